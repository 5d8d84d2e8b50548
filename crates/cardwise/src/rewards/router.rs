use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{CardDraft, CardId, RuleDraft, RuleId, TransactionDraft, TransactionFilter, TransactionId};
use super::repository::{CatalogRepository, RepositoryError, TransactionRepository};
use super::service::{RecommendationRequest, RewardService, RewardServiceError};

/// Router builder exposing the recommendation, card, rule, and transaction
/// endpoints.
pub fn rewards_router<C, T>(service: Arc<RewardService<C, T>>) -> Router
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/recommendations",
            post(recommend_handler::<C, T>),
        )
        .route(
            "/api/v1/cards",
            get(list_cards_handler::<C, T>).post(create_card_handler::<C, T>),
        )
        .route(
            "/api/v1/cards/:card_id",
            get(get_card_handler::<C, T>)
                .put(update_card_handler::<C, T>)
                .delete(delete_card_handler::<C, T>),
        )
        .route(
            "/api/v1/cards/:card_id/rules",
            get(list_rules_handler::<C, T>).post(create_rule_handler::<C, T>),
        )
        .route(
            "/api/v1/cards/:card_id/rules/:rule_id",
            axum::routing::put(update_rule_handler::<C, T>).delete(delete_rule_handler::<C, T>),
        )
        .route(
            "/api/v1/transactions",
            get(list_transactions_handler::<C, T>).post(create_transaction_handler::<C, T>),
        )
        .route(
            "/api/v1/transactions/summary",
            get(transaction_summary_handler::<C, T>),
        )
        .route(
            "/api/v1/transactions/:transaction_id",
            get(get_transaction_handler::<C, T>),
        )
        .with_state(service)
}

pub(crate) async fn recommend_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    axum::Json(request): axum::Json<RecommendationRequest>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.recommend(request) {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(RewardServiceError::InvalidInput(detail)) => {
            let payload = json!({ "error": detail });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        // Repository failures stay generic on this endpoint; the caller can
        // render nothing more useful than "try again".
        Err(RewardServiceError::Repository(_)) => {
            let payload = json!({ "error": "could not compute recommendations" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn create_card_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    axum::Json(draft): axum::Json<CardDraft>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.add_card(draft) {
        Ok(card) => (StatusCode::CREATED, axum::Json(card)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_cards_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.list_cards() {
        Ok(cards) => (StatusCode::OK, axum::Json(json!({ "cards": cards }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_card_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    Path(card_id): Path<String>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.get_card(&CardId(card_id)) {
        Ok(card) => (StatusCode::OK, axum::Json(card)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_card_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    Path(card_id): Path<String>,
    axum::Json(draft): axum::Json<CardDraft>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.update_card(&CardId(card_id), draft) {
        Ok(card) => (StatusCode::OK, axum::Json(card)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_card_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    Path(card_id): Path<String>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.delete_card(&CardId(card_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_rule_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    Path(card_id): Path<String>,
    axum::Json(draft): axum::Json<RuleDraft>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.add_rule(&CardId(card_id), draft) {
        Ok(rule) => (StatusCode::CREATED, axum::Json(rule)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_rules_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    Path(card_id): Path<String>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.list_rules(&CardId(card_id)) {
        Ok(rules) => (StatusCode::OK, axum::Json(json!({ "rules": rules }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_rule_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    Path((card_id, rule_id)): Path<(String, String)>,
    axum::Json(draft): axum::Json<RuleDraft>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.update_rule(&CardId(card_id), &RuleId(rule_id), draft) {
        Ok(rule) => (StatusCode::OK, axum::Json(rule)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_rule_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    Path((card_id, rule_id)): Path<(String, String)>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.delete_rule(&CardId(card_id), &RuleId(rule_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_transaction_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    axum::Json(draft): axum::Json<TransactionDraft>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.record_transaction(draft) {
        Ok(transaction) => (StatusCode::CREATED, axum::Json(transaction)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_transactions_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    Query(filter): Query<TransactionFilter>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.list_transactions(&filter) {
        Ok(transactions) => (
            StatusCode::OK,
            axum::Json(json!({ "transactions": transactions })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_transaction_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    Path(transaction_id): Path<String>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.get_transaction(&TransactionId(transaction_id)) {
        Ok(transaction) => (StatusCode::OK, axum::Json(transaction)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transaction_summary_handler<C, T>(
    State(service): State<Arc<RewardService<C, T>>>,
    Query(filter): Query<TransactionFilter>,
) -> Response
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    match service.transaction_summary(&filter) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: RewardServiceError) -> Response {
    let status = match &error {
        RewardServiceError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RewardServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        RewardServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        RewardServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
