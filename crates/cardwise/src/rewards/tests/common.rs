use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::rewards::domain::{
    Card, CardDraft, CardId, MatchKind, PurchaseContext, RewardKind, RewardRule, RuleDraft,
    RuleId, Transaction, TransactionFilter, TransactionId,
};
use crate::rewards::repository::{
    CatalogRepository, CatalogSnapshot, RepositoryError, TransactionRepository,
};
use crate::rewards::service::RewardService;

pub(super) fn purchase(merchant: &str, category: &str, amount: f64) -> PurchaseContext {
    PurchaseContext {
        merchant: merchant.to_string(),
        category: category.to_string(),
        amount,
    }
}

pub(super) fn cashback_card(id: &str, name: &str, rate: f64) -> Card {
    Card {
        id: CardId(id.to_string()),
        name: name.to_string(),
        issuer: "Test Bank".to_string(),
        last4: Some("1234".to_string()),
        expiry: NaiveDate::from_ymd_opt(2028, 6, 30),
        card_type: "Visa".to_string(),
        default_reward_rate: rate,
        default_reward_kind: RewardKind::Cashback,
        default_point_value: None,
    }
}

pub(super) fn points_card(id: &str, name: &str, rate: f64, point_value: Option<f64>) -> Card {
    Card {
        id: CardId(id.to_string()),
        name: name.to_string(),
        issuer: "Test Bank".to_string(),
        last4: Some("5678".to_string()),
        expiry: NaiveDate::from_ymd_opt(2027, 3, 31),
        card_type: "Mastercard".to_string(),
        default_reward_rate: rate,
        default_reward_kind: RewardKind::Points,
        default_point_value: point_value,
    }
}

pub(super) fn merchant_rule(id: &str, card: &Card, merchant: &str, rate: f64) -> RewardRule {
    RewardRule {
        id: RuleId(id.to_string()),
        card_id: card.id.clone(),
        match_kind: MatchKind::Merchant,
        match_value: merchant.to_string(),
        reward_rate: rate,
        reward_kind: RewardKind::Cashback,
        point_value: None,
    }
}

pub(super) fn category_rule(id: &str, card: &Card, category: &str, rate: f64) -> RewardRule {
    RewardRule {
        id: RuleId(id.to_string()),
        card_id: card.id.clone(),
        match_kind: MatchKind::Category,
        match_value: category.to_string(),
        reward_rate: rate,
        reward_kind: RewardKind::Cashback,
        point_value: None,
    }
}

pub(super) fn rules_map(rules: Vec<RewardRule>) -> HashMap<CardId, Vec<RewardRule>> {
    let mut map: HashMap<CardId, Vec<RewardRule>> = HashMap::new();
    for rule in rules {
        map.entry(rule.card_id.clone()).or_default().push(rule);
    }
    map
}

pub(super) fn card_draft(name: &str, rate: f64) -> CardDraft {
    CardDraft {
        name: name.to_string(),
        issuer: "Test Bank".to_string(),
        last4: Some("4242".to_string()),
        expiry: NaiveDate::from_ymd_opt(2029, 1, 31),
        card_type: "Visa".to_string(),
        default_reward_rate: rate,
        default_reward_kind: RewardKind::Cashback,
        default_point_value: None,
    }
}

pub(super) fn cashback_rule_draft(category: &str, rate: f64) -> RuleDraft {
    RuleDraft {
        match_kind: MatchKind::Category,
        match_value: category.to_string(),
        reward_rate: rate,
        reward_kind: RewardKind::Cashback,
        point_value: None,
    }
}

#[derive(Default)]
struct CatalogState {
    cards: Vec<Card>,
    rules: HashMap<CardId, Vec<RewardRule>>,
}

/// Mutex-backed catalog store preserving card insertion order, so ranking
/// tie-breaks are deterministic in tests.
#[derive(Default, Clone)]
pub(super) struct MemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl CatalogRepository for MemoryCatalog {
    fn insert_card(&self, card: Card) -> Result<Card, RepositoryError> {
        let mut state = self.state.lock().expect("catalog mutex poisoned");
        if state.cards.iter().any(|existing| existing.id == card.id) {
            return Err(RepositoryError::Conflict);
        }
        state.cards.push(card.clone());
        Ok(card)
    }

    fn update_card(&self, card: Card) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("catalog mutex poisoned");
        match state.cards.iter_mut().find(|existing| existing.id == card.id) {
            Some(existing) => {
                *existing = card;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_card(&self, id: &CardId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("catalog mutex poisoned");
        let before = state.cards.len();
        state.cards.retain(|card| &card.id != id);
        if state.cards.len() == before {
            return Err(RepositoryError::NotFound);
        }
        state.rules.remove(id);
        Ok(())
    }

    fn fetch_card(&self, id: &CardId) -> Result<Option<Card>, RepositoryError> {
        let state = self.state.lock().expect("catalog mutex poisoned");
        Ok(state.cards.iter().find(|card| &card.id == id).cloned())
    }

    fn list_cards(&self) -> Result<Vec<Card>, RepositoryError> {
        let state = self.state.lock().expect("catalog mutex poisoned");
        Ok(state.cards.clone())
    }

    fn insert_rule(&self, rule: RewardRule) -> Result<RewardRule, RepositoryError> {
        let mut state = self.state.lock().expect("catalog mutex poisoned");
        let rules = state.rules.entry(rule.card_id.clone()).or_default();
        if rules.iter().any(|existing| existing.id == rule.id) {
            return Err(RepositoryError::Conflict);
        }
        rules.push(rule.clone());
        Ok(rule)
    }

    fn update_rule(&self, rule: RewardRule) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("catalog mutex poisoned");
        let rules = state
            .rules
            .get_mut(&rule.card_id)
            .ok_or(RepositoryError::NotFound)?;
        match rules.iter_mut().find(|existing| existing.id == rule.id) {
            Some(existing) => {
                *existing = rule;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_rule(&self, card_id: &CardId, rule_id: &RuleId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("catalog mutex poisoned");
        let rules = state
            .rules
            .get_mut(card_id)
            .ok_or(RepositoryError::NotFound)?;
        let before = rules.len();
        rules.retain(|rule| &rule.id != rule_id);
        if rules.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn rules_for_card(&self, card_id: &CardId) -> Result<Vec<RewardRule>, RepositoryError> {
        let state = self.state.lock().expect("catalog mutex poisoned");
        Ok(state.rules.get(card_id).cloned().unwrap_or_default())
    }

    fn snapshot(&self) -> Result<CatalogSnapshot, RepositoryError> {
        let state = self.state.lock().expect("catalog mutex poisoned");
        Ok(CatalogSnapshot {
            cards: state.cards.clone(),
            rules_by_card: state.rules.clone(),
        })
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryTransactions {
    records: Arc<Mutex<Vec<Transaction>>>,
}

impl TransactionRepository for MemoryTransactions {
    fn insert(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        let mut records = self.records.lock().expect("transaction mutex poisoned");
        if records.iter().any(|existing| existing.id == transaction.id) {
            return Err(RepositoryError::Conflict);
        }
        records.push(transaction.clone());
        Ok(transaction)
    }

    fn fetch(&self, id: &TransactionId) -> Result<Option<Transaction>, RepositoryError> {
        let records = self.records.lock().expect("transaction mutex poisoned");
        Ok(records.iter().find(|record| &record.id == id).cloned())
    }

    fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, RepositoryError> {
        let records = self.records.lock().expect("transaction mutex poisoned");
        Ok(records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

/// Catalog stub that fails every call, for exercising the 500 paths.
pub(super) struct UnavailableCatalog;

impl CatalogRepository for UnavailableCatalog {
    fn insert_card(&self, _card: Card) -> Result<Card, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_card(&self, _card: Card) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete_card(&self, _id: &CardId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_card(&self, _id: &CardId) -> Result<Option<Card>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_cards(&self) -> Result<Vec<Card>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_rule(&self, _rule: RewardRule) -> Result<RewardRule, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_rule(&self, _rule: RewardRule) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete_rule(&self, _card_id: &CardId, _rule_id: &RuleId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn rules_for_card(&self, _card_id: &CardId) -> Result<Vec<RewardRule>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn snapshot(&self) -> Result<CatalogSnapshot, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> (
    Arc<RewardService<MemoryCatalog, MemoryTransactions>>,
    Arc<MemoryCatalog>,
    Arc<MemoryTransactions>,
) {
    let catalog = Arc::new(MemoryCatalog::default());
    let transactions = Arc::new(MemoryTransactions::default());
    let service = Arc::new(RewardService::new(catalog.clone(), transactions.clone()));
    (service, catalog, transactions)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
