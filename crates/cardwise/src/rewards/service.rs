use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::catalog::CardDefinition;
use super::domain::{
    Card, CardDraft, CardId, PurchaseContext, RewardRule, RuleDraft, RuleId, Transaction,
    TransactionDraft, TransactionFilter, TransactionId, TransactionSummary,
};
use super::repository::{CatalogRepository, RepositoryError, TransactionRepository};
use super::resolver::{self, RankedResult};

/// Boundary request for a recommendation.
///
/// `user_cards`, when present, restricts the candidate set to those ids; a
/// present-but-empty list means no candidates at all, while an absent field
/// means every stored card is a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub merchant: String,
    pub category: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_cards: Option<Vec<CardId>>,
}

/// Boundary response: the full ranked list plus the winner pulled out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub best_card: Option<RankedResult>,
    pub all_cards: Vec<RankedResult>,
}

/// Service composing the catalog repository, the transaction log, and the
/// resolver.
pub struct RewardService<C, T> {
    catalog: Arc<C>,
    transactions: Arc<T>,
}

static CARD_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static RULE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TRANSACTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_card_id() -> CardId {
    let id = CARD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CardId(format!("card-{id:06}"))
}

fn next_rule_id() -> RuleId {
    let id = RULE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RuleId(format!("rule-{id:06}"))
}

fn next_transaction_id() -> TransactionId {
    let id = TRANSACTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TransactionId(format!("txn-{id:06}"))
}

impl<C, T> RewardService<C, T>
where
    C: CatalogRepository + 'static,
    T: TransactionRepository + 'static,
{
    pub fn new(catalog: Arc<C>, transactions: Arc<T>) -> Self {
        Self {
            catalog,
            transactions,
        }
    }

    /// Rank every candidate card for the purchase and return the winner
    /// alongside the full ordered list.
    pub fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> Result<RecommendationResponse, RewardServiceError> {
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(RewardServiceError::InvalidInput(
                "amount must be a positive number".to_string(),
            ));
        }

        let mut snapshot = self.catalog.snapshot()?;
        if let Some(ids) = &request.user_cards {
            let wanted: HashSet<&CardId> = ids.iter().collect();
            snapshot.cards.retain(|card| wanted.contains(&card.id));
        }

        let purchase = PurchaseContext {
            merchant: request.merchant,
            category: request.category,
            amount: request.amount,
        };
        let all_cards = resolver::recommend(&purchase, &snapshot.cards, &snapshot.rules_by_card)
            .map_err(|err| RewardServiceError::InvalidInput(err.to_string()))?;

        Ok(RecommendationResponse {
            best_card: all_cards.first().cloned(),
            all_cards,
        })
    }

    pub fn add_card(&self, draft: CardDraft) -> Result<Card, RewardServiceError> {
        validate_card_draft(&draft)?;
        let card = card_from_draft(next_card_id(), draft);
        let stored = self.catalog.insert_card(card)?;
        Ok(stored)
    }

    pub fn update_card(&self, id: &CardId, draft: CardDraft) -> Result<Card, RewardServiceError> {
        validate_card_draft(&draft)?;
        self.catalog
            .fetch_card(id)?
            .ok_or(RepositoryError::NotFound)?;
        let card = card_from_draft(id.clone(), draft);
        self.catalog.update_card(card.clone())?;
        Ok(card)
    }

    /// Deleting a card cascades deletion of its rules inside the repository.
    pub fn delete_card(&self, id: &CardId) -> Result<(), RewardServiceError> {
        self.catalog.delete_card(id)?;
        Ok(())
    }

    pub fn get_card(&self, id: &CardId) -> Result<Card, RewardServiceError> {
        let card = self
            .catalog
            .fetch_card(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(card)
    }

    pub fn list_cards(&self) -> Result<Vec<Card>, RewardServiceError> {
        let cards = self.catalog.list_cards()?;
        Ok(cards)
    }

    /// Attach a rule to a card. A Points/Miles rule without a positive point
    /// value is rejected here, before it reaches the repository.
    pub fn add_rule(
        &self,
        card_id: &CardId,
        draft: RuleDraft,
    ) -> Result<RewardRule, RewardServiceError> {
        validate_rule_draft(&draft)?;
        self.catalog
            .fetch_card(card_id)?
            .ok_or(RepositoryError::NotFound)?;
        let rule = rule_from_draft(next_rule_id(), card_id.clone(), draft);
        let stored = self.catalog.insert_rule(rule)?;
        Ok(stored)
    }

    pub fn update_rule(
        &self,
        card_id: &CardId,
        rule_id: &RuleId,
        draft: RuleDraft,
    ) -> Result<RewardRule, RewardServiceError> {
        validate_rule_draft(&draft)?;
        self.catalog
            .fetch_card(card_id)?
            .ok_or(RepositoryError::NotFound)?;
        let rule = rule_from_draft(rule_id.clone(), card_id.clone(), draft);
        self.catalog.update_rule(rule.clone())?;
        Ok(rule)
    }

    pub fn delete_rule(&self, card_id: &CardId, rule_id: &RuleId) -> Result<(), RewardServiceError> {
        self.catalog.delete_rule(card_id, rule_id)?;
        Ok(())
    }

    pub fn list_rules(&self, card_id: &CardId) -> Result<Vec<RewardRule>, RewardServiceError> {
        self.catalog
            .fetch_card(card_id)?
            .ok_or(RepositoryError::NotFound)?;
        let rules = self.catalog.rules_for_card(card_id)?;
        Ok(rules)
    }

    /// Record a purchase. The reward is computed once, here, from the rates
    /// in effect right now; the stored record is never recomputed.
    pub fn record_transaction(
        &self,
        draft: TransactionDraft,
    ) -> Result<Transaction, RewardServiceError> {
        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(RewardServiceError::InvalidInput(
                "amount must be a positive number".to_string(),
            ));
        }
        let card = self
            .catalog
            .fetch_card(&draft.card_id)?
            .ok_or(RepositoryError::NotFound)?;
        let rules = self.catalog.rules_for_card(&draft.card_id)?;

        let purchase = PurchaseContext {
            merchant: draft.merchant.clone(),
            category: draft.category.clone(),
            amount: draft.amount,
        };
        let result = resolver::evaluate_card(&purchase, &card, &rules)
            .map_err(|err| RewardServiceError::InvalidInput(err.to_string()))?;

        let transaction = Transaction {
            id: next_transaction_id(),
            date: draft.date,
            merchant: draft.merchant,
            category: draft.category,
            amount: draft.amount,
            card_id: draft.card_id,
            reward_earned: result.cash_value,
            note: draft.note,
        };
        let stored = self.transactions.insert(transaction)?;
        Ok(stored)
    }

    pub fn get_transaction(&self, id: &TransactionId) -> Result<Transaction, RewardServiceError> {
        let transaction = self
            .transactions
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(transaction)
    }

    pub fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, RewardServiceError> {
        let transactions = self.transactions.list(filter)?;
        Ok(transactions)
    }

    pub fn transaction_summary(
        &self,
        filter: &TransactionFilter,
    ) -> Result<TransactionSummary, RewardServiceError> {
        let transactions = self.transactions.list(filter)?;
        Ok(TransactionSummary::from_transactions(&transactions))
    }

    /// Populate predefined card products, skipping any whose (name, issuer)
    /// pair is already stored. Returns the number of cards seeded.
    pub fn seed_catalog(
        &self,
        definitions: &[CardDefinition],
    ) -> Result<usize, RewardServiceError> {
        let existing = self.catalog.list_cards()?;
        let mut seeded = 0;

        for definition in definitions {
            let known = existing.iter().any(|card| {
                card.name.eq_ignore_ascii_case(&definition.name)
                    && card.issuer.eq_ignore_ascii_case(&definition.issuer)
            });
            if known {
                continue;
            }

            let card = self.add_card(definition.card_draft())?;
            for rule in definition.rule_drafts() {
                self.add_rule(&card.id, rule)?;
            }
            seeded += 1;
        }

        Ok(seeded)
    }
}

fn card_from_draft(id: CardId, draft: CardDraft) -> Card {
    Card {
        id,
        name: draft.name,
        issuer: draft.issuer,
        last4: draft.last4,
        expiry: draft.expiry,
        card_type: draft.card_type,
        default_reward_rate: draft.default_reward_rate,
        default_reward_kind: draft.default_reward_kind,
        default_point_value: draft.default_point_value,
    }
}

fn rule_from_draft(id: RuleId, card_id: CardId, draft: RuleDraft) -> RewardRule {
    RewardRule {
        id,
        card_id,
        match_kind: draft.match_kind,
        match_value: draft.match_value,
        reward_rate: draft.reward_rate,
        reward_kind: draft.reward_kind,
        point_value: draft.point_value,
    }
}

fn validate_card_draft(draft: &CardDraft) -> Result<(), RewardServiceError> {
    if draft.name.trim().is_empty() {
        return Err(RewardServiceError::InvalidInput(
            "card name must not be empty".to_string(),
        ));
    }
    if !draft.default_reward_rate.is_finite() || draft.default_reward_rate < 0.0 {
        return Err(RewardServiceError::InvalidInput(
            "default reward rate must be zero or positive".to_string(),
        ));
    }
    if let Some(point_value) = draft.default_point_value {
        if !point_value.is_finite() || point_value <= 0.0 {
            return Err(RewardServiceError::InvalidInput(
                "point value must be positive".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_rule_draft(draft: &RuleDraft) -> Result<(), RewardServiceError> {
    if draft.match_value.trim().is_empty() {
        return Err(RewardServiceError::InvalidInput(
            "rule entity name must not be empty".to_string(),
        ));
    }
    if !draft.reward_rate.is_finite() || draft.reward_rate < 0.0 {
        return Err(RewardServiceError::InvalidInput(
            "reward rate must be zero or positive".to_string(),
        ));
    }
    match draft.point_value {
        Some(point_value) if !point_value.is_finite() || point_value <= 0.0 => {
            Err(RewardServiceError::InvalidInput(
                "point value must be positive".to_string(),
            ))
        }
        None if draft.reward_kind.needs_point_value() => Err(RewardServiceError::InvalidInput(
            format!(
                "a {} rule requires a point value",
                draft.reward_kind.label()
            ),
        )),
        _ => Ok(()),
    }
}

/// Error raised by the reward service.
#[derive(Debug, thiserror::Error)]
pub enum RewardServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
