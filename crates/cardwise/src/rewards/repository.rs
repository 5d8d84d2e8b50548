use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::{Card, CardId, RewardRule, RuleId, Transaction, TransactionFilter, TransactionId};

/// A consistent copy-on-read view of every card together with its rules.
///
/// The resolver only ever sees one of these, never the live store, so no
/// rule in the snapshot can reference a card deleted mid-read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub cards: Vec<Card>,
    pub rules_by_card: HashMap<CardId, Vec<RewardRule>>,
}

/// Storage abstraction for cards and their reward rules.
///
/// Implementations must cascade rule deletion when a card is deleted and
/// must hand out snapshots that are consistent at the time of the read.
pub trait CatalogRepository: Send + Sync {
    fn insert_card(&self, card: Card) -> Result<Card, RepositoryError>;
    fn update_card(&self, card: Card) -> Result<(), RepositoryError>;
    fn delete_card(&self, id: &CardId) -> Result<(), RepositoryError>;
    fn fetch_card(&self, id: &CardId) -> Result<Option<Card>, RepositoryError>;
    fn list_cards(&self) -> Result<Vec<Card>, RepositoryError>;

    fn insert_rule(&self, rule: RewardRule) -> Result<RewardRule, RepositoryError>;
    fn update_rule(&self, rule: RewardRule) -> Result<(), RepositoryError>;
    fn delete_rule(&self, card_id: &CardId, rule_id: &RuleId) -> Result<(), RepositoryError>;
    fn rules_for_card(&self, card_id: &CardId) -> Result<Vec<RewardRule>, RepositoryError>;

    fn snapshot(&self) -> Result<CatalogSnapshot, RepositoryError>;
}

/// Storage abstraction for the immutable transaction log.
pub trait TransactionRepository: Send + Sync {
    fn insert(&self, transaction: Transaction) -> Result<Transaction, RepositoryError>;
    fn fetch(&self, id: &TransactionId) -> Result<Option<Transaction>, RepositoryError>;
    fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
