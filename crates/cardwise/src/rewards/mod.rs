//! Card catalog, reward resolver, and the service facade that ties them to
//! storage and the HTTP boundary.

pub mod catalog;
pub mod domain;
pub mod repository;
pub mod resolver;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{parse_catalog, CardDefinition, CatalogError, RuleDefinition};
pub use domain::{
    Card, CardDraft, CardId, CardSummary, MatchKind, PurchaseContext, RewardKind, RewardRule,
    RuleDraft, RuleId, Transaction, TransactionDraft, TransactionFilter, TransactionId,
    TransactionSummary, DEFAULT_POINT_VALUE,
};
pub use repository::{CatalogRepository, CatalogSnapshot, RepositoryError, TransactionRepository};
pub use resolver::{AppliedRule, RankedResult, ResolveError};
pub use router::rewards_router;
pub use service::{
    RecommendationRequest, RecommendationResponse, RewardService, RewardServiceError,
};
