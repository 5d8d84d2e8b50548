use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use cardwise::config::CatalogConfig;
use cardwise::error::AppError;
use cardwise::rewards::{
    parse_catalog, Card, CardDefinition, CardId, CatalogRepository, CatalogSnapshot,
    RepositoryError, RewardRule, RuleId, Transaction, TransactionFilter, TransactionId,
    TransactionRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;

/// Card products bundled into the binary so a fresh install has something
/// to recommend before the user adds their own cards.
const EMBEDDED_CATALOG: &str = include_str!("../data/cards.json");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Read the predefined card catalog: the configured JSON file when one is
/// set, the embedded catalog otherwise.
pub(crate) fn load_catalog(config: &CatalogConfig) -> Result<Vec<CardDefinition>, AppError> {
    let raw = match &config.path {
        Some(path) => std::fs::read_to_string(path)?,
        None => EMBEDDED_CATALOG.to_string(),
    };
    let definitions = parse_catalog(&raw)?;
    Ok(definitions)
}

#[derive(Default)]
struct CatalogState {
    cards: Vec<Card>,
    rules: HashMap<CardId, Vec<RewardRule>>,
}

/// Mutex-backed catalog store. Cards keep insertion order so ranking
/// tie-breaks stay deterministic across calls.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCatalogRepository {
    state: Arc<Mutex<CatalogState>>,
}

impl CatalogRepository for InMemoryCatalogRepository {
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
        // Rule lifetime is bound to the card.
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
pub(crate) struct InMemoryTransactionRepository {
    records: Arc<Mutex<Vec<Transaction>>>,
}

impl TransactionRepository for InMemoryTransactionRepository {
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

pub(crate) fn parse_date(raw: &str) -> Result<chrono::NaiveDate, String> {
    chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
