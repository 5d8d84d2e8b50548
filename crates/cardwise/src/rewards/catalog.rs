//! Predefined card products parsed from a JSON catalog.
//!
//! The catalog describes card products as shipped by issuers: default
//! earning behavior, the override rules the product advertises, and the
//! fee/benefit copy shown to users. Seeding turns each definition into a
//! stored card plus its rules.

use serde::{Deserialize, Serialize};

use super::domain::{CardDraft, MatchKind, RewardKind, RuleDraft, DEFAULT_POINT_VALUE};

/// One card product from the catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub card_key: String,
    pub name: String,
    pub issuer: String,
    pub card_type: String,
    pub default_reward_rate: f64,
    #[serde(rename = "reward_type")]
    pub reward_kind: RewardKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_fee: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_fee_waiver: Option<String>,
    #[serde(default)]
    pub reward_rules: Vec<RuleDefinition>,
    #[serde(default)]
    pub benefits: Vec<String>,
}

/// One advertised override rule on a card product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    #[serde(rename = "type")]
    pub match_kind: MatchKind,
    pub entity_name: String,
    pub reward_rate: f64,
    #[serde(rename = "reward_type")]
    pub reward_kind: RewardKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_value: Option<f64>,
}

impl CardDefinition {
    pub fn card_draft(&self) -> CardDraft {
        CardDraft {
            name: self.name.clone(),
            issuer: self.issuer.clone(),
            last4: None,
            expiry: None,
            card_type: self.card_type.clone(),
            default_reward_rate: self.default_reward_rate,
            default_reward_kind: self.reward_kind,
            default_point_value: self.point_value,
        }
    }

    /// Catalog rules that omit a point value inherit the card product's,
    /// falling back to [`DEFAULT_POINT_VALUE`] for points/miles rules.
    pub fn rule_drafts(&self) -> Vec<RuleDraft> {
        self.reward_rules
            .iter()
            .map(|rule| {
                let point_value = rule.point_value.or(self.point_value).or_else(|| {
                    rule.reward_kind
                        .needs_point_value()
                        .then_some(DEFAULT_POINT_VALUE)
                });
                RuleDraft {
                    match_kind: rule.match_kind,
                    match_value: rule.entity_name.clone(),
                    reward_rate: rule.reward_rate,
                    reward_kind: rule.reward_kind,
                    point_value,
                }
            })
            .collect()
    }
}

/// Catalog parse failure.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to parse card catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parse a JSON array of card definitions.
pub fn parse_catalog(raw: &str) -> Result<Vec<CardDefinition>, CatalogError> {
    let definitions = serde_json::from_str(raw)?;
    Ok(definitions)
}
