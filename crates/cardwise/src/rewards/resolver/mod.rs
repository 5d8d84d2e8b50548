//! The reward resolver: a pure function from a purchase context and a card
//! catalog to a ranked recommendation list.
//!
//! The resolver performs no I/O and mutates nothing it is given; it reads an
//! immutable snapshot of cards and rules and allocates a fresh result list,
//! so concurrent callers need no locking.

mod matching;

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    Card, CardId, CardSummary, MatchKind, PurchaseContext, RewardKind, RewardRule,
    DEFAULT_POINT_VALUE,
};

/// Per-card outcome of a recommendation: the effective rate that applied,
/// the reward it yields, and the rule that overrode the default, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub card: CardSummary,
    pub reward_rate: f64,
    #[serde(rename = "reward_type")]
    pub reward_kind: RewardKind,
    /// Raw reward quantity in reward-kind units (rupees, points, miles).
    pub reward_value: f64,
    /// The reward normalized to money, applying the point value for
    /// points/miles.
    pub cash_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<AppliedRule>,
}

/// The override that won, reported so callers can explain the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRule {
    pub match_kind: MatchKind,
    pub entity_name: String,
}

/// The only fatal resolver condition: an amount that is not a number.
///
/// Zero and negative amounts are not errors; they degrade to a zero reward
/// so the function stays total.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("purchase amount must be a finite number, got {0}")]
    NonFiniteAmount(f64),
}

/// Computes the recommendation for one card, independent of all others.
pub fn evaluate_card(
    purchase: &PurchaseContext,
    card: &Card,
    rules: &[RewardRule],
) -> Result<RankedResult, ResolveError> {
    if !purchase.amount.is_finite() {
        return Err(ResolveError::NonFiniteAmount(purchase.amount));
    }
    let amount = purchase.amount.max(0.0);

    let mut rate = card.default_reward_rate;
    let mut kind = card.default_reward_kind;
    let mut point_value = card.default_point_value.unwrap_or(DEFAULT_POINT_VALUE);
    let mut applied = None;

    if let Some(rule) =
        matching::best_matching_rule(&purchase.merchant, &purchase.category, rate, rules)
    {
        rate = rule.reward_rate;
        kind = rule.reward_kind;
        point_value = rule.point_value.unwrap_or(DEFAULT_POINT_VALUE);
        applied = Some(AppliedRule {
            match_kind: rule.match_kind,
            entity_name: rule.match_value.clone(),
        });
    }

    let reward_value = amount * rate / 100.0;
    let cash_value = if kind.needs_point_value() {
        reward_value * point_value
    } else {
        reward_value
    };

    Ok(RankedResult {
        card: card.summary(),
        reward_rate: rate,
        reward_kind: kind,
        reward_value,
        cash_value,
        rule: applied,
    })
}

/// Scores every candidate card against the purchase and returns the results
/// ranked by cash value, best first.
///
/// Cards absent from `rules_by_card` are scored on their default rate alone.
/// The sort is stable, so cards with equal cash value keep their input
/// order and repeated calls with identical input produce identical output.
pub fn recommend(
    purchase: &PurchaseContext,
    cards: &[Card],
    rules_by_card: &HashMap<CardId, Vec<RewardRule>>,
) -> Result<Vec<RankedResult>, ResolveError> {
    let mut results = Vec::with_capacity(cards.len());
    for card in cards {
        let rules = rules_by_card
            .get(&card.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        results.push(evaluate_card(purchase, card, rules)?);
    }

    results.sort_by(|a, b| {
        b.cash_value
            .partial_cmp(&a.cash_value)
            .unwrap_or(Ordering::Equal)
    });

    Ok(results)
}
