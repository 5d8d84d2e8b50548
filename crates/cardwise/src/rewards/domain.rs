use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Monetary value assumed for one point or mile when no point value is set.
///
/// Both the resolver and the validation layer coalesce against this constant
/// so a missing point value means the same thing everywhere.
pub const DEFAULT_POINT_VALUE: f64 = 1.0;

/// Identifier wrapper for stored cards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub String);

/// Identifier wrapper for reward rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

/// Identifier wrapper for recorded transactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

/// Currency in which a card pays its rewards out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardKind {
    Cashback,
    Points,
    Miles,
}

impl RewardKind {
    /// Points and miles carry a point-to-currency conversion; cashback is
    /// already monetary.
    pub const fn needs_point_value(self) -> bool {
        matches!(self, RewardKind::Points | RewardKind::Miles)
    }

    pub const fn label(self) -> &'static str {
        match self {
            RewardKind::Cashback => "Cashback",
            RewardKind::Points => "Points",
            RewardKind::Miles => "Miles",
        }
    }
}

/// Dimension a reward rule matches the purchase on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    Merchant,
    Category,
}

/// A payment card with its default earning behavior.
///
/// Predefined card products seeded from the catalog carry no last-4 digits
/// or expiry; user-added cards carry both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub issuer: String,
    #[serde(default)]
    pub last4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<NaiveDate>,
    pub card_type: String,
    pub default_reward_rate: f64,
    pub default_reward_kind: RewardKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_point_value: Option<f64>,
}

impl Card {
    pub fn summary(&self) -> CardSummary {
        CardSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            issuer: self.issuer.clone(),
            last4: self.last4.clone(),
        }
    }
}

/// The card fields exposed on recommendation results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub id: CardId,
    pub name: String,
    pub issuer: String,
    #[serde(default)]
    pub last4: Option<String>,
}

/// Caller-supplied fields for creating or replacing a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDraft {
    pub name: String,
    pub issuer: String,
    #[serde(default)]
    pub last4: Option<String>,
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    pub card_type: String,
    pub default_reward_rate: f64,
    pub default_reward_kind: RewardKind,
    #[serde(default)]
    pub default_point_value: Option<f64>,
}

/// An override of a card's default reward rate, scoped to one merchant or
/// spending category. Rule lifetime is bound to the owning card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRule {
    pub id: RuleId,
    pub card_id: CardId,
    pub match_kind: MatchKind,
    pub match_value: String,
    pub reward_rate: f64,
    pub reward_kind: RewardKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_value: Option<f64>,
}

/// Caller-supplied fields for creating or replacing a reward rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub match_kind: MatchKind,
    pub match_value: String,
    pub reward_rate: f64,
    pub reward_kind: RewardKind,
    #[serde(default)]
    pub point_value: Option<f64>,
}

/// Immutable record of a past purchase and the reward it earned.
///
/// `reward_earned` is computed once when the transaction is saved and never
/// recomputed, so later rule edits do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub merchant: String,
    pub category: String,
    pub amount: f64,
    pub card_id: CardId,
    pub reward_earned: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Caller-supplied fields for recording a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub date: NaiveDate,
    pub merchant: String,
    pub category: String,
    pub amount: f64,
    pub card_id: CardId,
    #[serde(default)]
    pub note: Option<String>,
}

/// The purchase being scored: merchant and category are free text compared
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseContext {
    pub merchant: String,
    pub category: String,
    pub amount: f64,
}

/// Optional narrowing criteria for transaction listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub card_id: Option<CardId>,
}

impl TransactionFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(from) = self.date_from {
            if transaction.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if transaction.date > to {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !transaction.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(card_id) = &self.card_id {
            if &transaction.card_id != card_id {
                return false;
            }
        }
        true
    }
}

/// Spend and reward totals over a set of recorded transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub total_spent: f64,
    pub total_rewards: f64,
    /// Rewards as a percentage of spend; zero when nothing was spent.
    pub average_reward_rate: f64,
}

impl TransactionSummary {
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut total_spent = 0.0;
        let mut total_rewards = 0.0;
        for transaction in transactions {
            total_spent += transaction.amount;
            total_rewards += transaction.reward_earned;
        }
        let average_reward_rate = if total_spent > 0.0 {
            (total_rewards / total_spent) * 100.0
        } else {
            0.0
        };
        Self {
            total_spent,
            total_rewards,
            average_reward_rate,
        }
    }
}
