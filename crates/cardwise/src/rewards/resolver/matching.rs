use super::super::domain::{MatchKind, RewardRule};

/// Scans a card's rules in input order and returns the one worth adopting,
/// if any.
///
/// A rule matches when its entity name equals the purchase merchant (for
/// merchant rules) or category (for category rules), case-insensitively. A
/// matching rule is adopted only when its rate strictly exceeds the current
/// best, seeded with the card's default rate. Strict inequality keeps the
/// scan stable: the first-seen rule wins ties and a rule that merely equals
/// the default is ignored.
pub(crate) fn best_matching_rule<'a>(
    merchant: &str,
    category: &str,
    default_rate: f64,
    rules: &'a [RewardRule],
) -> Option<&'a RewardRule> {
    let merchant = merchant.to_lowercase();
    let category = category.to_lowercase();

    let mut best: Option<&RewardRule> = None;
    let mut best_rate = default_rate;

    for rule in rules {
        let wanted = match rule.match_kind {
            MatchKind::Merchant => &merchant,
            MatchKind::Category => &category,
        };
        if rule.match_value.to_lowercase() == *wanted && rule.reward_rate > best_rate {
            best = Some(rule);
            best_rate = rule.reward_rate;
        }
    }

    best
}
