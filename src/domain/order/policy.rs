use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use super::value_objects::OrderStatus;

// ============================================================================
// Order Policies
// ============================================================================

/// One line of the allowed-transition graph: `from` may move to any of `to`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransitionRule {
    pub from: OrderStatus,
    pub to: Vec<OrderStatus>,
}

/// Which status changes `changeOrderStatus` accepts.
///
/// Without rules every status may move to every other status. Once rules are
/// configured, a transition is accepted only if some rule lists it.
#[derive(Debug, Clone, Default)]
pub struct TransitionPolicy {
    allowed: Option<HashMap<OrderStatus, HashSet<OrderStatus>>>,
}

impl TransitionPolicy {
    pub fn any_to_any() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: &[TransitionRule]) -> Self {
        let mut allowed: HashMap<OrderStatus, HashSet<OrderStatus>> = HashMap::new();
        for rule in rules {
            allowed
                .entry(rule.from)
                .or_default()
                .extend(rule.to.iter().copied());
        }

        Self {
            allowed: Some(allowed),
        }
    }

    pub fn permits(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match &self.allowed {
            None => true,
            Some(graph) => graph.get(&from).is_some_and(|targets| targets.contains(&to)),
        }
    }
}

/// What a read does when product names cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentPolicy {
    /// Fail the whole read with the catalog error
    #[default]
    Strict,
    /// Return the order with `name: null` on every item
    Degrade,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_accepts_everything() {
        let policy = TransitionPolicy::any_to_any();

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert!(policy.permits(from, to));
            }
        }
    }

    #[test]
    fn test_rules_restrict_transitions() {
        let policy = TransitionPolicy::from_rules(&[
            TransitionRule {
                from: OrderStatus::Pending,
                to: vec![OrderStatus::Paid, OrderStatus::Cancelled],
            },
            TransitionRule {
                from: OrderStatus::Paid,
                to: vec![OrderStatus::Delivered],
            },
        ]);

        assert!(policy.permits(OrderStatus::Pending, OrderStatus::Paid));
        assert!(policy.permits(OrderStatus::Paid, OrderStatus::Delivered));
        assert!(!policy.permits(OrderStatus::Delivered, OrderStatus::Pending));
        assert!(!policy.permits(OrderStatus::Cancelled, OrderStatus::Paid));
    }

    #[test]
    fn test_enrichment_policy_names() {
        let policy: EnrichmentPolicy = serde_json::from_str("\"degrade\"").unwrap();
        assert_eq!(policy, EnrichmentPolicy::Degrade);
        assert_eq!(EnrichmentPolicy::default(), EnrichmentPolicy::Strict);
    }
}
