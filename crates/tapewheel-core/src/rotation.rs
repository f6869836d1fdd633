//! Destination-set rotation.
//!
//! Each rule owns a fixed pool of destination sets (tape or disk volumes)
//! and a modular counter over that pool. The counter is advanced exactly
//! once per fully-successful archive run; a failed run leaves it untouched.

use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// Per-rule rotation counters, as stored in the `state.currentSet` block.
///
/// An absent entry means the rule has never rotated; its first advance
/// lands on set `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCounters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub none: Option<u32>,
}

impl SetCounters {
    /// Current counter value for a rule, if it has ever rotated.
    pub fn get(&self, rule: Rule) -> Option<u32> {
        match rule {
            Rule::Monthly => self.monthly,
            Rule::Weekly => self.weekly,
            Rule::Daily => self.daily,
            Rule::None => self.none,
        }
    }

    fn slot(&mut self, rule: Rule) -> &mut Option<u32> {
        match rule {
            Rule::Monthly => &mut self.monthly,
            Rule::Weekly => &mut self.weekly,
            Rule::Daily => &mut self.daily,
            Rule::None => &mut self.none,
        }
    }

    /// The set index the next run of `rule` will use, without mutating
    /// anything. Used by the notifier to advertise tomorrow's volume.
    pub fn peek_next(&self, rule: Rule, total_sets: u32) -> u32 {
        if total_sets == 0 {
            return 0;
        }
        match self.get(rule) {
            None => 0,
            Some(current) => (current + 1) % total_sets,
        }
    }

    /// Advance the counter for `rule` over a pool of `total_sets` sets and
    /// return the new index. Must be called exactly once per successful
    /// archive completion, regardless of how many targets it contained.
    pub fn advance(&mut self, rule: Rule, total_sets: u32) -> u32 {
        let next = self.peek_next(rule, total_sets);
        *self.slot(rule) = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_advance_lands_on_zero() {
        let mut counters = SetCounters::default();
        assert_eq!(counters.advance(Rule::Daily, 3), 0);
        assert_eq!(counters.get(Rule::Daily), Some(0));
    }

    #[test]
    fn test_advance_increments_modulo() {
        let mut counters = SetCounters {
            daily: Some(1),
            ..Default::default()
        };
        assert_eq!(counters.advance(Rule::Daily, 3), 2);
        assert_eq!(counters.advance(Rule::Daily, 3), 0);
        assert_eq!(counters.advance(Rule::Daily, 3), 1);
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let counters = SetCounters {
            weekly: Some(2),
            ..Default::default()
        };
        assert_eq!(counters.peek_next(Rule::Weekly, 4), 3);
        assert_eq!(counters.get(Rule::Weekly), Some(2));
    }

    #[test]
    fn test_rules_rotate_independently() {
        let mut counters = SetCounters::default();
        counters.advance(Rule::Daily, 5);
        counters.advance(Rule::Daily, 5);
        counters.advance(Rule::Monthly, 2);
        assert_eq!(counters.get(Rule::Daily), Some(1));
        assert_eq!(counters.get(Rule::Monthly), Some(0));
        assert_eq!(counters.get(Rule::Weekly), None);
    }

    #[test]
    fn test_serde_skips_unset_counters() {
        let counters = SetCounters {
            daily: Some(2),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&counters).unwrap();
        assert!(yaml.contains("daily: 2"));
        assert!(!yaml.contains("weekly"));

        let parsed: SetCounters = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, counters);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// After any number of successful runs the counter stays within
        /// `[0, total_sets)`.
        #[test]
        fn prop_counter_stays_in_bounds(
            total in 1u32..64,
            start in proptest::option::of(0u32..64),
            advances in 0usize..200,
        ) {
            let mut counters = SetCounters {
                daily: start.map(|s| s % total),
                ..Default::default()
            };
            for _ in 0..advances {
                let idx = counters.advance(Rule::Daily, total);
                prop_assert!(idx < total);
                prop_assert_eq!(counters.get(Rule::Daily), Some(idx));
            }
        }

        /// N consecutive successes cycle the counter exactly
        /// `N mod total_sets` positions from its starting point.
        #[test]
        fn prop_advance_cycles_from_start(
            total in 1u32..32,
            start in 0u32..32,
            n in 1usize..100,
        ) {
            let start = start % total;
            let mut counters = SetCounters {
                weekly: Some(start),
                ..Default::default()
            };
            let mut last = start;
            for _ in 0..n {
                last = counters.advance(Rule::Weekly, total);
            }
            prop_assert_eq!(last, (start + n as u32) % total);
        }
    }
}
