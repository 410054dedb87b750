//! Guard rails for the search engine (C10).
//!
//! The search loop is bounded by three independent limits: the number of
//! heap pops (`expansions`), the number of distinct per-node dominance
//! records (`visited_states`), and a wall-clock budget. A `GuardReport`
//! aggregates whichever of these were actually reached so that a caller can
//! tell a "complete" result set from a "best effort, ran out of budget" one.

use serde::Serialize;

/// Aggregated guard-rail counters and breach flags for a single search (or,
/// for the execution-plan orchestrator, for a whole run of searches).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardReport {
    pub expansions_reached: bool,
    pub visited_states_reached: bool,
    pub time_budget_reached: bool,
    pub expansions: u64,
    pub visited_states: u64,
    pub elapsed_milliseconds: f64,
    pub expansion_limit: u64,
    pub visited_state_limit: u64,
    pub time_budget_limit: Option<u64>,
}

impl GuardReport {
    /// `true` iff any guard limit was reached.
    ///
    /// Invariant: `any() == (expansions_reached || visited_states_reached ||
    /// time_budget_reached)` holds by construction, since `any` is never
    /// stored and is always derived from the three flags.
    pub fn any(&self) -> bool {
        self.expansions_reached || self.visited_states_reached || self.time_budget_reached
    }

    /// Folds another report's counters and flags into this one, the way the
    /// execution-plan orchestrator aggregates guard state across iterations:
    /// counters sum, breach flags OR together, and limits are kept from
    /// whichever report was populated first (the caller is expected to pass
    /// reports in iteration order and only take `other`'s limits when `self`
    /// has none set yet).
    pub fn merge(&mut self, other: &GuardReport) {
        self.expansions_reached |= other.expansions_reached;
        self.visited_states_reached |= other.visited_states_reached;
        self.time_budget_reached |= other.time_budget_reached;
        self.expansions += other.expansions;
        self.visited_states += other.visited_states;
        self.elapsed_milliseconds += other.elapsed_milliseconds;
        if self.expansion_limit == 0 {
            self.expansion_limit = other.expansion_limit;
        }
        if self.visited_state_limit == 0 {
            self.visited_state_limit = other.visited_state_limit;
        }
        if self.time_budget_limit.is_none() {
            self.time_budget_limit = other.time_budget_limit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_the_disjunction_of_the_three_flags() {
        let mut report = GuardReport::default();
        assert!(!report.any());

        report.visited_states_reached = true;
        assert!(report.any());
    }

    #[test]
    fn merge_sums_counters_and_ors_flags() {
        let mut a = GuardReport {
            expansions_reached: true,
            expansions: 10,
            expansion_limit: 10,
            ..Default::default()
        };
        let b = GuardReport {
            time_budget_reached: true,
            expansions: 5,
            elapsed_milliseconds: 12.5,
            expansion_limit: 10,
            ..Default::default()
        };

        a.merge(&b);

        assert!(a.expansions_reached);
        assert!(a.time_budget_reached);
        assert_eq!(a.expansions, 15);
        assert_eq!(a.expansion_limit, 10);
        assert_eq!(a.elapsed_milliseconds, 12.5);
    }
}
