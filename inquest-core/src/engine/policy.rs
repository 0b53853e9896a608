//! Termination policy for the retrieval loop.
//!
//! A pure decision function over the accumulated investigation state,
//! evaluated once per loop iteration immediately after the analyze stage.
//! The engine alone acts on the verdict; evaluation has no side effects.

use crate::config::EngineConfig;
use crate::types::InvestigationState;

/// Whether the retrieval loop should continue or stop, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Stop(StopReason),
}

/// Why the retrieval loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The hard safety cap on loop iterations was reached.
    RetrievalCap,
    /// Enough non-empty items have been collected.
    SufficientData,
    /// The analyst suggested nothing further to pursue.
    NoFollowUps,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::RetrievalCap => write!(f, "retrieval cap reached"),
            StopReason::SufficientData => write!(f, "sufficient data collected"),
            StopReason::NoFollowUps => write!(f, "no follow-up queries left to pursue"),
        }
    }
}

/// Evaluate the loop-termination conditions, first true wins.
pub fn evaluate(state: &InvestigationState, config: &EngineConfig) -> Verdict {
    if state.retrieval_count >= config.max_retrievals {
        return Verdict::Stop(StopReason::RetrievalCap);
    }
    if state.valid_item_count() >= config.sufficiency_threshold {
        return Verdict::Stop(StopReason::SufficientData);
    }
    if state.follow_up_queries.is_empty() {
        return Verdict::Stop(StopReason::NoFollowUps);
    }
    Verdict::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RetrievedItem;

    fn state_with(
        retrieval_count: usize,
        valid_items: usize,
        follow_ups: usize,
    ) -> InvestigationState {
        let mut state = InvestigationState::new("test subject");
        state.retrieval_count = retrieval_count;
        for i in 0..valid_items {
            state
                .retrieved_data
                .push(RetrievedItem::new("web_search", format!("fact {i}")));
        }
        state.follow_up_queries = (0..follow_ups).map(|i| format!("query {i}")).collect();
        state
    }

    #[test]
    fn test_continue_when_no_condition_met() {
        let state = state_with(3, 2, 2);
        assert_eq!(evaluate(&state, &EngineConfig::default()), Verdict::Continue);
    }

    #[test]
    fn test_stop_at_retrieval_cap() {
        let state = state_with(15, 2, 2);
        assert_eq!(
            evaluate(&state, &EngineConfig::default()),
            Verdict::Stop(StopReason::RetrievalCap)
        );
    }

    #[test]
    fn test_stop_on_sufficiency() {
        let state = state_with(3, 8, 2);
        assert_eq!(
            evaluate(&state, &EngineConfig::default()),
            Verdict::Stop(StopReason::SufficientData)
        );
    }

    #[test]
    fn test_stop_on_empty_follow_ups() {
        let state = state_with(3, 2, 0);
        assert_eq!(
            evaluate(&state, &EngineConfig::default()),
            Verdict::Stop(StopReason::NoFollowUps)
        );
    }

    #[test]
    fn test_empty_follow_ups_stops_regardless_of_counts() {
        // The empty-follow-ups rule fires even with almost no data collected
        // and the cap far away.
        let state = state_with(1, 0, 0);
        assert_eq!(
            evaluate(&state, &EngineConfig::default()),
            Verdict::Stop(StopReason::NoFollowUps)
        );
    }

    #[test]
    fn test_cap_takes_priority_over_sufficiency() {
        let state = state_with(15, 10, 0);
        assert_eq!(
            evaluate(&state, &EngineConfig::default()),
            Verdict::Stop(StopReason::RetrievalCap)
        );
    }

    #[test]
    fn test_sufficiency_counts_only_non_empty_items() {
        let mut state = state_with(3, 7, 2);
        for _ in 0..5 {
            state.retrieved_data.push(RetrievedItem::new("web_search", ""));
        }
        // 7 valid + 5 empty: still below the threshold of 8.
        assert_eq!(evaluate(&state, &EngineConfig::default()), Verdict::Continue);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = EngineConfig {
            max_retrievals: 2,
            sufficiency_threshold: 3,
            max_follow_up_queries: 3,
        };
        assert_eq!(
            evaluate(&state_with(2, 0, 1), &config),
            Verdict::Stop(StopReason::RetrievalCap)
        );
        assert_eq!(
            evaluate(&state_with(1, 3, 1), &config),
            Verdict::Stop(StopReason::SufficientData)
        );
    }
}
