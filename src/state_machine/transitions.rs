use super::states::MatchStatus;

/// Statuses reachable from `from`, excluding the always-allowed same-state no-op
pub fn allowed_match_transitions(from: MatchStatus) -> &'static [MatchStatus] {
    match from {
        MatchStatus::Scheduled => &[
            MatchStatus::Completed,
            MatchStatus::Cancelled,
            MatchStatus::Postponed,
        ],
        MatchStatus::Postponed => &[
            MatchStatus::Scheduled,
            MatchStatus::Completed,
            MatchStatus::Cancelled,
        ],
        MatchStatus::Cancelled => &[MatchStatus::Scheduled, MatchStatus::Postponed],
        MatchStatus::Completed => &[],
    }
}

pub fn is_valid_match_transition(from: MatchStatus, to: MatchStatus) -> bool {
    from == to || allowed_match_transitions(from).contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_is_terminal() {
        for to in MatchStatus::all() {
            assert_eq!(
                is_valid_match_transition(MatchStatus::Completed, to),
                to == MatchStatus::Completed,
                "completed -> {to}"
            );
        }
    }

    #[test]
    fn test_same_state_always_allowed() {
        for status in MatchStatus::all() {
            assert!(is_valid_match_transition(status, status));
        }
    }

    #[test]
    fn test_cancelled_cannot_complete() {
        assert!(!is_valid_match_transition(
            MatchStatus::Cancelled,
            MatchStatus::Completed
        ));
        assert!(is_valid_match_transition(
            MatchStatus::Cancelled,
            MatchStatus::Postponed
        ));
        assert!(is_valid_match_transition(
            MatchStatus::Postponed,
            MatchStatus::Completed
        ));
    }
}
