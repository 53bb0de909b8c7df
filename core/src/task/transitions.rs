use super::types::TaskState;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: TaskState, to: TaskState },
    #[error("Cannot transition from terminal state {state:?}")]
    FromTerminalState { state: TaskState },
}

pub struct StateTransition;

impl StateTransition {
    pub fn validate(from: TaskState, to: TaskState) -> Result<(), TransitionError> {
        if Self::is_terminal(from) {
            return Err(TransitionError::FromTerminalState { state: from });
        }

        let is_valid = match (from, to) {
            // First poll.
            (TaskState::Submitted, TaskState::Processing) => true,
            // Rejected before any poll, or an attempt budget of zero.
            (TaskState::Submitted, TaskState::Failure | TaskState::Timeout) => true,
            // Every further poll re-enters PROCESSING.
            (TaskState::Processing, TaskState::Processing) => true,
            (TaskState::Processing, TaskState::Success | TaskState::Failure | TaskState::Timeout) => {
                true
            }
            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    pub fn is_terminal(state: TaskState) -> bool {
        matches!(
            state,
            TaskState::Success | TaskState::Failure | TaskState::Timeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TaskState; 5] = [
        TaskState::Submitted,
        TaskState::Processing,
        TaskState::Success,
        TaskState::Failure,
        TaskState::Timeout,
    ];

    #[test]
    fn test_valid_transitions() {
        assert!(StateTransition::validate(TaskState::Submitted, TaskState::Processing).is_ok());
        assert!(StateTransition::validate(TaskState::Processing, TaskState::Processing).is_ok());
        assert!(StateTransition::validate(TaskState::Processing, TaskState::Success).is_ok());
        assert!(StateTransition::validate(TaskState::Processing, TaskState::Timeout).is_ok());
    }

    #[test]
    fn test_success_requires_a_poll() {
        assert_eq!(
            StateTransition::validate(TaskState::Submitted, TaskState::Success),
            Err(TransitionError::InvalidTransition {
                from: TaskState::Submitted,
                to: TaskState::Success
            })
        );
    }

    #[test]
    fn test_nothing_leaves_terminal_states() {
        for from in ALL.into_iter().filter(|s| StateTransition::is_terminal(*s)) {
            for to in ALL {
                assert_eq!(
                    StateTransition::validate(from, to),
                    Err(TransitionError::FromTerminalState { state: from })
                );
            }
        }
    }

    #[test]
    fn test_nothing_returns_to_submitted() {
        for from in ALL {
            assert!(StateTransition::validate(from, TaskState::Submitted).is_err());
        }
    }
}
