//! Generation state transitions

use crate::document::GenerationState;
use crate::error::TransitionError;

/// Validates a generation state change.
///
/// Writing the same state again is always accepted.
pub fn validate_transition(
    from: GenerationState,
    to: GenerationState,
) -> Result<(), TransitionError> {
    if from == to || allowed(from, to) {
        Ok(())
    } else {
        Err(TransitionError::Illegal { from, to })
    }
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: GenerationState) -> Vec<GenerationState> {
    use GenerationState::*;
    match from {
        Queued => vec![InProgress, Error],
        InProgress => vec![Paused, Completed, Error],
        Paused => vec![InProgress, Error],
        Error => vec![Queued],
        Completed => vec![Queued],
    }
}

fn allowed(from: GenerationState, to: GenerationState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
