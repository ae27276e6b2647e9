//! Error types for the roadmap model

use crate::document::GenerationState;

/// Illegal change of a document's generation state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The target state is not reachable from the current one
    #[error("illegal generation state transition: {from} -> {to}")]
    Illegal {
        /// Current state
        from: GenerationState,
        /// Requested state
        to: GenerationState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_display() {
        let err = TransitionError::Illegal {
            from: GenerationState::Completed,
            to: GenerationState::Paused,
        };
        assert_eq!(
            err.to_string(),
            "illegal generation state transition: completed -> paused"
        );
    }
}
