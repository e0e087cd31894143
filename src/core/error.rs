use crate::core::participant::ParticipantId;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while allocating, aggregating or settling expenses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// The expense cannot be split as given (no beneficiaries, bad weights,
    /// payers that do not add up, arithmetic overflow).
    #[error("invalid split input for expense {expense}: {reason}")]
    InvalidSplitInput { expense: Uuid, reason: String },

    /// Amounts that must add up exactly did not. Always a defect in the engine.
    #[error("conservation violated in {context}: expected {expected}, got {actual}")]
    ConservationViolation {
        context: String,
        expected: i64,
        actual: i64,
    },

    #[error("unknown participant: {participant}")]
    UnknownParticipant { participant: ParticipantId },
}

impl SplitError {
    pub(crate) fn invalid(expense: Uuid, reason: impl Into<String>) -> Self {
        SplitError::InvalidSplitInput {
            expense,
            reason: reason.into(),
        }
    }

    pub(crate) fn conservation(context: impl Into<String>, expected: i64, actual: i64) -> Self {
        SplitError::ConservationViolation {
            context: context.into(),
            expected,
            actual,
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SplitError::conservation("balances", 0, 3);
        assert_eq!(
            err.to_string(),
            "conservation violated in balances: expected 0, got 3"
        );

        let err = SplitError::UnknownParticipant {
            participant: ParticipantId::new("zoe"),
        };
        assert_eq!(err.to_string(), "unknown participant: zoe");
    }
}
