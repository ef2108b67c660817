//! Error types for expression parsing and validation.
//!
//! Only the parse/validate side of the engine produces errors. Evaluation
//! failures are reported in band as [`crate::Value::Invalid`] and never cross
//! the crate boundary as `Err`.

use core::fmt;
use core::result;

/// Result type used throughout the crate.
pub type Result<T> = result::Result<T, ExprError>;

/// Error produced while turning text into a validated tree.
///
/// Every variant carries the farthest character offset the scanner reached,
/// which is what the facade reports through
/// [`Expression::failure_offset`](crate::Expression::failure_offset). Offsets
/// count characters, not bytes, so they stay meaningful in the presence of
/// multi-byte operators such as `∫` or `π`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// The scanner could not continue: an unrecognised lexeme, a malformed
    /// numeric literal, an unterminated string or parameter, or an unmatched
    /// bracket.
    Syntax { position: usize },

    /// The tree parsed but a parent/child link violates the operator
    /// category rules, or a user-function name does not resolve in its
    /// enclosing defines chain.
    Structure { position: usize },

    /// Nesting exceeded the parser's recursion limit.
    TooDeep { position: usize },
}

impl ExprError {
    /// Character offset at which parsing gave up.
    pub fn position(&self) -> usize {
        match self {
            ExprError::Syntax { position }
            | ExprError::Structure { position }
            | ExprError::TooDeep { position } => *position,
        }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::Syntax { position } => {
                write!(f, "syntax error at offset {}", position)
            }
            ExprError::Structure { position } => {
                write!(f, "structurally invalid expression (offset {})", position)
            }
            ExprError::TooDeep { position } => {
                write!(f, "expression nested too deeply (offset {})", position)
            }
        }
    }
}

impl std::error::Error for ExprError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_position_and_display() {
        let err = ExprError::Syntax { position: 7 };
        assert_eq!(err.position(), 7);
        assert!(err.to_string().contains("offset 7"));

        let err = ExprError::Structure { position: 3 };
        assert_eq!(err.position(), 3);
        assert!(err.to_string().contains("invalid"));
    }
}
