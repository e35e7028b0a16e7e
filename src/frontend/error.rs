//! Front-end diagnostics.
//!
//! Every error carries the 1-based source line it was raised on; the driver
//! renders errors in the `[Error] <message>` / `[Line] <n>` form on stderr
//! before exiting.

use thiserror::Error;

use crate::frontend::ast::SemanticType;

pub type Result<T> = std::result::Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unexpected character `{character}` in stream")]
    UnexpectedCharacter { character: char, line: usize },

    #[error("unexpected non-ascii character in stream")]
    NonAsciiCharacter { line: usize },

    #[error("expected {expected} but found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("expected {expected} but reached end of file")]
    UnexpectedEof { expected: String, line: usize },

    #[error("unsupported return type")]
    UnsupportedReturnType { line: usize },

    #[error("incorrect function definition")]
    MalformedFunction { line: usize },

    #[error("re-definition of {name}")]
    Redefinition { name: String, line: usize },

    #[error("undefined variable {name}")]
    UndefinedVariable { name: String, line: usize },

    #[error("cannot declare variable {name} of type void")]
    VoidVariable { name: String, line: usize },

    #[error("variable {name} is not an array")]
    NotAnArray { name: String, line: usize },

    #[error("number of array elements must be a single integer")]
    ArrayLengthNotLiteral { line: usize },

    #[error("number of array elements must be larger than 1")]
    ArrayLengthTooSmall { line: usize },

    #[error(
        "accepted array formats: pre-allocation `{{}}` or #initials == #elements \
         (declared {expected}, found {found})"
    )]
    ArrayInitializerMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },

    #[error("invalid operand type for unary operator")]
    InvalidUnaryOperand { line: usize },

    #[error("expected {expected} type but found {found}")]
    TypeMismatch {
        expected: SemanticType,
        found: SemanticType,
        line: usize,
    },

    #[error("condition operands must be int or float, found {found}")]
    InvalidConditionOperand { found: SemanticType, line: usize },

    #[error("function {name} expects {expected} arguments but {found} were supplied")]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        found: usize,
        line: usize,
    },
}

impl SyntaxError {
    /// Source line the error was raised on.
    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedCharacter { line, .. }
            | Self::NonAsciiCharacter { line }
            | Self::UnexpectedToken { line, .. }
            | Self::UnexpectedEof { line, .. }
            | Self::UnsupportedReturnType { line }
            | Self::MalformedFunction { line }
            | Self::Redefinition { line, .. }
            | Self::UndefinedVariable { line, .. }
            | Self::VoidVariable { line, .. }
            | Self::NotAnArray { line, .. }
            | Self::ArrayLengthNotLiteral { line }
            | Self::ArrayLengthTooSmall { line }
            | Self::ArrayInitializerMismatch { line, .. }
            | Self::InvalidUnaryOperand { line }
            | Self::TypeMismatch { line, .. }
            | Self::InvalidConditionOperand { line, .. }
            | Self::ArgumentCountMismatch { line, .. } => *line,
        }
    }
}
