//! Error types for query lexing, parsing, and analysis.

use thiserror::Error;

/// An error produced while turning a query string into a normalized AST.
///
/// Every stage of the pipeline fails with one of these; no stage recovers
/// from a structurally invalid input, and no partial result is ever
/// returned. The HTTP layer maps all three kinds to a client error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Malformed quoting or escaping in the raw query string.
    #[error("lex error at character {offset}: {message}")]
    Lex {
        /// What went wrong.
        message: String,
        /// Byte offset into the query string where the problem starts.
        offset: usize,
    },

    /// The token sequence does not reduce to a single query expression.
    #[error("syntax error: {message}")]
    Syntax {
        /// What went wrong.
        message: String,
    },

    /// A structurally legal but meaningless query, e.g. a code nested
    /// inside another code's group.
    #[error("semantic error: {message}")]
    Semantic {
        /// What went wrong.
        message: String,
    },
}

impl QueryError {
    /// Creates a lex error at the given byte offset.
    pub fn lex(message: impl Into<String>, offset: usize) -> Self {
        Self::Lex {
            message: message.into(),
            offset,
        }
    }

    /// Creates a syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Creates a semantic error.
    pub fn semantic(message: impl Into<String>) -> Self {
        Self::Semantic {
            message: message.into(),
        }
    }

    /// Returns the source offset where the error occurred, if one is known.
    ///
    /// Only lex errors carry offsets; parser and analyzer errors concern
    /// token or tree structure rather than a single character.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Lex { offset, .. } => Some(*offset),
            Self::Syntax { .. } | Self::Semantic { .. } => None,
        }
    }
}
