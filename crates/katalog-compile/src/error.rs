//! Error types for query compilation.

use katalog_query::QueryError;
use thiserror::Error;

/// An error produced while compiling a query string into a filter query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The query string failed to lex, parse, or build.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A code refers to a field alias the mapping does not know.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A range comparison on a field whose type has no ordering.
    #[error("field {field} does not support range comparisons")]
    RangeUnsupported {
        /// The offending field alias.
        field: String,
    },

    /// The compiler was handed a tree that is not in normalized form.
    #[error("malformed query tree: {0}")]
    MalformedTree(String),
}
