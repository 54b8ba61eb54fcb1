//! Query parsing and AST for katalog search.
//!
//! This crate implements the query language of the bibliographic search
//! API:
//!
//! - **Free text**: `mumintrollet` - words matched against default fields
//! - **Phrases**: `"det osynliga barnet"` - quoted, whitespace preserved
//! - **Codes**: `title:foo` - restrict a term to one field
//! - **Comparisons**: `year>=1950` - range filters on a field
//! - **Negation**: `NOT foo` or `!foo`
//! - **Boolean**: `a AND b`, `a OR b`, plain adjacency meaning AND
//! - **Grouping**: `title:(a OR b)` - precedence and code distribution
//!
//! The pipeline is tokenize → parse → build → normalize; [`parse`] runs
//! the first three stages, [`normalize`] the last. Every stage is a pure
//! function over immutable values, so the whole pipeline can run
//! concurrently from any number of threads.
//!
//! # Example
//!
//! ```
//! use katalog_query::{Node, Operator, normalize, parse};
//!
//! let tree = normalize(parse("NOT year<1950").unwrap());
//! assert_eq!(
//!     tree,
//!     Node::Code {
//!         field: "year".into(),
//!         op: Operator::GreaterThanOrEquals,
//!         operand: Box::new(Node::Leaf("1950".into())),
//!     }
//! );
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod lexer;
mod normalize;
mod parser;

pub use ast::{Node, Operator, build};
pub use error::QueryError;
pub use lexer::{Token, TokenKind, tokenize};
pub use normalize::normalize;
pub use parser::{AndComb, Group, OrComb, Term, parse_tokens};

/// Parses a query string into a built (but not yet normalized) AST.
pub fn parse(input: &str) -> Result<Node, QueryError> {
    build(parse_tokens(tokenize(input)?)?)
}
