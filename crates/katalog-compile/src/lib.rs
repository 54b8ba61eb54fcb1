//! Filter-query compiler for katalog search.
//!
//! Takes the normalized AST produced by `katalog-query` and compiles it
//! into a backend-neutral boolean filter query, resolving field aliases
//! through a [`FieldMapping`] and applying free-text boosting per a
//! [`BoostConfig`]. The compiled value serializes straight into an
//! Elasticsearch `_search` body, but uses only generic boolean-query
//! vocabulary.
//!
//! # Example
//!
//! ```
//! use katalog_compile::{BoostConfig, FieldMapping, FieldType, compile_query};
//!
//! let mut mapping = FieldMapping::new();
//! mapping.insert("year", "publication.year", FieldType::Numeric);
//!
//! let query = compile_query("year >= 1950", &mapping, &BoostConfig::none()).unwrap();
//! assert_eq!(
//!     query["bool"]["filter"]["range"]["publication.year"]["gte"],
//!     serde_json::json!("1950")
//! );
//! ```

#![warn(missing_docs)]

mod boost;
mod compile;
mod error;
mod mapping;
mod text;

pub use boost::BoostConfig;
pub use compile::{compile, compile_query};
pub use error::CompileError;
pub use mapping::{FieldEntry, FieldMapping, FieldType};
pub use text::{escape_advanced, is_simple};
