//! Field alias resolution.
//!
//! Maps the short field aliases users type in queries (`title`, `year`)
//! to the paths they are indexed under, together with enough type
//! information to decide which comparison operators apply.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// How a field is indexed, which determines the operators it supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Analyzed full text.
    Text,
    /// A single unanalyzed token.
    Keyword,
    /// A date, comparable with range operators.
    Date,
    /// A number, comparable with range operators.
    Numeric,
}

impl FieldType {
    /// True if values of this type have a total order, i.e. range
    /// comparisons make sense.
    pub fn is_ordered(self) -> bool {
        matches!(self, Self::Date | Self::Numeric)
    }
}

/// One resolved field: where it lives in the index and what it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    /// The indexed path the alias resolves to.
    pub path: String,
    /// The field's type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// The alias → field table, typically deserialized from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    /// Alias to entry. A BTreeMap keeps iteration order stable.
    fields: BTreeMap<String, FieldEntry>,
}

impl FieldMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing any previous entry for the alias.
    pub fn insert(
        &mut self,
        alias: impl Into<String>,
        path: impl Into<String>,
        field_type: FieldType,
    ) {
        self.fields.insert(
            alias.into(),
            FieldEntry {
                path: path.into(),
                field_type,
            },
        );
    }

    /// Resolves an alias to its entry.
    pub fn resolve(&self, alias: &str) -> Result<&FieldEntry, CompileError> {
        self.fields
            .get(alias)
            .ok_or_else(|| CompileError::UnknownField(alias.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_alias() {
        let mut mapping = FieldMapping::new();
        mapping.insert("title", "hasTitle.mainTitle", FieldType::Text);
        let entry = mapping.resolve("title").unwrap();
        assert_eq!(entry.path, "hasTitle.mainTitle");
        assert_eq!(entry.field_type, FieldType::Text);
    }

    #[test]
    fn unknown_alias_is_an_error() {
        let mapping = FieldMapping::new();
        assert_eq!(
            mapping.resolve("year").unwrap_err(),
            CompileError::UnknownField("year".into())
        );
    }

    #[test]
    fn only_dates_and_numbers_are_ordered() {
        assert!(FieldType::Date.is_ordered());
        assert!(FieldType::Numeric.is_ordered());
        assert!(!FieldType::Text.is_ordered());
        assert!(!FieldType::Keyword.is_ordered());
    }

    #[test]
    fn deserializes_from_json() {
        let mapping: FieldMapping = serde_json::from_str(
            r#"{
                "title": { "path": "hasTitle.mainTitle", "type": "text" },
                "year": { "path": "publication.year", "type": "numeric" }
            }"#,
        )
        .unwrap();
        assert_eq!(
            mapping.resolve("year").unwrap().field_type,
            FieldType::Numeric
        );
    }
}
