//! Free-text boost configuration.
//!
//! Free-text terms can be matched with extra relevance weight against an
//! ordered list of boost fields. Fields that contain the search key (the
//! sub-field holding a record's searchable string form) get a "soft"
//! variant as-is and an "exact" variant with the search key swapped for
//! its `.exact` sub-field.

use serde::{Deserialize, Serialize};

/// The default search-key marker in indexed paths.
const DEFAULT_SEARCH_KEY: &str = "_str";

/// The ordered boost-field list for free-text matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostConfig {
    /// The search-key marker to look for inside boost-field paths.
    #[serde(default = "default_search_key")]
    pub search_key: String,
    /// Boost fields in descending priority order. Empty disables boosting.
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Serde default for [`BoostConfig::search_key`].
fn default_search_key() -> String {
    DEFAULT_SEARCH_KEY.to_owned()
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            search_key: default_search_key(),
            fields: Vec::new(),
        }
    }
}

impl BoostConfig {
    /// A configuration with no boost fields.
    pub fn none() -> Self {
        Self::default()
    }

    /// A configuration boosting the given fields with the default
    /// search key.
    pub fn with_fields(fields: Vec<String>) -> Self {
        Self {
            search_key: default_search_key(),
            fields,
        }
    }

    /// True if boosting is disabled.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The boost fields that contain the search key, used for soft
    /// (analyzed) matching. An empty search key marks nothing.
    pub fn soft_fields(&self) -> Vec<String> {
        if self.search_key.is_empty() {
            return Vec::new();
        }
        self.fields
            .iter()
            .filter(|field| field.contains(&self.search_key))
            .cloned()
            .collect()
    }

    /// All boost fields with the search key swapped for its `.exact`
    /// sub-field. Fields without the search key (or all of them, when
    /// the search key is empty) pass through unchanged.
    pub fn exact_fields(&self) -> Vec<String> {
        if self.search_key.is_empty() {
            return self.fields.clone();
        }
        let exact_key = format!("{}.exact", self.search_key);
        self.fields
            .iter()
            .map(|field| field.replace(&self.search_key, &exact_key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BoostConfig {
        BoostConfig::with_fields(vec![
            "hasTitle.mainTitle^100".into(),
            "contribution._str^80".into(),
            "subject._str".into(),
        ])
    }

    #[test]
    fn soft_fields_require_the_search_key() {
        assert_eq!(
            config().soft_fields(),
            vec!["contribution._str^80".to_owned(), "subject._str".to_owned()]
        );
    }

    #[test]
    fn exact_fields_swap_in_the_exact_subfield() {
        assert_eq!(
            config().exact_fields(),
            vec![
                "hasTitle.mainTitle^100".to_owned(),
                "contribution._str.exact^80".to_owned(),
                "subject._str.exact".to_owned(),
            ]
        );
    }

    #[test]
    fn empty_config_disables_boosting() {
        assert!(BoostConfig::none().is_empty());
        assert!(!config().is_empty());
    }

    #[test]
    fn empty_search_key_marks_no_field() {
        let config: BoostConfig = serde_json::from_str(
            r#"{ "search_key": "", "fields": ["hasTitle.mainTitle^100"] }"#,
        )
        .unwrap();
        assert_eq!(config.soft_fields(), Vec::<String>::new());
        assert_eq!(
            config.exact_fields(),
            vec!["hasTitle.mainTitle^100".to_owned()]
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: BoostConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.search_key, "_str");
        assert!(config.is_empty());
    }
}
