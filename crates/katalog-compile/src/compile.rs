//! Compilation of normalized query trees into filter queries.
//!
//! The output is a backend-neutral boolean query value (`bool`, `must`,
//! `should`, `must_not`, `filter`, `range`, plus the simple/advanced
//! text-query marker) meant to be serialized verbatim into the search
//! backend's wire format.

use katalog_query::{Node, Operator, normalize, parse};
use serde_json::{Map, Value, json};

use crate::{
    boost::BoostConfig,
    error::CompileError,
    mapping::FieldMapping,
    text::{escape_advanced, is_simple},
};

/// Compiles a normalized tree into a filter query.
///
/// Only two leaf shapes reach the compiler after normalization: bare
/// free-text leaves (optionally under a single `Not`) and codes wrapping
/// exactly one leaf. Anything else is a [`CompileError::MalformedTree`].
pub fn compile(
    node: &Node,
    mapping: &FieldMapping,
    boost: &BoostConfig,
) -> Result<Value, CompileError> {
    match node {
        Node::And(operands) => {
            let compiled = operands
                .iter()
                .map(|operand| compile(operand, mapping, boost))
                .collect::<Result<Vec<Value>, CompileError>>()?;
            Ok(json!({ "bool": { "must": compiled } }))
        }
        Node::Or(operands) => {
            let compiled = operands
                .iter()
                .map(|operand| compile(operand, mapping, boost))
                .collect::<Result<Vec<Value>, CompileError>>()?;
            Ok(json!({ "bool": { "should": compiled } }))
        }
        Node::Leaf(value) => Ok(free_text(value, boost, false)),
        Node::Not(inner) => match inner.as_ref() {
            Node::Leaf(value) => Ok(free_text(value, boost, true)),
            other => Err(CompileError::MalformedTree(format!(
                "negation was not pushed down to a leaf: NOT {}",
                other.to_query_string()
            ))),
        },
        Node::Code { field, op, operand } => {
            let entry = mapping.resolve(field)?;
            let Node::Leaf(value) = operand.as_ref() else {
                return Err(CompileError::MalformedTree(format!(
                    "code {field} was not distributed onto its leaves"
                )));
            };
            match op {
                Operator::Equals => Ok(field_filter(&entry.path, value, false)),
                Operator::NotEquals => Ok(field_filter(&entry.path, value, true)),
                Operator::LessThan
                | Operator::LessThanOrEquals
                | Operator::GreaterThan
                | Operator::GreaterThanOrEquals => {
                    if !entry.field_type.is_ordered() {
                        return Err(CompileError::RangeUnsupported {
                            field: field.clone(),
                        });
                    }
                    Ok(range_filter(&entry.path, value, range_bound(*op)))
                }
            }
        }
    }
}

/// Runs the whole pipeline: parse, normalize, compile.
pub fn compile_query(
    input: &str,
    mapping: &FieldMapping,
    boost: &BoostConfig,
) -> Result<Value, CompileError> {
    compile(&normalize(parse(input)?), mapping, boost)
}

/// Picks the text-query mode and prepares the query text for it.
fn classify(value: &str) -> (&'static str, String) {
    if is_simple(value) {
        ("simple_query_string", value.to_owned())
    } else {
        ("query_string", escape_advanced(value))
    }
}

/// Builds a single-key object, for keys that are not literals.
fn object(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_owned(), value);
    Value::Object(map)
}

/// Compiles a free-text term, with boosting when configured.
fn free_text(value: &str, boost: &BoostConfig, negate: bool) -> Value {
    let (mode, query) = classify(value);
    let simple = object(
        mode,
        json!({
            "query": query,
            "analyze_wildcard": true,
            "default_operator": "AND",
        }),
    );

    let clause = if boost.is_empty() {
        simple
    } else {
        let boosted_exact = object(
            mode,
            json!({
                "query": query,
                "fields": boost.exact_fields(),
                "analyze_wildcard": true,
                "default_operator": "AND",
            }),
        );
        let boosted_soft = object(
            mode,
            json!({
                "query": query,
                "fields": boost.soft_fields(),
                "quote_field_suffix": ".exact",
                "analyze_wildcard": true,
                "default_operator": "AND",
            }),
        );
        json!({ "bool": { "should": [boosted_exact, boosted_soft, simple] } })
    };

    if negate {
        json!({ "bool": { "must_not": clause } })
    } else {
        clause
    }
}

/// Compiles an equals or not-equals code into a filter clause.
fn field_filter(path: &str, value: &str, negate: bool) -> Value {
    let value = quote_if_phrase(value);
    let (mode, query) = classify(&value);
    let clause = object(mode, json!({ "query": query, "fields": [path] }));
    let clause = if negate {
        json!({ "bool": { "must_not": clause } })
    } else {
        clause
    };
    json!({ "bool": { "filter": clause } })
}

/// Compiles a range code into a filter clause.
fn range_filter(path: &str, value: &str, bound: &str) -> Value {
    let range = object(path, object(bound, Value::String(value.to_owned())));
    json!({ "bool": { "filter": { "range": range } } })
}

/// Maps a range operator to its bound key.
fn range_bound(op: Operator) -> &'static str {
    match op {
        Operator::LessThan => "lt",
        Operator::LessThanOrEquals => "lte",
        Operator::GreaterThan => "gt",
        Operator::GreaterThanOrEquals => "gte",
        Operator::Equals | Operator::NotEquals => unreachable!("not a range operator"),
    }
}

/// Multi-word values are matched as phrases.
fn quote_if_phrase(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FieldType;

    fn mapping() -> FieldMapping {
        let mut mapping = FieldMapping::new();
        mapping.insert("title", "hasTitle.mainTitle", FieldType::Text);
        mapping.insert("year", "publication.year", FieldType::Numeric);
        mapping
    }

    fn compiled(input: &str) -> Value {
        compile_query(input, &mapping(), &BoostConfig::none()).unwrap()
    }

    #[test]
    fn free_text_uses_the_lenient_mode() {
        assert_eq!(
            compiled("tove"),
            json!({
                "simple_query_string": {
                    "query": "tove",
                    "analyze_wildcard": true,
                    "default_operator": "AND",
                }
            })
        );
    }

    #[test]
    fn advanced_free_text_is_escaped_for_the_strict_mode() {
        assert_eq!(
            compiled("tr?ll"),
            json!({
                "query_string": {
                    "query": "tr?ll",
                    "analyze_wildcard": true,
                    "default_operator": "AND",
                }
            })
        );
        assert_eq!(
            compiled(r#""mumin*trollet:2""#)["query_string"]["query"],
            json!(r"mumin*trollet\:2")
        );
    }

    #[test]
    fn negated_free_text_wraps_in_must_not() {
        let value = compiled("NOT tove");
        assert_eq!(
            value["bool"]["must_not"]["simple_query_string"]["query"],
            json!("tove")
        );
    }

    #[test]
    fn boosted_free_text_is_a_three_way_should() {
        let boost = BoostConfig::with_fields(vec![
            "hasTitle.mainTitle^100".into(),
            "contribution._str^80".into(),
        ]);
        let value = compile_query("tove", &mapping(), &boost).unwrap();
        let clauses = value["bool"]["should"].as_array().unwrap();
        assert_eq!(clauses.len(), 3);
        assert_eq!(
            clauses[0]["simple_query_string"]["fields"],
            json!(["hasTitle.mainTitle^100", "contribution._str.exact^80"])
        );
        assert_eq!(
            clauses[1]["simple_query_string"]["fields"],
            json!(["contribution._str^80"])
        );
        assert_eq!(
            clauses[1]["simple_query_string"]["quote_field_suffix"],
            json!(".exact")
        );
        assert_eq!(clauses[2]["simple_query_string"]["query"], json!("tove"));
    }

    #[test]
    fn field_equals_becomes_a_filter() {
        assert_eq!(
            compiled("title:foo"),
            json!({
                "bool": {
                    "filter": {
                        "simple_query_string": {
                            "query": "foo",
                            "fields": ["hasTitle.mainTitle"],
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn phrase_values_are_quoted() {
        let value = compiled("title:\"det osynliga barnet\"");
        assert_eq!(
            value["bool"]["filter"]["simple_query_string"]["query"],
            json!("\"det osynliga barnet\"")
        );
    }

    #[test]
    fn negated_field_wraps_must_not_inside_the_filter() {
        let value = compiled("NOT title:foo");
        assert_eq!(
            value["bool"]["filter"]["bool"]["must_not"]["simple_query_string"]["fields"],
            json!(["hasTitle.mainTitle"])
        );
    }

    #[test]
    fn range_comparison_becomes_a_range_filter() {
        assert_eq!(
            compiled("year >= 1950"),
            json!({
                "bool": {
                    "filter": {
                        "range": { "publication.year": { "gte": "1950" } }
                    }
                }
            })
        );
    }

    #[test]
    fn negated_range_inverts_the_bound() {
        assert_eq!(
            compiled("NOT year < 1950")["bool"]["filter"]["range"]["publication.year"],
            json!({ "gte": "1950" })
        );
    }

    #[test]
    fn and_compiles_to_must() {
        let value = compiled("a AND b");
        assert_eq!(value["bool"]["must"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn or_compiles_to_should() {
        let value = compiled("a OR b");
        assert_eq!(value["bool"]["should"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn unknown_field_is_an_error() {
        assert_eq!(
            compile_query("isbn:123", &mapping(), &BoostConfig::none()).unwrap_err(),
            CompileError::UnknownField("isbn".into())
        );
    }

    #[test]
    fn range_on_text_field_is_an_error() {
        assert_eq!(
            compile_query("title > a", &mapping(), &BoostConfig::none()).unwrap_err(),
            CompileError::RangeUnsupported {
                field: "title".into()
            }
        );
    }

    #[test]
    fn query_errors_pass_through() {
        assert!(matches!(
            compile_query("\"abc", &mapping(), &BoostConfig::none()).unwrap_err(),
            CompileError::Query(_)
        ));
    }

    #[test]
    fn malformed_tree_is_rejected_without_panicking() {
        let tree = Node::Not(Box::new(Node::And(vec![
            Node::Leaf("a".into()),
            Node::Leaf("b".into()),
        ])));
        assert!(matches!(
            compile(&tree, &mapping(), &BoostConfig::none()).unwrap_err(),
            CompileError::MalformedTree(_)
        ));
    }
}
