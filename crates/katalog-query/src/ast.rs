//! Query abstract syntax tree.
//!
//! The builder reduces the parser's concrete parse tree to a [`Node`] tree
//! and runs the semantic checks. Normalization lives in [`crate::normalize`].

use std::fmt;

use crate::{
    error::QueryError,
    lexer::RESERVED_CHARS,
    parser::{AndComb, Group, OrComb, Term},
};

/// A field comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `:` or `=`
    Equals,
    /// Negated equality; only produced by normalization.
    NotEquals,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEquals,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEquals,
}

impl Operator {
    /// Maps a comparison symbol from the parser to an operator.
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Self::LessThan),
            "<=" => Some(Self::LessThanOrEquals),
            ">" => Some(Self::GreaterThan),
            ">=" => Some(Self::GreaterThanOrEquals),
            _ => None,
        }
    }

    /// Returns the logical negation of this operator.
    ///
    /// The mapping is total and involutive, which is what lets the
    /// normalizer eliminate every `Not` wrapped around a code.
    pub fn inverse(self) -> Self {
        match self {
            Self::Equals => Self::NotEquals,
            Self::NotEquals => Self::Equals,
            Self::LessThan => Self::GreaterThanOrEquals,
            Self::GreaterThanOrEquals => Self::LessThan,
            Self::LessThanOrEquals => Self::GreaterThan,
            Self::GreaterThan => Self::LessThanOrEquals,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEquals => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEquals => ">=",
        };
        f.write_str(symbol)
    }
}

/// A query expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An atomic string value: free text, or a code's operand.
    Leaf(String),

    /// Negation. After normalization this only ever wraps a [`Node::Leaf`].
    Not(Box<Self>),

    /// A field-scoped filter, e.g. `title:foo` or `year>=1950`.
    Code {
        /// The field alias as typed in the query.
        field: String,
        /// The comparison operator.
        op: Operator,
        /// The compared value. Comparison codes wrap a single leaf by
        /// construction; equals codes may wrap an arbitrary subtree until
        /// normalization distributes them.
        operand: Box<Self>,
    },

    /// Conjunction. At least two operands by construction.
    And(Vec<Self>),

    /// Disjunction. At least two operands by construction.
    Or(Vec<Self>),
}

impl Node {
    /// Removes every occurrence of `target` from the tree, comparing
    /// subtrees structurally.
    ///
    /// And/Or groups that lose members collapse to their sole remaining
    /// child; `None` means the whole tree was excluded. This backs the
    /// "remove this filter" breadcrumb links in search result pages.
    pub fn exclude(&self, target: &Self) -> Option<Self> {
        if self == target {
            return None;
        }
        match self {
            Self::And(operands) => {
                let kept: Vec<Self> = operands
                    .iter()
                    .filter_map(|operand| operand.exclude(target))
                    .collect();
                match kept.len() {
                    0 => None,
                    1 => kept.into_iter().next(),
                    _ => Some(Self::And(kept)),
                }
            }
            Self::Or(operands) => {
                let kept: Vec<Self> = operands
                    .iter()
                    .filter_map(|operand| operand.exclude(target))
                    .collect();
                match kept.len() {
                    0 => None,
                    1 => kept.into_iter().next(),
                    _ => Some(Self::Or(kept)),
                }
            }
            other => Some(other.clone()),
        }
    }

    /// Renders the tree back to query syntax.
    ///
    /// The output re-parses to an equivalent tree. Values containing
    /// whitespace or reserved characters are quoted.
    pub fn to_query_string(&self) -> String {
        match self {
            Self::Leaf(value) => quote_if_needed(value),
            Self::Not(inner) => format!("NOT {}", inner.to_query_string()),
            Self::Code { field, op, operand } => {
                let value = match operand.as_ref() {
                    Self::Leaf(value) => quote_if_needed(value),
                    other => format!("({})", other.to_query_string()),
                };
                match op {
                    Operator::Equals => format!("{field}:{value}"),
                    Operator::NotEquals => format!("NOT {field}:{value}"),
                    Operator::LessThan => format!("{field}<{value}"),
                    Operator::LessThanOrEquals => format!("{field}<={value}"),
                    Operator::GreaterThan => format!("{field}>{value}"),
                    Operator::GreaterThanOrEquals => format!("{field}>={value}"),
                }
            }
            Self::And(operands) => {
                let parts: Vec<String> = operands
                    .iter()
                    .map(|operand| match operand {
                        // OR binds looser, so OR children need parentheses.
                        or @ Self::Or(_) => format!("({})", or.to_query_string()),
                        other => other.to_query_string(),
                    })
                    .collect();
                parts.join(" AND ")
            }
            Self::Or(operands) => {
                let parts: Vec<String> =
                    operands.iter().map(Self::to_query_string).collect();
                parts.join(" OR ")
            }
        }
    }

    /// Formats the tree with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Leaf(value) => writeln!(f, "{prefix}Leaf({value:?})"),
            Self::Not(inner) => {
                writeln!(f, "{prefix}Not")?;
                inner.fmt_tree(f, indent + 1)
            }
            Self::Code { field, op, operand } => {
                writeln!(f, "{prefix}Code({field:?} {op})")?;
                operand.fmt_tree(f, indent + 1)
            }
            Self::And(operands) => {
                writeln!(f, "{prefix}And")?;
                for operand in operands {
                    operand.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Or(operands) => {
                writeln!(f, "{prefix}Or")?;
                for operand in operands {
                    operand.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

/// Quotes a value when it would not survive re-lexing as a single token.
fn quote_if_needed(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || matches!(value, "AND" | "OR" | "NOT")
        || value
            .chars()
            .any(|ch| ch.is_whitespace() || ch == '"' || ch == '\\' || RESERVED_CHARS.contains(&ch));
    if needs_quoting {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_owned()
    }
}

/// Reduces a parse tree to an AST and runs the semantic checks.
///
/// Singleton OrCombs and AndCombs collapse to their sole child, so And/Or
/// nodes always have at least two operands. An empty group and a code
/// nested inside another code's operand are semantic errors; the `~` like
/// operator is recognized by the grammar but rejected here.
pub fn build(or_comb: OrComb) -> Result<Node, QueryError> {
    let node = reduce_or_comb(or_comb)?;
    check_no_code_within_code(&node)?;
    Ok(node)
}

/// Reduces an OrComb, collapsing singletons.
fn reduce_or_comb(or_comb: OrComb) -> Result<Node, QueryError> {
    let mut operands = or_comb
        .and_combs
        .into_iter()
        .map(reduce_and_comb)
        .collect::<Result<Vec<Node>, QueryError>>()?;
    match operands.len() {
        1 => Ok(operands.remove(0)),
        _ => Ok(Node::Or(operands)),
    }
}

/// Reduces an AndComb, collapsing singletons and rejecting empty groups.
fn reduce_and_comb(and_comb: AndComb) -> Result<Node, QueryError> {
    if and_comb.terms.is_empty() {
        return Err(QueryError::semantic("empty group"));
    }
    let mut operands = and_comb
        .terms
        .into_iter()
        .map(reduce_term)
        .collect::<Result<Vec<Node>, QueryError>>()?;
    match operands.len() {
        1 => Ok(operands.remove(0)),
        _ => Ok(Node::And(operands)),
    }
}

/// Reduces a group to the AST of its contents.
fn reduce_group(group: Group) -> Result<Node, QueryError> {
    match group {
        Group::Or(or_comb) => reduce_or_comb(or_comb),
        Group::And(and_comb) => reduce_and_comb(and_comb),
        Group::Nested(inner) => reduce_group(*inner),
    }
}

/// Reduces a single parse-tree term.
fn reduce_term(term: Term) -> Result<Node, QueryError> {
    match term {
        Term::Value(token) => Ok(Node::Leaf(token.value)),
        Term::Group(group) => reduce_group(group),
        Term::Negated { op, term } => {
            if op.is_operator("~") {
                return Err(QueryError::semantic("Like operator (~) not yet supported"));
            }
            Ok(Node::Not(Box::new(reduce_term(*term)?)))
        }
        Term::Compare { code, op, value } => {
            let op = Operator::from_symbol(&op.value)
                .ok_or_else(|| QueryError::syntax(format!("unknown operator: {}", op.value)))?;
            Ok(Node::Code {
                field: code.value,
                op,
                operand: Box::new(Node::Leaf(value.value)),
            })
        }
        Term::CodeEquals { code, term } => Ok(Node::Code {
            field: code.value,
            op: Operator::Equals,
            operand: Box::new(reduce_term(*term)?),
        }),
    }
}

/// Rejects trees where a code's operand contains another code.
fn check_no_code_within_code(node: &Node) -> Result<(), QueryError> {
    match node {
        Node::Leaf(_) => Ok(()),
        Node::Not(inner) => check_no_code_within_code(inner),
        Node::And(operands) | Node::Or(operands) => {
            operands.iter().try_for_each(check_no_code_within_code)
        }
        Node::Code { operand, .. } => {
            if contains_code(operand) {
                Err(QueryError::semantic(
                    "Codes within code groups are not allowed.",
                ))
            } else {
                Ok(())
            }
        }
    }
}

/// True if any code appears anywhere in the tree.
fn contains_code(node: &Node) -> bool {
    match node {
        Node::Leaf(_) => false,
        Node::Code { .. } => true,
        Node::Not(inner) => contains_code(inner),
        Node::And(operands) | Node::Or(operands) => operands.iter().any(contains_code),
    }
}
