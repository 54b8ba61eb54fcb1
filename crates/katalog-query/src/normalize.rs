//! AST normalization.
//!
//! Two passes over the built tree, in a load-bearing order:
//!
//! 1. [`flatten_codes`] distributes every equals code over its operand's
//!    And/Or/Not structure, so that afterwards every code wraps exactly
//!    one leaf.
//! 2. [`flatten_negations`] pushes `Not` down with De Morgan's laws and
//!    absorbs it into code operators via [`Operator::inverse`]. Afterwards
//!    the only permitted `Not` wraps a bare leaf (a negated free-text
//!    term).
//!
//! Both passes build new trees; nothing is mutated in place.

use crate::ast::{Node, Operator};

/// Normalizes a built tree: code distribution, then negation push-down.
pub fn normalize(node: Node) -> Node {
    flatten_negations(flatten_codes(node))
}

/// Distributes `Code(field, Equals, operand)` onto every leaf reachable
/// through the operand, e.g. `code:(a OR b)` becomes
/// `Or(code:a, code:b)`. Comparison codes already wrap a single leaf by
/// construction and pass through unchanged.
fn flatten_codes(node: Node) -> Node {
    match node {
        Node::And(operands) => Node::And(operands.into_iter().map(flatten_codes).collect()),
        Node::Or(operands) => Node::Or(operands.into_iter().map(flatten_codes).collect()),
        Node::Not(inner) => Node::Not(Box::new(flatten_codes(*inner))),
        Node::Code {
            field,
            op: Operator::Equals,
            operand,
        } => distribute_code(&field, *operand),
        other => other,
    }
}

/// Rebuilds `operand` with `field:` applied to each of its leaves.
fn distribute_code(field: &str, operand: Node) -> Node {
    match operand {
        Node::Leaf(_) => Node::Code {
            field: field.to_owned(),
            op: Operator::Equals,
            operand: Box::new(operand),
        },
        Node::And(operands) => Node::And(
            operands
                .into_iter()
                .map(|operand| distribute_code(field, operand))
                .collect(),
        ),
        Node::Or(operands) => Node::Or(
            operands
                .into_iter()
                .map(|operand| distribute_code(field, operand))
                .collect(),
        ),
        Node::Not(inner) => Node::Not(Box::new(distribute_code(field, *inner))),
        // Nested codes were rejected by the semantic check before
        // normalization runs.
        nested @ Node::Code { .. } => nested,
    }
}

/// Pushes negations down to the leaves.
fn flatten_negations(node: Node) -> Node {
    match node {
        Node::And(operands) => {
            Node::And(operands.into_iter().map(flatten_negations).collect())
        }
        Node::Or(operands) => Node::Or(operands.into_iter().map(flatten_negations).collect()),
        Node::Not(inner) => negate(*inner),
        other => other,
    }
}

/// Returns the negation of `node` with the negation already pushed down.
fn negate(node: Node) -> Node {
    match node {
        Node::And(operands) => Node::Or(operands.into_iter().map(negate).collect()),
        Node::Or(operands) => Node::And(operands.into_iter().map(negate).collect()),
        // Double negation cancels.
        Node::Not(inner) => flatten_negations(*inner),
        Node::Code { field, op, operand } => Node::Code {
            field,
            op: op.inverse(),
            operand,
        },
        leaf @ Node::Leaf(_) => Node::Not(Box::new(leaf)),
    }
}
