//! Shift-reduce query parser.
//!
//! Consumes the lexer's token sequence bottom-up with an explicit stack and
//! one token of lookahead, producing a concrete parse tree that the AST
//! builder then reduces.
//!
//! # Grammar
//!
//! ```text
//! OrComb   := AndComb ( "OR" AndComb )*
//! AndComb  := Term ( "AND" Term | Term )*      adjacency is implicit AND
//! Term     := STRING
//!           | Group
//!           | UOP Term
//!           | STRING BOP STRING
//!           | STRING BOPEQ Term
//! Group    := "(" OrComb ")" | "(" AndComb ")" | "(" Group ")" | "(" ")"
//! UOP      := "NOT" | "!" | "~"
//! BOP      := "<" | ">" | "<=" | ">="
//! BOPEQ    := ":" | "="
//! ```
//!
//! AND binds tighter than OR. The lookahead decides when a reduction would
//! be premature: a bare string is not reduced to a term while it may still
//! be the left operand of a comparison, and an AndComb/OrComb is not closed
//! while the next token could still extend it.

use std::collections::VecDeque;

use crate::{
    error::QueryError,
    lexer::{Token, TokenKind},
};

/// The root of a parse tree: one or more AndCombs joined by `OR`.
#[derive(Debug, PartialEq, Eq)]
pub struct OrComb {
    /// The OR-separated conjunctions. Always at least one, except inside
    /// an empty group `()`.
    pub and_combs: Vec<AndComb>,
}

/// One or more terms joined by explicit `AND` or plain adjacency.
#[derive(Debug, PartialEq, Eq)]
pub struct AndComb {
    /// The conjoined terms. Empty only for the literal group `()`.
    pub terms: Vec<Term>,
}

/// A parenthesized subexpression.
#[derive(Debug, PartialEq, Eq)]
pub enum Group {
    /// `( OrComb )`
    Or(OrComb),
    /// `( AndComb )`, including the empty group `()`.
    And(AndComb),
    /// `( Group )`
    Nested(Box<Group>),
}

/// A single term of an AndComb.
#[derive(Debug, PartialEq, Eq)]
pub enum Term {
    /// A bare (or quoted) string.
    Value(Token),
    /// A parenthesized subexpression.
    Group(Group),
    /// A unary operator (`NOT`, `!`, `~`) applied to a term.
    Negated {
        /// The operator token.
        op: Token,
        /// The negated term.
        term: Box<Term>,
    },
    /// A comparison `code <op> value` where op is one of `< > <= >=`.
    Compare {
        /// The field code (left operand).
        code: Token,
        /// The comparison operator token.
        op: Token,
        /// The compared value (right operand).
        value: Token,
    },
    /// A field scoping `code : term` or `code = term`.
    CodeEquals {
        /// The field code.
        code: Token,
        /// The scoped term; may be an arbitrary subexpression.
        term: Box<Term>,
    },
}

/// An item on the parse stack: either a raw token or a reduced nonterminal.
#[derive(Debug)]
enum StackItem {
    /// A shifted, not yet reduced token.
    Input(Token),
    /// A reduced binary comparison operator (`< > <= >=`).
    Bop(Token),
    /// A reduced equals operator (`:` or `=`).
    BopEq,
    /// A reduced unary operator (`not`, `!`, `~`).
    Uop(Token),
    /// A reduced term.
    Term(Term),
    /// A reduced AndComb.
    AndComb(AndComb),
    /// A reduced OrComb.
    OrComb(OrComb),
    /// A reduced group.
    Group(Group),
}

/// True if the lookahead could make the string on the stack top the left
/// operand of a comparison, in which case it must not yet become a term.
fn lookahead_is_comparison(lookahead: Option<&Token>) -> bool {
    lookahead.is_some_and(|t| {
        t.kind == TokenKind::Operator
            && matches!(t.value.as_str(), "<" | ">" | "<=" | ">=" | "=" | ":")
    })
}

/// True if the lookahead could still extend an AndComb's term list, in
/// which case the list must stay open.
fn extends_and_comb(t: &Token) -> bool {
    t.is_string()
        || (t.kind == TokenKind::Operator
            && matches!(t.value.as_str(), "!" | "~" | ":" | "=" | "("))
        || t.is_keyword("not")
        || t.is_keyword("and")
}

/// The shift-reduce machine.
struct Parser {
    /// Parse stack; the last element is the top.
    stack: Vec<StackItem>,
}

impl Parser {
    /// Runs the machine over the token sequence.
    fn run(tokens: Vec<Token>) -> Result<OrComb, QueryError> {
        let mut queue: VecDeque<Token> = tokens.into();
        let mut parser = Self { stack: Vec::new() };

        while let Some(token) = queue.pop_front() {
            parser.stack.push(StackItem::Input(token));
            while parser.reduce(queue.front()) {}
        }

        if parser.stack.len() == 1
            && let Some(StackItem::OrComb(or_comb)) = parser.stack.pop()
        {
            return Ok(or_comb);
        }
        Err(QueryError::syntax(
            "query does not reduce to a single expression",
        ))
    }

    /// Applies at most one reduction rule, highest priority first.
    /// Returns false when no rule applies.
    fn reduce(&mut self, lookahead: Option<&Token>) -> bool {
        self.reduce_bop()
            || self.reduce_bopeq()
            || self.reduce_uop()
            || self.reduce_term(lookahead)
            || self.reduce_and_comb(lookahead)
            || self.reduce_or_comb(lookahead)
            || self.reduce_group()
    }

    /// Returns the stack item `depth` positions below the top.
    fn peek_at(&self, depth: usize) -> Option<&StackItem> {
        self.stack.get(self.stack.len().checked_sub(1 + depth)?)
    }

    /// Pops the top item, which the caller has checked to be an Input token.
    fn pop_input(&mut self) -> Token {
        match self.stack.pop() {
            Some(StackItem::Input(token)) => token,
            _ => unreachable!("caller checked stack top"),
        }
    }

    /// Pops the top item, which the caller has checked to be a Term.
    fn pop_term(&mut self) -> Term {
        match self.stack.pop() {
            Some(StackItem::Term(term)) => term,
            _ => unreachable!("caller checked stack top"),
        }
    }

    /// Pops the top item, which the caller has checked to be an AndComb.
    fn pop_and_comb(&mut self) -> AndComb {
        match self.stack.pop() {
            Some(StackItem::AndComb(and_comb)) => and_comb,
            _ => unreachable!("caller checked stack top"),
        }
    }

    /// BOP := "<" | ">" | "<=" | ">="
    fn reduce_bop(&mut self) -> bool {
        if matches!(self.peek_at(0), Some(StackItem::Input(t))
            if t.kind == TokenKind::Operator
                && matches!(t.value.as_str(), "<" | ">" | "<=" | ">="))
        {
            let op = self.pop_input();
            self.stack.push(StackItem::Bop(op));
            return true;
        }
        false
    }

    /// BOPEQ := ":" | "="
    fn reduce_bopeq(&mut self) -> bool {
        if matches!(self.peek_at(0), Some(StackItem::Input(t))
            if t.is_operator(":") || t.is_operator("="))
        {
            self.stack.pop();
            self.stack.push(StackItem::BopEq);
            return true;
        }
        false
    }

    /// UOP := "NOT" | "!" | "~"
    fn reduce_uop(&mut self) -> bool {
        if matches!(self.peek_at(0), Some(StackItem::Input(t))
            if t.is_keyword("not") || t.is_operator("!") || t.is_operator("~"))
        {
            let op = self.pop_input();
            self.stack.push(StackItem::Uop(op));
            return true;
        }
        false
    }

    /// TERM := STRING | GROUP | UOP TERM | STRING BOP STRING
    ///       | STRING BOPEQ TERM
    fn reduce_term(&mut self, lookahead: Option<&Token>) -> bool {
        // STRING BOP STRING
        if matches!(self.peek_at(2), Some(StackItem::Input(code)) if code.is_string())
            && matches!(self.peek_at(1), Some(StackItem::Bop(_)))
            && matches!(self.peek_at(0), Some(StackItem::Input(value)) if value.is_string())
        {
            let value = self.pop_input();
            let Some(StackItem::Bop(op)) = self.stack.pop() else {
                unreachable!("checked above");
            };
            let code = self.pop_input();
            self.stack.push(StackItem::Term(Term::Compare { code, op, value }));
            return true;
        }

        // STRING BOPEQ TERM
        if matches!(self.peek_at(2), Some(StackItem::Input(code)) if code.is_string())
            && matches!(self.peek_at(1), Some(StackItem::BopEq))
            && matches!(self.peek_at(0), Some(StackItem::Term(_)))
        {
            let term = self.pop_term();
            self.stack.pop(); // the BopEq
            let code = self.pop_input();
            self.stack.push(StackItem::Term(Term::CodeEquals {
                code,
                term: Box::new(term),
            }));
            return true;
        }

        // UOP TERM
        if matches!(self.peek_at(1), Some(StackItem::Uop(_)))
            && matches!(self.peek_at(0), Some(StackItem::Term(_)))
        {
            let term = self.pop_term();
            let Some(StackItem::Uop(op)) = self.stack.pop() else {
                unreachable!("checked above");
            };
            self.stack.push(StackItem::Term(Term::Negated {
                op,
                term: Box::new(term),
            }));
            return true;
        }

        // Bare STRING, unless the lookahead could make it the left operand
        // of a comparison.
        if matches!(self.peek_at(0), Some(StackItem::Input(t)) if t.is_string())
            && !lookahead_is_comparison(lookahead)
        {
            let value = self.pop_input();
            self.stack.push(StackItem::Term(Term::Value(value)));
            return true;
        }

        // GROUP
        if matches!(self.peek_at(0), Some(StackItem::Group(_))) {
            let Some(StackItem::Group(group)) = self.stack.pop() else {
                unreachable!("checked above");
            };
            self.stack.push(StackItem::Term(Term::Group(group)));
            return true;
        }

        false
    }

    /// ANDCOMB := TERM ( "AND" TERM | TERM )*
    ///
    /// The whole list must be on the stack before reducing, so this bails
    /// while the lookahead could still extend it.
    fn reduce_and_comb(&mut self, lookahead: Option<&Token>) -> bool {
        if !matches!(self.peek_at(0), Some(StackItem::Term(_))) {
            return false;
        }
        if lookahead.is_some_and(extends_and_comb) {
            return false;
        }

        // Chew the whole list at once, collecting in reverse.
        let mut terms = vec![self.pop_term()];
        loop {
            if matches!(self.peek_at(0), Some(StackItem::Term(_))) {
                terms.push(self.pop_term());
            } else if matches!(self.peek_at(0), Some(StackItem::Input(t)) if t.is_keyword("and"))
                && matches!(self.peek_at(1), Some(StackItem::Term(_)))
            {
                self.stack.pop(); // the "and"
                terms.push(self.pop_term());
            } else {
                break;
            }
        }
        terms.reverse();

        self.stack.push(StackItem::AndComb(AndComb { terms }));
        true
    }

    /// ORCOMB := ANDCOMB ( "OR" ANDCOMB )*
    fn reduce_or_comb(&mut self, lookahead: Option<&Token>) -> bool {
        if !matches!(self.peek_at(0), Some(StackItem::AndComb(_))) {
            return false;
        }
        if lookahead.is_some_and(|t| t.is_keyword("or")) {
            return false;
        }

        let mut and_combs = vec![self.pop_and_comb()];
        while matches!(self.peek_at(0), Some(StackItem::Input(t)) if t.is_keyword("or"))
            && matches!(self.peek_at(1), Some(StackItem::AndComb(_)))
        {
            self.stack.pop(); // the "or"
            and_combs.push(self.pop_and_comb());
        }
        and_combs.reverse();

        self.stack.push(StackItem::OrComb(OrComb { and_combs }));
        true
    }

    /// GROUP := "(" ORCOMB ")" | "(" ANDCOMB ")" | "(" GROUP ")" | "(" ")"
    ///
    /// The literal sequence `( )` yields a group holding an empty AndComb
    /// rather than a syntax error.
    fn reduce_group(&mut self) -> bool {
        if !matches!(self.peek_at(0), Some(StackItem::Input(t)) if t.is_operator(")")) {
            return false;
        }

        if matches!(self.peek_at(2), Some(StackItem::Input(t)) if t.is_operator("("))
            && matches!(
                self.peek_at(1),
                Some(StackItem::OrComb(_) | StackItem::AndComb(_) | StackItem::Group(_))
            )
        {
            self.stack.pop(); // ")"
            let inner = self.stack.pop();
            self.stack.pop(); // "("
            let group = match inner {
                Some(StackItem::OrComb(or_comb)) => Group::Or(or_comb),
                Some(StackItem::AndComb(and_comb)) => Group::And(and_comb),
                Some(StackItem::Group(group)) => Group::Nested(Box::new(group)),
                _ => unreachable!("checked above"),
            };
            self.stack.push(StackItem::Group(group));
            return true;
        }

        if matches!(self.peek_at(1), Some(StackItem::Input(t)) if t.is_operator("(")) {
            self.stack.pop(); // ")"
            self.stack.pop(); // "("
            self.stack.push(StackItem::Group(Group::And(AndComb {
                terms: Vec::new(),
            })));
            return true;
        }

        false
    }
}

/// Parses a token sequence into a parse tree.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<OrComb, QueryError> {
    if tokens.is_empty() {
        return Err(QueryError::syntax("empty query"));
    }
    Parser::run(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(input: &str) -> Result<OrComb, QueryError> {
        parse_tokens(tokenize(input).unwrap())
    }

    /// Unwraps an OrComb with exactly one AndComb with exactly one term.
    fn single_term(or_comb: OrComb) -> Term {
        let mut and_combs = or_comb.and_combs;
        assert_eq!(and_combs.len(), 1);
        let mut terms = and_combs.remove(0).terms;
        assert_eq!(terms.len(), 1);
        terms.remove(0)
    }

    fn value_of(term: &Term) -> &str {
        match term {
            Term::Value(token) => &token.value,
            other => panic!("expected a value term, got {other:?}"),
        }
    }

    #[test]
    fn single_string() {
        let term = single_term(parse("tove").unwrap());
        assert_eq!(value_of(&term), "tove");
    }

    #[test]
    fn adjacency_is_implicit_and() {
        let or_comb = parse("a b").unwrap();
        assert_eq!(or_comb.and_combs.len(), 1);
        let terms = &or_comb.and_combs[0].terms;
        assert_eq!(terms.len(), 2);
        assert_eq!(value_of(&terms[0]), "a");
        assert_eq!(value_of(&terms[1]), "b");
    }

    #[test]
    fn explicit_and_keyword() {
        let or_comb = parse("a AND b").unwrap();
        assert_eq!(or_comb.and_combs.len(), 1);
        assert_eq!(or_comb.and_combs[0].terms.len(), 2);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // a OR b AND c == a OR (b AND c)
        let or_comb = parse("a OR b AND c").unwrap();
        assert_eq!(or_comb.and_combs.len(), 2);
        assert_eq!(or_comb.and_combs[0].terms.len(), 1);
        assert_eq!(or_comb.and_combs[1].terms.len(), 2);
    }

    #[test]
    fn chained_or() {
        let or_comb = parse("a OR b OR c").unwrap();
        assert_eq!(or_comb.and_combs.len(), 3);
    }

    #[test]
    fn comparison_is_not_a_bare_term() {
        let term = single_term(parse("year >= 1950").unwrap());
        match term {
            Term::Compare { code, op, value } => {
                assert_eq!(code.value, "year");
                assert_eq!(op.value, ">=");
                assert_eq!(value.value, "1950");
            }
            other => panic!("expected a comparison, got {other:?}"),
        }
    }

    #[test]
    fn comparison_without_whitespace() {
        let term = single_term(parse("year<1950").unwrap());
        assert!(matches!(term, Term::Compare { .. }));
    }

    #[test]
    fn code_scopes_a_term() {
        let term = single_term(parse("title:foo").unwrap());
        match term {
            Term::CodeEquals { code, term } => {
                assert_eq!(code.value, "title");
                assert_eq!(value_of(&term), "foo");
            }
            other => panic!("expected a code term, got {other:?}"),
        }
    }

    #[test]
    fn equals_sign_scopes_like_colon() {
        let term = single_term(parse("title=foo").unwrap());
        assert!(matches!(term, Term::CodeEquals { .. }));
    }

    #[test]
    fn code_scopes_a_group() {
        let term = single_term(parse("title:(a OR b)").unwrap());
        match term {
            Term::CodeEquals { code, term } => {
                assert_eq!(code.value, "title");
                assert!(matches!(*term, Term::Group(Group::Or(_))));
            }
            other => panic!("expected a code term, got {other:?}"),
        }
    }

    #[test]
    fn not_keyword_negates() {
        let term = single_term(parse("NOT a").unwrap());
        match term {
            Term::Negated { op, term } => {
                assert_eq!(op.value, "not");
                assert_eq!(value_of(&term), "a");
            }
            other => panic!("expected a negated term, got {other:?}"),
        }
    }

    #[test]
    fn bang_negates() {
        let term = single_term(parse("!a").unwrap());
        assert!(matches!(term, Term::Negated { .. }));
    }

    #[test]
    fn tilde_parses_as_unary() {
        // Recognized by the grammar; rejected later by the AST builder.
        let term = single_term(parse("~a").unwrap());
        match term {
            Term::Negated { op, .. } => assert_eq!(op.value, "~"),
            other => panic!("expected a unary term, got {other:?}"),
        }
    }

    #[test]
    fn not_binds_tighter_than_and() {
        // NOT a b == (NOT a) AND b
        let or_comb = parse("NOT a b").unwrap();
        let terms = &or_comb.and_combs[0].terms;
        assert_eq!(terms.len(), 2);
        assert!(matches!(terms[0], Term::Negated { .. }));
    }

    #[test]
    fn group_captures_inner_or() {
        let or_comb = parse("(a OR b) c").unwrap();
        let terms = &or_comb.and_combs[0].terms;
        assert_eq!(terms.len(), 2);
        assert!(matches!(terms[0], Term::Group(Group::Or(_))));
    }

    #[test]
    fn empty_group_is_an_empty_and_comb() {
        let term = single_term(parse("()").unwrap());
        match term {
            Term::Group(Group::And(and_comb)) => assert!(and_comb.terms.is_empty()),
            other => panic!("expected an empty group, got {other:?}"),
        }
    }

    #[test]
    fn quoted_string_is_a_term() {
        let term = single_term(parse("\"a b\"").unwrap());
        assert_eq!(value_of(&term), "a b");
    }

    #[test]
    fn quoted_string_can_be_compared() {
        let term = single_term(parse("title:\"det osynliga barnet\"").unwrap());
        assert!(matches!(term, Term::CodeEquals { .. }));
    }

    #[test]
    fn empty_token_sequence_is_an_error() {
        assert!(matches!(
            parse("").unwrap_err(),
            QueryError::Syntax { .. }
        ));
    }

    #[test]
    fn trailing_and_is_an_error() {
        assert!(parse("a AND").is_err());
    }

    #[test]
    fn leading_or_is_an_error() {
        assert!(parse("OR a").is_err());
    }

    #[test]
    fn unbalanced_parens_are_an_error() {
        assert!(parse("(a b").is_err());
        assert!(parse("a b)").is_err());
    }

    #[test]
    fn dangling_comparison_is_an_error() {
        assert!(parse("year >=").is_err());
    }
}
