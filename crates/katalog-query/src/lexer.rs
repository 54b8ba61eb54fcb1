//! Query lexer (tokenizer).
//!
//! Converts a raw query string into an ordered sequence of tokens, each
//! carrying the byte offset it started at. The token stream is consumed by
//! the shift-reduce parser.

use crate::error::QueryError;

/// Characters that terminate an unquoted string and, at the start of a
/// token, lex as single-character operators.
pub(crate) const RESERVED_CHARS: [char; 8] = ['!', '<', '>', '=', '~', '(', ')', ':'];

/// The classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A reserved character or two-character comparison (`>=`, `<=`).
    Operator,
    /// One of the reserved words `AND`, `OR`, `NOT` (value is lower-cased).
    Keyword,
    /// An unquoted run of ordinary characters.
    Str,
    /// A double-quoted string (quotes stripped, escapes resolved).
    QuotedStr,
}

/// A token in the query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The token text. Quotes and escape backslashes are already removed.
    pub value: String,
    /// Byte offset into the original query string where the token started.
    pub offset: usize,
}

impl Token {
    /// Creates a token.
    fn new(kind: TokenKind, value: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            offset,
        }
    }

    /// True if this token is an Operator with exactly the given text.
    pub fn is_operator(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Operator && self.value == symbol
    }

    /// True if this token is a Keyword with exactly the given (lower-cased)
    /// text.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.value == word
    }

    /// True if this token is an unquoted or quoted string.
    pub fn is_string(&self) -> bool {
        matches!(self.kind, TokenKind::Str | TokenKind::QuotedStr)
    }
}

/// Tokenizes a query string.
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Current byte position in input.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Returns the character at the current position without consuming it.
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Consumes and returns the character at the current position.
    fn bump(&mut self) -> Option<char> {
        let ch = self.peek();
        if let Some(ch) = ch {
            self.position += ch.len_utf8();
        }
        ch
    }

    /// Skips whitespace between tokens (never inside quotes).
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Tokenizes the entire input.
    fn tokenize(mut self) -> Result<Vec<Token>, QueryError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Returns the next token, or None at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, QueryError> {
        self.skip_whitespace();

        let Some(ch) = self.peek() else {
            return Ok(None);
        };
        let start = self.position;

        // Two-character operators are matched greedily before the
        // single-character forms.
        for op in [">=", "<="] {
            if self.input[self.position..].starts_with(op) {
                self.position += op.len();
                return Ok(Some(Token::new(TokenKind::Operator, op, start)));
            }
        }

        if ch == '"' {
            return self.read_quoted(start).map(Some);
        }

        self.read_string(start).map(Some)
    }

    /// Reads a double-quoted string. The backslash escapes the immediately
    /// following character, whatever it is.
    fn read_quoted(&mut self, start: usize) -> Result<Token, QueryError> {
        self.bump(); // consume opening quote

        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(QueryError::lex("unclosed double quote", start));
                }
                Some('"') => {
                    return Ok(Token::new(TokenKind::QuotedStr, value, start));
                }
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => {
                        return Err(QueryError::lex("escaped end of input", start));
                    }
                },
                Some(ch) => value.push(ch),
            }
        }
    }

    /// Reads an unquoted string, a single-character operator, or a keyword.
    ///
    /// A reserved character at the very start of a token is itself the
    /// token; a reserved character reached later terminates the string
    /// without being consumed.
    fn read_string(&mut self, start: usize) -> Result<Token, QueryError> {
        let mut value = String::new();

        loop {
            let Some(ch) = self.peek() else {
                break;
            };

            if ch == '"' {
                return Err(QueryError::lex("double quote illegal here", self.position));
            }

            if RESERVED_CHARS.contains(&ch) {
                if value.is_empty() {
                    self.bump();
                    return Ok(Token::new(TokenKind::Operator, ch, start));
                }
                break;
            }

            if ch == '\\' {
                self.bump();
                match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => {
                        return Err(QueryError::lex("escaped end of input", start));
                    }
                }
                continue;
            }

            self.bump();
            if ch.is_whitespace() {
                break;
            }
            value.push(ch);
        }

        // Only these exact (unquoted) spellings are keywords; `and`, `And`
        // etc. remain ordinary strings.
        let token = match value.as_str() {
            "AND" | "OR" | "NOT" => Token::new(TokenKind::Keyword, value.to_lowercase(), start),
            _ => Token::new(TokenKind::Str, value, start),
        };
        Ok(token)
    }
}

/// Tokenizes a query string into an ordered token sequence.
pub fn tokenize(input: &str) -> Result<Vec<Token>, QueryError> {
    Lexer::new(input).tokenize()
}
