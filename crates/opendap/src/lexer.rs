//! Tokenizer shared by the DDS and DAS parsers.

use crate::error::{OpendapError, OpendapResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Identifier, keyword or number.
    Word(String),
    /// Double-quoted string with escapes resolved.
    Quoted(String),
    /// One of `{ } [ ] ; = : ,`.
    Symbol(char),
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '+' | '%' | '/' | '#' | '*' | '!' | '~' | '\'' | '\\' | '@' | '^' | '$' | '&' | '?' | '|' | '<' | '>' | '(' | ')')
}

pub(crate) fn tokenize(text: &str) -> OpendapResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if matches!(c, '{' | '}' | '[' | ']' | ';' | '=' | ':' | ',') {
            tokens.push(Token::Symbol(c));
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some('\\') => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    Some('"') => break,
                    Some(other) => value.push(other),
                    None => return Err(OpendapError::Parse("unterminated string".to_string())),
                }
            }
            tokens.push(Token::Quoted(value));
        } else if is_word_char(c) {
            let mut word = String::new();
            while let Some(&w) = chars.peek() {
                if !is_word_char(w) {
                    break;
                }
                word.push(w);
                chars.next();
            }
            tokens.push(Token::Word(word));
        } else {
            return Err(OpendapError::Parse(format!("unexpected character '{}'", c)));
        }
    }

    Ok(tokens)
}

/// Cursor over a token stream with expectation helpers.
pub(crate) struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn is_symbol(&self, symbol: char) -> bool {
        matches!(self.peek(), Some(Token::Symbol(c)) if *c == symbol)
    }

    pub(crate) fn expect_symbol(&mut self, symbol: char) -> OpendapResult<()> {
        match self.next() {
            Some(Token::Symbol(c)) if c == symbol => Ok(()),
            other => Err(OpendapError::Parse(format!("expected '{}', found {:?}", symbol, other))),
        }
    }

    pub(crate) fn expect_word(&mut self) -> OpendapResult<String> {
        match self.next() {
            Some(Token::Word(w)) => Ok(w),
            other => Err(OpendapError::Parse(format!("expected identifier, found {:?}", other))),
        }
    }

    /// Consume a word if it matches `keyword` case-insensitively.
    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }
}
