mod token;

pub use token::*;

use std::{error::Error, fmt::Display, iter::Peekable, str::Chars};

/// An illegal character encountered while scanning an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexError {
    pub character: char,
    pub column: usize,
}

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "illegal character '{}' at column {}",
            self.character, self.column
        ))
    }
}

impl Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

/// Tokenizer for a single boolean update expression.
///
/// Scanning never stops early: an illegal character is skipped and the rest
/// of the input is still consumed, but the first illegal character is
/// reported once the scan is done.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    iterator: Peekable<Chars<'a>>,
    tokens: Vec<Token>,
    col: usize,
    error: Option<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            iterator: input.chars().peekable(),
            tokens: vec![],
            col: 1,
            error: None,
        }
    }

    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        while let Some(next) = self.peek() {
            match next {
                ' ' | '\t' => {
                    self.advance();
                }
                'a'..='z' | 'A'..='Z' | '0'..='9' => self.lex_variable(),
                _ => self.lex_operator(),
            }
        }

        match self.error {
            Some(error) => Err(error),
            None => Ok(self.tokens),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.iterator.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        self.col += 1;
        self.iterator.next()
    }

    fn lex_variable(&mut self) {
        let mut name = String::new();

        while let Some(next) = self.iterator.next_if(|item| item.is_ascii_alphanumeric()) {
            self.col += 1;
            name.push(next);
        }

        self.tokens.push(Token::Variable(name));
    }

    fn lex_operator(&mut self) {
        let column = self.col;
        let Some(next) = self.advance() else {
            return;
        };

        let token = match next {
            '&' => Token::And,
            '|' => Token::Or,
            '!' => Token::Not,
            '^' => Token::Xor,
            '(' => Token::LParen,
            ')' => Token::RParen,
            character => {
                if self.error.is_none() {
                    self.error = Some(LexError { character, column });
                }
                return;
            }
        };

        self.tokens.push(token);
    }
}

/// Tokenize a single expression.
pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    Lexer::new(input).lex()
}
