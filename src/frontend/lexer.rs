use std::{collections::BTreeMap, str::Chars};

use itertools::{peek_nth, PeekNth};
use once_cell::sync::Lazy;
use strum::EnumString;

use crate::frontend::{
    error::{Result, SyntaxError},
    SourceFile,
};

#[derive(Debug)]
pub struct Lexer<'source> {
    source: &'source SourceFile,
    position: usize,
    line_number: usize,
    chars: PeekNth<Chars<'source>>,
    peek_buffer: Option<Token>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// 1-based source line the token starts on
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /* Words */
    Keyword(Keyword), // for
    Identifier,       // main

    /* Literals */
    IntegerLiteral, // 1
    FloatLiteral,   // 1.0

    /* Delimiters */
    OpenParen,    // (
    CloseParen,   // )
    OpenBracket,  // [
    CloseBracket, // ]
    OpenBrace,    // {
    CloseBrace,   // }
    Semicolon,    // ;
    Comma,        // ,

    /* Operators */
    Equals,   // =
    Plus,     // +
    Minus,    // -
    Asterisk, // *
    Divide,   // /
    Bang,     // !

    /* Comparison */
    DoubleEquals,         // ==
    NotEquals,            // !=
    LessThan,             // <
    LessThanOrEqualTo,    // <=
    GreaterThan,          // >
    GreaterThanOrEqualTo, // >=

    /* End of input */
    Eof,
}

impl TokenKind {
    pub fn is_term_operator(&self) -> bool {
        matches!(self, Self::Plus | Self::Minus)
    }

    pub fn is_factor_operator(&self) -> bool {
        matches!(self, Self::Asterisk | Self::Divide)
    }

    pub fn is_comparison_operator(&self) -> bool {
        matches!(
            self,
            Self::DoubleEquals
                | Self::NotEquals
                | Self::LessThan
                | Self::LessThanOrEqualTo
                | Self::GreaterThan
                | Self::GreaterThanOrEqualTo
        )
    }

    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            Self::Keyword(Keyword::Int)
                | Self::Keyword(Keyword::Float)
                | Self::Keyword(Keyword::Void)
                | Self::Keyword(Keyword::Array)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Keyword {
    Int,
    Float,
    Void,
    If,
    Else,
    For,
    Return,
    Array,
}

/// Table of single char tokens (matched after longer sequences are checked for)
static SINGLE_TOKENS: Lazy<BTreeMap<char, TokenKind>> = Lazy::new(|| {
    BTreeMap::from([
        ('(', TokenKind::OpenParen),
        (')', TokenKind::CloseParen),
        ('[', TokenKind::OpenBracket),
        (']', TokenKind::CloseBracket),
        ('{', TokenKind::OpenBrace),
        ('}', TokenKind::CloseBrace),
        (';', TokenKind::Semicolon),
        (',', TokenKind::Comma),
        ('=', TokenKind::Equals),
        ('+', TokenKind::Plus),
        ('-', TokenKind::Minus),
        ('*', TokenKind::Asterisk),
        ('/', TokenKind::Divide),
        ('!', TokenKind::Bang),
        ('<', TokenKind::LessThan),
        ('>', TokenKind::GreaterThan),
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source SourceFile) -> Self {
        Self {
            source,
            chars: peek_nth(source.contents().chars()),
            position: 0,
            line_number: 0,
            peek_buffer: None,
        }
    }

    pub fn source(&self) -> &SourceFile {
        self.source
    }

    /// 1-based line of the current scan position.
    pub fn line(&self) -> usize {
        self.line_number + 1
    }

    fn ignore_whitespace(&mut self) {
        while let Some(c) = self.chars.peek().copied() {
            if !c.is_ascii_whitespace() {
                break;
            }

            if c == '\n' {
                self.line_number += 1;
            }

            self.chars.next();
            self.position += 1;
        }
    }

    fn ignore_line(&mut self) {
        while let Some(c) = self.chars.peek().copied() {
            if c == '\n' {
                break;
            }

            self.chars.next();
            self.position += 1;
        }
    }

    // Keyword or identifier
    fn read_word(&mut self) -> Token {
        let start_position = self.position;

        while let Some(c) = self.chars.peek().copied() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }

            self.chars.next();
            self.position += 1;
        }

        let span = self.new_span(start_position);
        let value = self.source.value_of_span(span);

        let kind = if let Ok(keyword) = value.parse() {
            TokenKind::Keyword(keyword)
        } else {
            TokenKind::Identifier
        };

        self.new_token(kind, span)
    }

    fn read_number(&mut self) -> Token {
        let start_position = self.position;
        let mut kind = TokenKind::IntegerLiteral;

        while let Some(c) = self.chars.peek().copied() {
            if c == '.' {
                kind = TokenKind::FloatLiteral;
                self.read_decimal_part();
                break;
            }

            if !c.is_ascii_digit() {
                break;
            }

            self.chars.next();
            self.position += 1;
        }

        let span = self.new_span(start_position);
        self.new_token(kind, span)
    }

    fn read_decimal_part(&mut self) {
        // Consume the dot
        self.chars.next();
        self.position += 1;

        while let Some(c) = self.chars.peek().copied() {
            if !c.is_ascii_digit() {
                break;
            }

            self.chars.next();
            self.position += 1;
        }
    }

    fn read_single(&mut self, kind: TokenKind) -> Token {
        let start_position = self.position;

        self.chars.next();
        self.position += 1;

        let span = self.new_span(start_position);
        self.new_token(kind, span)
    }

    fn read_double(&mut self, kind: TokenKind) -> Token {
        let start_position = self.position;

        self.chars.next();
        self.chars.next();
        self.position += 2;

        let span = self.new_span(start_position);
        self.new_token(kind, span)
    }

    fn new_span(&self, start: usize) -> Span {
        Span {
            start,
            end: self.position,
        }
    }

    fn new_token(&self, kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            span,
            line: self.line_number + 1,
        }
    }

    pub fn peek(&mut self) -> Result<Token> {
        if let Some(token) = self.peek_buffer {
            return Ok(token);
        }

        let token = self.next()?;
        self.peek_buffer = Some(token);
        Ok(token)
    }

    pub fn next(&mut self) -> Result<Token> {
        if let Some(token) = self.peek_buffer.take() {
            return Ok(token);
        }

        while let Some(c) = self.chars.peek().copied() {
            if !c.is_ascii() {
                return Err(SyntaxError::NonAsciiCharacter { line: self.line() });
            }

            let token = match c {
                // Ignore whitespace
                c if c.is_whitespace() => {
                    self.ignore_whitespace();
                    continue;
                }
                // Ignore comments
                '/' if self.chars.peek_nth(1).is_some_and(|c| *c == '/') => {
                    self.ignore_line();
                    continue;
                }

                // Integer and float literals
                n if n.is_ascii_digit() => self.read_number(),

                // Identifiers and keywords
                a if a.is_ascii_alphabetic() || a == '_' => self.read_word(),

                // Double Equals (==)
                '=' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                    self.read_double(TokenKind::DoubleEquals)
                }
                // Not Equals (!=)
                '!' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                    self.read_double(TokenKind::NotEquals)
                }
                // Less than or equal (<=)
                '<' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                    self.read_double(TokenKind::LessThanOrEqualTo)
                }
                // Greater than or equal (>=)
                '>' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                    self.read_double(TokenKind::GreaterThanOrEqualTo)
                }

                s if SINGLE_TOKENS.contains_key(&s) => {
                    self.read_single(*SINGLE_TOKENS.get(&s).unwrap())
                }
                c => {
                    return Err(SyntaxError::UnexpectedCharacter {
                        character: c,
                        line: self.line(),
                    })
                }
            };

            return Ok(token);
        }

        Ok(self.new_token(TokenKind::Eof, self.new_span(self.position)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        let source = SourceFile::in_memory(source);
        let mut lexer = Lexer::new(&source);
        let mut kinds = Vec::new();

        loop {
            let token = lexer.next().expect("lexing should succeed");
            if token.kind == TokenKind::Eof {
                break;
            }
            kinds.push(token.kind);
        }

        kinds
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            token_kinds("int main float forty"),
            vec![
                TokenKind::Keyword(Keyword::Int),
                TokenKind::Identifier,
                TokenKind::Keyword(Keyword::Float),
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            token_kinds("1 23 4.5 0.125"),
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
            ]
        );
    }

    #[test]
    fn comparison_operators_use_longest_match() {
        assert_eq!(
            token_kinds("< <= > >= == != ="),
            vec![
                TokenKind::LessThan,
                TokenKind::LessThanOrEqualTo,
                TokenKind::GreaterThan,
                TokenKind::GreaterThanOrEqualTo,
                TokenKind::DoubleEquals,
                TokenKind::NotEquals,
                TokenKind::Equals,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            token_kinds("int x // trailing comment\n= 1"),
            vec![
                TokenKind::Keyword(Keyword::Int),
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::IntegerLiteral,
            ]
        );
    }

    #[test]
    fn tokens_carry_line_numbers() {
        let source = SourceFile::in_memory("int x\nfloat y\n\nvoid z");
        let mut lexer = Lexer::new(&source);

        let lines = std::iter::from_fn(|| {
            let token = lexer.next().unwrap();
            (token.kind != TokenKind::Eof).then_some(token.line)
        })
        .collect::<Vec<_>>();

        assert_eq!(lines, vec![1, 1, 2, 2, 4, 4]);
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let source = SourceFile::in_memory("int #");
        let mut lexer = Lexer::new(&source);

        lexer.next().unwrap();
        assert_eq!(
            lexer.next(),
            Err(SyntaxError::UnexpectedCharacter {
                character: '#',
                line: 1
            })
        );
    }

    #[test]
    fn eof_is_sticky() {
        let source = SourceFile::in_memory("");
        let mut lexer = Lexer::new(&source);

        assert_eq!(lexer.next().unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next().unwrap().kind, TokenKind::Eof);
    }
}
