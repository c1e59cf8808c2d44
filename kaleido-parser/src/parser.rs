use crate::ast::TopLevel;
use crate::lexer::Token;
use crate::precedence::PrecedenceTable;
use crate::ParseError;
use kaleido_source::{Located, Source};
use logos::{Lexer, Logos};
use std::ops::Range;
use tracing::debug;

mod expr;
mod stmt;

pub type ParseResult<T> = Result<T, ParseError>;

/// Pull-based token source with one token of lookahead. Not rewindable.
///
/// The token source outlives any single [`Parser`]: it keeps its position
/// from one top-level statement to the next.
pub struct TokenSource<'a> {
    lexer: Lexer<'a, Token>,
    /// Cached token for peeking.
    current_token: Token,
    current_span: Range<usize>,
    /// End offset of the last consumed token.
    previous_end: usize,
}

impl<'a> TokenSource<'a> {
    pub fn new(source: &'a Source<'a>) -> Self {
        Self::lex(source.content)
    }

    /// Create a token source directly over `content`.
    pub fn lex(content: &'a str) -> Self {
        let mut tokens = Self {
            lexer: Token::lexer(content),
            current_token: Token::Eof,
            current_span: 0..0,
            previous_end: 0,
        };
        tokens.advance();
        tokens.previous_end = 0;
        tokens
    }

    pub fn current(&self) -> &Token {
        &self.current_token
    }

    /// Byte range of the current token.
    pub fn span(&self) -> Range<usize> {
        self.current_span.clone()
    }

    pub fn is_at_end(&self) -> bool {
        self.current_token == Token::Eof
    }

    /// Consumes the current token and returns it.
    fn advance(&mut self) -> Token {
        self.previous_end = self.current_span.end;
        let (token, span) = match self.lexer.next() {
            Some(token) => (token, self.lexer.span()),
            None => {
                let end = self.lexer.source().len();
                (Token::Eof, end..end)
            }
        };
        self.current_span = span;
        std::mem::replace(&mut self.current_token, token)
    }
}

/// Recursive descent parser with precedence climbing for binary expressions.
///
/// A `Parser` borrows the precedence table for the duration of one or more
/// statements; the table is only read here; mutation happens between statements.
pub struct Parser<'s, 'a> {
    tokens: &'s mut TokenSource<'a>,
    precedence: &'s PrecedenceTable,
}

impl<'s, 'a> Parser<'s, 'a> {
    pub fn new(tokens: &'s mut TokenSource<'a>, precedence: &'s PrecedenceTable) -> Self {
        Self { tokens, precedence }
    }

    /// Parses the next top-level statement and its terminating `;`.
    ///
    /// Returns `None` at end of input. On a grammar violation the error is
    /// returned with the span of the offending token and the token source is
    /// advanced past it to the next statement boundary.
    pub fn parse_top_level(&mut self) -> Option<Result<Located<TopLevel>, Located<ParseError>>> {
        // empty statements
        while self.eat(Token::Char(';')) {}
        if self.tokens.is_at_end() {
            return None;
        }

        let start = self.tokens.span().start;
        let result = match self.tokens.current() {
            Token::Def => self.parse_definition(),
            Token::Extern => self.parse_extern(),
            _ => self.parse_top_level_expr(),
        }
        .and_then(|item| {
            let end = self.tokens.previous_end;
            self.expect_terminator()?;
            Ok((item, end))
        });

        Some(match result {
            Ok((item, end)) => {
                let span = start..end.max(start);
                debug!(statement = %item, ?span, "parsed top-level statement");
                Ok(Located::at(item, span))
            }
            Err(error) => {
                let span = self.tokens.span();
                debug!(%error, ?span, "syntax error, skipping to next statement");
                self.synchronize();
                Err(Located::at(error, span))
            }
        })
    }

    fn expect_terminator(&mut self) -> ParseResult<()> {
        if !self.tokens.current().is_statement_boundary() {
            return self.unexpected("`;` after top-level statement");
        }
        self.eat(Token::Char(';'));
        Ok(())
    }

    /// Skips tokens up to and including the next `;`, or up to the next
    /// `def`/`extern` keyword or the end of input.
    fn synchronize(&mut self) {
        loop {
            match self.tokens.current() {
                Token::Eof | Token::Def | Token::Extern => break,
                Token::Char(';') => {
                    self.next();
                    break;
                }
                _ => {
                    self.next();
                }
            }
        }
    }
}

/// Parse utilities
impl<'s, 'a> Parser<'s, 'a> {
    fn next(&mut self) -> Token {
        self.tokens.advance()
    }

    /// Predicate that tests whether the current token equals `tok` and eats it if yes as a side effect.
    fn eat(&mut self, tok: Token) -> bool {
        if *self.tokens.current() == tok {
            self.next(); // eat token
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Token, expected: &'static str) -> ParseResult<()> {
        if self.eat(tok) {
            Ok(())
        } else {
            self.unexpected(expected)
        }
    }

    fn identifier(&mut self, expected: &'static str) -> ParseResult<String> {
        match self.tokens.current() {
            Token::Identifier(ident) => {
                let ident = ident.clone();
                self.next();
                Ok(ident)
            }
            _ => self.unexpected(expected),
        }
    }

    /// Raises an unexpected token error.
    fn unexpected<T>(&self, expected: &'static str) -> ParseResult<T> {
        Err(ParseError::Syntax {
            expected,
            found: self.tokens.current().clone(),
        })
    }
}
