use super::*;
use crate::ast::{Function, Prototype, ANON_EXPR_NAME, DEFAULT_BINARY_PRECEDENCE};
use crate::precedence::{is_builtin_operator, PRECEDENCE_RANGE};

impl<'s, 'a> Parser<'s, 'a> {
    /// Parses `def prototype expression`.
    pub(super) fn parse_definition(&mut self) -> ParseResult<TopLevel> {
        self.expect(Token::Def, "`def`")?;
        let proto = self.parse_prototype()?;
        let body = self.parse_expr()?;
        Ok(TopLevel::Definition(Function { proto, body }))
    }

    /// Parses `extern prototype`.
    pub(super) fn parse_extern(&mut self) -> ParseResult<TopLevel> {
        self.expect(Token::Extern, "`extern`")?;
        Ok(TopLevel::Extern(self.parse_prototype()?))
    }

    /// Wraps a bare expression into an anonymous nullary function.
    pub(super) fn parse_top_level_expr(&mut self) -> ParseResult<TopLevel> {
        let body = self.parse_expr()?;
        Ok(TopLevel::Expression(Function {
            proto: Prototype::function(ANON_EXPR_NAME, Vec::new()),
            body,
        }))
    }

    pub fn parse_prototype(&mut self) -> ParseResult<Prototype> {
        match self.tokens.current() {
            Token::Identifier(_) => {
                let name = self.identifier("function name in prototype")?;
                let params = self.parse_params()?;
                Ok(Prototype::function(name, params))
            }
            Token::Unary => {
                self.next();
                let op = match self.tokens.current().operator_symbol() {
                    Some(op) => op,
                    None => return self.unexpected("a unary operator"),
                };
                self.next();

                match self.parse_params()?.as_slice() {
                    [operand] => Ok(Prototype::unary(op, operand.clone())),
                    params => Err(ParseError::OperatorArity {
                        expected: 1,
                        found: params.len(),
                    }),
                }
            }
            Token::Binary => {
                self.next();
                let op = match self.tokens.current().operator_symbol() {
                    Some(op) if !is_builtin_operator(op) => op,
                    _ => return self.unexpected("a user-definable binary operator"),
                };
                self.next();

                let precedence = match *self.tokens.current() {
                    Token::Number(val) => {
                        if val < *PRECEDENCE_RANGE.start() as f64
                            || val > *PRECEDENCE_RANGE.end() as f64
                        {
                            return Err(ParseError::PrecedenceRange(val));
                        }
                        self.next();
                        val as u32
                    }
                    _ => DEFAULT_BINARY_PRECEDENCE,
                };

                match self.parse_params()?.as_slice() {
                    [lhs, rhs] => Ok(Prototype::binary(op, precedence, lhs.clone(), rhs.clone())),
                    params => Err(ParseError::OperatorArity {
                        expected: 2,
                        found: params.len(),
                    }),
                }
            }
            _ => self.unexpected("function name in prototype"),
        }
    }

    /// Parses `( ident* )`.
    fn parse_params(&mut self) -> ParseResult<Vec<String>> {
        self.expect(Token::Char('('), "`(` in prototype")?;

        let mut params = Vec::new();
        while let Token::Identifier(ident) = self.tokens.current() {
            params.push(ident.clone());
            self.next();
        }

        self.expect(Token::Char(')'), "`)` in prototype")?;
        Ok(params)
    }
}
