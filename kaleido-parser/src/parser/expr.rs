use super::*;
use crate::ast::Expr;

impl<'s, 'a> Parser<'s, 'a> {
    /* Expressions */
    /// Parses any expression.
    /// This is equivalent to folding a unary expression with [`Self::parse_bin_op_rhs`] at precedence `0`.
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        let lhs = self.parse_unary_expr()?;
        self.parse_bin_op_rhs(0, lhs) // 0 to accept any operator
    }

    /// Returns the current token as a binary operator with its precedence,
    /// or `None` if it is not a registered operator.
    fn current_bin_op(&self) -> Option<(char, u32)> {
        match *self.tokens.current() {
            Token::Char(op) => self.precedence.lookup(op).map(|prec| (op, prec)),
            _ => None,
        }
    }

    /// Folds `{ binop unary }*` into `lhs` while operators bind at least as
    /// tightly as `min_prec`.
    fn parse_bin_op_rhs(&mut self, min_prec: u32, mut lhs: Expr) -> ParseResult<Expr> {
        loop {
            let (op, prec) = match self.current_bin_op() {
                Some((op, prec)) if prec >= min_prec => (op, prec),
                _ => return Ok(lhs), // not a valid binop or binds too loosely
            };
            self.next();

            let mut rhs = self.parse_unary_expr()?;

            // If the next operator binds tighter, it takes `rhs` as its lhs.
            if let Some((_, next_prec)) = self.current_bin_op() {
                if prec < next_prec {
                    rhs = self.parse_bin_op_rhs(prec + 1, rhs)?;
                }
            }

            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    /// Parses a prefix operator application or a primary expression.
    fn parse_unary_expr(&mut self) -> ParseResult<Expr> {
        match self.tokens.current().operator_symbol() {
            Some(op) => {
                self.next();
                let operand = self.parse_unary_expr()?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.parse_primary_expr(),
        }
    }

    /// Parses a primary (atom) expression.
    fn parse_primary_expr(&mut self) -> ParseResult<Expr> {
        match self.tokens.current() {
            Token::Identifier(_) => self.parse_identifier_or_call_expr(),
            Token::Number(_) => self.parse_number_expr(),
            Token::Char('(') => self.parse_paren_expr(),
            Token::If => self.parse_if_expr(),
            Token::For => self.parse_for_expr(),
            Token::Var => self.parse_var_expr(),
            _ => self.unexpected("an expression"),
        }
    }

    /* Expressions.Literals */
    fn parse_number_expr(&mut self) -> ParseResult<Expr> {
        match *self.tokens.current() {
            Token::Number(val) => {
                self.next();
                Ok(Expr::NumberLit(val))
            }
            _ => self.unexpected("a number"),
        }
    }

    fn parse_paren_expr(&mut self) -> ParseResult<Expr> {
        self.expect(Token::Char('('), "`(`")?;
        let expr = self.parse_expr()?;
        self.expect(Token::Char(')'), "`)`")?;
        Ok(expr)
    }

    /* Expressions.Identifier */
    /// Parses a variable reference or a call expression.
    fn parse_identifier_or_call_expr(&mut self) -> ParseResult<Expr> {
        let ident = self.identifier("an identifier")?;

        if !self.eat(Token::Char('(')) {
            return Ok(Expr::Variable(ident));
        }

        // parse call expression
        let mut args = Vec::new();
        if !self.eat(Token::Char(')')) {
            loop {
                args.push(self.parse_expr()?);

                if self.eat(Token::Char(')')) {
                    break;
                }
                self.expect(Token::Char(','), "`)` or `,` in argument list")?;
            }
        }

        Ok(Expr::Call {
            callee: ident,
            args,
        })
    }

    /* Expressions.Control */
    fn parse_if_expr(&mut self) -> ParseResult<Expr> {
        self.expect(Token::If, "`if`")?;
        let cond = self.parse_expr()?;

        self.expect(Token::Then, "`then`")?;
        let then = self.parse_expr()?;

        self.expect(Token::Else, "`else`")?;
        let else_ = self.parse_expr()?;

        Ok(Expr::If {
            cond: Box::new(cond),
            then: Box::new(then),
            else_: Box::new(else_),
        })
    }

    fn parse_for_expr(&mut self) -> ParseResult<Expr> {
        self.expect(Token::For, "`for`")?;
        let var = self.identifier("identifier after `for`")?;

        self.expect(Token::Char('='), "`=` after `for`")?;
        let start = self.parse_expr()?;

        self.expect(Token::Char(','), "`,` after for start value")?;
        let end = self.parse_expr()?;

        let step = if self.eat(Token::Char(',')) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        self.expect(Token::In, "`in` after `for`")?;
        let body = self.parse_expr()?;

        Ok(Expr::For {
            var,
            start: Box::new(start),
            end: Box::new(end),
            step,
            body: Box::new(body),
        })
    }

    fn parse_var_expr(&mut self) -> ParseResult<Expr> {
        self.expect(Token::Var, "`var`")?;

        let mut bindings = Vec::new();
        loop {
            let name = self.identifier("identifier after `var`")?;
            let init = if self.eat(Token::Char('=')) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            bindings.push((name, init));

            if !self.eat(Token::Char(',')) {
                break;
            }
        }

        self.expect(Token::In, "`in` after `var`")?;
        let body = self.parse_expr()?;

        Ok(Expr::Var {
            bindings,
            body: Box::new(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn expr_with(source: &str, table: &PrecedenceTable) -> Result<String, ParseError> {
        let mut tokens = TokenSource::lex(source);
        let mut parser = Parser::new(&mut tokens, table);
        let ast = parser.parse_expr()?;
        assert!(tokens.is_at_end(), "trailing input in {:?}", source);
        Ok(ast.to_string())
    }

    fn expr(source: &str) -> String {
        expr_with(source, &PrecedenceTable::new()).unwrap()
    }

    #[test]
    fn test_literal() {
        assert_snapshot!(expr("1"), @"1");
        assert_snapshot!(expr("2.5"), @"2.5");
        assert_snapshot!(expr("(((3)))"), @"3");
    }

    #[test]
    fn test_binary_expr() {
        assert_snapshot!(expr("1 + 2 * 3"), @"(+ 1 (* 2 3))");
        assert_snapshot!(expr("1 * 2 + 3"), @"(+ (* 1 2) 3)");
        assert_snapshot!(expr("(1 + 2) * 3"), @"(* (+ 1 2) 3)");
        assert_snapshot!(expr("a - b - c"), @"(- (- a b) c)"); // left associative
        assert_snapshot!(expr("a < b + c * d - e"), @"(< a (- (+ b (* c d)) e))");
        assert_snapshot!(expr("x = y + 1"), @"(= x (+ y 1))");
    }

    #[test]
    fn test_unary_expr() {
        assert_snapshot!(expr("-x"), @"(- x)");
        assert_snapshot!(expr("!-x"), @"(! (- x))");
        assert_snapshot!(expr("-1 * 2"), @"(* (- 1) 2)");
        assert_snapshot!(expr("a - -b"), @"(- a (- b))");
    }

    #[test]
    fn test_identifier() {
        assert_snapshot!(expr("foo"), @"foo");
    }

    #[test]
    fn test_fn_call() {
        assert_snapshot!(expr("foo()"), @"(call foo)");
        assert_snapshot!(expr("foo(1, bar)"), @"(call foo 1 bar)");
        assert_snapshot!(expr("foo(1, bar(x), y + 1)"), @"(call foo 1 (call bar x) (+ y 1))");
    }

    #[test]
    fn test_control_flow() {
        assert_snapshot!(expr("if x < 3 then 1 else f(x)"), @"(if (< x 3) 1 (call f x))");
        assert_snapshot!(expr("for i = 1, i < n in putchard(42)"), @"(for i 1 (< i n) (call putchard 42))");
        assert_snapshot!(expr("for i = 1, i < 10, 2 in 0"), @"(for i 1 (< i 10) 2 0)");
        assert_snapshot!(expr("var a = 1, b, c = a in a + c"), @"(var ((a 1) b (c a)) (+ a c))");
    }

    #[test]
    fn test_user_operator() {
        let mut table = PrecedenceTable::new();
        table.define('|', 5).unwrap();
        table.define('>', 10).unwrap();

        assert_eq!(expr_with("a | b < c", &table).unwrap(), "(| a (< b c))");
        assert_eq!(expr_with("a < b | c", &table).unwrap(), "(| (< a b) c)");
        assert_eq!(expr_with("3 > 2", &table).unwrap(), "(> 3 2)");
        // same precedence folds left to right
        assert_eq!(expr_with("a > b < c", &table).unwrap(), "(< (> a b) c)");
    }

    #[test]
    fn test_errors() {
        let table = PrecedenceTable::new();
        assert_eq!(
            expr_with("1 +", &table).unwrap_err().to_string(),
            "expected an expression, found end of input"
        );
        assert_eq!(
            expr_with("if x then 1", &table).unwrap_err().to_string(),
            "expected `else`, found end of input"
        );
        assert_eq!(
            expr_with("(1 + 2", &table).unwrap_err().to_string(),
            "expected `)`, found end of input"
        );
        assert_eq!(
            expr_with("for 1", &table).unwrap_err().to_string(),
            "expected identifier after `for`, found number `1`"
        );
        assert_eq!(
            expr_with("var in 1", &table).unwrap_err().to_string(),
            "expected identifier after `var`, found `in`"
        );
    }
}
