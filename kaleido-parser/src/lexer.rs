use logos::Logos;
use std::fmt;

#[derive(Debug, Logos, Clone, PartialEq)]
pub enum Token {
    // literals
    #[regex(r"[0-9.]+", |lex| lex.slice().parse())]
    Number(f64),

    // identifiers
    #[regex("[a-zA-Z][a-zA-Z0-9]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // commands
    #[token("def")]
    Def,
    #[token("extern")]
    Extern,

    // control
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("in")]
    In,

    // operators
    #[token("binary")]
    Binary,
    #[token("unary")]
    Unary,

    // var definition
    #[token("var")]
    Var,

    /// Any other single character: punctuation and operator symbols.
    #[regex(r"[^ \t\n\r\f0-9a-zA-Z.#]", |lex| lex.slice().chars().next())]
    Char(char),

    // misc
    #[regex(r"[ \t\n\r\f]+", logos::skip)]
    #[regex(r"#[^\n]*", logos::skip)] // single line comments
    #[error]
    Error,

    /// Only generated in parse phase when `lexer.next()` returns `None`.
    Eof,
}

impl Token {
    /// Returns the symbol if this token can name an operator: a single printable
    /// character that is neither alphanumeric nor one of `(`, `,` and `;`.
    pub fn operator_symbol(&self) -> Option<char> {
        match *self {
            Token::Char(c)
                if c != '(' && c != ',' && c != ';' && !c.is_alphanumeric() && !c.is_control() =>
            {
                Some(c)
            }
            _ => None,
        }
    }

    /// Returns `true` if this token ends a top-level statement.
    pub fn is_statement_boundary(&self) -> bool {
        matches!(self, Token::Char(';') | Token::Eof)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(val) => write!(f, "number `{}`", val),
            Token::Identifier(ident) => write!(f, "identifier `{}`", ident),
            Token::Def => write!(f, "`def`"),
            Token::Extern => write!(f, "`extern`"),
            Token::If => write!(f, "`if`"),
            Token::Then => write!(f, "`then`"),
            Token::Else => write!(f, "`else`"),
            Token::For => write!(f, "`for`"),
            Token::In => write!(f, "`in`"),
            Token::Binary => write!(f, "`binary`"),
            Token::Unary => write!(f, "`unary`"),
            Token::Var => write!(f, "`var`"),
            Token::Char(c) => write!(f, "`{}`", c),
            Token::Error => write!(f, "invalid token"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            lex("def extern definitely var x1"),
            vec![
                Token::Def,
                Token::Extern,
                Token::Identifier("definitely".to_string()),
                Token::Var,
                Token::Identifier("x1".to_string()),
            ]
        );
    }

    #[test]
    fn test_numbers_and_symbols() {
        assert_eq!(
            lex("1.5+x; # trailing comment\n(2)"),
            vec![
                Token::Number(1.5),
                Token::Char('+'),
                Token::Identifier("x".to_string()),
                Token::Char(';'),
                Token::Char('('),
                Token::Number(2.0),
                Token::Char(')'),
            ]
        );
    }

    #[test]
    fn test_malformed_number() {
        assert_eq!(lex("1.2.3"), vec![Token::Error]);
    }

    #[test]
    fn test_operator_symbol() {
        assert_eq!(Token::Char('|').operator_symbol(), Some('|'));
        assert_eq!(Token::Char('(').operator_symbol(), None);
        assert_eq!(Token::Char(',').operator_symbol(), None);
        assert_eq!(Token::Char(';').operator_symbol(), None);
        assert_eq!(Token::Identifier("a".to_string()).operator_symbol(), None);
    }
}
