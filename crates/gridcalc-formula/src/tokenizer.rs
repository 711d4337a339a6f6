//! Formula tokenizer
//!
//! Splits formula text into tokens using anchored longest-match patterns. Two-character
//! operators are tried before their one-character prefixes, and an identifier spelled
//! exactly `TRUE` or `FALSE` becomes a boolean.

use crate::error::{FormulaError, FormulaResult};
use lazy_regex::regex_find;
use std::fmt;

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Identifier(String),

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,

    // Comparison (`=` doubles as the formula marker)
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,

    // Delimiters
    LeftParen,
    RightParen,
    Colon,
    Comma,

    // End of input
    Eof,
}

/// Token kind without payload, used to ask a [`TokenStream`](crate::stream::TokenStream)
/// for a particular token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    String,
    Boolean,
    Identifier,
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    LeftParen,
    RightParen,
    Colon,
    Comma,
    Eof,
}

impl Token {
    /// The kind of this token
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Number(_) => TokenKind::Number,
            Token::String(_) => TokenKind::String,
            Token::Boolean(_) => TokenKind::Boolean,
            Token::Identifier(_) => TokenKind::Identifier,
            Token::Plus => TokenKind::Plus,
            Token::Minus => TokenKind::Minus,
            Token::Star => TokenKind::Star,
            Token::Slash => TokenKind::Slash,
            Token::Equal => TokenKind::Equal,
            Token::NotEqual => TokenKind::NotEqual,
            Token::GreaterThan => TokenKind::GreaterThan,
            Token::LessThan => TokenKind::LessThan,
            Token::GreaterEqual => TokenKind::GreaterEqual,
            Token::LessEqual => TokenKind::LessEqual,
            Token::LeftParen => TokenKind::LeftParen,
            Token::RightParen => TokenKind::RightParen,
            Token::Colon => TokenKind::Colon,
            Token::Comma => TokenKind::Comma,
            Token::Eof => TokenKind::Eof,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::String(s) => write!(f, "string {:?}", s),
            Token::Boolean(true) => f.write_str("TRUE"),
            Token::Boolean(false) => f.write_str("FALSE"),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            other => fmt::Display::fmt(&other.kind(), f),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Boolean => "boolean",
            TokenKind::Identifier => "identifier",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Equal => "'='",
            TokenKind::NotEqual => "'<>'",
            TokenKind::GreaterThan => "'>'",
            TokenKind::LessThan => "'<'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::LessEqual => "'<='",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Eof => "end of input",
        };
        f.write_str(text)
    }
}

/// Fixed-text tokens, longest first so `>=` wins over `>`
const FIXED_TOKENS: &[(&str, Token)] = &[
    (">=", Token::GreaterEqual),
    ("<=", Token::LessEqual),
    ("<>", Token::NotEqual),
    ("+", Token::Plus),
    ("-", Token::Minus),
    ("*", Token::Star),
    ("/", Token::Slash),
    ("=", Token::Equal),
    (">", Token::GreaterThan),
    ("<", Token::LessThan),
    ("(", Token::LeftParen),
    (")", Token::RightParen),
    (":", Token::Colon),
    (",", Token::Comma),
];

/// Tokenize formula text
///
/// Whitespace is dropped. The returned vector always ends with [`Token::Eof`].
///
/// # Example
/// ```rust
/// use gridcalc_formula::tokenizer::{tokenize, Token};
///
/// let tokens = tokenize("=A1>=2").unwrap();
/// assert_eq!(
///     tokens,
///     vec![
///         Token::Equal,
///         Token::Identifier("A1".into()),
///         Token::GreaterEqual,
///         Token::Number(2.0),
///         Token::Eof,
///     ]
/// );
/// ```
pub fn tokenize(input: &str) -> FormulaResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        let (token, len) = scan_token(rest)?;
        if let Some(token) = token {
            tokens.push(token);
        }
        rest = &rest[len..];
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}

/// Scan one token from the start of `rest`, returning it with the consumed length.
/// Whitespace scans as `None`.
fn scan_token(rest: &str) -> FormulaResult<(Option<Token>, usize)> {
    if let Some(ws) = regex_find!(r"^\s+", rest) {
        return Ok((None, ws.len()));
    }

    for (text, token) in FIXED_TOKENS {
        if rest.starts_with(text) {
            return Ok((Some(token.clone()), text.len()));
        }
    }

    if let Some(num) = regex_find!(r"^[0-9]+(?:\.[0-9]+)?", rest) {
        let value = num
            .parse()
            .map_err(|_| FormulaError::syntax(format!("invalid number '{}'", num)))?;
        return Ok((Some(Token::Number(value)), num.len()));
    }

    if let Some(word) = regex_find!(r"^[A-Za-z_][A-Za-z0-9_]*", rest) {
        let token = match word {
            "TRUE" => Token::Boolean(true),
            "FALSE" => Token::Boolean(false),
            _ => Token::Identifier(word.to_string()),
        };
        return Ok((Some(token), word.len()));
    }

    if let Some(literal) = regex_find!(r#"^"(?s:\\.|[^"\\])*""#, rest) {
        let body = &literal[1..literal.len() - 1];
        return Ok((Some(Token::String(unescape(body)?)), literal.len()));
    }

    Err(FormulaError::syntax(format!("unexpected input '{}'", rest)))
}

/// Resolve the escapes of a string literal body: `\\`, `\"` and `\n`
fn unescape(body: &str) -> FormulaResult<String> {
    let mut s = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            s.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => s.push('\\'),
            Some('"') => s.push('"'),
            Some('n') => s.push('\n'),
            Some(other) => {
                return Err(FormulaError::syntax(format!(
                    "invalid escape sequence '\\{}'",
                    other
                )))
            }
            None => return Err(FormulaError::syntax("unterminated escape sequence")),
        }
    }

    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operators() {
        let tokens = tokenize("+ - * / ( ) : , = <> > < >= <=").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::LeftParen,
                Token::RightParen,
                Token::Colon,
                Token::Comma,
                Token::Equal,
                Token::NotEqual,
                Token::GreaterThan,
                Token::LessThan,
                Token::GreaterEqual,
                Token::LessEqual,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokenize("42 3.14").unwrap(),
            vec![Token::Number(42.0), Token::Number(3.14), Token::Eof]
        );
    }

    #[test]
    fn test_booleans_exact_case() {
        assert_eq!(
            tokenize("TRUE FALSE true TRUEX").unwrap(),
            vec![
                Token::Boolean(true),
                Token::Boolean(false),
                Token::Identifier("true".into()),
                Token::Identifier("TRUEX".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokenize(r#""a\"b\\c\nd""#).unwrap(),
            vec![Token::String("a\"b\\c\nd".into()), Token::Eof]
        );
        assert_eq!(
            tokenize(r#""\"""#).unwrap(),
            vec![Token::String("\"".into()), Token::Eof]
        );
    }

    #[test]
    fn test_invalid_escape() {
        let err = tokenize(r#""\j""#).unwrap_err();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("\\j"));
    }

    #[test]
    fn test_trailing_backslash() {
        assert!(tokenize(r#""abc\"#).unwrap_err().is_syntax());
        assert!(tokenize(r#""abc\""#).unwrap_err().is_syntax());
    }

    #[test]
    fn test_unmatched_input_names_remainder() {
        let err = tokenize("1 + #oops").unwrap_err();
        assert_eq!(err, FormulaError::Syntax("unexpected input '#oops'".into()));
    }

    #[test]
    fn test_whitespace_dropped() {
        assert_eq!(
            tokenize(" \t A1 \n").unwrap(),
            vec![Token::Identifier("A1".into()), Token::Eof]
        );
    }
}
