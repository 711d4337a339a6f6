//! Formula parser
//!
//! A recursive descent parser with one function per precedence level, lowest first:
//! comparison, additive terms, multiplicative factors, unary signs, then values.

use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::stream::TokenStream;
use crate::tokenizer::{tokenize, Token, TokenKind};
use crate::value::{passthrough_value, FormulaValue};
use gridcalc_core::{CellContent, CellPosition, CellRange};
use lazy_regex::regex_is_match;

/// The result of parsing one cell
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCell {
    /// Expression tree
    pub expression: Expression,
    /// Every position the expression reads, ranges expanded
    pub references: Vec<CellPosition>,
}

/// Parse the content of a cell
///
/// Non-text content becomes a literal without being looked at. Text is handled by
/// [`parse_text`].
pub fn parse_cell(content: &CellContent) -> FormulaResult<ParsedCell> {
    match content {
        CellContent::Text(text) => parse_text(text),
        other => {
            let value = passthrough_value(other)
                .ok_or_else(|| FormulaError::Internal("text content has no passthrough".into()))?;
            Ok(ParsedCell {
                expression: Expression::Value(value),
                references: Vec::new(),
            })
        }
    }
}

/// Parse cell text
///
/// Text starting with `=` is a formula. Text that looks like a decimal number becomes that
/// number, and anything else is a string literal.
///
/// # Example
/// ```rust
/// use gridcalc_formula::parser::parse_text;
/// use gridcalc_formula::{Expression, FormulaValue};
///
/// let parsed = parse_text("-2.5").unwrap();
/// assert_eq!(parsed.expression, Expression::Value(FormulaValue::Number(-2.5)));
///
/// let parsed = parse_text("=SUM(A1:A2)").unwrap();
/// assert_eq!(parsed.references.len(), 2);
/// ```
pub fn parse_text(text: &str) -> FormulaResult<ParsedCell> {
    let expression = if text.starts_with('=') {
        parse_formula(text)?
    } else if regex_is_match!(r"^[+-]?[0-9]+(?:\.[0-9]+)?$", text) {
        let n: f64 = text
            .parse()
            .map_err(|_| FormulaError::syntax(format!("invalid number '{}'", text)))?;
        Expression::Value(FormulaValue::Number(n))
    } else {
        Expression::Value(FormulaValue::String(text.to_string()))
    };

    let references = collect_references(&expression)?;
    Ok(ParsedCell {
        expression,
        references,
    })
}

/// Parse formula text, including its leading `=`, into an AST
///
/// # Example
/// ```rust
/// use gridcalc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2*3").unwrap();
/// let ast = parse_formula("=SUM(A1:B2, 10)").unwrap();
/// let ast = parse_formula("=IF(A1>0, \"yes\", \"no\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<Expression> {
    let mut parser = FormulaParser::new(tokenize(formula)?);

    parser.tokens.require(TokenKind::Equal)?;
    let expr = parser.parse_expression()?;
    parser.tokens.require(TokenKind::Eof)?;

    Ok(expr)
}

/// Flatten every position an expression reads
///
/// Ranges contribute every position they span, in row-major order. Duplicates are kept.
pub fn collect_references(expr: &Expression) -> FormulaResult<Vec<CellPosition>> {
    let mut out = Vec::new();
    walk_references(expr, &mut out)?;
    Ok(out)
}

fn walk_references(expr: &Expression, out: &mut Vec<CellPosition>) -> FormulaResult<()> {
    match expr {
        Expression::Value(_) => {}
        Expression::Reference(position) => out.push(position.clone()),
        Expression::UnaryOp { operand, .. } => walk_references(operand, out)?,
        Expression::BinaryOp { left, right, .. } => {
            walk_references(left, out)?;
            walk_references(right, out)?;
        }
        Expression::FunctionCall { args, .. } => {
            for arg in args {
                walk_references(arg, out)?;
            }
        }
        Expression::Range { start, end } => {
            let range = CellRange::new(start, end)
                .map_err(|e| FormulaError::syntax(e.to_string()))?;
            out.extend(range.cells());
        }
    }
    Ok(())
}

/// Formula parser
struct FormulaParser {
    tokens: TokenStream,
}

impl FormulaParser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: TokenStream::new(tokens),
        }
    }

    fn parse_expression(&mut self) -> FormulaResult<Expression> {
        self.parse_comparison()
    }

    // Comparison: = <> > < >= <=
    fn parse_comparison(&mut self) -> FormulaResult<Expression> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.tokens.peek() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::LessThan => BinaryOperator::LessThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                Token::LessEqual => BinaryOperator::LessEqual,
                _ => break,
            };
            self.tokens.advance();
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    // Addition and subtraction
    fn parse_term(&mut self) -> FormulaResult<Expression> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.tokens.peek() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.tokens.advance();
            let right = self.parse_factor()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    // Multiplication and division
    fn parse_factor(&mut self) -> FormulaResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.tokens.peek() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };
            self.tokens.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    // Unary plus and minus
    fn parse_unary(&mut self) -> FormulaResult<Expression> {
        let op = match self.tokens.peek() {
            Token::Plus => UnaryOperator::Plus,
            Token::Minus => UnaryOperator::Negate,
            _ => return self.parse_value(),
        };
        self.tokens.advance();
        let operand = self.parse_unary()?;
        Ok(Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    // Literals, parentheses, references, ranges and function calls
    fn parse_value(&mut self) -> FormulaResult<Expression> {
        match self.tokens.advance() {
            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.tokens.require(TokenKind::RightParen)?;
                Ok(expr)
            }
            Token::Number(n) => Ok(Expression::Value(FormulaValue::Number(n))),
            Token::String(s) => Ok(Expression::Value(FormulaValue::String(s))),
            Token::Boolean(b) => Ok(Expression::Value(FormulaValue::Boolean(b))),
            Token::Identifier(name) => self.parse_identifier(name),
            other => Err(FormulaError::syntax(format!(
                "expected a value, got {}",
                other
            ))),
        }
    }

    fn parse_identifier(&mut self, name: String) -> FormulaResult<Expression> {
        if self.tokens.expect(TokenKind::Colon).is_some() {
            let end = match self.tokens.require(TokenKind::Identifier)? {
                Token::Identifier(end) => end,
                other => {
                    return Err(FormulaError::syntax(format!(
                        "expected identifier, got {}",
                        other
                    )))
                }
            };
            let start = range_endpoint(name)?;
            let end = range_endpoint(end)?;
            CellRange::new(&start, &end).map_err(|e| FormulaError::syntax(e.to_string()))?;
            return Ok(Expression::Range { start, end });
        }

        if self.tokens.expect(TokenKind::LeftParen).is_some() {
            let args = self.parse_arguments()?;
            return Ok(Expression::FunctionCall {
                name: name.to_uppercase(),
                args,
            });
        }

        if !CellPosition::is_reference_shaped(&name) {
            return Err(FormulaError::syntax(format!("invalid reference '{}'", name)));
        }
        Ok(Expression::Reference(CellPosition::new(name)))
    }

    // Arguments after the opening parenthesis, through the closing one
    fn parse_arguments(&mut self) -> FormulaResult<Vec<Expression>> {
        let mut args = Vec::new();

        if self.tokens.expect(TokenKind::RightParen).is_some() {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if self.tokens.expect(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.tokens.require(TokenKind::RightParen)?;

        Ok(args)
    }
}

fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn range_endpoint(name: String) -> FormulaResult<CellPosition> {
    let position = CellPosition::new(name);
    match position.coordinates() {
        Ok(_) => Ok(position),
        Err(_) => Err(FormulaError::syntax(format!(
            "invalid reference '{}' in range",
            position
        ))),
    }
}
