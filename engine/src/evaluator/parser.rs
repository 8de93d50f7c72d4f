//! Recursive-descent parser producing the restricted AST
//!
//! Grammar (Python precedence):
//!
//! ```text
//! expr   := term (("+" | "-") term)*
//! term   := factor (("*" | "/" | "%") factor)*
//! factor := ("+" | "-") factor | power
//! power  := atom ("**" factor)?
//! atom   := NUMBER | "(" expr ")"
//! ```

use super::lexer::Token;
use super::{EvaluationError, Number, MAX_DEPTH};

/// Unary operators in the allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
}

/// Binary operators in the allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

/// The complete set of node kinds an expression may contain
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Number),
    Group(Box<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse the whole token stream into one expression
    pub fn parse(mut self) -> Result<Expr, EvaluationError> {
        if self.tokens.is_empty() {
            return Err(EvaluationError::Empty);
        }
        let expr = self.expr()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(EvaluationError::UnexpectedToken(token.describe())),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn enter(&mut self) -> Result<(), EvaluationError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvaluationError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expr(&mut self) -> Result<Expr, EvaluationError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, EvaluationError> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.factor()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn factor(&mut self) -> Result<Expr, EvaluationError> {
        self.enter()?;
        let op = match self.peek() {
            Some(Token::Plus) => Some(UnaryOp::Plus),
            Some(Token::Minus) => Some(UnaryOp::Neg),
            _ => None,
        };
        let result = match op {
            Some(op) => {
                self.pos += 1;
                self.factor().map(|operand| Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.power(),
        };
        self.leave();
        result
    }

    fn power(&mut self) -> Result<Expr, EvaluationError> {
        let base = self.atom()?;
        if matches!(self.peek(), Some(Token::DoubleStar)) {
            self.pos += 1;
            // Right-associative, and the exponent may carry its own sign: 2 ** -1
            let exponent = self.factor()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, EvaluationError> {
        match self.next() {
            Some(Token::Number { text, is_float }) => parse_literal(&text, is_float),
            Some(Token::LParen) => {
                // Depth is charged by the factor that reaches this atom
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(Expr::Group(Box::new(inner))),
                    Some(token) => Err(EvaluationError::UnexpectedToken(token.describe())),
                    None => Err(EvaluationError::UnbalancedParentheses),
                }
            }
            Some(Token::RParen) => Err(EvaluationError::UnbalancedParentheses),
            Some(token) => Err(EvaluationError::UnexpectedToken(token.describe())),
            None => Err(EvaluationError::UnexpectedEnd),
        }
    }
}

fn parse_literal(text: &str, is_float: bool) -> Result<Expr, EvaluationError> {
    let number = if is_float {
        let value: f64 = text
            .parse()
            .map_err(|_| EvaluationError::InvalidNumber(text.to_string()))?;
        Number::Float(value)
    } else {
        let value: i128 = text.parse().map_err(|_| EvaluationError::Overflow)?;
        Number::Int(value)
    };
    Ok(Expr::Literal(number))
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn parse(input: &str) -> Result<Expr, EvaluationError> {
        Parser::new(tokenize(input)?).parse()
    }

    fn int(n: i128) -> Box<Expr> {
        Box::new(Expr::Literal(Number::Int(n)))
    }

    #[test]
    fn test_precedence_of_mul_over_add() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Binary {
                op: BinaryOp::Add,
                left: int(1),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: int(2),
                    right: int(3),
                }),
            }
        );
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        assert_eq!(
            parse("-2 ** 2").unwrap(),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    left: int(2),
                    right: int(2),
                }),
            }
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(
            parse("2 ** 3 ** 2").unwrap(),
            Expr::Binary {
                op: BinaryOp::Pow,
                left: int(2),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    left: int(3),
                    right: int(2),
                }),
            }
        );
    }

    #[test]
    fn test_grouping_is_kept() {
        assert_eq!(parse("(7)").unwrap(), Expr::Group(int(7)));
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(parse(""), Err(EvaluationError::Empty));
        assert_eq!(parse("   "), Err(EvaluationError::Empty));
        assert_eq!(parse("(1 + 2"), Err(EvaluationError::UnbalancedParentheses));
        assert_eq!(parse("1 + 2)"), Err(EvaluationError::UnexpectedToken("')'".to_string())));
        assert_eq!(parse("1 +"), Err(EvaluationError::UnexpectedEnd));
        assert_eq!(parse("()"), Err(EvaluationError::UnbalancedParentheses));
        assert_eq!(
            parse("2 3"),
            Err(EvaluationError::UnexpectedToken("number '3'".to_string()))
        );
        assert_eq!(
            parse("* 3"),
            Err(EvaluationError::UnexpectedToken("'*'".to_string()))
        );
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(matches!(parse(&deep), Err(EvaluationError::TooDeep(_))));

        let negations = format!("{}1", "-".repeat(MAX_DEPTH + 1));
        assert!(matches!(parse(&negations), Err(EvaluationError::TooDeep(_))));
    }
}
