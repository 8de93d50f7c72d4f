//! Tokenizer for arithmetic expressions
//!
//! Produces only the tokens of the allowed grammar. Any character sequence that
//! would introduce a name, string, call, subscript, comparison or statement is
//! rejected here, before a parser ever sees it.

use super::EvaluationError;

/// Allowed tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal text and whether it contained a decimal point
    Number { text: String, is_float: bool },
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    Percent,
    LParen,
    RParen,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Number { text, .. } => format!("number '{}'", text),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::DoubleStar => "'**'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Percent => "'%'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

/// Split an expression into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, EvaluationError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                let mut seen_dot = false;
                let mut seen_digit = false;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    if chars[i] == '.' {
                        if seen_dot {
                            break;
                        }
                        seen_dot = true;
                    } else {
                        seen_digit = true;
                    }
                    i += 1;
                }

                if !seen_digit {
                    // A lone '.' is attribute access, not a number
                    return Err(EvaluationError::Disallowed("attribute access"));
                }

                // `1e3`, `0x1f`, `2j`, `1.2.3` are all outside the literal grammar
                if i < chars.len() && (is_name_char(chars[i]) || chars[i] == '.') {
                    let mut end = i;
                    while end < chars.len() && (is_name_char(chars[end]) || chars[end] == '.') {
                        end += 1;
                    }
                    let text: String = chars[start..end].iter().collect();
                    return Err(EvaluationError::InvalidNumber(text));
                }

                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Number {
                    text,
                    is_float: seen_dot,
                });
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::DoubleStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    return Err(EvaluationError::DisallowedOperator("//".to_string()));
                }
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if is_name_start(c) => {
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                return Err(EvaluationError::NameReference(name));
            }
            '\'' | '"' => return Err(EvaluationError::Disallowed("string literal")),
            ';' => return Err(EvaluationError::Disallowed("statement separator")),
            '[' | ']' => return Err(EvaluationError::Disallowed("subscript or list literal")),
            '{' | '}' => return Err(EvaluationError::Disallowed("collection literal")),
            ',' => return Err(EvaluationError::Disallowed("tuple or argument list")),
            '<' | '>' | '=' | '!' => {
                let mut op = c.to_string();
                if let Some(next) = chars.get(i + 1).filter(|n| matches!(n, '=' | '<' | '>')) {
                    op.push(*next);
                }
                return Err(EvaluationError::DisallowedOperator(op));
            }
            '&' | '|' | '^' | '~' | '@' => {
                return Err(EvaluationError::DisallowedOperator(c.to_string()));
            }
            other => {
                return Err(EvaluationError::UnexpectedCharacter {
                    character: other,
                    position: i,
                })
            }
        }
    }

    Ok(tokens)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
