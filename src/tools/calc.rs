//! Arithmetic expression tool.

use async_trait::async_trait;

use super::Tool;

/// Evaluate basic arithmetic expressions.
pub struct Calculator;

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate a math expression and return the result. Use when the user needs arithmetic. Input: an expression using digits, + - * / and parentheses, e.g. '3 * (4 + 5)' or '100 / 4 + 28'."
    }

    async fn invoke(&self, input: &str) -> anyhow::Result<String> {
        let expression = input.trim();

        // Only digits and basic operators are accepted.
        if !expression
            .chars()
            .all(|c| "0123456789+-*/(). ".contains(c))
        {
            anyhow::bail!("expression contains unsupported characters; only digits, + - * / ( ) . are allowed");
        }
        if expression.is_empty() {
            anyhow::bail!("expression is empty");
        }

        let value = evaluate(expression)?;
        Ok(format!("{} = {}", expression, format_number(value)))
    }
}

/// Render whole results without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Recursive-descent evaluator over the usual precedence:
/// expr = term (('+'|'-') term)*, term = factor (('*'|'/') factor)*,
/// factor = number | '(' expr ')' | '-' factor.
fn evaluate(expression: &str) -> anyhow::Result<f64> {
    let tokens: Vec<char> = expression.chars().filter(|c| !c.is_whitespace()).collect();
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        anyhow::bail!(
            "unexpected character '{}' at position {}",
            parser.tokens[parser.pos],
            parser.pos
        );
    }
    Ok(value)
}

struct Parser {
    tokens: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn expr(&mut self) -> anyhow::Result<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                '+' => {
                    self.bump();
                    value += self.term()?;
                }
                '-' => {
                    self.bump();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> anyhow::Result<f64> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                '*' => {
                    self.bump();
                    value *= self.factor()?;
                }
                '/' => {
                    self.bump();
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        anyhow::bail!("division by zero");
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> anyhow::Result<f64> {
        match self.peek() {
            Some('-') => {
                self.bump();
                Ok(-self.factor()?)
            }
            Some('(') => {
                self.bump();
                let value = self.expr()?;
                if self.bump() != Some(')') {
                    anyhow::bail!("missing closing parenthesis");
                }
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => anyhow::bail!("unexpected character '{}'", c),
            None => anyhow::bail!("unexpected end of expression"),
        }
    }

    fn number(&mut self) -> anyhow::Result<f64> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.bump();
        }
        let literal: String = self.tokens[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| anyhow::anyhow!("invalid number '{}'", literal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_parens() {
        assert_eq!(evaluate("3 * (4 + 5)").unwrap(), 27.0);
        assert_eq!(evaluate("100 / 4 + 28").unwrap(), 53.0);
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
    }

    #[test]
    fn unary_minus() {
        assert_eq!(evaluate("-3 + 5").unwrap(), 2.0);
        assert_eq!(evaluate("2 * -(1 + 1)").unwrap(), -4.0);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let err = evaluate("1 / 0").unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn rejects_unsupported_characters() {
        let err = tokio_test::block_on(Calculator.invoke("2 + x")).unwrap_err();
        assert!(err.to_string().contains("unsupported characters"));
    }

    #[test]
    fn formats_whole_results_without_fraction() {
        let out = tokio_test::block_on(Calculator.invoke("128 + 256 + 99")).unwrap();
        assert_eq!(out, "128 + 256 + 99 = 483");
    }

    #[test]
    fn dangling_operator_is_an_error() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(1 + 2").is_err());
    }
}
