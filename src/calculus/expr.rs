/// Sandboxed expression language for user-typed functions.
///
/// Recursive descent over a small grammar; the result is an AST evaluated
/// directly, so no user text ever reaches a general-purpose interpreter.
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary | implicit-product)*
/// unary   := '-' unary | '+' unary | power
/// power   := primary ('^' unary)?
/// primary := number | X | Y | pi | e | func '(' expr ')' | '(' expr ')'
/// func    := sin | cos | tan | sqrt | abs | ln | exp
/// ```
///
/// Names are case-insensitive. `^` is right-associative and binds tighter
/// than unary minus on its left (`-x^2 == -(x^2)`). A number, name or `(`
/// directly after a complete factor multiplies it (`2x`, `3sin(x)`, `(x)(x)`).
///
/// Input is bounded before it can exhaust the stack: at most
/// [`MAX_TOKENS`] tokens and [`MAX_NESTING`] levels of parentheses, calls
/// and prefix signs.

use crate::error::{MathVizError, Result};

use super::DifferentiableFunction;

/// Deepest nesting of `(`, function calls and unary signs accepted by the parser.
pub const MAX_NESTING: usize = 256;

/// Longest token stream accepted; also bounds the depth of the evaluated tree.
pub const MAX_TOKENS: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Abs,
    Ln,
    Exp,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "ln" => Self::Ln,
            "exp" => Self::Exp,
            _ => return None,
        })
    }

    #[inline]
    fn apply(self, v: f64) -> f64 {
        match self {
            Self::Sin => v.sin(),
            Self::Cos => v.cos(),
            Self::Tan => v.tan(),
            Self::Sqrt => v.sqrt(),
            Self::Abs => v.abs(),
            Self::Ln => v.ln(),
            Self::Exp => v.exp(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    X,
    Y,
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Box<Expr>),
}

impl Expr {
    /// IEEE semantics throughout: `1/0` is infinite, `sqrt(-1)` is NaN.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        match self {
            Expr::Number(v) => *v,
            Expr::X => x,
            Expr::Y => y,
            Expr::Neg(e) => -e.eval(x, y),
            Expr::Binary(op, l, r) => {
                let (a, b) = (l.eval(x, y), r.eval(x, y));
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Expr::Call(f, arg) => f.apply(arg.eval(x, y)),
        }
    }
}

/// A parsed expression together with its source text.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        if let Some(tok) = tokens.get(MAX_TOKENS) {
            return Err(MathVizError::Parse {
                position: tok.position,
                message: format!("expression longer than {MAX_TOKENS} tokens"),
            });
        }
        let mut parser = Parser { tokens: &tokens, pos: 0, end: source.len(), depth: 0 };
        let ast = parser.expr()?;
        if let Some(tok) = parser.peek() {
            return Err(MathVizError::Parse {
                position: tok.position,
                message: format!("unexpected {}", tok.kind.describe()),
            });
        }
        Ok(Self { source: source.to_string(), ast })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    #[inline]
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.ast.eval(x, y)
    }
}

impl DifferentiableFunction for Expression {
    fn evaluate(&self, x: f64) -> Option<f64> {
        Some(self.ast.eval(x, 0.0))
    }
}

// ─── Tokenizer ───────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Number(v) => format!("number {v}"),
            TokenKind::Ident(name) => format!("name `{name}`"),
            TokenKind::Op(c) => format!("operator `{c}`"),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'0'..=b'9' | b'.' => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                // exponent part, only when digits follow
                if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                        j += 1;
                    }
                    if j < bytes.len() && bytes[j].is_ascii_digit() {
                        while j < bytes.len() && bytes[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text = &source[start..i];
                let value = text.parse::<f64>().map_err(|_| MathVizError::Parse {
                    position: start,
                    message: format!("malformed number `{text}`"),
                })?;
                tokens.push(Token { kind: TokenKind::Number(value), position: start });
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let name = source[start..i].to_ascii_lowercase();
                tokens.push(Token { kind: TokenKind::Ident(name), position: start });
            }
            b'+' | b'-' | b'*' | b'/' | b'^' => {
                tokens.push(Token { kind: TokenKind::Op(c as char), position: start });
                i += 1;
            }
            b'(' => {
                tokens.push(Token { kind: TokenKind::LParen, position: start });
                i += 1;
            }
            b')' => {
                tokens.push(Token { kind: TokenKind::RParen, position: start });
                i += 1;
            }
            _ => {
                let ch = source[start..].chars().next().unwrap_or('?');
                return Err(MathVizError::Parse {
                    position: start,
                    message: format!("unexpected character `{ch}`"),
                });
            }
        }
    }
    Ok(tokens)
}

// ─── Parser ──────────────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    end: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat_op(&mut self, op: char) -> bool {
        match self.peek() {
            Some(Token { kind: TokenKind::Op(c), .. }) if *c == op => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here("expression nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn error_here(&self, message: &str) -> MathVizError {
        let position = self.peek().map_or(self.end, |t| t.position);
        MathVizError::Parse { position, message: message.to_string() }
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut left = self.term()?;
        loop {
            let op = if self.eat_op('+') {
                BinaryOp::Add
            } else if self.eat_op('-') {
                BinaryOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn term(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = if self.eat_op('*') {
                BinaryOp::Mul
            } else if self.eat_op('/') {
                BinaryOp::Div
            } else if self.starts_primary() {
                BinaryOp::Mul
            } else {
                return Ok(left);
            };
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn starts_primary(&self) -> bool {
        matches!(
            self.peek().map(|t| &t.kind),
            Some(TokenKind::Number(_)) | Some(TokenKind::Ident(_)) | Some(TokenKind::LParen)
        )
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat_op('-') {
            let inner = self.nested(Self::unary)?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        if self.eat_op('+') {
            return self.nested(Self::unary);
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.primary()?;
        if self.eat_op('^') {
            let exponent = self.nested(Self::unary)?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr> {
        let tok = self.next().ok_or_else(|| self.error_here("unexpected end of expression"))?;
        match &tok.kind {
            TokenKind::Number(v) => Ok(Expr::Number(*v)),
            TokenKind::LParen => {
                let inner = self.nested(Self::expr)?;
                self.expect_rparen()?;
                Ok(inner)
            }
            TokenKind::Ident(name) => match name.as_str() {
                "x" => Ok(Expr::X),
                "y" => Ok(Expr::Y),
                "pi" => Ok(Expr::Number(std::f64::consts::PI)),
                "e" => Ok(Expr::Number(std::f64::consts::E)),
                _ => {
                    let func = Function::from_name(name)
                        .ok_or_else(|| MathVizError::UnknownVariable(name.clone()))?;
                    match self.next() {
                        Some(Token { kind: TokenKind::LParen, .. }) => {}
                        _ => {
                            return Err(MathVizError::Parse {
                                position: tok.position,
                                message: format!("expected `(` after `{name}`"),
                            })
                        }
                    }
                    let arg = self.nested(Self::expr)?;
                    self.expect_rparen()?;
                    Ok(Expr::Call(func, Box::new(arg)))
                }
            },
            other => Err(MathVizError::Parse {
                position: tok.position,
                message: format!("unexpected {}", other.describe()),
            }),
        }
    }

    fn expect_rparen(&mut self) -> Result<()> {
        match self.peek() {
            Some(Token { kind: TokenKind::RParen, .. }) => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error_here("expected `)`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str, x: f64) -> f64 {
        Expression::parse(src).unwrap().eval(x, 0.0)
    }

    #[test]
    fn test_precedence() {
        assert!((eval("1 + 2 * 3", 0.0) - 7.0).abs() < 1e-12);
        assert!((eval("(1 + 2) * 3", 0.0) - 9.0).abs() < 1e-12);
        assert!((eval("2 ^ 3 ^ 2", 0.0) - 512.0).abs() < 1e-9);
        assert!((eval("-x^2", 3.0) + 9.0).abs() < 1e-12);
        assert!((eval("2^-1", 0.0) - 0.5).abs() < 1e-12);
        assert!((eval("10 - 4 - 3", 0.0) - 3.0).abs() < 1e-12);
        assert!((eval("8 / 4 / 2", 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_functions_and_variables() {
        assert!((eval("sin(X)", std::f64::consts::FRAC_PI_2) - 1.0).abs() < 1e-12);
        assert!((eval("cos(0) + sqrt(16)", 0.0) - 5.0).abs() < 1e-12);
        assert!((eval("x*x - 2*x + 1", 3.0) - 4.0).abs() < 1e-12);
        let e = Expression::parse("x + y").unwrap();
        assert!((e.eval(2.0, 5.0) - 7.0).abs() < 1e-12);
        assert!((eval("ln(exp(2))", 0.0) - 2.0).abs() < 1e-12);
        assert!((eval("abs(-3) + tan(0)", 0.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_implicit_multiplication() {
        assert!((eval("2x", 4.0) - 8.0).abs() < 1e-12);
        assert!((eval("3sin(x)", std::f64::consts::FRAC_PI_2) - 3.0).abs() < 1e-12);
        assert!((eval("(x+1)(x-1)", 3.0) - 8.0).abs() < 1e-12);
        assert!((eval("2pi", 0.0) - 2.0 * std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_scientific_numbers() {
        assert!((eval("1.5e3", 0.0) - 1500.0).abs() < 1e-9);
        assert!((eval("2E-2", 0.0) - 0.02).abs() < 1e-12);
        // `e` after a number without digits is the constant
        assert!((eval("2e", 0.0) - 2.0 * std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_results() {
        assert!(eval("1/x", 0.0).is_infinite());
        assert!(eval("sqrt(x)", -1.0).is_nan());
    }

    #[test]
    fn test_rejects_code() {
        assert!(matches!(
            Expression::parse("alert(1)"),
            Err(MathVizError::UnknownVariable(name)) if name == "alert"
        ));
        assert!(matches!(Expression::parse("x; y"), Err(MathVizError::Parse { position: 1, .. })));
        assert!(matches!(Expression::parse("x = 2"), Err(MathVizError::Parse { .. })));
        assert!(matches!(Expression::parse("\"x\""), Err(MathVizError::Parse { position: 0, .. })));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Expression::parse(""), Err(MathVizError::Parse { position: 0, .. })));
        assert!(matches!(Expression::parse("(x + 1"), Err(MathVizError::Parse { position: 6, .. })));
        assert!(matches!(Expression::parse("sin x"), Err(MathVizError::Parse { .. })));
        assert!(matches!(Expression::parse("x +"), Err(MathVizError::Parse { .. })));
        assert!(matches!(Expression::parse("1..2"), Err(MathVizError::Parse { position: 0, .. })));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let deep = format!("{}x{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(matches!(
            Expression::parse(&deep),
            Err(MathVizError::Parse { ref message, .. }) if message.contains("tokens")
        ));

        let parens = format!("{}x{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(matches!(
            Expression::parse(&parens),
            Err(MathVizError::Parse { position, ref message })
                if position == MAX_NESTING + 1 && message == "expression nested too deeply"
        ));
        let signs = format!("{}x", "-".repeat(MAX_NESTING + 1));
        assert!(matches!(Expression::parse(&signs), Err(MathVizError::Parse { .. })));
        let calls = format!("{}x{}", "sin(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(matches!(Expression::parse(&calls), Err(MathVizError::Parse { .. })));
        let powers = format!("2{}", "^2".repeat(MAX_NESTING + 1));
        assert!(matches!(Expression::parse(&powers), Err(MathVizError::Parse { .. })));
    }

    #[test]
    fn test_nesting_within_limit_parses() {
        let parens = format!("{}x{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!((eval(&parens, 2.0) - 2.0).abs() < 1e-12);
        assert!((eval(&format!("{}x", "-".repeat(MAX_NESTING)), 3.0) - 3.0).abs() < 1e-12);

        // long flat sums stay within the token budget
        let sum = vec!["x"; MAX_TOKENS / 2].join("+");
        assert!((eval(&sum, 1.0) - (MAX_TOKENS / 2) as f64).abs() < 1e-9);
        let too_long = vec!["x"; MAX_TOKENS].join("+");
        assert!(Expression::parse(&too_long).is_err());
    }

    #[test]
    fn test_evaluate_as_function() {
        let f = Expression::parse("x^2").unwrap();
        assert_eq!(f.evaluate(3.0), Some(9.0));
        assert_eq!(f.source(), "x^2");
    }
}
