//! Compiled algebraic expressions over a closed set of variables.
//!
//! Formulas are tokenized and parsed by `evalexpr`, then lowered into a small
//! typed tree. Variable names are resolved once, when the formula is compiled,
//! so evaluation is a plain recursive walk with no string lookups.

use evalexpr::{Node, Operator, Value, build_operator_tree};

/// Errors raised while compiling a formula.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("cannot parse expression: {0}")]
    Parse(String),
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("unsupported token '{0}'")]
    Unsupported(String),
    #[error("empty expression")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Abs,
    Sgn,
    Sqrt,
    Exp,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
    Cot,
    Asin,
    Acos,
    Atan,
    Acot,
    Sinh,
    Cosh,
    Tanh,
    Coth,
    Step,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        let f = match name.to_ascii_lowercase().as_str() {
            "abs" => Func::Abs,
            "sgn" => Func::Sgn,
            "sqrt" => Func::Sqrt,
            "exp" => Func::Exp,
            "log" => Func::Log,
            "log10" => Func::Log10,
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "cot" => Func::Cot,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "acot" => Func::Acot,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "coth" => Func::Coth,
            "step" => Func::Step,
            _ => return None,
        };
        Some(f)
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Func::Abs => x.abs(),
            Func::Sgn => {
                if x > 0.0 {
                    1.0
                } else if x < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            Func::Sqrt => x.sqrt(),
            Func::Exp => x.exp(),
            Func::Log => x.ln(),
            Func::Log10 => x.log10(),
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tan => x.tan(),
            Func::Cot => 1.0 / x.tan(),
            Func::Asin => x.asin(),
            Func::Acos => x.acos(),
            Func::Atan => x.atan(),
            Func::Acot => std::f64::consts::FRAC_PI_2 - x.atan(),
            Func::Sinh => x.sinh(),
            Func::Cosh => x.cosh(),
            Func::Tanh => x.tanh(),
            Func::Coth => 1.0 / x.tanh(),
            Func::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Expression tree with variables already resolved to `V`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<V> {
    Number(f64),
    Variable(V),
    Neg(Box<Expr<V>>),
    Binary(BinaryOp, Box<Expr<V>>, Box<Expr<V>>),
    Call(Func, Box<Expr<V>>),
}

impl<V: Copy> Expr<V> {
    pub fn eval<F: Fn(V) -> f64>(&self, value_of: &F) -> f64 {
        match self {
            Expr::Number(x) => *x,
            Expr::Variable(v) => value_of(*v),
            Expr::Neg(e) => -e.eval(value_of),
            Expr::Binary(op, l, r) => {
                let (a, b) = (l.eval(value_of), r.eval(value_of));
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Mod => a % b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Expr::Call(f, arg) => f.apply(arg.eval(value_of)),
        }
    }
}

/// A formula compiled against a variable vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct MathExpr<V> {
    source: String,
    root: Expr<V>,
}

impl<V: Copy> MathExpr<V> {
    /// Compile `formula`, resolving each variable name through `resolve`.
    ///
    /// Fails on malformed input, on operators outside arithmetic, and on any
    /// name `resolve` does not recognize.
    pub fn compile<R>(formula: &str, resolve: R) -> Result<Self, ExprError>
    where
        R: Fn(&str) -> Option<V>,
    {
        if formula.trim().is_empty() {
            return Err(ExprError::Empty);
        }
        let tree = build_operator_tree(formula).map_err(|e| ExprError::Parse(e.to_string()))?;
        let root = lower(&tree, &resolve)?;
        Ok(MathExpr {
            source: formula.to_string(),
            root,
        })
    }

    pub fn eval<F: Fn(V) -> f64>(&self, value_of: F) -> f64 {
        self.root.eval(&value_of)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

fn only_child<'a>(node: &'a Node, token: &str) -> Result<&'a Node, ExprError> {
    match node.children() {
        [child] => Ok(child),
        [] => Err(ExprError::Empty),
        _ => Err(ExprError::Unsupported(token.to_string())),
    }
}

fn lower<V, R>(node: &Node, resolve: &R) -> Result<Expr<V>, ExprError>
where
    R: Fn(&str) -> Option<V>,
{
    let binary = |op: BinaryOp, token: &str| -> Result<Expr<V>, ExprError> {
        match node.children() {
            [l, r] => Ok(Expr::Binary(
                op,
                Box::new(lower(l, resolve)?),
                Box::new(lower(r, resolve)?),
            )),
            _ => Err(ExprError::Unsupported(token.to_string())),
        }
    };

    match node.operator() {
        Operator::RootNode => lower(only_child(node, "()")?, resolve),
        Operator::Add => binary(BinaryOp::Add, "+"),
        Operator::Sub => binary(BinaryOp::Sub, "-"),
        Operator::Mul => binary(BinaryOp::Mul, "*"),
        Operator::Div => binary(BinaryOp::Div, "/"),
        Operator::Mod => binary(BinaryOp::Mod, "%"),
        Operator::Exp => binary(BinaryOp::Pow, "^"),
        Operator::Neg => Ok(Expr::Neg(Box::new(lower(only_child(node, "-")?, resolve)?))),
        Operator::Const { value } => match value {
            Value::Float(x) => Ok(Expr::Number(*x)),
            Value::Int(i) => Ok(Expr::Number(*i as f64)),
            other => Err(ExprError::Unsupported(other.to_string())),
        },
        Operator::VariableIdentifierRead { identifier } => resolve(identifier)
            .map(Expr::Variable)
            .ok_or_else(|| ExprError::UnknownVariable(identifier.clone())),
        Operator::FunctionIdentifier { identifier } => {
            let func = Func::from_name(identifier)
                .ok_or_else(|| ExprError::UnknownFunction(identifier.clone()))?;
            let arg = lower(only_child(node, identifier)?, resolve)?;
            Ok(Expr::Call(func, Box::new(arg)))
        }
        other => Err(ExprError::Unsupported(format!("{other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Var {
        X,
        Y,
    }

    fn resolve(name: &str) -> Option<Var> {
        match name.to_ascii_uppercase().as_str() {
            "X" => Some(Var::X),
            "Y" => Some(Var::Y),
            _ => None,
        }
    }

    fn values(v: Var) -> f64 {
        match v {
            Var::X => 2.0,
            Var::Y => 0.5,
        }
    }

    #[test]
    fn evaluates_arithmetic_with_precedence() {
        let e = MathExpr::compile("1 + 2 * x ^ 2 - y / 0.25", resolve).unwrap();
        assert_relative_eq!(e.eval(values), 7.0);
    }

    #[test]
    fn parentheses_and_negation() {
        let e = MathExpr::compile("-(x + y) * 2", resolve).unwrap();
        assert_relative_eq!(e.eval(values), -5.0);
    }

    #[test]
    fn functions_are_applied() {
        let e = MathExpr::compile("sqrt(x * 8) + step(y - 1) + abs(-3)", resolve).unwrap();
        assert_relative_eq!(e.eval(values), 7.0);
    }

    #[test]
    fn unknown_variable_fails_at_compile_time() {
        let err = MathExpr::compile("x + HGWX", resolve).unwrap_err();
        assert_eq!(err, ExprError::UnknownVariable("HGWX".to_string()));
    }

    #[test]
    fn unknown_function_is_reported() {
        let err = MathExpr::compile("foo(x)", resolve).unwrap_err();
        assert_eq!(err, ExprError::UnknownFunction("foo".to_string()));
    }

    #[test]
    fn malformed_and_empty_formulas_fail() {
        assert!(matches!(
            MathExpr::compile("2 * (x", resolve),
            Err(ExprError::Parse(_))
        ));
        assert_eq!(MathExpr::compile("   ", resolve), Err(ExprError::Empty));
    }

    #[test]
    fn comparison_operators_are_rejected() {
        assert!(matches!(
            MathExpr::compile("x > y", resolve),
            Err(ExprError::Unsupported(_))
        ));
    }

    #[test]
    fn keeps_source_text() {
        let e = MathExpr::compile("2*x", resolve).unwrap();
        assert_eq!(e.source(), "2*x");
        assert!(matches!(e.root, Expr::Binary(BinaryOp::Mul, _, _)));
    }
}
