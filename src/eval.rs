use std::collections::HashMap;

use thiserror::Error;

use crate::{
    error::CalcError,
    parse::{Op, RpnNode},
    system::{self, Builtin, BinaryFn, UnaryFn},
};

pub const DEFAULT_PRECISION: usize = 10;
pub const MAX_PRECISION: usize = 30;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("precision must be between 0 and {MAX_PRECISION}, got {0}")]
pub struct PrecisionOutOfRange(pub usize);

/// Variables plus the display precision of the shell.
///
/// The precision never affects evaluation, which always runs on full `f64`.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, f64>,
    precision: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        let mut env = Environment {
            vars: HashMap::new(),
            precision: DEFAULT_PRECISION,
        };
        env.seed_constants();
        env
    }

    fn seed_constants(&mut self) {
        self.vars.insert("pi".to_string(), std::f64::consts::PI);
        self.vars.insert("e".to_string(), std::f64::consts::E);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.vars.insert(name.into(), value);
    }

    /// Drops every user variable and restores `pi` and `e`.
    pub fn clear(&mut self) {
        self.vars.clear();
        self.seed_constants();
    }

    /// All variables sorted by name.
    pub fn vars(&self) -> Vec<(&str, f64)> {
        let mut vars: Vec<_> = self.vars.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        vars.sort_unstable_by(|a, b| a.0.cmp(b.0));
        vars
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn set_precision(&mut self, precision: usize) -> Result<(), PrecisionOutOfRange> {
        if precision > MAX_PRECISION {
            return Err(PrecisionOutOfRange(precision));
        }
        self.precision = precision;
        Ok(())
    }
}

/// Outcome of running one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Value(f64),
    Assigned { name: String, value: f64 },
}

impl Evaluation {
    pub fn value(&self) -> f64 {
        match self {
            Evaluation::Value(value) | Evaluation::Assigned { value, .. } => *value,
        }
    }
}

enum Resolved {
    Unary(UnaryFn),
    Binary(BinaryFn),
    Variable(f64),
    Unknown,
}

fn resolve(name: &str, env: &Environment) -> Resolved {
    match system::lookup(name) {
        Some(Builtin::Unary(f)) => Resolved::Unary(f),
        Some(Builtin::Binary(f)) => Resolved::Binary(f),
        None => match env.get(name) {
            Some(value) => Resolved::Variable(value),
            None => Resolved::Unknown,
        },
    }
}

/// Runs `rpn`, assigning into `env` when the program has the
/// `name = expression` shape. `env` is untouched on any error.
pub fn execute(rpn: &[RpnNode<'_>], env: &mut Environment) -> Result<Evaluation, CalcError> {
    if !rpn.contains(&RpnNode::AssignMarker) {
        return run(rpn, env).map(Evaluation::Value);
    }

    let [RpnNode::Reference(name), RpnNode::AssignMarker, rhs @ ..] = rpn else {
        return Err(CalcError::InvalidAssignment);
    };
    if rhs.is_empty() || rhs.contains(&RpnNode::AssignMarker) {
        return Err(CalcError::InvalidAssignment);
    }

    let value = run(rhs, env)?;
    log::debug!("{name} = {value}");
    env.set(*name, value);
    Ok(Evaluation::Assigned {
        name: name.to_string(),
        value,
    })
}

pub fn evaluate(rpn: &[RpnNode<'_>], env: &mut Environment) -> Result<f64, CalcError> {
    execute(rpn, env).map(|evaluation| evaluation.value())
}

fn run(rpn: &[RpnNode<'_>], env: &Environment) -> Result<f64, CalcError> {
    let mut stack: Vec<f64> = Vec::with_capacity(rpn.len());

    for node in rpn {
        match *node {
            RpnNode::Number(n) => stack.push(n),
            RpnNode::Reference(name) => match resolve(name, env) {
                Resolved::Unary(f) => {
                    let Some(a) = stack.pop() else {
                        return Err(CalcError::MissingArgument {
                            name: name.to_string(),
                        });
                    };
                    stack.push(f(a));
                }
                Resolved::Binary(f) => {
                    let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) else {
                        return Err(CalcError::MissingArguments {
                            name: name.to_string(),
                        });
                    };
                    stack.push(f(lhs, rhs));
                }
                Resolved::Variable(value) => stack.push(value),
                Resolved::Unknown => {
                    return Err(CalcError::UndefinedVariable {
                        name: name.to_string(),
                    });
                }
            },
            RpnNode::Operator(op) => {
                if stack.len() < op.arity() {
                    return Err(CalcError::InsufficientStack { op });
                }
                let result = apply(op, &mut stack)?;
                stack.push(result);
            }
            // arity is already structural at this point
            RpnNode::ArgumentSeparator => {}
            RpnNode::AssignMarker => return Err(CalcError::InvalidAssignment),
        }
        log::trace!("{node} -> {stack:?}");
    }

    match stack.as_slice() {
        [value] => Ok(*value),
        rest => Err(CalcError::InvalidExpression {
            remaining: rest.len(),
        }),
    }
}

/// Pops the operands of `op` and computes the result.
fn apply(op: Op, stack: &mut Vec<f64>) -> Result<f64, CalcError> {
    let rhs = stack.pop().ok_or(CalcError::InsufficientStack { op })?;
    let mut lhs = || stack.pop().ok_or(CalcError::InsufficientStack { op });
    Ok(match op {
        Op::Neg => -rhs,
        Op::Add => lhs()? + rhs,
        Op::Sub => lhs()? - rhs,
        Op::Mul => lhs()? * rhs,
        Op::Div => {
            let lhs = lhs()?;
            if rhs == 0.0 {
                return Err(CalcError::DivisionByZero);
            }
            lhs / rhs
        }
        // NaN and infinities flow through untouched
        Op::Pow => lhs()?.powf(rhs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, parse::parse};

    fn eval(text: &str, env: &mut Environment) -> Result<f64, CalcError> {
        let rpn = parse(text)?;
        evaluate(&rpn, env)
    }

    #[test]
    fn arithmetic() {
        let mut env = Environment::new();
        assert_eq!(eval("2+3*4", &mut env).unwrap(), 14.0);
        assert_eq!(eval("(2+3)*4", &mut env).unwrap(), 20.0);
        assert_eq!(eval("2^3^2", &mut env).unwrap(), 512.0);
        assert_eq!(eval("-2^2", &mut env).unwrap(), -4.0);
        assert_eq!(eval("2^-2", &mut env).unwrap(), 0.25);
        assert_eq!(eval("7/2", &mut env).unwrap(), 3.5);
    }

    #[test]
    fn power_domain_is_not_an_error() {
        let mut env = Environment::new();
        assert!(eval("(-8)^0.5", &mut env).unwrap().is_nan());
        assert_eq!(eval("0^-1", &mut env).unwrap(), f64::INFINITY);
    }

    #[test]
    fn division_by_zero_keeps_environment() {
        let mut env = Environment::new();
        let err = eval("z = 5/0", &mut env).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert!(!env.contains("z"));
    }

    #[test]
    fn negative_zero_divisor_is_zero() {
        let mut env = Environment::new();
        let err = eval("1/(-0)", &mut env).unwrap_err();
        assert!(matches!(err, CalcError::DivisionByZero));
    }

    #[test]
    fn assignment_stores_value() {
        let mut env = Environment::new();
        let rpn = parse("x = 2*3").unwrap();
        let evaluation = execute(&rpn, &mut env).unwrap();
        assert_eq!(
            evaluation,
            Evaluation::Assigned {
                name: "x".into(),
                value: 6.0
            }
        );
        assert_eq!(env.get("x"), Some(6.0));
    }

    #[test]
    fn malformed_assignments() {
        let mut env = Environment::new();
        for text in ["2 = 3", "x =", "x = y = 1", "1 + x = 2", "-x = 3", "x - = 3"] {
            let err = eval(text, &mut env).unwrap_err();
            assert!(
                matches!(err, CalcError::InvalidAssignment),
                "{text}: {err}"
            );
            assert!(!env.contains("x"), "{text}");
        }
    }

    #[test]
    fn functions_shadow_variables() {
        let mut env = Environment::new();
        env.set("sin", 10.0);
        assert_eq!(eval("(0) sin", &mut env).unwrap(), 0.0);
    }

    #[test]
    fn binary_function_operand_order() {
        let mut env = Environment::new();
        assert_eq!(eval("(2 8) pow", &mut env).unwrap(), 256.0);
        assert_eq!(eval("(8 2) pow", &mut env).unwrap(), 64.0);
    }

    #[test]
    fn arity_errors() {
        let mut env = Environment::new();
        assert!(matches!(
            eval("sqrt", &mut env),
            Err(CalcError::MissingArgument { .. })
        ));
        assert!(matches!(
            eval("(2) pow", &mut env),
            Err(CalcError::MissingArguments { .. })
        ));
        assert!(matches!(
            eval("+2", &mut env),
            Err(CalcError::InsufficientStack { op: Op::Add })
        ));
    }

    #[test]
    fn undefined_variable() {
        let mut env = Environment::new();
        let err = eval("y+1", &mut env).unwrap_err();
        assert_eq!(err.to_string(), "undefined variable: y");
        assert!(!env.contains("y"));
    }

    #[test]
    fn leftover_operands_are_a_shape_error() {
        let mut env = Environment::new();
        let err = eval("(1, 2)", &mut env).unwrap_err();
        assert!(matches!(err, CalcError::InvalidExpression { remaining: 2 }));
        assert_eq!(err.kind(), ErrorKind::Shape);

        let err = evaluate(&[], &mut env).unwrap_err();
        assert!(matches!(err, CalcError::InvalidExpression { remaining: 0 }));
    }

    #[test]
    fn clear_restores_constants() {
        let mut env = Environment::new();
        env.set("x", 1.0);
        env.set("pi", 3.0);
        env.clear();
        assert!(!env.contains("x"));
        assert_eq!(env.get("pi"), Some(std::f64::consts::PI));
        assert_eq!(env.get("e"), Some(std::f64::consts::E));
    }

    #[test]
    fn precision_is_bounded() {
        let mut env = Environment::new();
        assert_eq!(env.precision(), DEFAULT_PRECISION);
        assert!(env.set_precision(30).is_ok());
        assert_eq!(env.set_precision(31), Err(PrecisionOutOfRange(31)));
        assert_eq!(env.precision(), 30);
    }

    #[test]
    fn vars_are_sorted() {
        let mut env = Environment::new();
        env.set("b", 2.0);
        env.set("a", 1.0);
        let names: Vec<_> = env.vars().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b", "e", "pi"]);
    }
}
