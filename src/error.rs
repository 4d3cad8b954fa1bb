use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::parse::Op;

/// Broad class of a [`CalcError`], used by callers that only care about
/// what went wrong rather than the exact message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Arity,
    Name,
    Domain,
    Shape,
}

#[derive(Error, Debug, Diagnostic)]
pub enum CalcError {
    #[error("invalid symbol '{symbol}'")]
    #[diagnostic(
        code(supercalc::lexical),
        help("only numbers, identifiers and `( ) + - * / ^ = ,` are understood")
    )]
    InvalidSymbol {
        symbol: char,
        #[source_code]
        src: String,
        #[label("this character")]
        span: SourceSpan,
    },

    #[error("invalid numeric literal '{literal}'")]
    #[diagnostic(code(supercalc::lexical))]
    InvalidNumber {
        literal: String,
        #[source_code]
        src: String,
        #[label("this numeric literal")]
        span: SourceSpan,
    },

    #[error("unbalanced parentheses")]
    #[diagnostic(
        code(supercalc::syntax),
        help("every `(` needs a matching `)`")
    )]
    UnbalancedParens,

    #[error("unbalanced parentheses in call to `{name}`")]
    #[diagnostic(code(supercalc::syntax))]
    UnbalancedCall {
        name: String,
        #[source_code]
        src: String,
        #[label("this call is never closed")]
        span: SourceSpan,
    },

    #[error("comma out of context")]
    #[diagnostic(
        code(supercalc::syntax),
        help("commas only separate the arguments of a function call")
    )]
    StrayComma,

    #[error("invalid assignment, use: name = expression")]
    #[diagnostic(code(supercalc::syntax))]
    InvalidAssignment,

    #[error("missing argument for function `{name}`")]
    #[diagnostic(code(supercalc::arity))]
    MissingArgument { name: String },

    #[error("missing arguments for function `{name}`")]
    #[diagnostic(code(supercalc::arity))]
    MissingArguments { name: String },

    #[error("insufficient stack for operator `{op}`")]
    #[diagnostic(code(supercalc::arity))]
    InsufficientStack { op: Op },

    #[error("undefined variable: {name}")]
    #[diagnostic(
        code(supercalc::name),
        help("assign it first, e.g. `{name} = 1`")
    )]
    UndefinedVariable { name: String },

    #[error("division by zero")]
    #[diagnostic(code(supercalc::domain))]
    DivisionByZero,

    #[error("invalid expression")]
    #[diagnostic(
        code(supercalc::shape),
        help("the expression left {remaining} values instead of exactly one")
    )]
    InvalidExpression { remaining: usize },
}

impl CalcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::InvalidSymbol { .. } | CalcError::InvalidNumber { .. } => ErrorKind::Lexical,
            CalcError::UnbalancedParens
            | CalcError::UnbalancedCall { .. }
            | CalcError::StrayComma
            | CalcError::InvalidAssignment => ErrorKind::Syntax,
            CalcError::MissingArgument { .. }
            | CalcError::MissingArguments { .. }
            | CalcError::InsufficientStack { .. } => ErrorKind::Arity,
            CalcError::UndefinedVariable { .. } => ErrorKind::Name,
            CalcError::DivisionByZero => ErrorKind::Domain,
            CalcError::InvalidExpression { .. } => ErrorKind::Shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_like_the_shell_prints_them() {
        let err = CalcError::UndefinedVariable { name: "y".into() };
        assert_eq!(err.to_string(), "undefined variable: y");
        assert_eq!(err.kind(), ErrorKind::Name);

        let err = CalcError::InsufficientStack { op: Op::Neg };
        assert_eq!(err.to_string(), "insufficient stack for operator `u-`");
        assert_eq!(err.kind(), ErrorKind::Arity);
    }

    #[test]
    fn lexical_errors_point_at_the_symbol() {
        let err = CalcError::InvalidSymbol {
            symbol: '$',
            src: "2 $ 3".into(),
            span: SourceSpan::from(2..3),
        };
        assert_eq!(err.kind(), ErrorKind::Lexical);
        let labels: Vec<_> = err.labels().expect("labels").collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 2);
    }
}
