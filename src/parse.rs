use std::fmt::Display;

use crate::{
    Lexer,
    error::CalcError,
    lex::{Token, TokenKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    /// Unary minus, kept apart from [`Op::Sub`].
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub precedence: u8,
    pub right_assoc: bool,
    pub arity: usize,
}

impl Op {
    pub fn info(self) -> OpInfo {
        let (precedence, right_assoc, arity) = match self {
            Op::Add | Op::Sub => (1, false, 2),
            Op::Mul | Op::Div => (2, false, 2),
            // below `^` so that `-2^2` negates the power
            Op::Neg => (3, true, 1),
            Op::Pow => (4, true, 2),
        };
        OpInfo {
            precedence,
            right_assoc,
            arity,
        }
    }

    pub fn arity(self) -> usize {
        self.info().arity
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Pow => "^",
            Op::Neg => "u-",
        };
        f.write_str(symbol)
    }
}

/// One instruction of the postfix program produced by [`parse`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RpnNode<'de> {
    Number(f64),
    /// A name resolved at evaluation time: function first, then variable.
    Reference(&'de str),
    Operator(Op),
    ArgumentSeparator,
    AssignMarker,
}

impl Display for RpnNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpnNode::Number(n) => write!(f, "{n}"),
            RpnNode::Reference(name) => write!(f, "{name}"),
            RpnNode::Operator(op) => write!(f, "{op}"),
            RpnNode::ArgumentSeparator => write!(f, ","),
            RpnNode::AssignMarker => write!(f, "="),
        }
    }
}

/// Space separated rendering of a whole program, as printed by `supercalc rpn`.
pub struct DisplayRpn<'a, 'de>(pub &'a [RpnNode<'de>]);

impl Display for DisplayRpn<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, node) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Operator(Op),
    GroupOpen,
}

/// Shunting-yard conversion of one (already call-rewritten) line into RPN.
pub struct Parser<'de> {
    lexer: Lexer<'de>,
    output: Vec<RpnNode<'de>>,
    stack: Vec<Pending>,
}

impl<'de> Parser<'de> {
    pub fn new(whole: &'de str) -> Self {
        Parser {
            lexer: Lexer::new(whole),
            output: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Result<Vec<RpnNode<'de>>, CalcError> {
        let mut prev: Option<TokenKind> = None;
        let mut position = 0;

        loop {
            let (token, next) = self.lexer.next_token(position)?;
            position = next;
            log::trace!("token {token}");

            match token {
                Token {
                    kind: TokenKind::End,
                    ..
                } => break,
                Token {
                    kind: TokenKind::Number(n),
                    ..
                } => self.output.push(RpnNode::Number(n)),
                Token {
                    kind: TokenKind::Ident,
                    literal,
                    ..
                } => self.output.push(RpnNode::Reference(literal)),
                Token {
                    kind: TokenKind::Comma,
                    ..
                } => {
                    self.pop_until_group();
                    if self.stack.is_empty() {
                        return Err(CalcError::StrayComma);
                    }
                    self.output.push(RpnNode::ArgumentSeparator);
                }
                Token {
                    kind: TokenKind::LeftParen,
                    ..
                } => self.stack.push(Pending::GroupOpen),
                Token {
                    kind: TokenKind::RightParen,
                    ..
                } => {
                    self.pop_until_group();
                    if self.stack.pop().is_none() {
                        return Err(CalcError::UnbalancedParens);
                    }
                }
                Token {
                    kind: TokenKind::Equal,
                    ..
                } => {
                    // only a bare name may stand left of `=`
                    let target = matches!(self.output.as_slice(), [RpnNode::Reference(_)]);
                    let pending_op = self.stack.iter().any(|p| *p != Pending::GroupOpen);
                    if !target || pending_op {
                        return Err(CalcError::InvalidAssignment);
                    }
                    self.output.push(RpnNode::AssignMarker);
                }
                Token {
                    kind: TokenKind::Minus,
                    ..
                } if starts_operand(prev) => {
                    // a prefix operator has no left operand to reduce
                    self.stack.push(Pending::Operator(Op::Neg));
                }
                Token {
                    kind: TokenKind::Plus,
                    ..
                } => self.push_operator(Op::Add),
                Token {
                    kind: TokenKind::Minus,
                    ..
                } => self.push_operator(Op::Sub),
                Token {
                    kind: TokenKind::Star,
                    ..
                } => self.push_operator(Op::Mul),
                Token {
                    kind: TokenKind::Slash,
                    ..
                } => self.push_operator(Op::Div),
                Token {
                    kind: TokenKind::Caret,
                    ..
                } => self.push_operator(Op::Pow),
            }
            prev = Some(token.kind);
        }

        while let Some(pending) = self.stack.pop() {
            match pending {
                Pending::Operator(op) => self.output.push(RpnNode::Operator(op)),
                Pending::GroupOpen => return Err(CalcError::UnbalancedParens),
            }
        }
        Ok(self.output)
    }

    fn push_operator(&mut self, incoming: Op) {
        let info = incoming.info();
        while let Some(&Pending::Operator(top)) = self.stack.last() {
            let top_info = top.info();
            let binds_first = top_info.precedence > info.precedence
                || (top_info.precedence == info.precedence && !info.right_assoc);
            if !binds_first {
                break;
            }
            self.stack.pop();
            self.output.push(RpnNode::Operator(top));
        }
        self.stack.push(Pending::Operator(incoming));
    }

    /// Moves operators to the output until a group opener (left in place) or
    /// the bottom of the stack is reached.
    fn pop_until_group(&mut self) {
        while let Some(&Pending::Operator(op)) = self.stack.last() {
            self.stack.pop();
            self.output.push(RpnNode::Operator(op));
        }
    }
}

/// A `-` is unary at the start of input or right after `(`, `,`, `=` or
/// another operator.
fn starts_operand(prev: Option<TokenKind>) -> bool {
    match prev {
        None => true,
        Some(prev) => {
            prev.is_operator()
                || matches!(
                    prev,
                    TokenKind::LeftParen | TokenKind::Comma | TokenKind::Equal
                )
        }
    }
}

pub fn parse(text: &str) -> Result<Vec<RpnNode<'_>>, CalcError> {
    Parser::new(text).parse()
}
