//! Expression trees built by the parser and consumed by the code generator.
//!
//! A tree only lives for the compilation of one expression; every node owns
//! its children and identifier text borrows from the source buffer.

#[derive(Debug, Clone, PartialEq)]
pub enum Expression<'a> {
    IntLiteral(u16),
    StrLiteral(&'a str),
    KeywordConstant(KeywordConstant),
    Variable(&'a str),
    Index(&'a str, Box<Expression<'a>>),
    Unary(UnaryOp, Box<Expression<'a>>),
    Binary(BinaryOp, Box<Expression<'a>>, Box<Expression<'a>>),
    Call(SubroutineCall<'a>),
}

impl<'a> Drop for Expression<'a> {
    /// Unlinks the right spine of a binary chain one node at a time so that
    /// long chains don't recurse through the default drop glue.
    fn drop(&mut self) {
        let mut spine = match self {
            Expression::Binary(_, _, rhs) => std::mem::replace(&mut **rhs, Expression::IntLiteral(0)),
            _ => return,
        };
        while let Expression::Binary(_, _, rhs) = &mut spine {
            let next = std::mem::replace(&mut **rhs, Expression::IntLiteral(0));
            spine = next;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubroutineCall<'a> {
    pub kind: CallKind,
    /// Class name for `Function` and `Implicit` calls, variable name for `Method`.
    pub target: &'a str,
    pub selector: &'a str,
    pub arguments: Vec<Expression<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `selector(...)` on the enclosing class.
    Implicit,
    /// `variable.selector(...)`, the variable is passed as the receiver.
    Method,
    /// `ClassName.selector(...)`.
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordConstant {
    True,
    False,
    Null,
    This,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '-' => Some(UnaryOp::Neg),
            '~' => Some(UnaryOp::Not),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Less,
    Greater,
    Equal,
}

impl BinaryOp {
    pub fn from_symbol(c: char) -> Option<Self> {
        let op = match c {
            '+' => BinaryOp::Add,
            '-' => BinaryOp::Sub,
            '*' => BinaryOp::Mul,
            '/' => BinaryOp::Div,
            '&' => BinaryOp::And,
            '|' => BinaryOp::Or,
            '<' => BinaryOp::Less,
            '>' => BinaryOp::Greater,
            '=' => BinaryOp::Equal,
            _ => return None,
        };
        Some(op)
    }
}
