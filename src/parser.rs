//! Expression grammar. There is no operator precedence; every binary operator
//! takes the rest of the expression as its right operand, so `a - b - c`
//! parses as `a - (b - c)`.
//!
//! ``` BNF
//! expression → term ( op term )* ;
//! term       → INTEGER | STRING | "true" | "false" | "null" | "this"
//!            | ( "-" | "~" ) term
//!            | "(" expression ")"
//!            | IDENTIFIER
//!            | IDENTIFIER "[" expression "]"
//!            | IDENTIFIER "(" arguments ")"
//!            | IDENTIFIER "." IDENTIFIER "(" arguments ")" ;
//! arguments  → ( expression ( "," expression )* )? ;
//! ```

use crate::ast::{BinaryOp, CallKind, Expression, KeywordConstant, SubroutineCall, UnaryOp};
use crate::common::{CompileError, CompileResult};
use crate::lexer::{Keyword, TokenType};
use crate::symbol_table::SymbolTable;
use crate::tokenizer::Tokenizer;

/// What an identifier at the start of a term refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Variable,
    ArrayElement,
    ImplicitCall,
    MethodCall,
    FunctionCall,
}

/// Decides the shape of a term starting with `name`, given the symbol that
/// follows it. Returns `None` when `name` is used as a variable but was never
/// declared.
pub fn classify_reference(name: &str, next: Option<char>, symbols: &SymbolTable) -> Option<Reference> {
    match next {
        Some('(') => Some(Reference::ImplicitCall),
        Some('.') if symbols.contains(name) => Some(Reference::MethodCall),
        Some('.') => Some(Reference::FunctionCall),
        Some('[') if symbols.contains(name) => Some(Reference::ArrayElement),
        _ if symbols.contains(name) => Some(Reference::Variable),
        _ => None,
    }
}

/// Deepest nesting of parenthesised, unary, indexed or argument terms the
/// parser accepts.
pub const MAX_NESTING: usize = 256;

pub struct Parser<'p, 'a> {
    tokens: &'p mut Tokenizer<'a>,
    symbols: &'p SymbolTable,
    class_name: &'a str,
    depth: usize,
}

impl<'p, 'a> Parser<'p, 'a> {
    pub fn new(tokens: &'p mut Tokenizer<'a>, symbols: &'p SymbolTable, class_name: &'a str) -> Self {
        Self {
            tokens,
            symbols,
            class_name,
            depth: 0,
        }
    }

    /// Reads `term (op term)*` in a loop and folds it from the right, so
    /// `a op b op c` becomes `a op (b op c)`.
    pub fn expression(&mut self) -> CompileResult<Expression<'a>> {
        let mut operands = vec![self.term()?];
        let mut operators = Vec::new();
        while let Some(operator) = self.tokens.symbol().and_then(BinaryOp::from_symbol) {
            self.tokens.advance()?;
            operators.push(operator);
            operands.push(self.term()?);
        }

        let mut node = operands.pop().ok_or_else(|| self.tokens.error("expression"))?;
        for (operator, lhs) in operators.into_iter().rev().zip(operands.into_iter().rev()) {
            node = Expression::Binary(operator, Box::new(lhs), Box::new(node));
        }
        Ok(node)
    }

    /// Parses the call of a `do` statement.
    pub fn subroutine_call(&mut self) -> CompileResult<SubroutineCall<'a>> {
        let name = match self.tokens.identifier() {
            Some(name) => name,
            None => return Err(self.tokens.error("subroutine call")),
        };
        let token = self.tokens.index();
        match self.resolve(name)? {
            Reference::Variable | Reference::ArrayElement => Err(CompileError::Syntax {
                expected: "subroutine call".to_string(),
                found: format!("identifier '{}'", name),
                token,
            }),
            reference => self.call(name, reference),
        }
    }

    fn term(&mut self) -> CompileResult<Expression<'a>> {
        if self.depth == MAX_NESTING {
            return Err(self.tokens.error("shallower expression"));
        }
        self.depth += 1;
        let node = self.nested_term();
        self.depth -= 1;
        node
    }

    fn nested_term(&mut self) -> CompileResult<Expression<'a>> {
        if let Some(value) = self.tokens.int_val() {
            self.tokens.advance()?;
            return Ok(Expression::IntLiteral(value));
        }
        if let Some(value) = self.tokens.string_val() {
            self.tokens.advance()?;
            return Ok(Expression::StrLiteral(value));
        }
        if let Some(name) = self.tokens.identifier() {
            return self.reference(name);
        }

        let node = match self.tokens.token_type() {
            Some(TokenType::Keyword(keyword)) => {
                let constant = match keyword {
                    Keyword::True => KeywordConstant::True,
                    Keyword::False => KeywordConstant::False,
                    Keyword::Null => KeywordConstant::Null,
                    Keyword::This => KeywordConstant::This,
                    _ => return Err(self.tokens.error("expression")),
                };
                self.tokens.advance()?;
                Expression::KeywordConstant(constant)
            }
            Some(TokenType::Symbol('(')) => {
                self.tokens.advance()?;
                let inner = self.expression()?;
                self.tokens.consume_symbol(')')?;
                inner
            }
            Some(TokenType::Symbol(c)) => match UnaryOp::from_symbol(c) {
                Some(operator) => {
                    self.tokens.advance()?;
                    let operand = self.term()?;
                    Expression::Unary(operator, Box::new(operand))
                }
                None => return Err(self.tokens.error("expression")),
            },
            _ => return Err(self.tokens.error("expression")),
        };
        Ok(node)
    }

    /// Parses a term whose current token is the identifier `name`.
    fn reference(&mut self, name: &'a str) -> CompileResult<Expression<'a>> {
        let node = match self.resolve(name)? {
            Reference::Variable => Expression::Variable(name),
            Reference::ArrayElement => {
                self.tokens.consume_symbol('[')?;
                let index = self.expression()?;
                self.tokens.consume_symbol(']')?;
                Expression::Index(name, Box::new(index))
            }
            reference => Expression::Call(self.call(name, reference)?),
        };
        Ok(node)
    }

    /// Classifies the identifier `name` and steps past it.
    fn resolve(&mut self, name: &'a str) -> CompileResult<Reference> {
        let token = self.tokens.index();
        let next = self.tokens.peek()?.and_then(|t| match t.tok_type {
            TokenType::Symbol(c) => Some(c),
            _ => None,
        });
        let reference = classify_reference(name, next, self.symbols).ok_or_else(|| {
            CompileError::UnresolvedReference {
                name: name.to_string(),
                token,
            }
        })?;
        self.tokens.advance()?;
        Ok(reference)
    }

    /// The rest of a call once `name` has been consumed.
    fn call(&mut self, name: &'a str, reference: Reference) -> CompileResult<SubroutineCall<'a>> {
        if reference == Reference::ImplicitCall {
            return Ok(SubroutineCall {
                kind: CallKind::Implicit,
                target: self.class_name,
                selector: name,
                arguments: self.arguments()?,
            });
        }
        self.tokens.consume_symbol('.')?;
        let selector = self.tokens.consume_identifier("subroutine name")?;
        let kind = if reference == Reference::MethodCall {
            CallKind::Method
        } else {
            CallKind::Function
        };
        Ok(SubroutineCall {
            kind,
            target: name,
            selector,
            arguments: self.arguments()?,
        })
    }

    fn arguments(&mut self) -> CompileResult<Vec<Expression<'a>>> {
        self.tokens.consume_symbol('(')?;
        let mut arguments = Vec::new();
        if !self.tokens.check_symbol(')') {
            arguments.push(self.expression()?);
            while self.tokens.check_symbol(',') {
                self.tokens.advance()?;
                arguments.push(self.expression()?);
            }
        }
        self.tokens.consume_symbol(')')?;
        Ok(arguments)
    }
}
