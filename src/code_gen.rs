use std::convert::TryFrom;

use crate::ast::{BinaryOp, CallKind, Expression, KeywordConstant, SubroutineCall, UnaryOp};
use crate::common::{CompileError, CompileResult};
use crate::lexer::MAX_INT_CONSTANT;
use crate::symbol_table::{Kind, SymbolTable};
use crate::vm_writer::{Command, Segment, VmWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// Lowers expression trees into VM instructions for one subroutine body.
pub struct Generator<'g> {
    writer: &'g mut VmWriter,
    symbols: &'g SymbolTable,
    subroutine_kind: SubroutineKind,
    /// Token position reported if a name fails to resolve.
    token: usize,
}

impl<'g> Generator<'g> {
    pub fn new(
        writer: &'g mut VmWriter,
        symbols: &'g SymbolTable,
        subroutine_kind: SubroutineKind,
        token: usize,
    ) -> Self {
        Self {
            writer,
            symbols,
            subroutine_kind,
            token,
        }
    }

    pub fn generate(&mut self, expression: &Expression<'_>) -> CompileResult<()> {
        match expression {
            Expression::IntLiteral(value) => self.writer.write_push(Segment::Constant, *value),
            Expression::StrLiteral(value) => self.string(value)?,
            Expression::KeywordConstant(constant) => self.keyword_constant(*constant),
            Expression::Variable(name) => self.push_variable(name)?,
            Expression::Index(name, index) => {
                self.generate(index)?;
                self.push_variable(name)?;
                self.writer.write_arithmetic(Command::Add);
                self.writer.write_pop(Segment::Pointer, 1);
                self.writer.write_push(Segment::That, 0);
            }
            Expression::Unary(operator, operand) => {
                self.generate(operand)?;
                let command = match operator {
                    UnaryOp::Neg => Command::Neg,
                    UnaryOp::Not => Command::Not,
                };
                self.writer.write_arithmetic(command);
            }
            Expression::Binary(..) => {
                // Walk the right spine with a loop; chains can be arbitrarily long.
                let mut operators = Vec::new();
                let mut node = expression;
                while let Expression::Binary(operator, lhs, rhs) = node {
                    self.generate(lhs)?;
                    operators.push(*operator);
                    node = &**rhs;
                }
                self.generate(node)?;
                for operator in operators.into_iter().rev() {
                    self.binary(operator);
                }
            }
            Expression::Call(call) => self.call(call)?,
        }
        Ok(())
    }

    pub fn push_variable(&mut self, name: &str) -> CompileResult<()> {
        let (segment, index) = self.locate(name)?;
        self.writer.write_push(segment, index);
        Ok(())
    }

    pub fn pop_variable(&mut self, name: &str) -> CompileResult<()> {
        let (segment, index) = self.locate(name)?;
        self.writer.write_pop(segment, index);
        Ok(())
    }

    /// Stores the value on top of the stack at `name[index]`, where the index
    /// sits directly beneath the value.
    pub fn pop_indexed(&mut self, name: &str) -> CompileResult<()> {
        self.writer.write_pop(Segment::Temp, 0);
        self.push_variable(name)?;
        self.writer.write_arithmetic(Command::Add);
        self.writer.write_pop(Segment::Pointer, 1);
        self.writer.write_push(Segment::Temp, 0);
        self.writer.write_pop(Segment::That, 0);
        Ok(())
    }

    pub fn call(&mut self, call: &SubroutineCall<'_>) -> CompileResult<()> {
        let mut num_args = call.arguments.len() as u16;
        let class_name = match call.kind {
            CallKind::Implicit => {
                if self.subroutine_kind == SubroutineKind::Method {
                    self.writer.write_push(Segment::Pointer, 0);
                    num_args += 1;
                }
                call.target
            }
            CallKind::Method => {
                self.push_variable(call.target)?;
                num_args += 1;
                self.symbols
                    .type_of(call.target)
                    .ok_or_else(|| self.unresolved(call.target))?
            }
            CallKind::Function => call.target,
        };
        let name = format!("{}.{}", class_name, call.selector);
        for argument in &call.arguments {
            self.generate(argument)?;
        }
        self.writer.write_call(&name, num_args);
        Ok(())
    }

    /// Segment and index of a declared variable. Explicit arguments of a
    /// method start at 1 because argument 0 holds the receiver.
    fn locate(&self, name: &str) -> CompileResult<(Segment, u16)> {
        let symbol = self.symbols.get(name).ok_or_else(|| self.unresolved(name))?;
        let index = if symbol.kind == Kind::Argument && self.subroutine_kind == SubroutineKind::Method {
            symbol.index + 1
        } else {
            symbol.index
        };
        Ok((symbol.kind.segment(), index))
    }

    fn unresolved(&self, name: &str) -> CompileError {
        CompileError::UnresolvedReference {
            name: name.to_string(),
            token: self.token,
        }
    }

    /// String constants are printable ASCII, so each byte is one character
    /// code.
    fn string(&mut self, value: &str) -> CompileResult<()> {
        let length = match u16::try_from(value.len()) {
            Ok(length) if length <= MAX_INT_CONSTANT => length,
            _ => {
                return Err(CompileError::Syntax {
                    expected: "shorter string constant".to_string(),
                    found: format!("string of {} characters", value.len()),
                    token: self.token,
                })
            }
        };
        self.writer.write_push(Segment::Constant, length);
        self.writer.write_call("String.new", 1);
        for byte in value.bytes() {
            self.writer.write_push(Segment::Constant, u16::from(byte));
            self.writer.write_call("String.appendChar", 2);
        }
        Ok(())
    }

    fn keyword_constant(&mut self, constant: KeywordConstant) {
        match constant {
            KeywordConstant::True => {
                self.writer.write_push(Segment::Constant, 0);
                self.writer.write_arithmetic(Command::Not);
            }
            KeywordConstant::False | KeywordConstant::Null => {
                self.writer.write_push(Segment::Constant, 0)
            }
            KeywordConstant::This => self.writer.write_push(Segment::Pointer, 0),
        }
    }

    fn binary(&mut self, operator: BinaryOp) {
        let command = match operator {
            BinaryOp::Add => Command::Add,
            BinaryOp::Sub => Command::Sub,
            BinaryOp::And => Command::And,
            BinaryOp::Or => Command::Or,
            BinaryOp::Less => Command::Lt,
            BinaryOp::Greater => Command::Gt,
            BinaryOp::Equal => Command::Eq,
            BinaryOp::Mul => return self.writer.write_call("Math.multiply", 2),
            BinaryOp::Div => return self.writer.write_call("Math.divide", 2),
        };
        self.writer.write_arithmetic(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression::*;

    fn lower(expression: &Expression<'_>, symbols: &SymbolTable, kind: SubroutineKind) -> String {
        let mut writer = VmWriter::new();
        Generator::new(&mut writer, symbols, kind, 0)
            .generate(expression)
            .unwrap();
        writer.into_output()
    }

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    fn table() -> SymbolTable {
        let mut symbols = SymbolTable::new();
        symbols.define("count", "int", Kind::Static);
        symbols.define("size", "int", Kind::Field);
        symbols.define("a", "int", Kind::Argument);
        symbols.define("b", "Point", Kind::Argument);
        symbols.define("i", "int", Kind::Local);
        symbols
    }

    #[test]
    fn variables_use_their_segments() {
        let symbols = table();
        let text = lower(
            &Binary(
                BinaryOp::Add,
                Box::new(Variable("count")),
                Box::new(Binary(
                    BinaryOp::Add,
                    Box::new(Variable("size")),
                    Box::new(Binary(BinaryOp::Add, Box::new(Variable("a")), Box::new(Variable("i")))),
                )),
            ),
            &symbols,
            SubroutineKind::Function,
        );
        assert_eq!(
            lines(&text),
            vec![
                "push static 0",
                "push this 0",
                "push argument 0",
                "push local 0",
                "add",
                "add",
                "add",
            ]
        );
    }

    #[test]
    fn method_arguments_skip_receiver_slot() {
        let symbols = table();
        assert_eq!(lower(&Variable("a"), &symbols, SubroutineKind::Method), "push argument 1\n");
        assert_eq!(lower(&Variable("b"), &symbols, SubroutineKind::Method), "push argument 2\n");
        assert_eq!(lower(&Variable("i"), &symbols, SubroutineKind::Method), "push local 0\n");
    }

    #[test]
    fn keyword_constants() {
        let symbols = SymbolTable::new();
        let kind = SubroutineKind::Method;
        assert_eq!(lower(&KeywordConstant(crate::ast::KeywordConstant::True), &symbols, kind), "push constant 0\nnot\n");
        assert_eq!(lower(&KeywordConstant(crate::ast::KeywordConstant::False), &symbols, kind), "push constant 0\n");
        assert_eq!(lower(&KeywordConstant(crate::ast::KeywordConstant::Null), &symbols, kind), "push constant 0\n");
        assert_eq!(lower(&KeywordConstant(crate::ast::KeywordConstant::This), &symbols, kind), "push pointer 0\n");
    }

    #[test]
    fn string_literal_builds_string_object() {
        let text = lower(&StrLiteral("Hi"), &SymbolTable::new(), SubroutineKind::Function);
        assert_eq!(
            lines(&text),
            vec![
                "push constant 2",
                "call String.new 1",
                "push constant 72",
                "call String.appendChar 2",
                "push constant 105",
                "call String.appendChar 2",
            ]
        );
    }

    #[test]
    fn oversized_string_is_an_error() {
        let mut writer = VmWriter::new();
        let symbols = SymbolTable::new();
        let long = "a".repeat(MAX_INT_CONSTANT as usize + 1);
        let err = Generator::new(&mut writer, &symbols, SubroutineKind::Function, 4)
            .generate(&StrLiteral(&long))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected shorter string constant, found string of 32768 characters at token 4"
        );
        assert_eq!(writer.into_output(), "");
    }

    #[test]
    fn array_read_goes_through_that() {
        let symbols = table();
        let text = lower(&Index("size", Box::new(IntLiteral(3))), &symbols, SubroutineKind::Method);
        assert_eq!(
            lines(&text),
            vec!["push constant 3", "push this 0", "add", "pop pointer 1", "push that 0"]
        );
    }

    #[test]
    fn multiply_and_divide_call_math() {
        let text = lower(
            &Binary(
                BinaryOp::Mul,
                Box::new(IntLiteral(6)),
                Box::new(Binary(BinaryOp::Div, Box::new(IntLiteral(4)), Box::new(Unary(UnaryOp::Neg, Box::new(IntLiteral(2)))))),
            ),
            &SymbolTable::new(),
            SubroutineKind::Function,
        );
        assert_eq!(
            lines(&text),
            vec![
                "push constant 6",
                "push constant 4",
                "push constant 2",
                "neg",
                "call Math.divide 2",
                "call Math.multiply 2",
            ]
        );
    }

    #[test]
    fn call_shapes() {
        let symbols = table();
        let implicit = Call(SubroutineCall {
            kind: CallKind::Implicit,
            target: "Foo",
            selector: "bloop",
            arguments: vec![IntLiteral(1)],
        });
        assert_eq!(
            lines(&lower(&implicit, &symbols, SubroutineKind::Method)),
            vec!["push pointer 0", "push constant 1", "call Foo.bloop 2"]
        );
        assert_eq!(
            lines(&lower(&implicit, &symbols, SubroutineKind::Function)),
            vec!["push constant 1", "call Foo.bloop 1"]
        );

        let method = Call(SubroutineCall {
            kind: CallKind::Method,
            target: "b",
            selector: "getX",
            arguments: vec![],
        });
        assert_eq!(
            lines(&lower(&method, &symbols, SubroutineKind::Function)),
            vec!["push argument 1", "call Point.getX 1"]
        );

        let function = Call(SubroutineCall {
            kind: CallKind::Function,
            target: "Math",
            selector: "max",
            arguments: vec![IntLiteral(1), Variable("i")],
        });
        assert_eq!(
            lines(&lower(&function, &symbols, SubroutineKind::Function)),
            vec!["push constant 1", "push local 0", "call Math.max 2"]
        );
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let mut writer = VmWriter::new();
        let symbols = SymbolTable::new();
        let err = Generator::new(&mut writer, &symbols, SubroutineKind::Function, 7)
            .generate(&Variable("ghost"))
            .unwrap_err();
        assert_eq!(err.to_string(), "unresolved reference 'ghost' at token 7");
    }
}
