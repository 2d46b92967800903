use std::io::Write;

use crate::code_gen::{Generator, SubroutineKind};
use crate::common::{CompileError, CompileResult};
use crate::lexer::{Keyword, TokenType};
use crate::parser::{Parser, MAX_NESTING};
use crate::symbol_table::{Kind, SymbolTable};
use crate::tokenizer::Tokenizer;
use crate::vm_writer::{Segment, VmWriter};

/// Compiles one class and returns its VM text.
pub fn compile(source: &str) -> CompileResult<String> {
    let mut engine = CompilationEngine::new(source);
    engine.compile_class()?;
    Ok(engine.writer.into_output())
}

/// Compiles one class into `sink`. Nothing is written unless the whole class
/// compiles.
pub fn compile_to<W: Write>(source: &str, sink: &mut W) -> CompileResult<()> {
    let output = compile(source)?;
    sink.write_all(output.as_bytes())?;
    Ok(())
}

/// Recursive-descent driver with one method per grammar production.
pub struct CompilationEngine<'a> {
    tokens: Tokenizer<'a>,
    symbols: SymbolTable,
    writer: VmWriter,
    class_name: &'a str,
    subroutine_kind: SubroutineKind,
    #[cfg_attr(not(feature = "debug-logging"), allow(dead_code))]
    return_type: &'a str,
    while_counter: usize,
    if_counter: usize,
    /// Depth of `{ }` statement blocks inside the current subroutine body.
    block_depth: usize,
}

impl<'a> CompilationEngine<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            tokens: Tokenizer::new(source),
            symbols: SymbolTable::new(),
            writer: VmWriter::new(),
            class_name: "",
            subroutine_kind: SubroutineKind::Function,
            return_type: "void",
            while_counter: 0,
            if_counter: 0,
            block_depth: 0,
        }
    }

    pub fn compile_class(&mut self) -> CompileResult<()> {
        self.tokens.advance()?;
        self.tokens.consume_keyword(Keyword::Class)?;
        self.class_name = self.tokens.consume_identifier("class name")?;
        self.tokens.consume_symbol('{')?;

        loop {
            match self.tokens.keyword() {
                Some(Keyword::Static) | Some(Keyword::Field) => self.compile_class_var_dec()?,
                Some(Keyword::Constructor) | Some(Keyword::Function) | Some(Keyword::Method) => {
                    self.compile_subroutine()?
                }
                _ => break,
            }
        }

        if !self.tokens.check_symbol('}') {
            return Err(self.tokens.error("class member or '}'"));
        }
        self.tokens.advance()?;
        if self.tokens.current().is_some() {
            return Err(self.tokens.error("end of input"));
        }
        Ok(())
    }

    fn compile_class_var_dec(&mut self) -> CompileResult<()> {
        let kind = if self.tokens.check_keyword(Keyword::Static) {
            Kind::Static
        } else {
            Kind::Field
        };
        self.tokens.advance()?;
        let declared_type = self.compile_type(false)?;
        self.compile_names(declared_type, kind)
    }

    fn compile_subroutine(&mut self) -> CompileResult<()> {
        self.subroutine_kind = match self.tokens.keyword() {
            Some(Keyword::Constructor) => SubroutineKind::Constructor,
            Some(Keyword::Method) => SubroutineKind::Method,
            _ => SubroutineKind::Function,
        };
        self.tokens.advance()?;
        self.symbols.start_subroutine();

        self.return_type = self.compile_type(true)?;
        let name = self.tokens.consume_identifier("subroutine name")?;
        self.tokens.consume_symbol('(')?;
        self.compile_parameter_list()?;
        self.tokens.consume_symbol(')')?;

        #[cfg(feature = "debug-logging")]
        {
            eprintln!(
                "== {:?} {} {}.{} ==",
                self.subroutine_kind, self.return_type, self.class_name, name
            );
        }

        self.compile_subroutine_body(name)
    }

    fn compile_parameter_list(&mut self) -> CompileResult<()> {
        if self.tokens.check_symbol(')') {
            return Ok(());
        }
        loop {
            let declared_type = self.compile_type(false)?;
            let name = self.tokens.consume_identifier("parameter name")?;
            self.symbols.define(name, declared_type, Kind::Argument);
            if !self.tokens.check_symbol(',') {
                return Ok(());
            }
            self.tokens.advance()?;
        }
    }

    fn compile_subroutine_body(&mut self, name: &str) -> CompileResult<()> {
        self.tokens.consume_symbol('{')?;
        while self.tokens.check_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        let full_name = format!("{}.{}", self.class_name, name);
        self.writer
            .write_function(&full_name, self.symbols.var_count(Kind::Local));

        #[cfg(feature = "debug-logging")]
        {
            eprintln!(
                "   args={} locals={} fields={} statics={}",
                self.symbols.var_count(Kind::Argument),
                self.symbols.var_count(Kind::Local),
                self.symbols.var_count(Kind::Field),
                self.symbols.var_count(Kind::Static),
            );
        }

        match self.subroutine_kind {
            SubroutineKind::Constructor => {
                self.writer
                    .write_push(Segment::Constant, self.symbols.var_count(Kind::Field));
                self.writer.write_call("Memory.alloc", 1);
                self.writer.write_pop(Segment::Pointer, 0);
            }
            SubroutineKind::Method => {
                self.writer.write_push(Segment::Argument, 0);
                self.writer.write_pop(Segment::Pointer, 0);
            }
            SubroutineKind::Function => (),
        }

        self.compile_statements()?;
        self.tokens.consume_symbol('}')
    }

    fn compile_var_dec(&mut self) -> CompileResult<()> {
        self.tokens.consume_keyword(Keyword::Var)?;
        let declared_type = self.compile_type(false)?;
        self.compile_names(declared_type, Kind::Local)
    }

    /// `name ( "," name )* ";"`, each defined with the same type and kind.
    fn compile_names(&mut self, declared_type: &str, kind: Kind) -> CompileResult<()> {
        loop {
            let name = self.tokens.consume_identifier("variable name")?;
            self.symbols.define(name, declared_type, kind);
            if !self.tokens.check_symbol(',') {
                break;
            }
            self.tokens.advance()?;
        }
        self.tokens.consume_symbol(';')
    }

    fn compile_type(&mut self, allow_void: bool) -> CompileResult<&'a str> {
        let accepted = match self.tokens.current() {
            Some(token) => match token.tok_type {
                TokenType::Keyword(Keyword::Int)
                | TokenType::Keyword(Keyword::Char)
                | TokenType::Keyword(Keyword::Boolean)
                | TokenType::Identifier => Some(token.source),
                TokenType::Keyword(Keyword::Void) if allow_void => Some(token.source),
                _ => None,
            },
            None => None,
        };
        match accepted {
            Some(declared_type) => {
                self.tokens.advance()?;
                Ok(declared_type)
            }
            None => Err(self.tokens.error("type")),
        }
    }

    /// Compiles statements until the next token cannot start one; the caller
    /// consumes whatever closes the list.
    fn compile_statements(&mut self) -> CompileResult<()> {
        loop {
            match self.tokens.keyword() {
                Some(Keyword::Let) => self.compile_let()?,
                Some(Keyword::If) => self.compile_if()?,
                Some(Keyword::While) => self.compile_while()?,
                Some(Keyword::Do) => self.compile_do()?,
                Some(Keyword::Return) => self.compile_return()?,
                _ => return Ok(()),
            }
        }
    }

    fn compile_let(&mut self) -> CompileResult<()> {
        self.tokens.advance()?;
        let token = self.tokens.index();
        let name = self.tokens.consume_identifier("variable name")?;
        if !self.symbols.contains(name) {
            return Err(CompileError::UnresolvedReference {
                name: name.to_string(),
                token,
            });
        }

        if self.tokens.check_symbol('[') {
            self.tokens.advance()?;
            self.compile_expression()?;
            self.tokens.consume_symbol(']')?;
            self.tokens.consume_symbol('=')?;
            self.compile_expression()?;
            self.tokens.consume_symbol(';')?;
            self.generator().pop_indexed(name)
        } else {
            self.tokens.consume_symbol('=')?;
            self.compile_expression()?;
            self.tokens.consume_symbol(';')?;
            self.generator().pop_variable(name)
        }
    }

    fn compile_while(&mut self) -> CompileResult<()> {
        let n = self.while_counter;
        self.while_counter += 1;
        let cond_label = format!("WHILE_COND{}", n);
        let true_label = format!("WHILE_TRUE{}", n);
        let end_label = format!("WHILE_END{}", n);

        self.tokens.advance()?;
        self.writer.write_label(&cond_label);
        self.tokens.consume_symbol('(')?;
        self.compile_expression()?;
        self.tokens.consume_symbol(')')?;
        self.writer.write_if(&true_label);
        self.writer.write_goto(&end_label);
        self.writer.write_label(&true_label);
        self.compile_block()?;
        self.writer.write_goto(&cond_label);
        self.writer.write_label(&end_label);
        Ok(())
    }

    fn compile_if(&mut self) -> CompileResult<()> {
        let n = self.if_counter;
        self.if_counter += 1;
        let true_label = format!("IF_TRUE{}", n);
        let false_label = format!("IF_FALSE{}", n);
        let end_label = format!("IF_END{}", n);

        self.tokens.advance()?;
        self.tokens.consume_symbol('(')?;
        self.compile_expression()?;
        self.tokens.consume_symbol(')')?;
        self.writer.write_if(&true_label);
        self.writer.write_goto(&false_label);
        self.writer.write_label(&true_label);
        self.compile_block()?;
        self.writer.write_goto(&end_label);
        self.writer.write_label(&false_label);
        if self.tokens.check_keyword(Keyword::Else) {
            self.tokens.advance()?;
            self.compile_block()?;
        }
        self.writer.write_label(&end_label);
        Ok(())
    }

    fn compile_do(&mut self) -> CompileResult<()> {
        self.tokens.advance()?;
        let call = Parser::new(&mut self.tokens, &self.symbols, self.class_name).subroutine_call()?;
        self.tokens.consume_symbol(';')?;
        self.generator().call(&call)?;
        self.writer.write_pop(Segment::Temp, 0);
        Ok(())
    }

    fn compile_return(&mut self) -> CompileResult<()> {
        self.tokens.advance()?;
        if self.tokens.check_symbol(';') {
            self.writer.write_push(Segment::Constant, 0);
        } else {
            self.compile_expression()?;
        }
        self.tokens.consume_symbol(';')?;
        self.writer.write_return();
        Ok(())
    }

    fn compile_block(&mut self) -> CompileResult<()> {
        self.tokens.consume_symbol('{')?;
        if self.block_depth == MAX_NESTING {
            return Err(self.tokens.error("shallower block nesting"));
        }
        self.block_depth += 1;
        let statements = self.compile_statements();
        self.block_depth -= 1;
        statements?;
        self.tokens.consume_symbol('}')
    }

    fn compile_expression(&mut self) -> CompileResult<()> {
        let expression = Parser::new(&mut self.tokens, &self.symbols, self.class_name).expression()?;
        self.generator().generate(&expression)
    }

    fn generator(&mut self) -> Generator<'_> {
        Generator::new(
            &mut self.writer,
            &self.symbols,
            self.subroutine_kind,
            self.tokens.index(),
        )
    }
}
