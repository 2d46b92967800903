use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match self {
            Command::Add => "add",
            Command::Sub => "sub",
            Command::Neg => "neg",
            Command::Eq => "eq",
            Command::Gt => "gt",
            Command::Lt => "lt",
            Command::And => "and",
            Command::Or => "or",
            Command::Not => "not",
        };
        f.write_str(mnemonic)
    }
}

/// Appends one line of VM text per call. Performs no validation.
#[derive(Debug, Default)]
pub struct VmWriter {
    output: String,
}

impl VmWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_function(&mut self, name: &str, num_locals: u16) {
        self.append(format_args!("function {} {}", name, num_locals))
    }

    pub fn write_push(&mut self, segment: Segment, index: u16) {
        self.append(format_args!("push {} {}", segment, index))
    }

    pub fn write_pop(&mut self, segment: Segment, index: u16) {
        self.append(format_args!("pop {} {}", segment, index))
    }

    pub fn write_call(&mut self, name: &str, num_args: u16) {
        self.append(format_args!("call {} {}", name, num_args))
    }

    pub fn write_label(&mut self, label: &str) {
        self.append(format_args!("label {}", label))
    }

    pub fn write_goto(&mut self, label: &str) {
        self.append(format_args!("goto {}", label))
    }

    pub fn write_if(&mut self, label: &str) {
        self.append(format_args!("if-goto {}", label))
    }

    pub fn write_arithmetic(&mut self, command: Command) {
        self.append(format_args!("{}", command))
    }

    pub fn write_return(&mut self) {
        self.append(format_args!("return"))
    }

    pub fn into_output(self) -> String {
        self.output
    }

    fn append(&mut self, line: fmt::Arguments<'_>) {
        #[cfg(feature = "debug-logging")]
        {
            eprintln!("  | {}", line);
        }

        self.output.push_str(&line.to_string());
        self.output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut VmWriter)) -> String {
        let mut writer = VmWriter::new();
        f(&mut writer);
        writer.into_output()
    }

    #[test]
    fn function_prologue() {
        assert_eq!(written(|w| w.write_function("Main.foo", 3)), "function Main.foo 3\n");
    }

    #[test]
    fn push_and_pop_segments() {
        assert_eq!(written(|w| w.write_push(Segment::Constant, 3)), "push constant 3\n");
        assert_eq!(written(|w| w.write_push(Segment::Pointer, 10)), "push pointer 10\n");
        assert_eq!(written(|w| w.write_pop(Segment::That, 0)), "pop that 0\n");
        assert_eq!(written(|w| w.write_pop(Segment::Temp, 0)), "pop temp 0\n");
    }

    #[test]
    fn calls_and_control_flow() {
        let text = written(|w| {
            w.write_call("foo", 3);
            w.write_label("WHILE_COND0");
            w.write_if("WHILE_TRUE0");
            w.write_goto("WHILE_END0");
            w.write_return();
        });
        assert_eq!(
            text,
            "call foo 3\nlabel WHILE_COND0\nif-goto WHILE_TRUE0\ngoto WHILE_END0\nreturn\n"
        );
    }

    #[test]
    fn arithmetic_mnemonics() {
        let text = written(|w| {
            for command in &[
                Command::Add,
                Command::Sub,
                Command::Neg,
                Command::Eq,
                Command::Gt,
                Command::Lt,
                Command::And,
                Command::Or,
                Command::Not,
            ] {
                w.write_arithmetic(*command);
            }
        });
        assert_eq!(text, "add\nsub\nneg\neq\ngt\nlt\nand\nor\nnot\n");
    }
}
