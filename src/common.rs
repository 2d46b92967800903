use std::fmt;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} at offset {offset}")]
pub struct LexError {
    pub offset: usize,
    pub kind: LexErrorKind,
}

impl LexError {
    pub fn new(offset: usize, kind: LexErrorKind) -> Self {
        Self { offset, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexErrorKind {
    UnterminatedString,
    NewlineInString,
    InvalidStringCharacter(char),
    UnterminatedBlockComment,
    UnexpectedCharacter(char),
    IntegerOverflow(String),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use LexErrorKind::*;
        match self {
            UnterminatedString => write!(f, "unterminated string constant"),
            NewlineInString => write!(f, "newline in string constant"),
            InvalidStringCharacter(c) => {
                write!(f, "character {:?} not allowed in string constant", c)
            }
            UnterminatedBlockComment => write!(f, "unterminated block comment"),
            UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            IntegerOverflow(digits) => write!(f, "integer constant {} exceeds 32767", digits),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("expected {expected}, found {found} at token {token}")]
    Syntax {
        expected: String,
        found: String,
        token: usize,
    },
    #[error("expected {expected}, found end of input")]
    UnexpectedEof { expected: String },
    #[error("unresolved reference '{name}' at token {token}")]
    UnresolvedReference { name: String, token: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CompileResult<T> = Result<T, CompileError>;
