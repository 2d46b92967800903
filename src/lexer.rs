use std::fmt;

use crate::common::{LexError, LexErrorKind};

/// Largest integer constant the VM can push directly.
pub const MAX_INT_CONSTANT: u16 = 32767;

pub struct Lexer<'a> {
    source: &'a [u8],
    start: usize,
    current: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub tok_type: TokenType,
    pub source: &'a str,
    pub offset: usize,
}

impl<'a> Token<'a> {
    fn new(tok_type: TokenType, source: &'a str, offset: usize) -> Self {
        Self {
            tok_type,
            source,
            offset,
        }
    }
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tok_type {
            TokenType::Keyword(_) => write!(f, "keyword '{}'", self.source),
            TokenType::Symbol(c) => write!(f, "symbol '{}'", c),
            TokenType::Identifier => write!(f, "identifier '{}'", self.source),
            TokenType::IntConst(value) => write!(f, "integer {}", value),
            TokenType::StrConst => write!(f, "string {}", self.source),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenType {
    Keyword(Keyword),
    Symbol(char),
    Identifier,
    IntConst(u16),
    StrConst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        let keyword = match lexeme {
            "class" => Keyword::Class,
            "constructor" => Keyword::Constructor,
            "function" => Keyword::Function,
            "method" => Keyword::Method,
            "field" => Keyword::Field,
            "static" => Keyword::Static,
            "var" => Keyword::Var,
            "int" => Keyword::Int,
            "char" => Keyword::Char,
            "boolean" => Keyword::Boolean,
            "void" => Keyword::Void,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "this" => Keyword::This,
            "let" => Keyword::Let,
            "do" => Keyword::Do,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "return" => Keyword::Return,
            _ => return None,
        };
        Some(keyword)
    }
}

const SYMBOLS: &[u8] = b"{}()[].,;+-*/&|<>=~";

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            start: 0,
            current: 0,
        }
    }

    /// Scans the next token, or `None` once only whitespace and comments remain.
    pub fn next(&mut self) -> Result<Option<Token<'a>>, LexError> {
        self.skip_whitespace()?;
        self.start = self.current;
        if self.is_at_end() {
            return Ok(None);
        }
        let c = self.advance();
        let token = if SYMBOLS.contains(&c) {
            self.make_token(TokenType::Symbol(c as char))
        } else if c == b'"' {
            self.string()?
        } else if c.is_ascii_digit() {
            self.number()?
        } else if c.is_ascii_alphabetic() || c == b'_' {
            self.identifier()
        } else {
            let c = self.source_str(self.start, self.source.len()).chars().next();
            return Err(LexError::new(
                self.start,
                LexErrorKind::UnexpectedCharacter(c.unwrap_or('\u{fffd}')),
            ));
        };
        Ok(Some(token))
    }

    fn skip_whitespace(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                b' ' | b'\r' | b'\t' | b'\n' => self.current += 1,
                b'/' if self.peek_2() == b'/' => {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.current += 1;
                    }
                }
                b'/' if self.peek_2() == b'*' => {
                    let comment_start = self.current;
                    self.current += 2;
                    loop {
                        if self.is_at_end() {
                            return Err(LexError::new(
                                comment_start,
                                LexErrorKind::UnterminatedBlockComment,
                            ));
                        }
                        if self.peek() == b'*' && self.peek_2() == b'/' {
                            self.current += 2;
                            break;
                        }
                        self.current += 1;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn peek(&self) -> u8 {
        self.source.get(self.current).copied().unwrap_or(b'\0')
    }

    fn peek_2(&self) -> u8 {
        self.source.get(self.current + 1).copied().unwrap_or(b'\0')
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        self.current += 1;
        self.source[self.current - 1]
    }

    fn source_str(&self, from: usize, to: usize) -> &'a str {
        // Token boundaries always sit on ASCII bytes, so the slice is valid UTF-8.
        std::str::from_utf8(&self.source[from..to]).unwrap_or("")
    }

    fn make_token(&self, tok_type: TokenType) -> Token<'a> {
        Token::new(tok_type, self.source_str(self.start, self.current), self.start)
    }

    fn string(&mut self) -> Result<Token<'a>, LexError> {
        while self.peek() != b'"' && !self.is_at_end() {
            match self.peek() {
                b'\n' => return Err(LexError::new(self.start, LexErrorKind::NewlineInString)),
                b' '..=b'~' => self.current += 1,
                _ => {
                    let c = self.source_str(self.current, self.source.len()).chars().next();
                    return Err(LexError::new(
                        self.current,
                        LexErrorKind::InvalidStringCharacter(c.unwrap_or('\u{fffd}')),
                    ));
                }
            }
        }

        if self.is_at_end() {
            Err(LexError::new(self.start, LexErrorKind::UnterminatedString))
        } else {
            self.current += 1; // consume closing quote
            Ok(self.make_token(TokenType::StrConst))
        }
    }

    fn number(&mut self) -> Result<Token<'a>, LexError> {
        while self.peek().is_ascii_digit() {
            self.current += 1;
        }
        let digits = self.source_str(self.start, self.current);
        match digits.parse::<u16>() {
            Ok(value) if value <= MAX_INT_CONSTANT => {
                Ok(self.make_token(TokenType::IntConst(value)))
            }
            _ => Err(LexError::new(
                self.start,
                LexErrorKind::IntegerOverflow(digits.to_string()),
            )),
        }
    }

    fn identifier(&mut self) -> Token<'a> {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.current += 1;
        }
        let lexeme = self.source_str(self.start, self.current);
        match Keyword::from_lexeme(lexeme) {
            Some(keyword) => self.make_token(TokenType::Keyword(keyword)),
            None => self.make_token(TokenType::Identifier),
        }
    }
}
