use crate::common::{CompileError, CompileResult, LexError};
use crate::lexer::{Keyword, Lexer, Token, TokenType};

/// Token cursor shared by the class compiler and the expression parser.
///
/// Holds the current token and at most one token of lookahead; everything
/// else stays unscanned in the lexer.
pub struct Tokenizer<'a> {
    lexer: Lexer<'a>,
    current: Option<Token<'a>>,
    peeked: Option<Token<'a>>,
    /// Zero-based index of `current` within the token stream.
    index: usize,
    started: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            current: None,
            peeked: None,
            index: 0,
            started: false,
        }
    }

    pub fn has_more_tokens(&mut self) -> Result<bool, LexError> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next()?;
        }
        Ok(self.peeked.is_some())
    }

    /// Makes the next token current. Past the end of input the current token
    /// becomes `None` rather than panicking.
    pub fn advance(&mut self) -> Result<(), LexError> {
        self.has_more_tokens()?;
        self.current = self.peeked.take();
        if self.started {
            self.index += 1;
        }
        self.started = true;

        #[cfg(feature = "debug-logging")]
        {
            if let Some(token) = &self.current {
                eprintln!(
                    "{:>6} #{:<4} {:?} '{}'",
                    token.offset, self.index, token.tok_type, token.source
                );
            }
        }

        Ok(())
    }

    /// The token after the current one, scanned on demand.
    pub fn peek(&mut self) -> Result<Option<&Token<'a>>, LexError> {
        self.has_more_tokens()?;
        Ok(self.peeked.as_ref())
    }

    pub fn current(&self) -> Option<&Token<'a>> {
        self.current.as_ref()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn token_type(&self) -> Option<TokenType> {
        self.current.as_ref().map(|t| t.tok_type)
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.token_type() {
            Some(TokenType::Keyword(keyword)) => Some(keyword),
            _ => None,
        }
    }

    pub fn symbol(&self) -> Option<char> {
        match self.token_type() {
            Some(TokenType::Symbol(c)) => Some(c),
            _ => None,
        }
    }

    pub fn identifier(&self) -> Option<&'a str> {
        match &self.current {
            Some(token) if token.tok_type == TokenType::Identifier => Some(token.source),
            _ => None,
        }
    }

    pub fn int_val(&self) -> Option<u16> {
        match self.token_type() {
            Some(TokenType::IntConst(value)) => Some(value),
            _ => None,
        }
    }

    /// String constant with its quote delimiters stripped.
    pub fn string_val(&self) -> Option<&'a str> {
        match &self.current {
            Some(token) if token.tok_type == TokenType::StrConst => {
                Some(&token.source[1..token.source.len() - 1])
            }
            _ => None,
        }
    }

    pub fn check_symbol(&self, c: char) -> bool {
        self.symbol() == Some(c)
    }

    pub fn check_keyword(&self, keyword: Keyword) -> bool {
        self.keyword() == Some(keyword)
    }

    /// Builds the structural error for the current position.
    pub fn error(&self, expected: &str) -> CompileError {
        match &self.current {
            Some(token) => CompileError::Syntax {
                expected: expected.to_string(),
                found: token.to_string(),
                token: self.index,
            },
            None => CompileError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    pub fn consume_symbol(&mut self, c: char) -> CompileResult<()> {
        if self.check_symbol(c) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error(&format!("'{}'", c)))
        }
    }

    pub fn consume_keyword(&mut self, keyword: Keyword) -> CompileResult<()> {
        if self.check_keyword(keyword) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error(&format!("keyword {:?}", keyword).to_lowercase()))
        }
    }

    pub fn consume_identifier(&mut self, what: &str) -> CompileResult<&'a str> {
        match self.identifier() {
            Some(name) => {
                self.advance()?;
                Ok(name)
            }
            None => Err(self.error(what)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_tokens_in_empty_input() {
        let mut tokenizer = Tokenizer::new("");
        assert!(!tokenizer.has_more_tokens().unwrap());
    }

    #[test]
    fn advance_to_end_of_input() {
        let mut tokenizer = Tokenizer::new("class Foo { }");
        assert!(tokenizer.has_more_tokens().unwrap());
        for _ in 0..4 {
            assert!(tokenizer.has_more_tokens().unwrap());
            tokenizer.advance().unwrap();
        }
        assert_eq!(tokenizer.index(), 3);
        assert!(!tokenizer.has_more_tokens().unwrap());
    }

    #[test]
    fn accessors_match_token_type() {
        let mut tokenizer = Tokenizer::new("static Foo_Bar1 ~ 999 \" a foo bar \"");
        tokenizer.advance().unwrap();
        assert_eq!(tokenizer.keyword(), Some(Keyword::Static));
        assert_eq!(tokenizer.identifier(), None);
        tokenizer.advance().unwrap();
        assert_eq!(tokenizer.identifier(), Some("Foo_Bar1"));
        tokenizer.advance().unwrap();
        assert_eq!(tokenizer.symbol(), Some('~'));
        tokenizer.advance().unwrap();
        assert_eq!(tokenizer.int_val(), Some(999));
        tokenizer.advance().unwrap();
        assert_eq!(tokenizer.token_type(), Some(TokenType::StrConst));
        assert_eq!(tokenizer.string_val(), Some(" a foo bar "));
    }

    #[test]
    fn peek_does_not_move_current() {
        let mut tokenizer = Tokenizer::new("foo.bar");
        tokenizer.advance().unwrap();
        assert_eq!(tokenizer.peek().unwrap().map(|t| t.tok_type), Some(TokenType::Symbol('.')));
        assert_eq!(tokenizer.identifier(), Some("foo"));
        tokenizer.advance().unwrap();
        assert!(tokenizer.check_symbol('.'));
    }

    #[test]
    fn consume_reports_expected_and_found() {
        let mut tokenizer = Tokenizer::new("class 42");
        tokenizer.advance().unwrap();
        tokenizer.consume_keyword(Keyword::Class).unwrap();
        let err = tokenizer.consume_identifier("class name").unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected class name, found integer 42 at token 1"
        );
        tokenizer.advance().unwrap();
        let err = tokenizer.consume_symbol('{').unwrap_err();
        assert_eq!(err.to_string(), "expected '{', found end of input");
    }
}
