//! Path Lexer
//!
//! Tokenizes relative sub-path expressions such as
//! `.//Trait[@Type='Disease']//ElementValue`.

/// Path token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Slash,        // /
    DoubleSlash,  // //
    Dot,          // .
    DoubleDot,    // ..
    At,           // @
    Star,         // *
    Eq,           // =
    LeftBracket,  // [
    RightBracket, // ]
    Literal(String),
    Name(String),
    Eof,
}

/// Path lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.advance(c.len_utf8());
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, String> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        let token = match c {
            '/' => {
                self.advance(1);
                if self.peek() == Some('/') {
                    self.advance(1);
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                self.advance(1);
                if self.peek() == Some('.') {
                    self.advance(1);
                    Token::DoubleDot
                } else {
                    Token::Dot
                }
            }
            '@' => {
                self.advance(1);
                Token::At
            }
            '*' => {
                self.advance(1);
                Token::Star
            }
            '=' => {
                self.advance(1);
                Token::Eq
            }
            '[' => {
                self.advance(1);
                Token::LeftBracket
            }
            ']' => {
                self.advance(1);
                Token::RightBracket
            }
            '"' | '\'' => self.read_literal(c)?,
            c if is_name_start(c) => self.read_name(),
            c => return Err(format!("unexpected character '{}' at offset {}", c, self.pos)),
        };
        Ok(token)
    }

    fn read_literal(&mut self, quote: char) -> Result<Token, String> {
        let start = self.pos;
        self.advance(1);
        let rest = self.remaining();
        match rest.find(quote) {
            Some(len) => {
                let value = rest[..len].to_string();
                self.advance(len + 1);
                Ok(Token::Literal(value))
            }
            None => Err(format!("unterminated string literal at offset {}", start)),
        }
    }

    fn read_name(&mut self) -> Token {
        let rest = self.remaining();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !is_name_char(c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.advance(len);
        Token::Name(rest[..len].to_string())
    }

    /// Tokenize the whole input
    pub fn tokenize(mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}
