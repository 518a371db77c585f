//! Path Parser
//!
//! Grammar (relative to the record root):
//!
//! ```text
//! path      := '.' | '.'? sep step (sep step)* | step (sep step)*
//! sep       := '/' | '//'
//! step      := ('*' | Name) predicate*
//! predicate := '[' '@' Name ']' | '[' '@' Name '=' Literal ']'
//! ```
//!
//! Absolute paths and parent steps are rejected: they would let a rule reach
//! outside the record.

use super::lexer::{Lexer, Token};

static EOF: Token = Token::Eof;

/// Navigation axis of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
}

/// Element name test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    Any,
    Name(String),
}

/// Attribute test attached to a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepPredicate {
    HasAttribute(String),
    AttributeEquals(String, String),
}

/// One location step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub test: NameTest,
    pub predicates: Vec<StepPredicate>,
}

/// Compiled sub-path; no steps means the record root itself
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathExpr {
    pub steps: Vec<Step>,
}

/// Path parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), String> {
        let token = self.next();
        if token == expected {
            Ok(())
        } else {
            Err(format!("expected {}, found {:?}", what, token))
        }
    }

    /// Parse a complete path
    pub fn parse_path(&mut self) -> Result<PathExpr, String> {
        let mut steps = Vec::new();

        let mut axis = match self.peek().clone() {
            Token::Dot => {
                self.next();
                match self.next() {
                    Token::Eof => return Ok(PathExpr { steps }),
                    Token::Slash => Axis::Child,
                    Token::DoubleSlash => Axis::Descendant,
                    other => return Err(format!("expected '/' or '//' after '.', found {:?}", other)),
                }
            }
            Token::Slash | Token::DoubleSlash => {
                return Err("absolute paths are not allowed; paths are relative to the record root".into());
            }
            Token::Eof => return Err("empty path".into()),
            _ => Axis::Child,
        };

        loop {
            steps.push(self.parse_step(axis)?);
            axis = match self.next() {
                Token::Eof => return Ok(PathExpr { steps }),
                Token::Slash => Axis::Child,
                Token::DoubleSlash => Axis::Descendant,
                other => return Err(format!("unexpected {:?} after step", other)),
            };
        }
    }

    fn parse_step(&mut self, axis: Axis) -> Result<Step, String> {
        let test = match self.next() {
            Token::Star => NameTest::Any,
            Token::Name(name) => NameTest::Name(name),
            Token::DoubleDot => return Err("parent steps ('..') are not supported".into()),
            Token::Eof => return Err("path ends with a separator".into()),
            other => return Err(format!("expected element name or '*', found {:?}", other)),
        };

        let mut predicates = Vec::new();
        while *self.peek() == Token::LeftBracket {
            self.next();
            predicates.push(self.parse_predicate()?);
        }

        Ok(Step { axis, test, predicates })
    }

    fn parse_predicate(&mut self) -> Result<StepPredicate, String> {
        const SUPPORTED: &str = "only [@attr] and [@attr='value'] predicates are supported";

        if self.next() != Token::At {
            return Err(SUPPORTED.into());
        }
        let Token::Name(attr) = self.next() else {
            return Err("expected attribute name after '@'".into());
        };

        match self.next() {
            Token::RightBracket => Ok(StepPredicate::HasAttribute(attr)),
            Token::Eq => {
                let Token::Literal(value) = self.next() else {
                    return Err("expected quoted value after '='".into());
                };
                self.expect(Token::RightBracket, "']'")?;
                Ok(StepPredicate::AttributeEquals(attr, value))
            }
            _ => Err(SUPPORTED.into()),
        }
    }
}

/// Parse a path string
pub fn parse(path: &str) -> Result<PathExpr, String> {
    let tokens = Lexer::new(path).tokenize()?;
    Parser::new(tokens).parse_path()
}
