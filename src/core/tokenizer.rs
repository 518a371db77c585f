//! Incremental XML Tokenizer
//!
//! Pull-parser over a buffer that may stop in the middle of a construct.
//! Extracts:
//! - Element start/end/empty tags (with the raw attribute region)
//! - Text content (raw, entity decoding is left to the consumer)
//! - CDATA sections, comments, processing instructions
//! - The XML declaration and DOCTYPE (internal subset included)
//!
//! When the buffer ends before the construct at the cursor is complete the
//! tokenizer reports [`Step::NeedMore`] and leaves the cursor at the start of
//! that construct, so the caller can refill and resume from the same offset.

use super::scanner::{is_whitespace, Scanner};

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
}

/// A complete XML token borrowed from the input
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// For tags and PIs: the name / target
    pub name: Option<&'a [u8]>,
    /// For tags: raw attribute region. For text, CDATA, comments: content.
    pub body: &'a [u8],
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize), body: &'a [u8]) -> Self {
        Token {
            kind,
            span,
            name: None,
            body,
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }
}

/// Outcome of one tokenizer step
#[derive(Debug)]
pub enum Step<'a> {
    /// A complete token
    Token(Token<'a>),
    /// The construct at the cursor is incomplete
    NeedMore,
    /// All input consumed (only on the final chunk)
    End,
}

/// Structural error at a position relative to the tokenizer input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenError {
    pub message: &'static str,
    pub position: usize,
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    /// No more bytes will follow this input
    last_chunk: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer; `last_chunk` marks the input as the end of the stream
    pub fn new(input: &'a [u8], last_chunk: bool) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            last_chunk,
        }
    }

    /// Offset of the first byte not yet returned as part of a token
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Step<'a>, TokenError> {
        if self.scanner.is_eof() {
            return Ok(if self.last_chunk { Step::End } else { Step::NeedMore });
        }

        let start = self.scanner.position();
        let step = match self.scanner.peek() {
            Some(b'<') => self.parse_markup(start)?,
            _ => self.parse_text(start),
        };

        match step {
            Step::NeedMore => self.scanner.set_position(start),
            Step::Token(ref token) => self.scanner.set_position(token.span.1),
            Step::End => {}
        }
        Ok(step)
    }

    fn error(&self, message: &'static str, position: usize) -> TokenError {
        TokenError { message, position }
    }

    fn parse_text(&mut self, start: usize) -> Step<'a> {
        let end = match self.scanner.find_tag_start() {
            Some(end) => end,
            None if self.last_chunk => start + self.scanner.remaining().len(),
            // The run may continue in the next chunk
            None => return Step::NeedMore,
        };
        Step::Token(Token::new(TokenKind::Text, (start, end), self.scanner.slice(start, end)))
    }

    /// Parse markup starting with '<'
    fn parse_markup(&mut self, start: usize) -> Result<Step<'a>, TokenError> {
        match self.scanner.peek_at(1) {
            None => Ok(Step::NeedMore),
            Some(b'/') => self.parse_end_tag(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'?') => self.parse_pi(start),
            Some(_) => self.parse_start_tag(start),
        }
    }

    /// Parse a start tag or empty element tag
    fn parse_start_tag(&mut self, start: usize) -> Result<Step<'a>, TokenError> {
        self.scanner.set_position(start + 1);
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("invalid element name", start + 1))?;
        let name_end = self.scanner.position();

        let Some(end) = self.scanner.find_tag_end_quoted() else {
            return Ok(Step::NeedMore);
        };

        match self.scanner.peek() {
            Some(b) if is_whitespace(b) || b == b'/' || b == b'>' => {}
            _ => return Err(self.error("invalid character in element name", name_end)),
        }

        let is_empty = end > name_end && self.scanner.slice(end - 1, end) == b"/";
        let attr_end = if is_empty { end - 1 } else { end };
        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };

        Ok(Step::Token(
            Token::new(kind, (start, end + 1), self.scanner.slice(name_end, attr_end)).with_name(name),
        ))
    }

    /// Parse an end tag
    fn parse_end_tag(&mut self, start: usize) -> Result<Step<'a>, TokenError> {
        self.scanner.set_position(start + 2);
        let Some(end) = self.scanner.find_tag_end() else {
            return Ok(Step::NeedMore);
        };

        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("invalid element name in end tag", start + 2))?;

        let trailing = self.scanner.slice(self.scanner.position(), end);
        if !trailing.iter().all(|&b| is_whitespace(b)) {
            return Err(self.error("end tag cannot have attributes or other content", self.scanner.position()));
        }

        Ok(Step::Token(
            Token::new(TokenKind::EndTag, (start, end + 1), &[]).with_name(name),
        ))
    }

    /// Parse markup starting with '!' (comment, CDATA, DOCTYPE)
    fn parse_bang_markup(&mut self, start: usize) -> Result<Step<'a>, TokenError> {
        const COMMENT: &[u8] = b"<!--";
        const CDATA: &[u8] = b"<![CDATA[";
        const DOCTYPE: &[u8] = b"<!DOCTYPE";

        if self.scanner.starts_with(COMMENT) {
            Ok(self.parse_delimited(start, COMMENT.len(), b"-->", TokenKind::Comment))
        } else if self.scanner.starts_with(CDATA) {
            Ok(self.parse_delimited(start, CDATA.len(), b"]]>", TokenKind::CData))
        } else if self.scanner.starts_with(DOCTYPE) {
            Ok(self.parse_doctype(start, DOCTYPE.len()))
        } else if [COMMENT, CDATA, DOCTYPE].iter().any(|m| self.scanner.is_prefix_of(m)) {
            Ok(Step::NeedMore)
        } else {
            Err(self.error("invalid declaration - expected comment, CDATA, or DOCTYPE", start))
        }
    }

    /// Parse a construct whose content runs up to a fixed terminator
    fn parse_delimited(&mut self, start: usize, open_len: usize, close: &[u8], kind: TokenKind) -> Step<'a> {
        let content_start = start + open_len;
        self.scanner.set_position(content_start);
        match self.scanner.find_seq(close) {
            Some(pos) => Step::Token(Token::new(
                kind,
                (start, pos + close.len()),
                self.scanner.slice(content_start, pos),
            )),
            None => Step::NeedMore,
        }
    }

    /// Parse a DOCTYPE, skipping over an internal subset in brackets
    fn parse_doctype(&mut self, start: usize, open_len: usize) -> Step<'a> {
        let input_end = start + self.scanner.remaining().len();
        let rest = self.scanner.slice(start + open_len, input_end);
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;

        for (i, &b) in rest.iter().enumerate() {
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => {
                    let end = start + open_len + i + 1;
                    return Step::Token(Token::new(
                        TokenKind::DocType,
                        (start, end),
                        self.scanner.slice(start + open_len, end - 1),
                    ));
                }
                _ => {}
            }
        }
        Step::NeedMore
    }

    /// Parse a processing instruction or the XML declaration
    fn parse_pi(&mut self, start: usize) -> Result<Step<'a>, TokenError> {
        self.scanner.set_position(start + 2);
        let Some(end) = self.scanner.find_seq(b"?>") else {
            return Ok(Step::NeedMore);
        };

        let target = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("invalid processing instruction target", start + 2))?;

        let kind = if target.eq_ignore_ascii_case(b"xml") {
            TokenKind::XmlDeclaration
        } else {
            TokenKind::ProcessingInstruction
        };
        let body_start = self.scanner.position().min(end);

        Ok(Step::Token(
            Token::new(kind, (start, end + 2), self.scanner.slice(body_start, end)).with_name(target),
        ))
    }
}
