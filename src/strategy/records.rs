//! Record Boundary Detection
//!
//! Forward-only walk over the input that builds exactly one record at a time.
//!
//! Outside records only the names of open ancestor elements are kept, which
//! is enough to check that end tags balance. Inside a record every element,
//! attribute and text node goes into the [`RecordTree`] arena. A record is
//! ready the moment its root closes; it stays readable until
//! [`RecordScanner::release_record`] or the next [`RecordScanner::advance`]
//! reclaims it.

use super::reclaim::{Reclaimer, RetentionStats};
use crate::core::attributes::{parse_attributes, Attribute};
use crate::core::entities::{decode_text, normalize_line_endings};
use crate::core::tokenizer::{Step, Token, TokenKind, Tokenizer};
use crate::dom::{NodeKind, RecordTree, RecordView};
use crate::error::{ExtractError, Result};
use crate::reader::InputBuffer;
use crate::rules::RuleSet;
use std::io::Read;

/// Outcome of [`RecordScanner::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// A complete record is available through `current_record`
    RecordReady,
    /// The buffered input holds no further complete record
    NeedInput,
    /// The document ended cleanly
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Scanning,
    Finished,
    Failed,
}

/// Incremental record detector over pushed or pulled input
pub struct RecordScanner {
    input: InputBuffer,
    walker: Walker,
    reclaimer: Reclaimer,
    phase: Phase,
}

impl RecordScanner {
    /// Scanner for the record tag and identifier attribute of a rule set
    pub fn new(rules: &RuleSet) -> Self {
        Self::with_record_tag(rules.record_tag(), rules.id_attribute())
    }

    pub fn with_record_tag(record_tag: &str, id_attribute: Option<&str>) -> Self {
        RecordScanner {
            input: InputBuffer::new(),
            walker: Walker::new(record_tag, id_attribute),
            reclaimer: Reclaimer::new(),
            phase: Phase::Scanning,
        }
    }

    /// Append a chunk of input
    pub fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        self.check_usable()?;
        if self.input.is_eof() {
            log::warn!("ignoring {} bytes received after end of input", chunk.len());
            return Ok(());
        }
        self.input.extend(chunk);
        Ok(())
    }

    /// Pull one chunk from a reader; zero bytes marks end of input
    pub fn fill_from<R: Read>(&mut self, reader: &mut R, chunk_size: usize) -> Result<usize> {
        self.check_usable()?;
        match self.input.fill_from(reader, chunk_size) {
            Ok(read) => Ok(read),
            Err(e) => {
                self.phase = Phase::Failed;
                Err(e.into())
            }
        }
    }

    /// Declare that no more input will arrive
    pub fn finish_input(&mut self) {
        self.input.mark_eof();
    }

    /// Move to the next complete record
    ///
    /// Releases the previously returned record first. After an error every
    /// later call fails with [`ExtractError::Aborted`].
    pub fn advance(&mut self) -> Result<ScanStatus> {
        match self.phase {
            Phase::Failed => return Err(ExtractError::Aborted),
            Phase::Finished => return Ok(ScanStatus::Finished),
            Phase::Scanning => {}
        }

        self.release_record();

        let result = self.walker.scan(&mut self.input);
        self.reclaimer.observe(self.walker.retained_nodes());

        match result {
            Ok(ScanStatus::Finished) => {
                self.phase = Phase::Finished;
                Ok(ScanStatus::Finished)
            }
            Ok(status) => Ok(status),
            Err(e) => {
                self.phase = Phase::Failed;
                Err(e)
            }
        }
    }

    /// Reclaim the current record and the input consumed up to its end
    ///
    /// Does nothing when no record is ready. The view from `current_record`
    /// is gone afterwards.
    pub fn release_record(&mut self) {
        if !self.walker.record_ready {
            return;
        }
        self.walker.record_ready = false;
        self.walker.record_id = None;
        self.reclaimer.reclaim(&mut self.walker.tree, &mut self.input);
        self.reclaimer.observe(self.walker.retained_nodes());
    }

    /// The record returned by the last `advance`, until it is released
    pub fn current_record(&self) -> Option<RecordView<'_>> {
        self.walker.record_ready.then(|| self.walker.tree.view())
    }

    /// Identifier of the current (or partially read) record
    pub fn record_id(&self) -> Option<&str> {
        self.walker.record_id.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn stats(&self) -> RetentionStats {
        self.reclaimer.stats()
    }

    /// Unconsumed bytes held in the input buffer
    pub fn buffered_bytes(&self) -> usize {
        self.input.pending_len()
    }

    /// Total bytes received
    pub fn bytes_received(&self) -> u64 {
        self.input.received()
    }

    fn check_usable(&self) -> Result<()> {
        if self.phase == Phase::Failed {
            return Err(ExtractError::Aborted);
        }
        Ok(())
    }
}

/// Walk state carried between chunks
struct Walker {
    record_tag: Vec<u8>,
    id_attribute: Option<Vec<u8>>,
    /// Open elements outside any record, outermost first
    ancestors: Vec<Vec<u8>>,
    tree: RecordTree,
    record_ready: bool,
    record_id: Option<String>,
    record_start: u64,
}

impl Walker {
    fn new(record_tag: &str, id_attribute: Option<&str>) -> Self {
        Walker {
            record_tag: record_tag.as_bytes().to_vec(),
            id_attribute: id_attribute.map(|a| a.as_bytes().to_vec()),
            ancestors: Vec::new(),
            tree: RecordTree::new(),
            record_ready: false,
            record_id: None,
            record_start: 0,
        }
    }

    fn retained_nodes(&self) -> usize {
        self.tree.node_count() + self.ancestors.len()
    }

    /// Consume tokens until a record completes or the buffer runs dry
    fn scan(&mut self, input: &mut InputBuffer) -> Result<ScanStatus> {
        let base = input.offset();
        let eof = input.is_eof();
        let mut tokenizer = Tokenizer::new(input.pending(), eof);

        let outcome = loop {
            match tokenizer.next_token() {
                Err(e) => break Err(ExtractError::malformed(base + e.position as u64, e.message)),
                Ok(Step::NeedMore) if eof => {
                    break Err(self.truncated(base + tokenizer.position() as u64));
                }
                Ok(Step::NeedMore) => break Ok(ScanStatus::NeedInput),
                Ok(Step::End) => break self.end_of_document(base + tokenizer.position() as u64),
                Ok(Step::Token(token)) => {
                    if let Err(e) = self.handle(&token, base) {
                        break Err(e);
                    }
                    if self.record_ready {
                        break Ok(ScanStatus::RecordReady);
                    }
                }
            }
        };

        let consumed = tokenizer.position();
        input.consume(consumed);
        outcome
    }

    fn handle(&mut self, token: &Token<'_>, base: u64) -> Result<()> {
        let offset = base + token.span.0 as u64;
        match token.kind {
            TokenKind::StartTag | TokenKind::EmptyTag => {
                let name = token.name.unwrap_or_default();
                let empty = token.kind == TokenKind::EmptyTag;
                if self.tree.is_building() {
                    let attrs = parse_tag_attributes(token, offset)?;
                    self.tree.open_element(name, &attrs);
                } else if name == self.record_tag.as_slice() {
                    let attrs = parse_tag_attributes(token, offset)?;
                    self.open_record(name, &attrs, offset);
                } else {
                    if !empty {
                        self.ancestors.push(name.to_vec());
                    }
                    return Ok(());
                }
                if empty {
                    self.close_in_record(name, offset)?;
                }
            }
            TokenKind::EndTag => {
                let name = token.name.unwrap_or_default();
                if self.tree.is_building() {
                    self.close_in_record(name, offset)?;
                } else {
                    self.close_ancestor(name, offset)?;
                }
            }
            TokenKind::Text if self.tree.is_building() => {
                let raw = normalize_line_endings(token.body);
                let text = decode_text(&raw);
                self.tree.append_text(NodeKind::Text, &text);
            }
            TokenKind::CData if self.tree.is_building() => {
                let text = normalize_line_endings(token.body);
                self.tree.append_text(NodeKind::CData, &text);
            }
            TokenKind::Comment if self.tree.is_building() => {
                self.tree.append_marker(NodeKind::Comment);
            }
            TokenKind::ProcessingInstruction if self.tree.is_building() => {
                self.tree.append_marker(NodeKind::ProcessingInstruction);
            }
            // Content outside records and declarations: nothing to keep
            _ => {}
        }
        Ok(())
    }

    fn open_record(&mut self, name: &[u8], attrs: &[Attribute<'_>], offset: u64) {
        self.record_start = offset;
        self.record_id = self.id_attribute.as_deref().and_then(|id_name| {
            attrs
                .iter()
                .find(|attr| attr.name == id_name)
                .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
        });

        if let (Some(id_name), None) = (&self.id_attribute, &self.record_id) {
            log::warn!(
                "record at byte {} has no {} attribute",
                offset,
                String::from_utf8_lossy(id_name)
            );
        }
        self.tree.open_element(name, attrs);
    }

    fn close_in_record(&mut self, name: &[u8], offset: u64) -> Result<()> {
        if let Err(open) = self.tree.close_element(name) {
            return Err(ExtractError::malformed(
                offset,
                format!(
                    "mismatched end tag: expected </{}>, found </{}>",
                    open,
                    String::from_utf8_lossy(name)
                ),
            ));
        }

        if self.tree.is_complete() {
            self.record_ready = true;
            log::debug!(
                "record {} complete: bytes {}..{}, {} nodes",
                self.record_id.as_deref().unwrap_or("<no id>"),
                self.record_start,
                offset,
                self.tree.node_count()
            );
        }
        Ok(())
    }

    fn close_ancestor(&mut self, name: &[u8], offset: u64) -> Result<()> {
        match self.ancestors.pop() {
            Some(open) if open == name => Ok(()),
            Some(open) => Err(ExtractError::malformed(
                offset,
                format!(
                    "mismatched end tag: expected </{}>, found </{}>",
                    String::from_utf8_lossy(&open),
                    String::from_utf8_lossy(name)
                ),
            )),
            None => Err(ExtractError::malformed(
                offset,
                format!("unexpected end tag </{}>", String::from_utf8_lossy(name)),
            )),
        }
    }

    fn end_of_document(&self, offset: u64) -> Result<ScanStatus> {
        if self.tree.is_building() || !self.ancestors.is_empty() {
            return Err(self.truncated(offset));
        }
        Ok(ScanStatus::Finished)
    }

    fn truncated(&self, offset: u64) -> ExtractError {
        ExtractError::TruncatedInput {
            offset,
            record: if self.tree.is_building() {
                self.record_id.clone()
            } else {
                None
            },
        }
    }
}

fn parse_tag_attributes<'a>(token: &Token<'a>, offset: u64) -> Result<Vec<Attribute<'a>>> {
    parse_attributes(token.body).map_err(|message| ExtractError::malformed(offset, message))
}
