//! Error types for record extraction
//!
//! - [`RuleConfigError`] - rule set problems, detected before any input is read
//! - [`SinkError`] - failures reported by the row sink
//! - [`ExtractError`] - everything that can stop a run
//!
//! A rule that finds nothing is not an error: the column is simply `None`.

use thiserror::Error;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Invalid rule set configuration.
#[derive(Debug, Error)]
pub enum RuleConfigError {
    /// Record-root tag is empty.
    #[error("record tag must not be empty")]
    EmptyRecordTag,

    /// Rule set has no columns.
    #[error("rule set has no columns")]
    NoColumns,

    /// Column with an empty name.
    #[error("column {index} has an empty name")]
    EmptyColumnName { index: usize },

    /// Two columns share a name.
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    /// Sub-path failed to compile.
    #[error("column '{column}': invalid path '{path}': {message}")]
    InvalidPath {
        column: String,
        path: String,
        message: String,
    },

    /// Filter clause without an attribute name.
    #[error("column '{column}': filter clause {index} has an empty attribute name")]
    EmptyFilterAttribute { column: String, index: usize },

    /// Attribute value source without an attribute name.
    #[error("column '{column}': value attribute name is empty")]
    EmptyValueAttribute { column: String },

    /// Configuration document could not be parsed.
    #[error("rule set JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reported by a row sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// CSV serialization failed.
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying writer failed.
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Row width does not match the columns given to `begin`.
    #[error("row has {got} values, sink expects {expected}")]
    RowWidth { expected: usize, got: usize },
}

/// Errors that stop an extraction run.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Input ended before the open record (or markup construct) closed.
    #[error("input truncated at byte {offset}{}", record_suffix(.record))]
    TruncatedInput {
        offset: u64,
        /// Identifier of the record that was open, if one was.
        record: Option<String>,
    },

    /// The input is not well-formed enough to trust the record tree.
    #[error("malformed XML at byte {offset}: {message}")]
    MalformedStructure { offset: u64, message: String },

    /// Rule set rejected at setup time.
    #[error("invalid rule configuration: {0}")]
    RuleConfiguration(#[from] RuleConfigError),

    /// Reading the input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The row sink failed.
    #[error("row sink error: {0}")]
    Sink(#[from] SinkError),

    /// A previous call already failed; the extractor cannot continue.
    #[error("extraction already aborted by an earlier error")]
    Aborted,
}

fn record_suffix(record: &Option<String>) -> String {
    match record {
        Some(id) => format!(" inside record {}", id),
        None => String::new(),
    }
}

impl ExtractError {
    /// Short machine-readable kind, used for host error tuples
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::TruncatedInput { .. } => "truncated_input",
            ExtractError::MalformedStructure { .. } => "malformed_structure",
            ExtractError::RuleConfiguration(_) => "rule_configuration",
            ExtractError::Io(_) => "io",
            ExtractError::Sink(_) => "sink",
            ExtractError::Aborted => "aborted",
        }
    }

    pub(crate) fn malformed(offset: u64, message: impl Into<String>) -> Self {
        ExtractError::MalformedStructure {
            offset,
            message: message.into(),
        }
    }
}
