//! Field Rules
//!
//! A rule set names the record-root tag and holds one [`FieldRule`] per output
//! column. Rule sets are compiled from [`RuleSetConfig`] once, before any
//! input is read, and are immutable afterwards.

pub mod clinvar;
pub mod config;
pub mod engine;

pub use config::{AttributeMatch, ColumnConfig, RuleSetConfig, ValueConfig};

use crate::error::RuleConfigError;
use crate::path::{compile_cached, PathExpr};
use std::collections::HashSet;
use std::sync::Arc;

/// Conjunction of attribute equality tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<(String, String)>,
}

impl Predicate {
    pub fn new(clauses: Vec<(String, String)>) -> Self {
        Predicate { clauses }
    }

    pub fn clauses(&self) -> &[(String, String)] {
        &self.clauses
    }
}

/// How a rule picks one node out of its candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// First candidate in document order
    First,
    /// First candidate whose attributes satisfy the predicate
    FirstWhere(Predicate),
}

/// Which part of the chosen node becomes the value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    Text,
    Attribute(String),
}

/// Compiled rule for one output column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub column: String,
    pub path: Arc<PathExpr>,
    pub selection: Selection,
    pub source: ValueSource,
}

/// One extracted row, a value slot per column in rule order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub values: Vec<Option<String>>,
}

impl Row {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a column index; `None` for absent values and bad indexes
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index)?.as_deref()
    }
}

/// Compiled, validated rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    record_tag: String,
    id_attribute: Option<String>,
    columns: Vec<String>,
    rules: Vec<FieldRule>,
}

impl RuleSet {
    /// Validate and compile a configuration
    pub fn compile(config: &RuleSetConfig) -> Result<Self, RuleConfigError> {
        if config.record_tag.is_empty() {
            return Err(RuleConfigError::EmptyRecordTag);
        }
        if config.columns.is_empty() {
            return Err(RuleConfigError::NoColumns);
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(config.columns.len());
        for (index, column) in config.columns.iter().enumerate() {
            if column.name.is_empty() {
                return Err(RuleConfigError::EmptyColumnName { index });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(RuleConfigError::DuplicateColumn(column.name.clone()));
            }
            rules.push(compile_column(column)?);
        }

        Ok(RuleSet {
            record_tag: config.record_tag.clone(),
            id_attribute: config.id_attribute.clone().filter(|a| !a.is_empty()),
            columns: rules.iter().map(|r| r.column.clone()).collect(),
            rules,
        })
    }

    /// Parse a JSON configuration and compile it
    pub fn from_json(json: &str) -> Result<Self, RuleConfigError> {
        let config: RuleSetConfig = serde_json::from_str(json)?;
        Self::compile(&config)
    }

    pub fn record_tag(&self) -> &str {
        &self.record_tag
    }

    pub fn id_attribute(&self) -> Option<&str> {
        self.id_attribute.as_deref()
    }

    /// Column names in output order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

fn compile_column(column: &ColumnConfig) -> Result<FieldRule, RuleConfigError> {
    let path_text = column.path.as_deref().unwrap_or(".");
    let path = compile_cached(path_text).map_err(|message| RuleConfigError::InvalidPath {
        column: column.name.clone(),
        path: path_text.to_string(),
        message,
    })?;

    let mut clauses = Vec::with_capacity(column.filter.len());
    for (index, clause) in column.filter.iter().enumerate() {
        if clause.attribute.is_empty() {
            return Err(RuleConfigError::EmptyFilterAttribute {
                column: column.name.clone(),
                index,
            });
        }
        clauses.push((clause.attribute.clone(), clause.equals.clone()));
    }
    let selection = if clauses.is_empty() {
        Selection::First
    } else {
        Selection::FirstWhere(Predicate::new(clauses))
    };

    let source = match &column.value {
        ValueConfig::Text => ValueSource::Text,
        ValueConfig::Attribute(name) if name.is_empty() => {
            return Err(RuleConfigError::EmptyValueAttribute {
                column: column.name.clone(),
            });
        }
        ValueConfig::Attribute(name) => ValueSource::Attribute(name.clone()),
    };

    Ok(FieldRule {
        column: column.name.clone(),
        path,
        selection,
        source,
    })
}
