//! Rule set configuration
//!
//! The serialized form of a rule set. It is validated and compiled into a
//! [`RuleSet`](super::RuleSet) before any input is read.
//!
//! ```json
//! {
//!   "record_tag": "VariationArchive",
//!   "id_attribute": "VariationID",
//!   "columns": [
//!     {"name": "variation_id", "value": {"attribute": "VariationID"}},
//!     {"name": "rs_id", "path": ".//XRef",
//!      "filter": [{"attribute": "DB", "equals": "dbSNP"}],
//!      "value": {"attribute": "ID"}}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Whole rule set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetConfig {
    pub record_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_attribute: Option<String>,
    pub columns: Vec<ColumnConfig>,
}

/// One output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<AttributeMatch>,
    pub value: ValueConfig,
}

/// `attribute == equals` clause of a filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeMatch {
    pub attribute: String,
    pub equals: String,
}

/// Where a column's value comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueConfig {
    Text,
    Attribute(String),
}

impl ColumnConfig {
    /// Column reading the text of the first element at `path`
    pub fn text(name: &str, path: &str) -> Self {
        ColumnConfig {
            name: name.to_string(),
            path: Some(path.to_string()),
            filter: Vec::new(),
            value: ValueConfig::Text,
        }
    }

    /// Column reading an attribute of the first element at `path`
    pub fn attribute(name: &str, path: &str, attribute: &str) -> Self {
        ColumnConfig {
            name: name.to_string(),
            path: Some(path.to_string()),
            filter: Vec::new(),
            value: ValueConfig::Attribute(attribute.to_string()),
        }
    }

    /// Add a filter clause; the column then picks the first matching candidate
    pub fn where_eq(mut self, attribute: &str, equals: &str) -> Self {
        self.filter.push(AttributeMatch {
            attribute: attribute.to_string(),
            equals: equals.to_string(),
        });
        self
    }
}
