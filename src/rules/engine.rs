//! Rule evaluation over one completed record

use super::{FieldRule, Predicate, RuleSet, Row, Selection, ValueSource};
use crate::dom::{NodeId, RecordView};
use crate::path::select;
use std::borrow::Cow;

impl Predicate {
    /// All clauses hold on the node's attributes
    pub fn matches(&self, view: RecordView<'_>, node: NodeId) -> bool {
        self.clauses()
            .iter()
            .all(|(attr, expected)| view.attribute(node, attr) == Some(expected.as_str()))
    }
}

impl FieldRule {
    /// Value of this rule for a record, `None` when nothing matches
    pub fn apply(&self, view: RecordView<'_>) -> Option<String> {
        let candidates = select(view, &self.path);
        let node = match &self.selection {
            Selection::First => candidates.first().copied(),
            Selection::FirstWhere(pred) => candidates.into_iter().find(|&n| pred.matches(view, n)),
        }?;

        match &self.source {
            ValueSource::Text => view.text(node).map(Cow::into_owned),
            ValueSource::Attribute(name) => view.attribute(node, name).map(str::to_owned),
        }
    }
}

impl RuleSet {
    /// Run every rule against a record, in column order
    pub fn extract(&self, view: RecordView<'_>) -> Row {
        Row {
            values: self.rules().iter().map(|rule| rule.apply(view)).collect(),
        }
    }
}
