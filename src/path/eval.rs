//! Path Evaluation
//!
//! Evaluates a compiled sub-path against one record. Navigation starts at the
//! record root and only ever walks downward, so a result can never lie outside
//! the record.

use super::parser::{Axis, NameTest, PathExpr, Step, StepPredicate};
use crate::dom::{NodeId, RecordView};

/// Select the elements a path reaches, in document order without duplicates
pub fn select(view: RecordView<'_>, expr: &PathExpr) -> Vec<NodeId> {
    if view.node_count() == 0 {
        return Vec::new();
    }

    let mut context = vec![view.root()];
    for step in &expr.steps {
        let mut next = Vec::new();
        for &node in &context {
            match step.axis {
                Axis::Child => next.extend(
                    view.children(node)
                        .filter(|&child| matches_step(view, child, step)),
                ),
                Axis::Descendant => next.extend(
                    view.descendant_elements(node)
                        .filter(|&d| matches_step(view, d, step)),
                ),
            }
        }

        // Ids are assigned in document order
        if context.len() > 1 {
            next.sort_unstable();
            next.dedup();
        }
        if next.is_empty() {
            return next;
        }
        context = next;
    }
    context
}

fn matches_step(view: RecordView<'_>, node: NodeId, step: &Step) -> bool {
    let Some(name) = view.name(node) else {
        return false;
    };
    let name_ok = match &step.test {
        NameTest::Any => true,
        NameTest::Name(expected) => name == expected,
    };
    name_ok
        && step.predicates.iter().all(|pred| match pred {
            StepPredicate::HasAttribute(attr) => view.attribute(node, attr).is_some(),
            StepPredicate::AttributeEquals(attr, value) => {
                view.attribute(node, attr) == Some(value.as_str())
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attributes::parse_attributes;
    use crate::dom::RecordTree;
    use crate::path::parser::parse;

    fn open(tree: &mut RecordTree, name: &str, attrs: &str) {
        let attrs = parse_attributes(attrs.as_bytes()).unwrap();
        tree.open_element(name.as_bytes(), &attrs);
    }

    fn close(tree: &mut RecordTree, name: &str) {
        tree.close_element(name.as_bytes()).unwrap();
    }

    // <R><G n="1"><X/></G><L><G n="2"><G n="3"/></G></L><X/></R>
    fn build() -> RecordTree {
        let mut tree = RecordTree::new();
        open(&mut tree, "R", "");
        open(&mut tree, "G", " n=\"1\"");
        open(&mut tree, "X", "");
        close(&mut tree, "X");
        close(&mut tree, "G");
        open(&mut tree, "L", "");
        open(&mut tree, "G", " n=\"2\"");
        open(&mut tree, "G", " n=\"3\"");
        close(&mut tree, "G");
        close(&mut tree, "G");
        close(&mut tree, "L");
        open(&mut tree, "X", "");
        close(&mut tree, "X");
        close(&mut tree, "R");
        tree
    }

    fn attrs(view: RecordView<'_>, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| view.attribute(id, "n").unwrap_or("-").to_string())
            .collect()
    }

    #[test]
    fn test_self() {
        let tree = build();
        let view = tree.view();
        assert_eq!(select(view, &parse(".").unwrap()), vec![0]);
    }

    #[test]
    fn test_child_vs_descendant() {
        let tree = build();
        let view = tree.view();
        let child = select(view, &parse("G").unwrap());
        assert_eq!(attrs(view, &child), vec!["1"]);

        let desc = select(view, &parse(".//G").unwrap());
        assert_eq!(attrs(view, &desc), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_nested_descendant_deduplicates() {
        let tree = build();
        let view = tree.view();
        // G n=3 is reachable from both G n=2 and the root
        let result = select(view, &parse(".//G//G").unwrap());
        assert_eq!(attrs(view, &result), vec!["3"]);
    }

    #[test]
    fn test_predicates_and_wildcard() {
        let tree = build();
        let view = tree.view();
        let result = select(view, &parse(".//G[@n='2']").unwrap());
        assert_eq!(attrs(view, &result), vec!["2"]);

        let result = select(view, &parse("*[@n]").unwrap());
        assert_eq!(attrs(view, &result), vec!["1"]);

        let result = select(view, &parse("L/*/G").unwrap());
        assert_eq!(attrs(view, &result), vec!["3"]);
    }

    #[test]
    fn test_no_match() {
        let tree = build();
        let view = tree.view();
        assert!(select(view, &parse("Missing/X").unwrap()).is_empty());
        assert!(select(view, &parse(".//G[@n='9']").unwrap()).is_empty());
    }

    #[test]
    fn test_empty_record() {
        let tree = RecordTree::new();
        assert!(select(tree.view(), &parse(".").unwrap()).is_empty());
    }
}
