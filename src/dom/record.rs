//! Record Tree - arena holding exactly one record's subtree
//!
//! The record root is always node 0. Nodes are appended as the record is
//! scanned, so ids follow document order and every descendant of a node
//! occupies a contiguous id range. Nothing outside the record is ever stored
//! here, which is what keeps rule evaluation scoped to the record.

use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode};
use super::strings::StringPool;
use crate::core::attributes::Attribute;
use std::borrow::Cow;

/// Arena storage for the record currently being built or read
#[derive(Debug, Default)]
pub struct RecordTree {
    nodes: Vec<XmlNode>,
    attributes: Vec<XmlAttribute>,
    strings: StringPool,
    /// Elements opened but not yet closed, innermost last
    open: Vec<NodeId>,
}

impl RecordTree {
    pub fn new() -> Self {
        RecordTree {
            nodes: Vec::with_capacity(256),
            attributes: Vec::with_capacity(128),
            strings: StringPool::new(),
            open: Vec::with_capacity(32),
        }
    }

    /// Number of nodes held
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True once the root has been opened and everything is closed again
    pub fn is_complete(&self) -> bool {
        !self.nodes.is_empty() && self.open.is_empty()
    }

    /// True while the root is open
    pub fn is_building(&self) -> bool {
        !self.open.is_empty()
    }

    /// Open an element as the last child of the innermost open element
    pub fn open_element(&mut self, name: &[u8], attrs: &[Attribute<'_>]) -> NodeId {
        let name_id = self.strings.intern_bytes(name);
        let attr_start = self.attributes.len() as u32;
        for attr in attrs {
            let name_id = self.strings.intern_bytes(attr.name);
            let value_id = self.strings.intern_bytes(attr.value.as_ref());
            self.attributes.push(XmlAttribute { name_id, value_id });
        }

        let id = self.push_node(XmlNode::element(name_id, attr_start, attrs.len() as u32));
        self.open.push(id);
        id
    }

    /// Close the innermost open element, checking its name
    ///
    /// Returns the name of the open element on mismatch.
    pub fn close_element(&mut self, name: &[u8]) -> Result<NodeId, String> {
        let Some(&id) = self.open.last() else {
            return Err(String::new());
        };
        let open_name = self.node_name(id).unwrap_or("");
        if open_name.as_bytes() != name {
            return Err(open_name.to_string());
        }

        self.open.pop();
        self.nodes[id as usize].subtree_end = self.nodes.len() as NodeId;
        Ok(id)
    }

    /// Append a text or CDATA node to the innermost open element
    pub fn append_text(&mut self, kind: NodeKind, content: &[u8]) {
        if self.open.is_empty() || content.is_empty() {
            return;
        }
        let content_id = self.strings.intern_bytes(content);
        self.push_node(XmlNode::text(kind, content_id));
    }

    /// Record where a comment or processing instruction sat
    ///
    /// The node carries no content but ends the text run of its parent.
    pub fn append_marker(&mut self, kind: NodeKind) {
        if self.open.is_empty() {
            return;
        }
        self.push_node(XmlNode::marker(kind));
    }

    fn push_node(&mut self, node: XmlNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);

        if let Some(&parent) = self.open.last() {
            match self.nodes[parent as usize].last_child {
                Some(prev) => self.nodes[prev as usize].next_sibling = Some(id),
                None => self.nodes[parent as usize].first_child = Some(id),
            }
            self.nodes[parent as usize].last_child = Some(id);
        }
        id
    }

    fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.nodes.get(id as usize)?;
        self.strings.get(node.name_id)
    }

    /// Read-only view of the finished record
    pub fn view(&self) -> RecordView<'_> {
        RecordView { tree: self }
    }

    /// Discard the record, keeping allocated capacity
    ///
    /// Returns the number of nodes released.
    pub fn reclaim(&mut self) -> usize {
        let released = self.nodes.len();
        self.nodes.clear();
        self.attributes.clear();
        self.strings.clear();
        self.open.clear();
        released
    }
}

/// Borrowed handle on one complete record
///
/// Holding a view keeps the owning scanner borrowed, so a record can never be
/// read after the scanner moves on to the next one.
#[derive(Clone, Copy)]
pub struct RecordView<'a> {
    tree: &'a RecordTree,
}

impl<'a> RecordView<'a> {
    /// The record root element
    pub fn root(&self) -> NodeId {
        0
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&'a XmlNode> {
        self.tree.nodes.get(id as usize)
    }

    /// Number of nodes in the record
    pub fn node_count(&self) -> usize {
        self.tree.nodes.len()
    }

    /// Element name
    pub fn name(&self, id: NodeId) -> Option<&'a str> {
        let node = self.get_node(id)?;
        if !node.is_element() {
            return None;
        }
        self.tree.strings.get(node.name_id)
    }

    /// Attributes of an element
    pub fn attributes(&self, id: NodeId) -> &'a [XmlAttribute] {
        let Some(node) = self.get_node(id) else {
            return &[];
        };
        let start = node.attr_start as usize;
        let end = start + node.attr_count as usize;
        self.tree.attributes.get(start..end).unwrap_or(&[])
    }

    /// Get attribute value by name
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&'a str> {
        self.attributes(id)
            .iter()
            .find(|attr| self.tree.strings.get(attr.name_id) == Some(name))
            .and_then(|attr| self.tree.strings.get(attr.value_id))
    }

    /// Iterate over all children of a node, in document order
    pub fn children(&self, id: NodeId) -> ChildIter<'a> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { view: *self, next: first }
    }

    /// Iterate over descendant elements of a node, in document order
    pub fn descendant_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + 'a {
        let view = *self;
        let range = match self.get_node(id) {
            Some(node) => id + 1..node.subtree_end.max(id + 1),
            None => 0..0,
        };
        range.filter(move |&d| view.get_node(d).is_some_and(XmlNode::is_element))
    }

    /// Element text: the run of text/CDATA children before the first child
    /// element, comment or processing instruction. `None` when that run is
    /// empty.
    pub fn text(&self, id: NodeId) -> Option<Cow<'a, str>> {
        let mut text: Option<Cow<'a, str>> = None;
        for child in self.children(id) {
            let node = self.get_node(child)?;
            if !node.is_text() {
                break;
            }
            let part = self.tree.strings.get(node.name_id).unwrap_or("");
            text = Some(match text {
                None => Cow::Borrowed(part),
                Some(prev) => Cow::Owned(prev.into_owned() + part),
            });
        }
        text
    }
}

/// Iterator over child nodes
pub struct ChildIter<'a> {
    view: RecordView<'a>,
    next: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.view.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attributes::parse_attributes;

    fn build() -> RecordTree {
        // <VA id="1"><A x="1">hi<B/></A><C><A x="2"/></C></VA>
        let mut tree = RecordTree::new();
        let attrs = parse_attributes(b" id=\"1\"").unwrap();
        tree.open_element(b"VA", &attrs);
        let attrs = parse_attributes(b" x=\"1\"").unwrap();
        tree.open_element(b"A", &attrs);
        tree.append_text(NodeKind::Text, b"hi");
        tree.open_element(b"B", &[]);
        tree.close_element(b"B").unwrap();
        tree.close_element(b"A").unwrap();
        tree.open_element(b"C", &[]);
        let attrs = parse_attributes(b" x=\"2\"").unwrap();
        tree.open_element(b"A", &attrs);
        tree.close_element(b"A").unwrap();
        tree.close_element(b"C").unwrap();
        tree.close_element(b"VA").unwrap();
        tree
    }

    #[test]
    fn test_build_and_navigate() {
        let tree = build();
        assert!(tree.is_complete());
        let view = tree.view();
        assert_eq!(view.name(view.root()), Some("VA"));
        assert_eq!(view.attribute(0, "id"), Some("1"));
        assert_eq!(view.attribute(0, "missing"), None);

        let children: Vec<_> = view.children(0).filter_map(|c| view.name(c)).collect();
        assert_eq!(children, vec!["A", "C"]);

        let descendants: Vec<_> = view.descendant_elements(0).filter_map(|d| view.name(d)).collect();
        assert_eq!(descendants, vec!["A", "B", "C", "A"]);
    }

    #[test]
    fn test_descendants_stay_in_subtree() {
        let tree = build();
        let view = tree.view();
        let first_a = view.children(0).next().unwrap();
        let names: Vec<_> = view.descendant_elements(first_a).filter_map(|d| view.name(d)).collect();
        assert_eq!(names, vec!["B"]);
    }

    #[test]
    fn test_text_is_leading_run() {
        let mut tree = RecordTree::new();
        tree.open_element(b"D", &[]);
        tree.append_text(NodeKind::Text, b"Patho");
        tree.append_text(NodeKind::CData, b"genic");
        tree.open_element(b"X", &[]);
        tree.close_element(b"X").unwrap();
        tree.append_text(NodeKind::Text, b"tail");
        tree.close_element(b"D").unwrap();

        let view = tree.view();
        assert_eq!(view.text(0).as_deref(), Some("Pathogenic"));
        let x = view.children(0).nth(2).unwrap();
        assert_eq!(view.text(x), None);
    }

    #[test]
    fn test_comment_ends_text_run() {
        let mut tree = RecordTree::new();
        tree.open_element(b"D", &[]);
        tree.append_text(NodeKind::Text, b"Patho");
        tree.append_marker(NodeKind::Comment);
        tree.append_text(NodeKind::Text, b"genic");
        tree.open_element(b"P", &[]);
        tree.append_marker(NodeKind::ProcessingInstruction);
        tree.append_text(NodeKind::Text, b"after");
        tree.close_element(b"P").unwrap();
        tree.close_element(b"D").unwrap();

        let view = tree.view();
        assert_eq!(view.text(0).as_deref(), Some("Patho"));
        let p = view.descendant_elements(0).next().unwrap();
        assert_eq!(view.name(p), Some("P"));
        assert_eq!(view.text(p), None);
        assert_eq!(view.children(0).filter_map(|c| view.name(c)).count(), 1);
    }

    #[test]
    fn test_marker_outside_record_is_ignored() {
        let mut tree = RecordTree::new();
        tree.append_marker(NodeKind::Comment);
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn test_close_mismatch_reports_open_name() {
        let mut tree = RecordTree::new();
        tree.open_element(b"A", &[]);
        assert_eq!(tree.close_element(b"B"), Err("A".to_string()));
    }

    #[test]
    fn test_reclaim_empties_tree() {
        let mut tree = build();
        assert_eq!(tree.reclaim(), 6);
        assert_eq!(tree.node_count(), 0);
        assert!(!tree.is_complete());
        assert!(!tree.is_building());
    }
}
