//! Record node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references. Ids are
//! assigned in creation order, which is document order.

/// Compact node identifier (index into the record arena)
pub type NodeId = u32;

/// Type of record node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment; only its position is kept
    Comment,
    /// Processing instruction; only its position is kept
    ProcessingInstruction,
}

/// A node in the record arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for name (elements) or text content (text nodes)
    pub name_id: u32,
    /// Start of attributes in attribute arena (for elements)
    pub attr_start: u32,
    /// Number of attributes
    pub attr_count: u32,
    /// One past the last descendant; descendants occupy `id + 1 .. subtree_end`
    pub subtree_end: NodeId,
}

impl XmlNode {
    /// Create a new element node
    pub fn element(name_id: u32, attr_start: u32, attr_count: u32) -> Self {
        XmlNode {
            kind: NodeKind::Element,
            first_child: None,
            last_child: None,
            next_sibling: None,
            name_id,
            attr_start,
            attr_count,
            subtree_end: 0,
        }
    }

    /// Create a new text or CDATA node
    pub fn text(kind: NodeKind, content_id: u32) -> Self {
        XmlNode {
            kind,
            first_child: None,
            last_child: None,
            next_sibling: None,
            name_id: content_id,
            attr_start: 0,
            attr_count: 0,
            subtree_end: 0,
        }
    }

    /// Create a content-less comment or processing-instruction node
    pub fn marker(kind: NodeKind) -> Self {
        Self::text(kind, 0)
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this is a text or CDATA node
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }
}

/// Stored attribute
#[derive(Debug, Clone, Copy)]
pub struct XmlAttribute {
    /// Index into string pool for attribute name
    pub name_id: u32,
    /// Index into string pool for attribute value
    pub value_id: u32,
}
