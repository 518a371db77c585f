//! DOM Module - Arena-based record storage
//!
//! - Arena allocation for the nodes of one record at a time
//! - NodeId (u32) indices, assigned in document order
//! - String interning for names, attribute values and text

pub mod node;
pub mod record;
pub mod strings;

pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode};
pub use record::{RecordTree, RecordView};
pub use strings::StringPool;
