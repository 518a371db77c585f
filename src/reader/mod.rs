//! Input Module
//!
//! - InputBuffer: chunked input with compaction and absolute offsets

pub mod buffered;

pub use buffered::{InputBuffer, DEFAULT_CHUNK_SIZE};
