//! String Interning Pool
//!
//! Stores element names, attribute names/values and text content for one
//! record. Names repeat heavily inside a record (`XRef`, `DB`, `Assembly`), so
//! content is deduplicated through a hash index. The pool is cleared, not
//! dropped, between records: its buffers keep their capacity.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// String interning pool
///
/// Memory layout:
/// - `entries`: (offset, len) into `data` for each interned string ID
/// - `data`: one UTF-8 buffer holding every distinct string
/// - `hash_index`: hash -> list of IDs (handles rare collisions)
#[derive(Debug)]
pub struct StringPool {
    entries: Vec<(u32, u32)>,
    data: String,
    hash_index: HashMap<u64, Vec<u32>>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(256),
            data: String::with_capacity(4096),
            hash_index: HashMap::new(),
        };
        // Entry 0 is reserved for the empty string
        pool.entries.push((0, 0));
        pool
    }

    #[inline]
    fn compute_hash(s: &str) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern raw bytes, replacing invalid UTF-8 sequences
    pub fn intern_bytes(&mut self, s: &[u8]) -> u32 {
        self.intern(&String::from_utf8_lossy(s))
    }

    /// Intern a string, returning its ID
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);

        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get(id) == Some(s) {
                    return id;
                }
            }
        }

        let offset = self.data.len() as u32;
        self.data.push_str(s);

        let id = self.entries.len() as u32;
        self.entries.push((offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(id);

        id
    }

    /// Get a string by ID
    pub fn get(&self, id: u32) -> Option<&str> {
        let &(offset, len) = self.entries.get(id as usize)?;
        let start = offset as usize;
        self.data.get(start..start + len as usize)
    }

    /// Check if the pool holds no strings besides the reserved entry
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Drop every string, keeping allocated capacity for the next record
    pub fn clear(&mut self) {
        self.entries.truncate(1);
        self.data.clear();
        self.hash_index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_get() {
        let mut pool = StringPool::new();
        let id = pool.intern("GRCh38");
        assert!(id > 0);
        assert_eq!(pool.get(id), Some("GRCh38"));
    }

    #[test]
    fn test_intern_duplicate() {
        let mut pool = StringPool::new();
        let id1 = pool.intern("XRef");
        let id2 = pool.intern("XRef");
        let id3 = pool.intern("Gene");
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(pool.data.len(), 8);
    }

    #[test]
    fn test_empty_string() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(""), 0);
        assert_eq!(pool.get(0), Some(""));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_long_string_not_truncated() {
        let mut pool = StringPool::new();
        let long = "A".repeat(70_000);
        let id = pool.intern(&long);
        assert_eq!(pool.get(id).map(str::len), Some(70_000));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut pool = StringPool::new();
        let id = pool.intern_bytes(b"ab\xFFcd");
        assert_eq!(pool.get(id), Some("ab\u{FFFD}cd"));
    }

    #[test]
    fn test_clear_resets_ids() {
        let mut pool = StringPool::new();
        pool.intern("one");
        pool.intern("two");
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.data.len(), 0);
        let id = pool.intern("three");
        assert_eq!(id, 1);
        assert_eq!(pool.get(id), Some("three"));
    }
}
