//! Compiled path cache
//!
//! Rule sets are often compiled again for every extractor created from the
//! host. Paths repeat across those rule sets, so compiled expressions are kept
//! in a process-wide LRU cache.

use super::parser::{parse, PathExpr};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, OnceLock};

const CACHE_CAPACITY: usize = 256;

static CACHE: OnceLock<Mutex<LruCache<String, Arc<PathExpr>>>> = OnceLock::new();

fn cache() -> &'static Mutex<LruCache<String, Arc<PathExpr>>> {
    CACHE.get_or_init(|| {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Mutex::new(LruCache::new(capacity))
    })
}

/// Compile a path, reusing an earlier compilation when available
pub fn compile_cached(path: &str) -> Result<Arc<PathExpr>, String> {
    let Ok(mut guard) = cache().lock() else {
        // A poisoned cache only costs a recompile
        return parse(path).map(Arc::new);
    };

    if let Some(expr) = guard.get(path) {
        return Ok(Arc::clone(expr));
    }

    let expr = Arc::new(parse(path)?);
    guard.put(path.to_string(), Arc::clone(&expr));
    Ok(expr)
}
