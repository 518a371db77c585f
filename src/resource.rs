//! ResourceArc Wrappers
//!
//! Persistent extractor state shared with the BEAM between NIF calls.

use crate::rules::RuleSet;
use crate::strategy::RecordExtractor;
use rustler::ResourceArc;
use std::sync::{Arc, Mutex, MutexGuard};

/// Wrapper for RecordExtractor that can be stored in a ResourceArc
pub struct ExtractorResource {
    pub inner: Mutex<RecordExtractor>,
}

impl ExtractorResource {
    pub fn new(rules: RuleSet) -> Self {
        ExtractorResource {
            inner: Mutex::new(RecordExtractor::new(Arc::new(rules))),
        }
    }

    /// Lock the extractor
    ///
    /// # Errors
    ///
    /// Raises `:mutex_poisoned` if an earlier call panicked while holding it.
    pub fn lock(&self) -> rustler::NifResult<MutexGuard<'_, RecordExtractor>> {
        self.inner
            .lock()
            .map_err(|_| rustler::Error::RaiseAtom("mutex_poisoned"))
    }
}

#[rustler::resource_impl]
impl rustler::Resource for ExtractorResource {}

/// Type alias for the ResourceArc
pub type ExtractorRef = ResourceArc<ExtractorResource>;
