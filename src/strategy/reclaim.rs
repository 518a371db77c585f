//! Memory Reclaimer
//!
//! Releases a record's arena once its row has been produced and drops the
//! consumed input behind it. Content outside records is never stored, so the
//! only other memory the walk holds is the chain of open ancestor elements.

use crate::dom::RecordTree;
use crate::reader::InputBuffer;

/// Retained-node counters for one extraction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionStats {
    /// Nodes held right now: record arena plus open ancestors
    pub retained_nodes: usize,
    /// Highest value `retained_nodes` has reached
    pub peak_retained_nodes: usize,
    pub records_reclaimed: u64,
    pub nodes_reclaimed: u64,
}

#[derive(Debug, Default)]
pub struct Reclaimer {
    stats: RetentionStats,
}

impl Reclaimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current number of retained nodes
    pub fn observe(&mut self, retained: usize) {
        self.stats.retained_nodes = retained;
        self.stats.peak_retained_nodes = self.stats.peak_retained_nodes.max(retained);
    }

    /// Release a finished record and, once it outweighs the pending tail,
    /// the input consumed so far
    pub fn reclaim(&mut self, tree: &mut RecordTree, input: &mut InputBuffer) -> usize {
        let released = tree.reclaim();
        input.maybe_compact();

        self.stats.retained_nodes = self.stats.retained_nodes.saturating_sub(released);
        self.stats.records_reclaimed += 1;
        self.stats.nodes_reclaimed += released as u64;

        if self.stats.records_reclaimed % 10_000 == 0 {
            log::debug!(
                "reclaimed {} records ({} nodes), peak retained {}, {} input bytes compacted",
                self.stats.records_reclaimed,
                self.stats.nodes_reclaimed,
                self.stats.peak_retained_nodes,
                input.bytes_moved()
            );
        }
        released
    }

    pub fn stats(&self) -> RetentionStats {
        self.stats
    }
}
