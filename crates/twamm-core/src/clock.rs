//! # Block Source
//!
//! The pool reads the current block from a [`BlockSource`]. Blocks must never
//! go backwards; a source that does is rejected with `InvalidBlock`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonically increasing block height
pub trait BlockSource {
    fn current_block(&self) -> u64;
}

/// Block height driven by the host. Clones share the same height.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    block: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(block: u64) -> Self {
        Self {
            block: Arc::new(AtomicU64::new(block)),
        }
    }

    /// Move forward by `blocks`
    pub fn advance(&self, blocks: u64) -> u64 {
        self.block.fetch_add(blocks, Ordering::SeqCst) + blocks
    }

    /// Jump to `block`. Lower values are ignored.
    pub fn set(&self, block: u64) {
        self.block.fetch_max(block, Ordering::SeqCst);
    }
}

impl BlockSource for ManualClock {
    fn current_block(&self) -> u64 {
        self.block.load(Ordering::SeqCst)
    }
}
