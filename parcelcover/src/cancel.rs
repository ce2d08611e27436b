//! Cooperative cancellation for long-running overlays.
//!
//! Cross-product overlays can run for a long time; the engine polls a
//! [`CancelToken`] between output batches so cancellation never leaves a
//! partially-written dataset under its final name (staging outputs are
//! discarded on cancel).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply cloneable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
