//! Cooperative cancellation of an in-flight generation

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared, resettable cancellation flag
///
/// Clones share the same flag. The generation loop polls it between tokens;
/// the command router is the only writer.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a cleared token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the flag
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    /// Set the flag
    pub fn signal(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Read the flag
    #[must_use]
    pub fn is_signaled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
