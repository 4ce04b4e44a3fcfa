use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop signal between an async `recognize` call and the blocking
/// worker doing the decoding.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Cancels the flag when dropped.
    ///
    /// Hold the guard inside the `recognize` future: if the caller's timeout
    /// drops that future, the blocking worker sees the flag and stops.
    pub fn guard(&self) -> CancelGuard {
        CancelGuard(self.clone())
    }
}

pub struct CancelGuard(CancelFlag);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
