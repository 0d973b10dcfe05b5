use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation signal polled at render checkpoints.
///
/// Cloning shares the flag. Raising it does not interrupt work; stages observe it at their next
/// checkpoint. The flag stays raised until [`AbortHandle::reset`] is called by whoever schedules
/// the next render.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Create a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    pub fn abort(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Lower the flag.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Return `true` once the flag has been raised.
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
