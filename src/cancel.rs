//! Cooperative cancellation signal for long-running operations.
//!
//! KDF and calibration loops observe a cancellation signal, checked between
//! byte positions or between KDF iterations, and return
//! [`SbkError::Cancelled`](crate::error::SbkError::Cancelled) without
//! yielding partial secrets. This is a plain atomic flag rather than a
//! channel: the orchestrator only ever needs a level-triggered "stop now",
//! and a flag composes more simply with the worker/timer split in
//! [`crate::kdf`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
