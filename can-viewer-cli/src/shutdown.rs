//! Interrupt handling
//!
//! Ctrl-C only raises a flag; the display loop checks it between iterations
//! and after every receive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Cancel this token on Ctrl-C (SIGINT)
    ///
    /// Other termination signals keep their default action. Can only be
    /// installed once per process.
    pub fn install_interrupt_handler(&self) -> Result<(), ctrlc::Error> {
        ctrlc::set_handler(self.interrupt_handler())
    }

    fn interrupt_handler(&self) -> impl FnMut() + Send + 'static {
        let token = self.clone();
        move || {
            log::debug!("Interrupt received");
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());

        handle.cancel();
        assert!(token.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_interrupt_handler_cancels_from_signal_thread() {
        let token = CancelToken::new();
        let mut handler = token.interrupt_handler();
        assert!(!token.is_cancelled());

        std::thread::spawn(move || handler()).join().unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_from_other_thread() {
        let token = CancelToken::new();
        let handle = token.clone();
        std::thread::spawn(move || handle.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
