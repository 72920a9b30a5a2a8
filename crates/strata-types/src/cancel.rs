use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// The operation was canceled through its [`CancelToken`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("operation canceled")]
pub struct Canceled;

/// Cooperative cancellation handle threaded through blocking operations.
///
/// Every operation that touches the storage backend accepts a token and
/// calls [`checkpoint`] between round-trips. Once a token is tripped all
/// subsequent checkpoints fail, so an in-flight operation returns promptly
/// without installing partial state: the store root CAS is the single
/// commit point, and chunks written before cancellation are idempotent and
/// harmless.
///
/// Tokens are cheap to clone; all clones observe the same flag.
///
/// [`checkpoint`]: CancelToken::checkpoint
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token. All clones observe the cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if the token has been tripped.
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail fast if the token has been tripped.
    pub fn checkpoint(&self) -> Result<(), Canceled> {
        if self.is_canceled() {
            Err(Canceled)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("canceled", &self.is_canceled())
            .finish()
    }
}
