//! Cooperative cancellation for a running generation.

use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable flag that, once set, aborts the generation holding it.
///
/// Every clone observes the same flag. The pipeline races each extraction
/// and each conversation turn against [`CancelToken::cancelled`] and returns
/// [`crate::QuizError::Cancelled`] as soon as the flag flips.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|flag| *flag).await.is_err() {
            // Sender is shared by every clone; unreachable while `self` lives.
            std::future::pending::<()>().await;
        }
    }
}
