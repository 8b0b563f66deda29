//! Tokio-backed task runner

use futures::future::BoxFuture;

use herdcache_core::TaskRunner;

/// Runner that hands tasks to the ambient tokio runtime
///
/// Must be used from within a runtime context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

impl TokioRunner {
    /// Create a new tokio runner
    pub fn new() -> Self {
        Self
    }
}

impl TaskRunner for TokioRunner {
    fn submit(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_submit_runs_task() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        TokioRunner::new().submit(Box::pin(async move {
            flag.store(true, Ordering::SeqCst);
        }));

        tokio::task::yield_now().await;
        assert!(ran.load(Ordering::SeqCst));
    }
}
