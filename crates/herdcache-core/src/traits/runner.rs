//! Task runner trait

use futures::future::BoxFuture;

/// A parallel worker pool that tasks can be handed to
///
/// The bounded executor and the async loading cache are both constructed
/// over a runner rather than spawning directly, so callers decide where
/// background work executes.
pub trait TaskRunner: Send + Sync + 'static {
    /// Hand a task to the pool; returns without waiting for it
    fn submit(&self, task: BoxFuture<'static, ()>);
}
