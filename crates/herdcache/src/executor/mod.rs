//! Bounded-resource async executor
//!
//! [`BoundedExecutor`] runs one batch of caller-supplied tasks at a time
//! over an external [`TaskRunner`], holding the number of concurrently
//! executing bodies at a fixed resource limit. Tasks start in submission
//! order; a waiting caller can promote a still-queued task to the front
//! of the start order and block on its result.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Semaphore, watch};
use tracing::debug;

use herdcache_core::{CacheError, Result, TaskRunner};

mod runner;
pub use runner::TokioRunner;

/// A task body submitted to the executor
pub type TaskFuture<T> = BoxFuture<'static, Result<T>>;

enum TaskState {
    Queued,
    Running,
    Done,
}

struct TaskSlot<T> {
    state: TaskState,
    task: Option<TaskFuture<T>>,
    outcome_tx: watch::Sender<Option<Result<T>>>,
    outcome_rx: watch::Receiver<Option<Result<T>>>,
}

struct Batch<T> {
    /// Guards a finished wrapper of an older batch against touching a
    /// newer batch installed after `clear`
    epoch: u64,
    slots: HashMap<String, TaskSlot<T>>,
    queue: VecDeque<String>,
    /// Promoted ids start before anything left in `queue`
    promoted: VecDeque<String>,
    stopped: bool,
    /// Tasks not yet in a terminal state
    pending: usize,
}

impl<T> Batch<T> {
    /// Pop the next startable task id, promoted ids first
    fn pop_next(&mut self) -> Option<String> {
        self.promoted.pop_front().or_else(|| self.queue.pop_front())
    }

    /// Resolve every still-queued task as cancelled
    fn cancel_queued(&mut self) {
        let ids: Vec<String> = self.promoted.drain(..).chain(self.queue.drain(..)).collect();
        for id in ids {
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.state = TaskState::Done;
                slot.outcome_tx
                    .send_replace(Some(Err(CacheError::Cancelled(id.clone()))));
                self.pending = self.pending.saturating_sub(1);
            }
        }
    }
}

/// Coordinator for a batch of tasks sharing a resource pool
///
/// Construction takes the external runner the work executes on and the
/// size of the pool. At any moment at most `resource_limit` task bodies
/// are executing; start order is submission order except where
/// [`get_or_wait`](Self::get_or_wait) promotes a queued task. Starting is
/// serialized through a single drainer which acquires the resource permit
/// and only then picks the next task, so a promotion always beats every
/// task still waiting in line.
pub struct BoundedExecutor<T> {
    runner: Arc<dyn TaskRunner>,
    resources: Arc<Semaphore>,
    state: Arc<Mutex<Option<Batch<T>>>>,
    epochs: AtomicU64,
}

impl<T> BoundedExecutor<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an executor over `runner` with `resource_limit` permits
    ///
    /// Fails with an argument error when the limit is zero.
    pub fn new(runner: Arc<dyn TaskRunner>, resource_limit: usize) -> Result<Self> {
        if resource_limit == 0 {
            return Err(CacheError::argument("resource limit must be positive"));
        }
        Ok(Self {
            runner,
            resources: Arc::new(Semaphore::new(resource_limit)),
            state: Arc::new(Mutex::new(None)),
            epochs: AtomicU64::new(0),
        })
    }

    /// Submit a batch of `(id, task)` pairs
    ///
    /// Fails with a state error while a previous batch is still running
    /// and with an argument error when two tasks share an id. A completed
    /// batch is replaced; its results are dropped.
    pub fn execute(&self, tasks: Vec<(String, TaskFuture<T>)>) -> Result<()> {
        let mut guard = self.state.lock();
        if let Some(batch) = guard.as_ref() {
            if batch.pending > 0 {
                return Err(CacheError::state("a batch is still running"));
            }
        }

        let mut slots = HashMap::with_capacity(tasks.len());
        let mut queue = VecDeque::with_capacity(tasks.len());
        for (id, task) in tasks {
            let (outcome_tx, outcome_rx) = watch::channel(None);
            let slot = TaskSlot {
                state: TaskState::Queued,
                task: Some(task),
                outcome_tx,
                outcome_rx,
            };
            if slots.insert(id.clone(), slot).is_some() {
                return Err(CacheError::argument(format!("duplicate task id: {id}")));
            }
            queue.push_back(id);
        }

        let epoch = self.epochs.fetch_add(1, Ordering::Relaxed) + 1;
        let pending = slots.len();
        debug!(target: "herdcache", epoch, tasks = pending, "executor batch accepted");
        *guard = Some(Batch {
            epoch,
            slots,
            queue,
            promoted: VecDeque::new(),
            stopped: false,
            pending,
        });
        drop(guard);

        self.spawn_drainer(epoch);
        Ok(())
    }

    /// Get a task's result, waiting for it if necessary
    ///
    /// A completed task returns its result or failure immediately. A
    /// running task is awaited. A task still waiting in line is promoted
    /// to start next, ahead of the remaining queue, and then awaited.
    /// Fails with a not-found error for an id that was never submitted
    /// and with a state error before any batch.
    pub async fn get_or_wait(&self, id: &str) -> Result<T> {
        let mut outcome_rx = {
            let mut guard = self.state.lock();
            let batch = guard
                .as_mut()
                .ok_or_else(|| CacheError::state("no batch has been submitted"))?;
            let Some(slot) = batch.slots.get_mut(id) else {
                return Err(CacheError::NotFound(id.to_string()));
            };
            if matches!(slot.state, TaskState::Queued) {
                if let Some(position) = batch.queue.iter().position(|queued| queued == id) {
                    batch.queue.remove(position);
                    batch.promoted.push_back(id.to_string());
                    debug!(target: "herdcache", id, "task promoted");
                }
            }
            slot.outcome_rx.clone()
        };

        let outcome = outcome_rx
            .wait_for(|outcome| outcome.is_some())
            .await
            .map_err(|_| CacheError::state("executor was cleared"))?
            .clone();
        match outcome {
            Some(result) => result,
            None => Err(CacheError::state("executor was cleared")),
        }
    }

    /// Whether the current batch still has unfinished tasks
    pub fn is_running(&self) -> bool {
        self.state
            .lock()
            .as_ref()
            .map(|batch| batch.pending > 0)
            .unwrap_or(false)
    }

    /// Whether the current batch has finished every task
    pub fn is_completed(&self) -> bool {
        self.state
            .lock()
            .as_ref()
            .map(|batch| batch.pending == 0)
            .unwrap_or(false)
    }

    /// Prevent any further queued task from starting
    ///
    /// Queued tasks resolve as cancelled so their waiters unblock;
    /// running tasks finish normally and keep their results.
    pub fn stop(&self) {
        let mut guard = self.state.lock();
        let Some(batch) = guard.as_mut() else {
            return;
        };
        if batch.stopped {
            return;
        }
        batch.stopped = true;
        batch.cancel_queued();
        debug!(target: "herdcache", epoch = batch.epoch, "executor stopped");
    }

    /// Drop the current batch and every stored result
    pub fn clear(&self) {
        *self.state.lock() = None;
    }

    /// Start the loop that feeds tasks to the runner
    fn spawn_drainer(&self, epoch: u64) {
        let resources = Arc::clone(&self.resources);
        let state = Arc::clone(&self.state);
        let runner = Arc::clone(&self.runner);

        let drainer = async move {
            loop {
                // Hold the resource before picking a task, so a promotion
                // arriving while the pool is exhausted still jumps ahead
                // of everything not yet started.
                let Ok(permit) = resources.clone().acquire_owned().await else {
                    return;
                };

                let next = {
                    let mut guard = state.lock();
                    let Some(batch) = guard.as_mut() else { return };
                    if batch.epoch != epoch || batch.stopped {
                        return;
                    }
                    match batch.pop_next() {
                        Some(id) => match batch.slots.get_mut(&id) {
                            Some(slot) => {
                                slot.state = TaskState::Running;
                                slot.task
                                    .take()
                                    .map(|task| (id, task, slot.outcome_tx.clone()))
                            }
                            None => None,
                        },
                        None => None,
                    }
                };

                // Queues drained: every task has started, and none can be
                // added until the next batch brings its own drainer.
                let Some((id, task, outcome_tx)) = next else {
                    return;
                };

                let wrapper_state = Arc::clone(&state);
                runner.submit(Box::pin(async move {
                    let _permit = permit;
                    let stopped = {
                        let guard = wrapper_state.lock();
                        guard
                            .as_ref()
                            .map(|batch| batch.epoch != epoch || batch.stopped)
                            .unwrap_or(true)
                    };

                    let outcome = if stopped {
                        Err(CacheError::Cancelled(id.clone()))
                    } else {
                        task.await
                    };

                    let mut guard = wrapper_state.lock();
                    if let Some(batch) = guard.as_mut() {
                        if batch.epoch == epoch {
                            if let Some(slot) = batch.slots.get_mut(&id) {
                                slot.state = TaskState::Done;
                            }
                            batch.pending = batch.pending.saturating_sub(1);
                        }
                    }
                    drop(guard);
                    outcome_tx.send_replace(Some(outcome));
                }));
            }
        };
        self.runner.submit(Box::pin(drainer));
    }
}
