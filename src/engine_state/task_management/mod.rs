//! # Task Management System
//!
//! This module provides the worker pools that run chunk generation and meshing off
//! the main thread, plus an inline mode that runs the same tasks on the calling
//! thread under a per-frame budget.
//!
//! ## Architecture Overview
//!
//! The task management system consists of three pieces:
//! - `Task`: A unit of work that can be executed on any thread
//! - `TaskQueue`: A blocking FIFO with a shutdown flag and a pending-work counter
//! - `TaskManager`: One queue plus the worker threads that drain it
//!
//! ## Scheduling Modes
//!
//! ### Threaded
//! - Creates a pool of OS threads with `std::thread`
//! - Workers block on the queue; publishing wakes one of them
//! - Dropping the manager sets the shutdown flag, wakes every worker and joins them
//!
//! ### Inline
//! - A manager created with zero workers never spawns threads
//! - `process_queued_tasks(budget)` runs up to `budget` tasks on the calling thread
//! - Also used as a fallback when no worker thread could be spawned
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. A worker (or `process_queued_tasks`) pops and processes them in FIFO order
//! 3. Processing pushes follow-up work into other queues before it returns
//! 4. The task is marked complete and the pending counter drops
//!
//! ## Performance Considerations
//! - **Task Granularity**: one chunk per task, large enough to amortize queueing
//! - **Blocking**: tasks take chunk locks only for bounded sections
//! - **Shutdown**: queued tasks are dropped, in-flight tasks finish before the join

pub mod task;
pub mod task_queue;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};
pub use task::Task;
pub use task_queue::TaskQueue;

/// Derives a worker count from the configured value.
///
/// `0` means automatic: `share` of the available parallelism minus one thread kept
/// for the main loop. The result is at least 1.
pub fn resolve_worker_count(configured: usize, share: f32) -> usize {
    if configured > 0 {
        return configured;
    }
    let available = thread::available_parallelism().map_or(1, |count| count.get());
    info!("Available parallelism: {:?}", available);
    let usable = available.saturating_sub(1).max(1);
    ((usable as f32 * share).floor() as usize).max(1)
}

/// Manages one task queue and the worker threads that drain it.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use voxel_world::engine_state::task_management::{Task, TaskManager};
///
/// struct Count(Arc<AtomicUsize>);
///
/// impl Task for Count {
///     fn process(self) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// let manager = TaskManager::new("count", 0);
/// for _ in 0..3 {
///     manager.publish_task(Count(counter.clone()));
/// }
/// assert_eq!(manager.process_queued_tasks(2), 2);
/// assert_eq!(counter.load(Ordering::SeqCst), 2);
/// assert_eq!(manager.pending(), 1);
/// ```
pub struct TaskManager<T: Task> {
    name: &'static str,
    queue: Arc<TaskQueue<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Task> TaskManager<T> {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `name` - Prefix of the worker thread names, also used in log lines
    /// * `num_workers` - Number of worker threads; `0` selects inline mode
    ///
    /// # Returns
    /// A manager whose workers (if any) are already waiting for tasks. Workers that
    /// fail to spawn are logged and skipped; with none left the manager runs inline.
    pub fn new(name: &'static str, num_workers: usize) -> Self {
        let queue = Arc::new(TaskQueue::<T>::new());
        let mut workers = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let worker_queue = queue.clone();
            let spawned = thread::Builder::new()
                .name(format!("{name}-{index}"))
                .spawn(move || {
                    while let Some(task) = worker_queue.pop_blocking() {
                        task.process();
                        worker_queue.complete();
                    }
                });

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => error!("Failed to spawn {name} worker {index}: {err}"),
            }
        }

        if num_workers > 0 && workers.is_empty() {
            warn!("No {name} worker could be started, running {name} tasks inline");
        }
        info!("Started {} {} worker(s)", workers.len(), name);

        TaskManager {
            name,
            queue,
            workers,
        }
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// `false` if the manager is shutting down and the task was dropped.
    pub fn publish_task(&self, task: T) -> bool {
        self.queue.push(task)
    }

    /// Runs up to `budget` queued tasks on the calling thread.
    ///
    /// Does nothing when worker threads drain the queue.
    ///
    /// # Returns
    /// The number of tasks processed.
    pub fn process_queued_tasks(&self, budget: usize) -> usize {
        if self.is_threaded() {
            return 0;
        }

        let mut processed = 0;
        while processed < budget {
            let Some(task) = self.queue.try_pop() else {
                break;
            };
            task.process();
            self.queue.complete();
            processed += 1;
        }
        processed
    }

    /// True when worker threads drain the queue.
    pub fn is_threaded(&self) -> bool {
        !self.workers.is_empty()
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Shared handle to the queue, for tasks that publish follow-up work.
    pub fn queue(&self) -> Arc<TaskQueue<T>> {
        self.queue.clone()
    }

    /// Tasks queued or running.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Drops every task no worker has started.
    ///
    /// # Returns
    /// The number of tasks dropped.
    pub fn clear_queued(&self) -> usize {
        let dropped = self.queue.clear();
        if dropped > 0 {
            debug!("Dropped {dropped} queued {} task(s)", self.name);
        }
        dropped
    }

    /// Stops accepting work and joins every worker.
    ///
    /// Tasks already running finish first; queued tasks are dropped. Calling this
    /// more than once is harmless.
    pub fn shutdown(&mut self) {
        self.queue.shutdown();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("A {} worker panicked", self.name);
            }
        }
    }
}

impl<T: Task> Drop for TaskManager<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
