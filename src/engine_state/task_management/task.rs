//! # Task System Core Trait
//!
//! This module defines the unit of work the task system executes.
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and published via `TaskManager::publish_task()`
//! 2. A worker thread (or the calling thread, in inline mode) pops it
//! 3. The task's `process()` method runs and hands its output to the next queue
//! 4. The manager marks the task complete, so its pending count drops
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - Tasks own handles to everything they touch; they borrow nothing from the
//!   thread that published them

/// A unit of work that can be executed on a worker thread.
///
/// # Implementation Guidelines
/// - Should look its target up again when it runs: the world may have changed since
///   the task was queued, and work for a target that is gone is dropped silently
/// - Must not hold one chunk lock while taking another
/// - Should push any follow-up work before returning, so there is never a moment
///   where the work is neither queued nor in flight
pub trait Task: Send + 'static {
    /// Runs the task to completion.
    fn process(self);
}
