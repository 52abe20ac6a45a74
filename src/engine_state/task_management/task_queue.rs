//! Blocking FIFO queue shared by the publishing thread and its workers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct QueueState<T> {
    items: VecDeque<T>,
    shutdown: bool,
}

/// A FIFO queue with blocking pop and a shutdown flag.
///
/// Besides the queued items the queue counts *pending* work: an item is pending
/// from `push` until someone calls `complete` for it. Workers call `complete` after
/// processing, which makes "nothing queued and nothing in flight" observable as
/// `pending() == 0`.
///
/// # Examples
///
/// ```
/// use voxel_world::engine_state::task_management::TaskQueue;
///
/// let queue = TaskQueue::new();
/// queue.push(1);
/// queue.push(2);
/// assert_eq!(queue.try_pop(), Some(1));
/// assert_eq!(queue.pending(), 2);
/// queue.complete();
/// assert_eq!(queue.pending(), 1);
/// ```
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
    pending: AtomicUsize,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                shutdown: false,
            }),
            available: Condvar::new(),
            pending: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` and wakes one waiting worker.
    ///
    /// # Returns
    /// `false` when the queue is shut down; the item is dropped.
    pub fn push(&self, item: T) -> bool {
        let mut state = self.lock();
        if state.shutdown {
            return false;
        }
        state.items.push_back(item);
        self.pending.fetch_add(1, Ordering::SeqCst);
        drop(state);
        self.available.notify_one();
        true
    }

    /// Waits for an item.
    ///
    /// # Returns
    /// `None` once the queue is shut down, even if items are left.
    pub fn pop_blocking(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if state.shutdown {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Pops the front item without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().items.pop_front()
    }

    /// Marks one popped item as finished.
    pub fn complete(&self) {
        // Saturates at zero.
        let _ = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| count.checked_sub(1));
    }

    /// Drops every queued item that no worker has taken yet.
    ///
    /// # Returns
    /// The number of items dropped.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let dropped = state.items.len();
        state.items.clear();
        self.pending.fetch_sub(dropped, Ordering::SeqCst);
        dropped
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Items queued or popped but not completed.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Sets the shutdown flag and wakes every waiting worker.
    pub fn shutdown(&self) {
        self.lock().shutdown = true;
        self.available.notify_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().shutdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn items_come_out_in_order() {
        let queue = TaskQueue::new();
        for i in 0..5 {
            queue.push(i);
        }
        let drained: Vec<_> = std::iter::from_fn(|| queue.try_pop()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn clear_drops_pending_work() {
        let queue = TaskQueue::new();
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.try_pop(), Some("a"));
        assert_eq!(queue.clear(), 1);
        assert_eq!(queue.pending(), 1, "the popped item is still in flight");
        queue.complete();
        assert_eq!(queue.pending(), 0);
        queue.complete();
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn shutdown_wakes_blocked_workers() {
        let queue = Arc::new(TaskQueue::<u32>::new());
        let workers: Vec<_> = (0..3)
            .map(|_| {
                let queue = queue.clone();
                thread::spawn(move || queue.pop_blocking())
            })
            .collect();

        queue.shutdown();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), None);
        }
        assert!(!queue.push(7), "a shut down queue rejects work");
    }

    #[test]
    fn blocked_worker_receives_item() {
        let queue = Arc::new(TaskQueue::new());
        let worker = {
            let queue = queue.clone();
            thread::spawn(move || queue.pop_blocking())
        };
        queue.push(42);
        assert_eq!(worker.join().unwrap(), Some(42));
    }
}
