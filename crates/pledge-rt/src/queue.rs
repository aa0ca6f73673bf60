// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! FIFO task queue.
//!
//! Single owner, single thread: a `RefCell<VecDeque>`. Callers must not
//! hold a borrow across running a task, since tasks push more tasks.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::task::Task;

pub struct TaskQueue {
    deque: RefCell<VecDeque<Task>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            deque: RefCell::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append to the back.
    pub fn push(&self, task: Task) {
        self.deque.borrow_mut().push_back(task);
    }

    /// Take from the front. The borrow ends before the task is returned.
    pub fn pop(&self) -> Option<Task> {
        self.deque.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.deque.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deque.borrow().is_empty()
    }

    /// Drop every queued task without running it.
    pub fn clear(&self) -> usize {
        // Tasks are dropped after the borrow ends; their captures may
        // reach back into this queue.
        let drained = std::mem::take(&mut *self.deque.borrow_mut());
        drained.len()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue").field("len", &self.len()).finish()
    }
}
