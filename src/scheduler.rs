//! Render scheduling and the "next tick" task queue.
//!
//! Everything runs on one thread. Work deferred with [`TickQueue::push`]
//! runs on the following tick; work it defers in turn waits for the tick
//! after that. [`RenderScheduler`] collapses any number of render requests
//! between two ticks into one repaint.

use std::collections::VecDeque;

use tracing::trace;

// ---------------------------------------------------------------------------
// TickQueue
// ---------------------------------------------------------------------------

/// FIFO of deferred tasks.
#[derive(Debug)]
pub struct TickQueue<T> {
    tasks: VecDeque<T>,
    ticks: u64,
}

impl<T> Default for TickQueue<T> {
    fn default() -> Self {
        Self { tasks: VecDeque::new(), ticks: 0 }
    }
}

impl<T> TickQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: T) {
        self.tasks.push_back(task);
    }

    /// Take the tasks due this tick. Tasks pushed while they run are left
    /// for the next call.
    pub fn begin_tick(&mut self) -> Vec<T> {
        self.ticks += 1;
        self.tasks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Ticks started so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

// ---------------------------------------------------------------------------
// RenderScheduler
// ---------------------------------------------------------------------------

/// Coalesces render requests.
///
/// `pending` means a repaint is owed; `scheduled` means a render task is
/// already queued for the next tick. While paused, requests still mark
/// `pending` but no task is scheduled.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderScheduler {
    pending: bool,
    scheduled: bool,
    paused: bool,
    coalesced: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a repaint as owed. Returns `true` when the caller must queue a
    /// render task for the next tick.
    pub fn request_render(&mut self) -> bool {
        self.pending = true;
        if self.paused {
            return false;
        }
        if self.scheduled {
            self.coalesced += 1;
            return false;
        }
        self.scheduled = true;
        true
    }

    /// Stop scheduling render tasks. Requests keep accumulating.
    pub fn pause(&mut self) {
        self.paused = true;
        trace!("render scheduling paused");
    }

    /// Resume scheduling. Returns `true` when a request arrived while paused
    /// and a render task must be queued now.
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        trace!(pending = self.pending, "render scheduling resumed");
        if self.pending && !self.scheduled {
            self.scheduled = true;
            return true;
        }
        false
    }

    /// Called when the scheduled render task runs. Returns `true` when a
    /// repaint should happen now.
    pub fn take_due(&mut self) -> bool {
        self.scheduled = false;
        if self.paused || !self.pending {
            return false;
        }
        self.pending = false;
        true
    }

    /// Repaint synchronously: clears `pending` and leaves any scheduled task
    /// to find nothing to do.
    pub fn render_immediate(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Requests absorbed by an already scheduled render.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
