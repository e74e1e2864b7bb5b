use parking_lot::{Condvar, Mutex};
use tracing::trace;

#[derive(Debug)]
struct SlotState<T> {
    pending: Option<T>,
    closed: bool,
    dropped: u64,
}

/// Single-item hand-off between a producer (the camera) and one worker.
///
/// `offer` never blocks: a newer item replaces one the worker has not picked
/// up yet. The worker therefore only ever sees the freshest frame, and a slow
/// frame costs staleness instead of a growing queue.
#[derive(Debug)]
pub struct LatestFrameSlot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> Default for LatestFrameSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestFrameSlot<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                pending: None,
                closed: false,
                dropped: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// Publish `item`. Returns `false` if the slot is closed and the item
    /// was discarded.
    pub fn offer(&self, item: T) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        if state.pending.replace(item).is_some() {
            state.dropped += 1;
            trace!(dropped = state.dropped, "replaced stale frame");
        }
        drop(state);
        self.ready.notify_one();
        true
    }

    /// Wait for the next item. `None` once the slot is closed and drained.
    pub fn take(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.pending.take() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.ready.wait(&mut state);
        }
    }

    pub fn try_take(&self) -> Option<T> {
        self.state.lock().pending.take()
    }

    /// Stop accepting items and wake the worker. A pending item can still
    /// be taken.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Items overwritten before the worker got to them.
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }
}
