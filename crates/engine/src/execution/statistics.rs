use parking_lot::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TaskCounters {
    /// Registered, not started yet.
    pub new: usize,
    pub running: usize,
    pub completed: usize,
    pub all: usize,
}

/// Task counters of a request, the only source of truth for whether it is done.
#[derive(Default)]
pub(crate) struct TaskStatistics {
    counters: Mutex<TaskCounters>,
    state_changed: Notify,
}

impl TaskStatistics {
    pub fn task_created(&self) {
        {
            let mut counters = self.counters.lock();
            counters.new += 1;
            counters.all += 1;
        }
        self.state_changed.notify_waiters();
    }

    pub fn task_started(&self) {
        let mut counters = self.counters.lock();
        counters.new = counters.new.saturating_sub(1);
        counters.running += 1;
    }

    pub fn task_completed(&self) {
        {
            let mut counters = self.counters.lock();
            counters.running = counters.running.saturating_sub(1);
            counters.completed += 1;
        }
        self.state_changed.notify_waiters();
    }

    /// A task registered but dropped without running, after a cancellation.
    pub fn task_discarded(&self) {
        {
            let mut counters = self.counters.lock();
            counters.new = counters.new.saturating_sub(1);
            counters.completed += 1;
        }
        self.state_changed.notify_waiters();
    }

    pub fn is_completed(&self) -> bool {
        let counters = self.counters.lock();
        counters.all == counters.completed
    }

    pub fn counters(&self) -> TaskCounters {
        *self.counters.lock()
    }

    pub fn state_changed(&self) -> &Notify {
        &self.state_changed
    }
}
