//! Cooperative task table.
//!
//! The run loop owns one execution context and drives every periodic
//! task from it: query [`next_due`](TaskTable::next_due) until no task
//! is due, run each returned task to completion, then sleep for
//! [`sleep_hint`](TaskTable::sleep_hint). No preemption, no locks —
//! a tick that is running is the only code touching shared state.
//!
//! Deadlines advance by exactly one interval per firing rather than
//! resynchronising to the clock, mirroring the control loop's window
//! policy: a late poll shifts nothing, and a task that fell behind
//! fires repeatedly until it has caught up.

use log::info;

/// Maximum number of registered tasks (stack-allocated table).
pub const MAX_TASKS: usize = 8;

/// Identifies a registered task; returned by [`TaskTable::add`] and
/// matched on by the run loop.
pub type TaskId = usize;

#[derive(Debug, Clone)]
struct TaskSlot {
    label: &'static str,
    interval_ms: u64,
    next_due_ms: u64,
}

/// Fixed-capacity table of periodic tasks.
pub struct TaskTable {
    tasks: heapless::Vec<TaskSlot, MAX_TASKS>,
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTable {
    pub fn new() -> Self {
        Self {
            tasks: heapless::Vec::new(),
        }
    }

    /// Register a periodic task. The first firing is due immediately.
    /// Returns `None` if the table is full.
    pub fn add(&mut self, label: &'static str, interval_ms: u64, now_ms: u64) -> Option<TaskId> {
        let slot = TaskSlot {
            label,
            interval_ms: interval_ms.max(1),
            next_due_ms: now_ms,
        };
        self.tasks.push(slot).ok()?;
        let id = self.tasks.len() - 1;
        info!("scheduler: '{label}' every {interval_ms} ms (task {id})");
        Some(id)
    }

    /// Return one due task and advance its deadline by one interval.
    /// Call repeatedly until `None` to drain everything due at `now_ms`.
    pub fn next_due(&mut self, now_ms: u64) -> Option<TaskId> {
        for (id, slot) in self.tasks.iter_mut().enumerate() {
            if slot.next_due_ms <= now_ms {
                slot.next_due_ms += slot.interval_ms;
                return Some(id);
            }
        }
        None
    }

    /// Milliseconds until the earliest deadline — how long the run loop
    /// may sleep. Zero if anything is already due or no task exists.
    pub fn sleep_hint(&self, now_ms: u64) -> u64 {
        self.tasks
            .iter()
            .map(|slot| slot.next_due_ms.saturating_sub(now_ms))
            .min()
            .unwrap_or(0)
    }

    /// Label of a task, for run-loop diagnostics.
    pub fn label(&self, id: TaskId) -> &'static str {
        self.tasks.get(id).map_or("?", |slot| slot.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_firing_is_immediate() {
        let mut table = TaskTable::new();
        let control = table.add("control", 10, 0).unwrap();
        assert_eq!(table.next_due(0), Some(control));
        assert_eq!(table.next_due(0), None);
    }

    #[test]
    fn fires_once_per_interval() {
        let mut table = TaskTable::new();
        let id = table.add("net", 1000, 0).unwrap();
        let _ = table.next_due(0);

        assert_eq!(table.next_due(999), None);
        assert_eq!(table.next_due(1000), Some(id));
        assert_eq!(table.next_due(1000), None);
    }

    #[test]
    fn late_poll_does_not_shift_the_cadence() {
        let mut table = TaskTable::new();
        let id = table.add("history", 1000, 0).unwrap();
        let _ = table.next_due(0);

        // Polled 300 ms late: deadline advances from the scheduled
        // time, so the next firing is still at 2000, not 2300.
        assert_eq!(table.next_due(1300), Some(id));
        assert_eq!(table.next_due(1999), None);
        assert_eq!(table.next_due(2000), Some(id));
    }

    #[test]
    fn lagging_task_catches_up() {
        let mut table = TaskTable::new();
        let id = table.add("control", 10, 0).unwrap();
        let _ = table.next_due(0);

        // 50 ms of lost time: the task fires five times in a row.
        let mut fired = 0;
        while table.next_due(50) == Some(id) {
            fired += 1;
        }
        assert_eq!(fired, 5);
    }

    #[test]
    fn drains_every_due_task_before_none() {
        let mut table = TaskTable::new();
        let a = table.add("control", 10, 0).unwrap();
        let b = table.add("net", 1000, 0).unwrap();

        let mut due = Vec::new();
        while let Some(id) = table.next_due(0) {
            due.push(id);
        }
        assert_eq!(due, [a, b]);
    }

    #[test]
    fn sleep_hint_tracks_earliest_deadline() {
        let mut table = TaskTable::new();
        let _ = table.add("control", 10, 0);
        let _ = table.add("net", 1000, 0);
        while table.next_due(0).is_some() {}

        assert_eq!(table.sleep_hint(0), 10);
        assert_eq!(table.sleep_hint(7), 3);
        assert_eq!(table.sleep_hint(10), 0);
    }

    #[test]
    fn table_capacity_is_bounded() {
        let mut table = TaskTable::new();
        for i in 0..MAX_TASKS {
            assert!(table.add("t", 100, 0).is_some(), "slot {i}");
        }
        assert!(table.add("overflow", 100, 0).is_none());
    }
}
