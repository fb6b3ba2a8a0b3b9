//! Cooperative run-to-completion scheduling.
//!
//! Every periodic component is polled through a `ready`/`step` pair. One pass
//! walks the configured priority order, asks each task whether it has work and
//! runs it immediately when it does. There is no time slicing: a task that is
//! ready on every pass keeps every task behind it waiting, which is exactly
//! what lets the safety monitor and decoder preempt slower work by position.

use core::fmt;

use heapless::Vec;

use crate::clock::Millis;
use crate::config::ScheduleConfig;

/// Upper bound on the number of registered tasks.
pub const MAX_TASKS: usize = 8;

/// Identifies one schedulable component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskId {
    Safety,
    Keyboard,
    Remote,
    Decoder,
    Executor,
    LineFollow,
    Status,
}

impl TaskId {
    pub const ALL: [TaskId; 7] = [
        TaskId::Safety,
        TaskId::Keyboard,
        TaskId::Remote,
        TaskId::Decoder,
        TaskId::Executor,
        TaskId::LineFollow,
        TaskId::Status,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TaskId::Safety => "safety",
            TaskId::Keyboard => "keyboard",
            TaskId::Remote => "remote",
            TaskId::Decoder => "decoder",
            TaskId::Executor => "executor",
            TaskId::LineFollow => "line-follow",
            TaskId::Status => "status",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of pollable components addressed by [`TaskId`].
///
/// `ready` may be called without a following `step`; implementations must
/// tolerate that (no side effects, or only idempotent ones). `step` must never
/// block.
///
/// Components that write into each other (the safety monitor into the drive
/// train, the executor into the line follower) live together behind one
/// `TaskSet` so each step can borrow exactly the collaborators it needs.
pub trait TaskSet {
    fn ready(&mut self, task: TaskId, now: Millis) -> bool;
    fn step(&mut self, task: TaskId, now: Millis);
}

/// Errors raised while validating a priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    Empty,
    TooManyTasks,
    Duplicate(TaskId),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::Empty => f.write_str("task order is empty"),
            ScheduleError::TooManyTasks => write!(f, "more than {MAX_TASKS} tasks registered"),
            ScheduleError::Duplicate(task) => write!(f, "task `{task}` registered twice"),
        }
    }
}

/// Which tasks ran during one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    ran: u8,
}

impl PassReport {
    #[must_use]
    pub const fn ran(&self, task: TaskId) -> bool {
        self.ran & task.bit() != 0
    }

    #[must_use]
    pub const fn count(&self) -> u32 {
        self.ran.count_ones()
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.ran == 0
    }
}

/// Fixed-priority poll loop.
#[derive(Clone, Debug)]
pub struct Scheduler {
    order: Vec<TaskId, MAX_TASKS>,
    passes: u32,
}

impl Scheduler {
    /// Builds a scheduler from a validated priority order.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] when the order is empty, too long, or names
    /// a task twice.
    pub fn new(config: &ScheduleConfig) -> Result<Self, ScheduleError> {
        if config.order.is_empty() {
            return Err(ScheduleError::Empty);
        }

        let mut order = Vec::new();
        for &task in config.order {
            if order.contains(&task) {
                return Err(ScheduleError::Duplicate(task));
            }
            order.push(task).map_err(|_| ScheduleError::TooManyTasks)?;
        }

        Ok(Self { order, passes: 0 })
    }

    #[must_use]
    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    /// Number of completed passes.
    #[must_use]
    pub const fn passes(&self) -> u32 {
        self.passes
    }

    /// Runs one pass: every ready task steps once, in priority order.
    pub fn run_pass<T>(&mut self, tasks: &mut T, now: Millis) -> PassReport
    where
        T: TaskSet + ?Sized,
    {
        let mut report = PassReport::default();
        for &task in &self.order {
            if tasks.ready(task, now) {
                tasks.step(task, now);
                report.ran |= task.bit();
            }
        }
        self.passes = self.passes.wrapping_add(1);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Call {
        Ready(TaskId),
        Step(TaskId),
    }

    struct Recorder {
        calls: Vec<Call, 32>,
        ready: &'static [TaskId],
    }

    impl TaskSet for Recorder {
        fn ready(&mut self, task: TaskId, _now: Millis) -> bool {
            self.calls.push(Call::Ready(task)).expect("call log capacity");
            self.ready.contains(&task)
        }

        fn step(&mut self, task: TaskId, _now: Millis) {
            self.calls.push(Call::Step(task)).expect("call log capacity");
        }
    }

    #[test]
    fn steps_follow_each_ready_check_in_priority_order() {
        let mut scheduler = Scheduler::new(&ScheduleConfig::new(&[
            TaskId::Safety,
            TaskId::Decoder,
            TaskId::Status,
        ]))
        .expect("valid order");
        let mut tasks = Recorder {
            calls: Vec::new(),
            ready: &[TaskId::Safety, TaskId::Status],
        };

        let report = scheduler.run_pass(&mut tasks, 0);

        assert_eq!(
            tasks.calls.as_slice(),
            &[
                Call::Ready(TaskId::Safety),
                Call::Step(TaskId::Safety),
                Call::Ready(TaskId::Decoder),
                Call::Ready(TaskId::Status),
                Call::Step(TaskId::Status),
            ]
        );
        assert!(report.ran(TaskId::Safety));
        assert!(!report.ran(TaskId::Decoder));
        assert_eq!(report.count(), 2);
        assert_eq!(scheduler.passes(), 1);
    }

    #[test]
    fn rejects_invalid_orders() {
        assert_eq!(
            Scheduler::new(&ScheduleConfig::new(&[])).unwrap_err(),
            ScheduleError::Empty
        );
        assert_eq!(
            Scheduler::new(&ScheduleConfig::new(&[TaskId::Safety, TaskId::Safety])).unwrap_err(),
            ScheduleError::Duplicate(TaskId::Safety)
        );
    }

    #[test]
    fn idle_pass_reports_nothing() {
        let mut scheduler = Scheduler::new(&ScheduleConfig::default()).expect("default order");
        let mut tasks = Recorder {
            calls: Vec::new(),
            ready: &[],
        };
        assert!(scheduler.run_pass(&mut tasks, 5).is_idle());
    }
}
