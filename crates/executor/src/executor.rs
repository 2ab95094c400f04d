//! The capability contract every executor satisfies (spec.md §4.4).

use std::time::SystemTime;

/// An opaque, no-argument unit of work. Ownership transfers on submission.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A unit that runs tasks, possibly on its own thread, possibly at a future
/// time.
///
/// `execute`/`execute_at`/`now` are non-throwing by contract: failures are
/// reported to the logger only, never propagated to the caller.
pub trait Executor: Send + Sync {
    /// Immutable identity tag (`"main_thread"`, `"guard_thread"`, `"time_wheel"`).
    fn kind(&self) -> &'static str;
    /// User-chosen, manager-unique name.
    fn name(&self) -> &str;
    /// Whether `execute` may be called concurrently from multiple threads.
    fn thread_safe(&self) -> bool;

    /// Start whatever background work this executor owns. Called by the
    /// manager once, in construction order.
    fn start(&self);
    /// Idempotent teardown, called by the manager in reverse construction
    /// order.
    fn shutdown(&self);

    /// Submit for immediate execution.
    fn execute(&self, task: Task);

    /// Whether `now`/`execute_at` are meaningful for this executor.
    fn support_timer_schedule(&self) -> bool;
    /// The executor's notion of current time. Undefined (logged as an
    /// error) for executors that don't support timer scheduling.
    fn now(&self) -> SystemTime;
    /// Submit to run at or after `tp`; if `tp` is already in the past,
    /// execute immediately.
    fn execute_at(&self, tp: SystemTime, task: Task);

    /// Best-effort queue depth.
    fn current_task_num(&self) -> usize {
        0
    }
}
