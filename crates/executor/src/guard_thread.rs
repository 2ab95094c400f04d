//! Single dedicated worker thread with a bounded FIFO queue and warn/reject
//! thresholds (spec.md §4.6).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Condvar, Mutex};
use serde::Deserialize;
use serde_yaml::Value;

use ados_core::thread_policy;

use crate::executor::{Executor, Task};

const DEFAULT_QUEUE_THRESHOLD: u32 = 10_000;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Options {
    thread_sched_policy: String,
    thread_bind_cpu: Vec<u32>,
    queue_threshold: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            thread_sched_policy: String::new(),
            thread_bind_cpu: Vec::new(),
            queue_threshold: DEFAULT_QUEUE_THRESHOLD,
        }
    }
}

struct Shared {
    queue: Mutex<VecDeque<Task>>,
    cond: Condvar,
    shutdown: AtomicBool,
    queue_task_num: AtomicU32,
    queue_threshold: u32,
    queue_warn_threshold: u32,
}

impl Shared {
    fn drain_once(queue: &mut VecDeque<Task>, queue_task_num: &AtomicU32) {
        while let Some(task) = queue.pop_front() {
            task();
            queue_task_num.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

pub struct GuardThreadExecutor {
    name: String,
    shared: Arc<Shared>,
    thread: Mutex<Option<std::thread::JoinHandle<()>>>,
    started: AtomicBool,
}

impl GuardThreadExecutor {
    /// Spawns the worker thread immediately; it parks on the condition
    /// variable until the first task arrives or shutdown is requested.
    pub fn initialize(name: String, options: Value) -> Self {
        let options: Options = if options.is_null() {
            Options::default()
        } else {
            serde_yaml::from_value(options).unwrap_or_default()
        };

        let queue_warn_threshold = (options.queue_threshold as f64 * 0.95) as u32;
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            cond: Condvar::new(),
            shutdown: AtomicBool::new(false),
            queue_task_num: AtomicU32::new(0),
            queue_threshold: options.queue_threshold,
            queue_warn_threshold,
        });

        let worker_shared = shared.clone();
        let thread_name = name.clone();
        let sched_policy = options.thread_sched_policy;
        let bind_cpu = options.thread_bind_cpu;
        let thread = std::thread::spawn(move || {
            thread_policy::set_name(&thread_name);
            if let Err(err) = thread_policy::bind_cpu(&bind_cpu) {
                tracing::error!(%err, "failed to bind CPU affinity for guard thread");
            }
            if let Err(err) = thread_policy::set_sched(&sched_policy) {
                tracing::error!(%err, "failed to set scheduling policy for guard thread");
            }

            loop {
                let mut local = {
                    let mut queue = worker_shared.queue.lock();
                    while queue.is_empty() && !worker_shared.shutdown.load(Ordering::Acquire) {
                        worker_shared.cond.wait(&mut queue);
                    }
                    if worker_shared.shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    std::mem::take(&mut *queue)
                };
                Shared::drain_once(&mut local, &worker_shared.queue_task_num);
            }

            let mut remaining = std::mem::take(&mut *worker_shared.queue.lock());
            Shared::drain_once(&mut remaining, &worker_shared.queue_task_num);
        });

        tracing::info!(name, "GuardThreadExecutor init completed");
        Self { name, shared, thread: Mutex::new(Some(thread)), started: AtomicBool::new(false) }
    }
}

impl Executor for GuardThreadExecutor {
    fn kind(&self) -> &'static str {
        "guard_thread"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn thread_safe(&self) -> bool {
        true
    }

    fn start(&self) {
        self.started.store(true, Ordering::Release);
        tracing::info!(name = %self.name, "GuardThreadExecutor start completed");
    }

    fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.cond.notify_one();
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
        tracing::info!(name = %self.name, "GuardThreadExecutor shutdown");
    }

    fn execute(&self, task: Task) {
        if !self.started.load(Ordering::Acquire) {
            tracing::error!(
                name = %self.name,
                "guard thread executor can only execute task when started"
            );
            return;
        }

        let current = self.shared.queue_task_num.fetch_add(1, Ordering::AcqRel) + 1;

        if current > self.shared.queue_threshold {
            tracing::error!(
                threshold = self.shared.queue_threshold,
                "guard thread queue reached its threshold, task will not be delivered"
            );
            self.shared.queue_task_num.fetch_sub(1, Ordering::AcqRel);
            return;
        }

        if current > self.shared.queue_warn_threshold {
            tracing::warn!(
                current,
                threshold = self.shared.queue_threshold,
                "guard thread queue is about to reach its threshold"
            );
        }

        self.shared.queue.lock().push_back(task);
        self.shared.cond.notify_one();
    }

    fn support_timer_schedule(&self) -> bool {
        false
    }

    fn now(&self) -> SystemTime {
        tracing::error!("guard thread executor does not support timer schedule");
        SystemTime::UNIX_EPOCH
    }

    fn execute_at(&self, _tp: SystemTime, _task: Task) {
        tracing::error!("guard thread executor does not support timer schedule");
    }

    fn current_task_num(&self) -> usize {
        self.shared.queue_task_num.load(Ordering::Acquire) as usize
    }
}

#[cfg(test)]
#[path = "guard_thread_tests.rs"]
mod tests;
