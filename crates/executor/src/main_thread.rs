//! A handle to the thread that calls `ExecutorManager::initialize`
//! (spec.md §4.5). Owns no loop; `execute`/`execute_at` are no-ops that
//! report an error.

use std::time::SystemTime;

use serde::Deserialize;
use serde_yaml::Value;

use ados_core::thread_policy;

use crate::executor::{Executor, Task};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Options {
    thread_sched_policy: String,
    thread_bind_cpu: Vec<u32>,
}

pub struct MainThreadExecutor {
    name: String,
}

impl MainThreadExecutor {
    /// Applies the configured thread name, CPU affinity, and scheduling
    /// policy to the calling thread, which becomes this executor's identity.
    pub fn initialize(name: String, options: Value) -> Self {
        let options: Options = if options.is_null() {
            Options::default()
        } else {
            serde_yaml::from_value(options).unwrap_or_default()
        };

        thread_policy::set_name(&name);
        if let Err(err) = thread_policy::bind_cpu(&options.thread_bind_cpu) {
            tracing::error!(%err, "failed to bind CPU affinity for main thread");
        }
        if let Err(err) = thread_policy::set_sched(&options.thread_sched_policy) {
            tracing::error!(%err, "failed to set scheduling policy for main thread");
        }

        tracing::info!(name, "MainThreadExecutor init completed");
        Self { name }
    }
}

impl Executor for MainThreadExecutor {
    fn kind(&self) -> &'static str {
        "main_thread"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn thread_safe(&self) -> bool {
        true
    }

    fn start(&self) {
        tracing::info!(name = %self.name, "MainThreadExecutor start completed");
    }

    fn shutdown(&self) {
        tracing::info!(name = %self.name, "MainThreadExecutor shutdown");
    }

    fn execute(&self, _task: Task) {
        tracing::error!("main thread executor does not implement execute");
    }

    fn support_timer_schedule(&self) -> bool {
        false
    }

    fn now(&self) -> SystemTime {
        tracing::error!("main thread executor does not support timer schedule");
        SystemTime::UNIX_EPOCH
    }

    fn execute_at(&self, _tp: SystemTime, _task: Task) {
        tracing::error!("main thread executor does not support timer schedule");
    }

    fn current_task_num(&self) -> usize {
        1
    }
}

#[cfg(test)]
#[path = "main_thread_tests.rs"]
mod tests;
