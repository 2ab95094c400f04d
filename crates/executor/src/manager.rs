//! Instantiates, orders, starts, and tears down executors from config
//! (spec.md §4.3).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use ados_core::lifecycle::LifecycleSubsystem;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::ExecutorError;
use crate::executor::Executor;
use crate::guard_thread::GuardThreadExecutor;
use crate::main_thread::MainThreadExecutor;
use crate::time_wheel::TimeWheelExecutor;

const DEFAULT_MAIN_THREAD_NAME: &str = "nxpilot_main";
const DEFAULT_GUARD_THREAD_NAME: &str = "nxpilot_guard";

#[derive(Debug, Deserialize)]
struct ExecutorEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    options: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Options {
    executors: Vec<ExecutorEntry>,
}

pub struct ExecutorManager {
    used_executor_names: Mutex<Vec<String>>,
    executor_map: Mutex<HashMap<String, Box<dyn Executor>>>,
    initialized: AtomicBool,
    shutdown_once: AtomicBool,
}

impl Default for ExecutorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutorManager {
    pub fn new() -> Self {
        Self {
            used_executor_names: Mutex::new(Vec::new()),
            executor_map: Mutex::new(HashMap::new()),
            initialized: AtomicBool::new(false),
            shutdown_once: AtomicBool::new(false),
        }
    }

    fn insert(&self, name: String, executor: Box<dyn Executor>) {
        self.used_executor_names.lock().push(name.clone());
        self.executor_map.lock().insert(name, executor);
    }
}

impl LifecycleSubsystem for ExecutorManager {
    type Error = ExecutorError;

    fn initialize(&self, options: Value) -> Result<(), ExecutorError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(ExecutorError::AlreadyInitialized);
        }

        let options: Options = if options.is_null() {
            Options::default()
        } else {
            serde_yaml::from_value(options).unwrap_or_default()
        };

        let mut main_thread_name = DEFAULT_MAIN_THREAD_NAME.to_string();
        let mut main_thread_options = Value::Null;
        let mut guard_thread_name = DEFAULT_GUARD_THREAD_NAME.to_string();
        let mut guard_thread_options = Value::Null;
        let mut detected_main_thread = false;

        for (idx, entry) in options.executors.iter().enumerate() {
            match entry.kind.as_str() {
                "main_thread" => {
                    if idx != 0 {
                        return Err(ExecutorError::MainThreadNotFirst);
                    }
                    main_thread_name = entry.name.clone();
                    main_thread_options = entry.options.clone();
                    detected_main_thread = true;
                }
                "guard_thread" => {
                    let ok = (idx == 0 && !detected_main_thread) || (idx == 1 && detected_main_thread);
                    if !ok {
                        return Err(ExecutorError::GuardThreadPosition);
                    }
                    guard_thread_name = entry.name.clone();
                    guard_thread_options = entry.options.clone();
                }
                _ => {}
            }
        }

        self.insert(
            main_thread_name.clone(),
            Box::new(MainThreadExecutor::initialize(main_thread_name, main_thread_options)),
        );
        self.insert(
            guard_thread_name.clone(),
            Box::new(GuardThreadExecutor::initialize(guard_thread_name, guard_thread_options)),
        );

        for entry in &options.executors {
            if entry.kind == "main_thread" || entry.kind == "guard_thread" {
                continue;
            }
            if self.executor_map.lock().contains_key(&entry.name) {
                return Err(ExecutorError::DuplicateName(entry.name.clone()));
            }
            let executor: Box<dyn Executor> = match entry.kind.as_str() {
                "time_wheel" => Box::new(TimeWheelExecutor::initialize(
                    entry.name.clone(),
                    entry.options.clone(),
                )),
                other => return Err(ExecutorError::UnknownType(other.to_string())),
            };
            self.insert(entry.name.clone(), executor);
        }

        tracing::info!("ExecutorManager init completed");
        Ok(())
    }

    // `used_executor_names` and `executor_map` are only ever grown together
    // in `insert`, so every name here has a matching map entry.
    #[allow(clippy::expect_used)]
    fn start(&self) -> Result<(), ExecutorError> {
        let names = self.used_executor_names.lock().clone();
        let map = self.executor_map.lock();
        for name in &names {
            map.get(name).expect("executor present since insertion").start();
        }
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn shutdown(&self) {
        if self.shutdown_once.swap(true, Ordering::SeqCst) {
            return;
        }
        let names = self.used_executor_names.lock().clone();
        let map = self.executor_map.lock();
        for name in names.iter().rev() {
            map.get(name).expect("executor present since insertion").shutdown();
        }
        tracing::info!("ExecutorManager shutdown");
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
