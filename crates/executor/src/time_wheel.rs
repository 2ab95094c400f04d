//! Hierarchical timing wheel with an overflow map for far-future tasks
//! (spec.md §4.7), after the classical Varghese–Lauck construction.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::{Condvar, Mutex, RwLock};
use serde::Deserialize;
use serde_yaml::Value;

use ados_core::thread_policy;

use crate::executor::{Executor, Task};

const DEFAULT_DT_US: u64 = 1_000;
const MAX_SLEEP: Duration = Duration::from_secs(1);

#[derive(Deserialize)]
#[serde(default)]
struct Options {
    bind_executor: String,
    thread_sched_policy: String,
    thread_bind_cpu: Vec<u32>,
    dt_us: u64,
    wheel_size: Vec<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bind_executor: String::new(),
            thread_sched_policy: String::new(),
            thread_bind_cpu: Vec::new(),
            dt_us: DEFAULT_DT_US,
            wheel_size: vec![1000, 600],
        }
    }
}

struct TaskEntry {
    tick_count: u64,
    task: Task,
}

struct Level {
    current_pos: usize,
    slots: Vec<Vec<TaskEntry>>,
}

/// Everything mutated under the wheel's single reader-writer lock.
struct WheelState {
    levels: Vec<Level>,
    overflow: BTreeMap<u64, Vec<TaskEntry>>,
    overflow_pos: u64,
    current_tick_count: u64,
}

// SAFETY: `Task = Box<dyn FnOnce() + Send>` is not `Sync`, which would
// otherwise make `RwLock<WheelState>` uninhabitable for shared reads. Every
// shared (`read`) access in this module only touches `current_tick_count`;
// `levels`/`overflow` (where tasks live) are only ever reached through an
// exclusive (`write`) guard, so two threads never observe a `Task` through
// a shared reference at the same time.
unsafe impl Sync for WheelState {}

impl WheelState {
    fn new(wheel_size: &[u64]) -> Self {
        let levels = wheel_size
            .iter()
            .enumerate()
            .map(|(i, &size)| Level {
                current_pos: if i == 0 { 0 } else { 1 },
                slots: (0..size).map(|_| Vec::new()).collect(),
            })
            .collect();
        Self { levels, overflow: BTreeMap::new(), overflow_pos: 1, current_tick_count: 0 }
    }

    /// `Π_{j<level} wheel_size[j]`: the tick-count divisor that converts an
    /// absolute tick into `level`'s own position units.
    fn local_scale(wheel_size: &[u64], level: usize) -> u64 {
        wheel_size[..level].iter().product()
    }

    /// Places `task`, targeted for absolute tick `target_tick`, into the
    /// wheel level or overflow bucket that will fire it at that tick.
    fn place(&mut self, wheel_size: &[u64], target_tick: u64, task: Task) {
        let mut delta = target_tick.saturating_sub(self.current_tick_count);
        let mut tt = self.current_tick_count;
        for (i, &size) in wheel_size.iter().enumerate() {
            if delta < size {
                let pos = ((delta + tt) % size) as usize;
                self.levels[i].slots[pos].push(TaskEntry { tick_count: target_tick, task });
                return;
            }
            delta /= size;
            tt /= size;
        }
        self.overflow.entry(delta + tt).or_default().push(TaskEntry { tick_count: target_tick, task });
    }

    /// Fires level 0's current slot, borrowing from higher levels (or the
    /// overflow map) whenever a level's cursor wraps. Returns the tasks due
    /// this tick.
    fn tick(&mut self, wheel_size: &[u64]) -> Vec<Task> {
        let entries = self.tick_level(wheel_size, 0);
        entries.into_iter().map(|e| e.task).collect()
    }

    fn tick_level(&mut self, wheel_size: &[u64], level: usize) -> Vec<TaskEntry> {
        let size = wheel_size[level] as usize;
        let pos = self.levels[level].current_pos;
        let fired = std::mem::take(&mut self.levels[level].slots[pos]);
        self.levels[level].current_pos += 1;
        if self.levels[level].current_pos == size {
            self.levels[level].current_pos = 0;
            self.borrow(wheel_size, level);
        }
        fired
    }

    fn borrow(&mut self, wheel_size: &[u64], level: usize) {
        let entries = if level + 1 < self.levels.len() {
            self.tick_level(wheel_size, level + 1)
        } else {
            self.pull_overflow()
        };

        let local_scale = Self::local_scale(wheel_size, level);
        let size = wheel_size[level];
        for entry in entries {
            let pos = ((entry.tick_count / local_scale) % size) as usize;
            self.levels[level].slots[pos].push(entry);
        }
    }

    fn pull_overflow(&mut self) -> Vec<TaskEntry> {
        let entries = self.overflow.remove(&self.overflow_pos).unwrap_or_default();
        self.overflow_pos += 1;
        entries
    }
}

fn nanos_since_epoch(tp: SystemTime) -> u64 {
    tp.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos() as u64
}

struct StartLatch {
    started: Mutex<bool>,
    cond: Condvar,
}

impl StartLatch {
    fn new() -> Self {
        Self { started: Mutex::new(false), cond: Condvar::new() }
    }

    fn fire(&self) {
        *self.started.lock() = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let mut started = self.started.lock();
        while !*started {
            self.cond.wait(&mut started);
        }
    }
}

pub struct TimeWheelExecutor {
    name: String,
    wheel_size: Vec<u64>,
    dt_ns: u64,
    state: Arc<RwLock<WheelState>>,
    start_time_point: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    start_latch: Arc<StartLatch>,
    thread: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl TimeWheelExecutor {
    pub fn initialize(name: String, options: Value) -> Self {
        let options: Options = if options.is_null() {
            Options::default()
        } else {
            serde_yaml::from_value(options).unwrap_or_default()
        };

        if !options.bind_executor.is_empty() {
            tracing::warn!(
                bind_executor = %options.bind_executor,
                "bind_executor is accepted but not wired; fired tasks run on the wheel's own timer thread"
            );
        }

        let dt_ns = options.dt_us.saturating_mul(1_000);
        let state = Arc::new(RwLock::new(WheelState::new(&options.wheel_size)));

        tracing::info!(name, "TimeWheelExecutor init completed");
        Self {
            name,
            wheel_size: options.wheel_size,
            dt_ns,
            state,
            start_time_point: Arc::new(AtomicU64::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
            start_latch: Arc::new(StartLatch::new()),
            thread: Mutex::new(None),
        }
    }
}

impl Executor for TimeWheelExecutor {
    fn kind(&self) -> &'static str {
        "time_wheel"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn thread_safe(&self) -> bool {
        true
    }

    fn start(&self) {
        let wheel_size = self.wheel_size.clone();
        let dt_ns = self.dt_ns;
        let state = self.state.clone();
        let start_time_point = self.start_time_point.clone();
        let shutdown = self.shutdown.clone();
        let start_latch = self.start_latch.clone();
        let thread_name = self.name.clone();

        let handle = std::thread::spawn(move || {
            thread_policy::set_name(&thread_name);

            start_time_point.store(nanos_since_epoch(SystemTime::now()), Ordering::Release);
            start_latch.fire();

            let dt = Duration::from_nanos(dt_ns);
            let mut last_loop = std::time::Instant::now();
            while !shutdown.load(Ordering::Acquire) {
                // Sleep to the next tick boundary in chunks no larger than
                // 1s, so shutdown stays responsive even with a long `dt`.
                // A final fragment shorter than `dt` is folded into the
                // previous chunk to avoid a spuriously tiny last sleep.
                let mut real_dt = dt;
                loop {
                    let mut sleep_time = real_dt.min(MAX_SLEEP);
                    real_dt -= sleep_time;
                    if !real_dt.is_zero() && dt < MAX_SLEEP && real_dt <= dt {
                        sleep_time += real_dt;
                        real_dt = Duration::ZERO;
                    }
                    last_loop += sleep_time;
                    let now = std::time::Instant::now();
                    if last_loop > now {
                        std::thread::sleep(last_loop - now);
                    }
                    if shutdown.load(Ordering::Acquire) || real_dt.is_zero() {
                        break;
                    }
                }
                if shutdown.load(Ordering::Acquire) {
                    break;
                }

                let mut guard = state.write();
                let fired = guard.tick(&wheel_size);
                guard.current_tick_count += 1;
                drop(guard);

                for task in fired {
                    task();
                }
            }
        });

        *self.thread.lock() = Some(handle);
        self.start_latch.wait();
        tracing::info!(name = %self.name, "TimeWheelExecutor start completed");
    }

    fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
        tracing::info!(name = %self.name, "TimeWheelExecutor shutdown");
    }

    fn execute(&self, _task: Task) {
        tracing::error!(name = %self.name, "TimeWheelExecutor does not implement execute");
    }

    fn support_timer_schedule(&self) -> bool {
        true
    }

    fn now(&self) -> SystemTime {
        let guard = self.state.read();
        let start = self.start_time_point.load(Ordering::Acquire);
        let ns = start + guard.current_tick_count * self.dt_ns;
        UNIX_EPOCH + Duration::from_nanos(ns)
    }

    fn execute_at(&self, tp: SystemTime, task: Task) {
        let start = self.start_time_point.load(Ordering::Acquire);
        let virtual_tp = nanos_since_epoch(tp).saturating_sub(start);

        let mut guard = self.state.write();
        if virtual_tp < guard.current_tick_count * self.dt_ns {
            drop(guard);
            self.execute(task);
            return;
        }

        let target_tick = virtual_tp / self.dt_ns;
        guard.place(&self.wheel_size, target_tick, task);
    }

    fn current_task_num(&self) -> usize {
        1
    }
}

#[cfg(test)]
#[path = "time_wheel_tests.rs"]
mod tests;
