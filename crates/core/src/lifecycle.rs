//! The phased lifecycle state machine (`Core`) that drives the
//! configuration store and the executor subsystem through a fixed order of
//! init/start/shutdown phases.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};
use serde_yaml::Value;

use crate::configurator::ConfiguratorManager;
use crate::error::CoreError;
use crate::hooks::HookRegistry;
use crate::phase::Phase;

/// The contract `Core` drives through Init/Start/Shutdown. Implemented by
/// the executor manager; kept as a trait here so `ados-core` has no
/// dependency on `ados-executor`.
pub trait LifecycleSubsystem {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct subsystem state from its configuration sub-document.
    fn initialize(&self, options: Value) -> Result<(), Self::Error>;
    /// Start whatever background work the subsystem owns.
    fn start(&self) -> Result<(), Self::Error>;
    /// Idempotent teardown.
    fn shutdown(&self);
}

/// A single-fire event: one producer releases it, one consumer waits on it.
#[derive(Default)]
struct ShutdownLatch {
    fired: Mutex<bool>,
    cond: Condvar,
}

impl ShutdownLatch {
    fn fire(&self) {
        let mut fired = self.fired.lock();
        *fired = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let mut fired = self.fired.lock();
        while !*fired {
            self.cond.wait(&mut fired);
        }
    }
}

/// The phased lifecycle state machine described in spec.md §4.1.
///
/// Generic over the executor manager implementation so this crate does not
/// depend on `ados-executor`.
pub struct Core<E: LifecycleSubsystem> {
    hooks: Mutex<HookRegistry>,
    current_phase: AtomicUsize,
    init_once: AtomicBool,
    shutdown_once: AtomicBool,
    latch: ShutdownLatch,
    configurator: Mutex<Option<ConfiguratorManager>>,
    executor_manager: Mutex<Option<E>>,
}

impl<E: LifecycleSubsystem> Default for Core<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: LifecycleSubsystem> Core<E> {
    pub fn new() -> Self {
        tracing::info!("AdosCore constructor");
        Self {
            hooks: Mutex::new(HookRegistry::new()),
            current_phase: AtomicUsize::new(Phase::PreInit.index()),
            init_once: AtomicBool::new(false),
            shutdown_once: AtomicBool::new(false),
            latch: ShutdownLatch::default(),
            configurator: Mutex::new(None),
            executor_manager: Mutex::new(None),
        }
    }

    /// Register `hook` to run the next time `phase` is entered.
    pub fn register_hook(&self, phase: Phase, hook: impl Fn() + Send + Sync + 'static) {
        self.hooks.lock().register(phase, hook);
    }

    /// The most recently entered phase.
    pub fn current_phase(&self) -> usize {
        self.current_phase.load(Ordering::SeqCst)
    }

    /// Advance the recorded phase and run its hooks. `phase` must not be
    /// behind the currently recorded phase — the current phase only ever
    /// moves forward within one lifecycle.
    fn enter_state(&self, phase: Phase) {
        let prev = self.current_phase.swap(phase.index(), Ordering::SeqCst);
        assert!(
            phase.index() >= prev,
            "lifecycle phase moved backward: {prev} -> {}",
            phase.index()
        );
        self.hooks.lock().run(phase);
    }

    /// Drives `PreInit..PostInit`, loading the configuration document and
    /// initializing `executor_manager` from its `executor` sub-document.
    /// May be called at most once.
    pub fn initialize(
        &self,
        cfg_file_path: impl AsRef<std::path::Path>,
        executor_manager: E,
    ) -> Result<(), CoreError>
    where
        E::Error: Into<CoreError>,
    {
        if self.init_once.swap(true, Ordering::SeqCst) {
            return Err(CoreError::AlreadyInitialized);
        }

        self.enter_state(Phase::PreInit);
        self.enter_state(Phase::PreInitConfigurator);

        let configurator = ConfiguratorManager::initialize(cfg_file_path)?;
        let executor_options = configurator.get_node_options_by_key("executor");
        *self.configurator.lock() = Some(configurator);

        self.enter_state(Phase::PostInitConfigurator);
        self.enter_state(Phase::PreInitExecutor);

        executor_manager.initialize(executor_options).map_err(Into::into)?;
        *self.executor_manager.lock() = Some(executor_manager);

        self.enter_state(Phase::PostInitExecutor);
        self.enter_state(Phase::PostInit);

        tracing::info!("ados core init completed");
        Ok(())
    }

    /// Drives `PreStart..PostStart`, then blocks the calling thread until
    /// `shutdown` is called from any thread, then drives the symmetric
    /// shutdown sequence before returning.
    pub fn start(&self) -> Result<(), CoreError>
    where
        E::Error: Into<CoreError>,
    {
        self.enter_state(Phase::PreStart);

        self.enter_state(Phase::PreStartConfigurator);
        if let Some(configurator) = self.configurator.lock().as_ref() {
            configurator.start();
        }
        self.enter_state(Phase::PostStartConfigurator);

        self.enter_state(Phase::PreStartExecutor);
        if let Some(manager) = self.executor_manager.lock().as_ref() {
            manager.start().map_err(Into::into)?;
        }
        self.enter_state(Phase::PostStartExecutor);

        self.enter_state(Phase::PostStart);

        self.latch.wait();
        self.run_shutdown_sequence();

        Ok(())
    }

    /// Idempotent, thread-safe. First caller wins and releases the shutdown
    /// latch that `start` is waiting on; further calls return silently.
    pub fn shutdown(&self) {
        if self.shutdown_once.swap(true, Ordering::SeqCst) {
            return;
        }
        self.latch.fire();
    }

    fn run_shutdown_sequence(&self) {
        self.enter_state(Phase::PreShutdown);
        self.enter_state(Phase::PreShutdownExecutor);
        if let Some(manager) = self.executor_manager.lock().as_ref() {
            manager.shutdown();
        }
        self.enter_state(Phase::PostShutdownExecutor);
        self.enter_state(Phase::PreShutdownConfigurator);
        if let Some(configurator) = self.configurator.lock().as_ref() {
            configurator.shutdown();
        }
        self.enter_state(Phase::PostShutdownConfigurator);
        self.enter_state(Phase::PostShutdown);
        tracing::info!("ados core shutdown");
    }
}

impl<E: LifecycleSubsystem> Drop for Core<E> {
    /// Best-effort defensive shutdown: a forgotten `shutdown()` call must
    /// not leak the process past the embedder, even if nothing was ever
    /// waiting on the latch.
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
