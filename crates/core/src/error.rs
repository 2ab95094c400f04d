//! Error types shared across the core lifecycle and configuration store.

use thiserror::Error;

/// Errors surfaced by the lifecycle state machine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Core can only be initialized once")]
    AlreadyInitialized,
    #[error("configurator error: {0}")]
    Configurator(#[from] ConfiguratorError),
    /// Boxed error from the `LifecycleSubsystem` implementation (the
    /// executor manager, in this binary). Kept opaque here so this crate
    /// carries no dependency on the subsystem crate.
    #[error("executor subsystem error: {0}")]
    Subsystem(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors surfaced by the configuration store.
#[derive(Debug, Error)]
pub enum ConfiguratorError {
    #[error("nxpilot start with no cfg file")]
    EmptyPath,
    #[error("failed to canonicalize config path {path}: {source}")]
    Canonicalize { path: String, source: std::io::Error },
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: serde_yaml::Error },
}

/// Errors from the thread-policy helpers (`set_name`/`bind_cpu`/`set_sched`).
#[derive(Debug, Error)]
pub enum ThreadPolicyError {
    #[error("invalid cpu index {idx}, max cpu idx is {max}")]
    InvalidCpuIndex { idx: u32, max: u32 },
    #[error("failed to bind cpu affinity")]
    BindCpu,
    #[error("invalid sched policy '{0}'")]
    InvalidSchedSpec(String),
    #[error("invalid sched priority {priority} for {policy}, required range {min}~{max}")]
    InvalidSchedPriority { policy: String, priority: i32, min: i32, max: i32 },
    #[error("failed to set scheduling policy: {0}")]
    SetSched(std::io::Error),
}
