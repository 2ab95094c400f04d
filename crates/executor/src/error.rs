//! Errors surfaced by the executor manager and concrete executors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("ExecutorManager can only be initialized once")]
    AlreadyInitialized,
    #[error("MainThreadExecutor should be the first entry")]
    MainThreadNotFirst,
    #[error(
        "GuardThreadExecutor should be first without MainThreadExecutor, or second after it"
    )]
    GuardThreadPosition,
    #[error("duplicate executor name '{0}'")]
    DuplicateName(String),
    #[error("invalid executor type '{0}'")]
    UnknownType(String),
}

impl From<ExecutorError> for ados_core::CoreError {
    fn from(err: ExecutorError) -> Self {
        ados_core::CoreError::Subsystem(Box::new(err))
    }
}
