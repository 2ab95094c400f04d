//! Configuration store: loads a document from disk once, exposes
//! sub-documents by key.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

use serde_yaml::Value;

use crate::error::ConfiguratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum State {
    PreInit = 0,
    Init = 1,
    Start = 2,
    Shutdown = 3,
}

impl From<u8> for State {
    fn from(v: u8) -> Self {
        match v {
            0 => State::PreInit,
            1 => State::Init,
            2 => State::Start,
            _ => State::Shutdown,
        }
    }
}

/// Loads a tree-structured document from disk once and exposes
/// sub-documents by string key. Drives its own `PreInit -> Init -> Start ->
/// Shutdown` state machine, independent of the owning `Core`'s phases.
#[derive(Debug)]
pub struct ConfiguratorManager {
    state: AtomicU8,
    cfg_path: PathBuf,
    root: Value,
}

impl ConfiguratorManager {
    /// Load `cfg_file_path` and move to `Init`. Requires a non-empty path
    /// and a readable, parseable file. May only be called once.
    pub fn initialize(cfg_file_path: impl AsRef<Path>) -> Result<Self, ConfiguratorError> {
        let cfg_file_path = cfg_file_path.as_ref();
        if cfg_file_path.as_os_str().is_empty() {
            return Err(ConfiguratorError::EmptyPath);
        }

        let cfg_path = std::fs::canonicalize(cfg_file_path).map_err(|source| {
            ConfiguratorError::Canonicalize { path: cfg_file_path.display().to_string(), source }
        })?;

        let raw = std::fs::read_to_string(&cfg_path).map_err(|source| ConfiguratorError::Read {
            path: cfg_path.display().to_string(),
            source,
        })?;

        let root: Value = serde_yaml::from_str(&raw).map_err(|source| ConfiguratorError::Parse {
            path: cfg_path.display().to_string(),
            source,
        })?;

        tracing::info!(path = %cfg_path.display(), "ConfiguratorManager init completed");

        Ok(Self { state: AtomicU8::new(State::Init as u8), cfg_path, root })
    }

    /// Absolute, canonicalized path the document was loaded from.
    pub fn cfg_path(&self) -> &Path {
        &self.cfg_path
    }

    /// Move to `Start`. Idempotent on the terminal shutdown state is not
    /// required here since `start` is only ever called once per lifecycle.
    pub fn start(&self) {
        self.state.store(State::Start as u8, Ordering::SeqCst);
        tracing::info!("ConfiguratorManager start completed");
    }

    /// Idempotent: only the first call has any effect.
    pub fn shutdown(&self) {
        if self.state.swap(State::Shutdown as u8, Ordering::SeqCst) == State::Shutdown as u8 {
            return;
        }
        tracing::info!("ConfiguratorManager shutdown");
    }

    /// Root document, for callers that want the whole tree.
    pub fn root_options_node(&self) -> &Value {
        &self.root
    }

    /// Returns the sub-document at `key`, or `Value::Null` if absent.
    ///
    /// Only callable while in `Init` state; calling outside that state is a
    /// programming error.
    pub fn get_node_options_by_key(&self, key: &str) -> Value {
        let state: State = self.state.load(Ordering::SeqCst).into();
        assert!(state == State::Init, "GetNodeOptionsByKey called outside Init state");
        self.root.get(key).cloned().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
#[path = "configurator_tests.rs"]
mod tests;
