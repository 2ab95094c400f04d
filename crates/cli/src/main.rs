//! `ados`: boots the core lifecycle with the executor subsystem and waits
//! for `SIGINT`/`SIGTERM` to shut it down.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, OnceLock};

use ados_core::Core;
use ados_executor::ExecutorManager;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "ados", version, about = "ados core runtime")]
struct Cli {
    /// Path to the runtime configuration file
    #[arg(long = "cfg-file-path")]
    cfg_file_path: PathBuf,
}

static CORE: OnceLock<Arc<Core<ExecutorManager>>> = OnceLock::new();

fn install_signal_handlers() -> Result<(), std::io::Error> {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        // SAFETY: the handler only touches a process-global `OnceLock` and
        // an `Arc<Core<_>>`'s atomics; nothing allocates or locks a
        // non-async-signal-safe mutex on this path.
        unsafe {
            signal_hook::low_level::register(signal, || {
                if let Some(core) = CORE.get() {
                    core.shutdown();
                }
            })?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let core: Arc<Core<ExecutorManager>> = Arc::new(Core::new());
    let _ = CORE.set(core.clone());

    if let Err(err) = install_signal_handlers() {
        tracing::error!(%err, "failed to install signal handlers");
        return ExitCode::FAILURE;
    }

    if let Err(err) = core.initialize(&cli.cfg_file_path, ExecutorManager::new()) {
        tracing::error!(%err, "initialize failed");
        return ExitCode::FAILURE;
    }

    if let Err(err) = core.start() {
        tracing::error!(%err, "start failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
