use super::*;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

struct RecordingSubsystem {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl LifecycleSubsystem for RecordingSubsystem {
    type Error = CoreError;

    fn initialize(&self, _options: Value) -> Result<(), CoreError> {
        self.calls.lock().push("initialize");
        Ok(())
    }

    fn start(&self) -> Result<(), CoreError> {
        self.calls.lock().push("start");
        Ok(())
    }

    fn shutdown(&self) {
        self.calls.lock().push("shutdown");
    }
}

fn write_cfg() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"executor:\n  executors: []\n").unwrap();
    file
}

#[test]
fn minimum_viable_lifecycle_runs_every_marker_in_order() {
    let cfg = write_cfg();
    let core: Arc<Core<RecordingSubsystem>> = Arc::new(Core::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let expected: Vec<Phase> = Phase::INIT_SEQUENCE
        .iter()
        .chain(Phase::START_SEQUENCE)
        .chain(Phase::SHUTDOWN_SEQUENCE)
        .copied()
        .collect();

    for phase in expected.iter().copied() {
        let seen = seen.clone();
        core.register_hook(phase, move || seen.lock().push(phase));
    }

    let calls = Arc::new(Mutex::new(Vec::new()));
    core.initialize(cfg.path(), RecordingSubsystem { calls: calls.clone() }).unwrap();

    let core_for_start = core.clone();
    let handle = std::thread::spawn(move || core_for_start.start());

    std::thread::sleep(Duration::from_millis(20));
    core.shutdown();
    handle.join().unwrap().unwrap();

    assert_eq!(*seen.lock(), expected);
    assert_eq!(*calls.lock(), vec!["initialize", "start", "shutdown"]);
}

#[test]
fn double_initialize_is_rejected() {
    let cfg = write_cfg();
    let core: Core<RecordingSubsystem> = Core::new();
    let calls = Arc::new(Mutex::new(Vec::new()));

    core.initialize(cfg.path(), RecordingSubsystem { calls: calls.clone() }).unwrap();
    let err = core.initialize(cfg.path(), RecordingSubsystem { calls }).unwrap_err();
    assert!(matches!(err, CoreError::AlreadyInitialized));
}

#[test]
fn shutdown_before_start_is_observed_once_start_runs() {
    let cfg = write_cfg();
    let core: Arc<Core<RecordingSubsystem>> = Arc::new(Core::new());
    let calls = Arc::new(Mutex::new(Vec::new()));
    core.initialize(cfg.path(), RecordingSubsystem { calls: calls.clone() }).unwrap();

    // Shutdown called "early" from another thread, before the start-caller
    // thread reaches the wait.
    let core_for_shutdown = core.clone();
    let shutdown_handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(5));
        core_for_shutdown.shutdown();
        core_for_shutdown.shutdown();
    });

    core.start().unwrap();
    shutdown_handle.join().unwrap();

    assert_eq!(*calls.lock(), vec!["initialize", "start", "shutdown"]);
}

#[test]
fn concurrent_shutdown_callers_observe_a_single_effective_call() {
    let cfg = write_cfg();
    let core: Arc<Core<RecordingSubsystem>> = Arc::new(Core::new());
    let calls = Arc::new(Mutex::new(Vec::new()));
    core.initialize(cfg.path(), RecordingSubsystem { calls: calls.clone() }).unwrap();

    let core_for_start = core.clone();
    let handle = std::thread::spawn(move || core_for_start.start());

    std::thread::sleep(Duration::from_millis(10));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let core = core.clone();
            std::thread::spawn(move || core.shutdown())
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    handle.join().unwrap().unwrap();

    assert_eq!(calls.lock().iter().filter(|c| **c == "shutdown").count(), 1);
}
