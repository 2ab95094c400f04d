use super::*;

#[test]
fn identity_and_capability_flags_match_the_spec() {
    let exec = MainThreadExecutor::initialize("nxpilot_main".into(), Value::Null);
    assert_eq!(exec.kind(), "main_thread");
    assert_eq!(exec.name(), "nxpilot_main");
    assert!(exec.thread_safe());
    assert!(!exec.support_timer_schedule());
    assert_eq!(exec.current_task_num(), 1);
}

#[test]
fn execute_is_a_logged_noop() {
    let exec = MainThreadExecutor::initialize("nxpilot_main".into(), Value::Null);
    exec.execute(Box::new(|| panic!("must not run")));
}
