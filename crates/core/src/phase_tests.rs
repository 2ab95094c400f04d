use super::*;

#[test]
fn count_matches_last_discriminant_plus_one() {
    assert_eq!(Phase::COUNT, Phase::PostShutdown.index() + 1);
}

#[test]
fn init_sequence_is_monotonically_increasing() {
    let mut last = None;
    for phase in Phase::INIT_SEQUENCE {
        if let Some(prev) = last {
            assert!(phase.index() > prev);
        }
        last = Some(phase.index());
    }
}

#[test]
fn start_sequence_is_monotonically_increasing() {
    let mut last = None;
    for phase in Phase::START_SEQUENCE {
        if let Some(prev) = last {
            assert!(phase.index() > prev);
        }
        last = Some(phase.index());
    }
}

#[test]
fn shutdown_sequence_mirrors_init_subsystem_order_reversed() {
    assert_eq!(Phase::SHUTDOWN_SEQUENCE[1], Phase::PreShutdownExecutor);
    assert_eq!(Phase::SHUTDOWN_SEQUENCE[3], Phase::PreShutdownConfigurator);
}
