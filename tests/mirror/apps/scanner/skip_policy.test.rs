use geoscan_scanner::scheduler::{classify_spawn_timing, SpawnTimingOutcome};

#[test]
fn dispatches_a_spawn_that_arrives_within_the_skip_window() {
    let outcome = classify_spawn_timing(1_000, 995, false, 90);
    assert_eq!(outcome, SpawnTimingOutcome::Dispatch);
}

#[test]
fn marks_a_late_but_already_observed_spawn_as_redundant() {
    let outcome = classify_spawn_timing(1_010, 1_000, true, 90);
    assert_eq!(outcome, SpawnTimingOutcome::Redundant);
}

#[test]
fn a_late_but_unobserved_spawn_is_still_dispatched_under_the_skip_ceiling() {
    let outcome = classify_spawn_timing(1_010, 1_000, false, 90);
    assert_eq!(outcome, SpawnTimingOutcome::Dispatch);
}

#[test]
fn skips_a_spawn_that_arrives_past_the_skip_ceiling() {
    let outcome = classify_spawn_timing(1_200, 1_000, false, 90);
    assert_eq!(outcome, SpawnTimingOutcome::Skipped);
}

#[test]
fn redundant_takes_priority_over_skip_when_both_thresholds_are_crossed() {
    let outcome = classify_spawn_timing(1_200, 1_000, true, 90);
    assert_eq!(outcome, SpawnTimingOutcome::Redundant);
}
