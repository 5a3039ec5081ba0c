use super::*;

const ALL_ROLLBACK: [Option<RollbackStatus>; 5] = [
    None,
    Some(RollbackStatus::InProgress),
    Some(RollbackStatus::Completed),
    Some(RollbackStatus::Failed),
    Some(RollbackStatus::Suspended),
];

#[test]
fn missing_apply_status_yields_empty_output() {
    for rollback in ALL_ROLLBACK {
        for permission in [true, false] {
            assert_eq!(
                derive_status(None, rollback, permission),
                DerivedStatus {
                    phase_text: "",
                    status_text: "",
                    active_actions: Vec::new(),
                }
            );
        }
    }
}

#[test]
fn no_permission_never_enables_actions() {
    for apply in ApplyStatus::ALL {
        for rollback in ALL_ROLLBACK {
            assert!(derive_status(Some(apply), rollback, false)
                .active_actions
                .is_empty());
        }
    }
}

#[test]
fn status_text_follows_effective_status() {
    for apply in ApplyStatus::ALL {
        for rollback in ALL_ROLLBACK {
            let derived = derive_status(Some(apply), rollback, true);
            let expected = rollback.map(ApplyStatus::from).unwrap_or(apply);
            assert_eq!(derived.status_text, status_label(expected));
            let phase = if rollback.is_some() { "Rollback" } else { "Apply" };
            assert_eq!(derived.phase_text, phase);
        }
    }
}

#[test]
fn derivation_is_repeatable() {
    for apply in ApplyStatus::ALL {
        for rollback in ALL_ROLLBACK {
            assert_eq!(
                derive_status(Some(apply), rollback, true),
                derive_status(Some(apply), rollback, true)
            );
        }
    }
}

#[test]
fn in_progress_apply_offers_cancel_and_rollback() {
    assert_eq!(
        derive_status(Some(ApplyStatus::InProgress), None, true),
        DerivedStatus {
            phase_text: "Apply",
            status_text: "In Progress",
            active_actions: vec![ControlAction::Cancel, ControlAction::Rollback],
        }
    );
}

#[test]
fn suspended_rollback_offers_termination_and_resume() {
    assert_eq!(
        derive_status(
            Some(ApplyStatus::Canceled),
            Some(RollbackStatus::Suspended),
            true
        ),
        DerivedStatus {
            phase_text: "Rollback",
            status_text: "Suspended",
            active_actions: vec![ControlAction::ForcedTermination, ControlAction::Resume],
        }
    );
}

#[test]
fn in_progress_rollback_only_offers_forced_termination() {
    let derived = derive_status(
        Some(ApplyStatus::Canceled),
        Some(RollbackStatus::InProgress),
        true,
    );
    assert_eq!(derived.active_actions, vec![ControlAction::ForcedTermination]);
}

#[test]
fn suspended_apply_offers_termination_and_resume() {
    let derived = derive_status(Some(ApplyStatus::Suspended), None, true);
    assert_eq!(derived.phase_text, "Apply");
    assert_eq!(
        derived.active_actions,
        vec![ControlAction::ForcedTermination, ControlAction::Resume]
    );
}

#[test]
fn terminal_and_transitional_statuses_offer_nothing() {
    for apply in [
        ApplyStatus::Completed,
        ApplyStatus::Failed,
        ApplyStatus::Canceling,
        ApplyStatus::Canceled,
    ] {
        assert!(derive_status(Some(apply), None, true)
            .active_actions
            .is_empty());
    }
    for rollback in [RollbackStatus::Completed, RollbackStatus::Failed] {
        assert!(derive_status(Some(ApplyStatus::Canceled), Some(rollback), true)
            .active_actions
            .is_empty());
    }
}

#[test]
fn action_queries_match_control_endpoint_contract() {
    assert_eq!(ControlAction::Cancel.query(), &[("action", "cancel")]);
    assert_eq!(
        ControlAction::Rollback.query(),
        &[("action", "cancel"), ("rollbackOnCancel", "true")]
    );
    assert_eq!(ControlAction::ForcedTermination.query(), &[("action", "cancel")]);
    assert_eq!(ControlAction::Resume.query(), &[("action", "resume")]);
}
