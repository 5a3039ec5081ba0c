//! Mapping from an apply record's statuses to phase, label and the control
//! actions an operator may trigger.

use shared::domain::{ApplyStatus, RollbackStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Cancel,
    Rollback,
    ForcedTermination,
    Resume,
}

impl ControlAction {
    pub const ALL: [ControlAction; 4] = [
        Self::Cancel,
        Self::Rollback,
        Self::ForcedTermination,
        Self::Resume,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Cancel => "Cancel",
            Self::Rollback => "Rollback",
            Self::ForcedTermination => "Forced Termination",
            Self::Resume => "Resume",
        }
    }

    /// Query string sent with `PUT /layout-apply/{id}`.
    pub fn query(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Cancel | Self::ForcedTermination => &[("action", "cancel")],
            Self::Rollback => &[("action", "cancel"), ("rollbackOnCancel", "true")],
            Self::Resume => &[("action", "resume")],
        }
    }
}

impl std::fmt::Display for ControlAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Apply,
    Rollback,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Apply => "Apply",
            Self::Rollback => "Rollback",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedStatus {
    pub phase_text: &'static str,
    pub status_text: &'static str,
    pub active_actions: Vec<ControlAction>,
}

pub fn status_label(status: ApplyStatus) -> &'static str {
    match status {
        ApplyStatus::InProgress => "In Progress",
        ApplyStatus::Completed => "Completed",
        ApplyStatus::Failed => "Failed",
        ApplyStatus::Canceling => "Canceling",
        ApplyStatus::Canceled => "Canceled",
        ApplyStatus::Suspended => "Suspended",
    }
}

pub fn effective_status(
    apply_status: ApplyStatus,
    rollback_status: Option<RollbackStatus>,
) -> ApplyStatus {
    rollback_status.map(ApplyStatus::from).unwrap_or(apply_status)
}

pub fn derive_status(
    apply_status: Option<ApplyStatus>,
    rollback_status: Option<RollbackStatus>,
    has_permission: bool,
) -> DerivedStatus {
    let Some(apply_status) = apply_status else {
        return DerivedStatus::default();
    };

    let phase = if rollback_status.is_some() {
        Phase::Rollback
    } else {
        Phase::Apply
    };
    let effective = effective_status(apply_status, rollback_status);

    let active_actions = if !has_permission {
        Vec::new()
    } else {
        match (effective, phase) {
            (ApplyStatus::InProgress, Phase::Apply) => {
                vec![ControlAction::Cancel, ControlAction::Rollback]
            }
            (ApplyStatus::InProgress, Phase::Rollback) => vec![ControlAction::ForcedTermination],
            (ApplyStatus::Suspended, _) => {
                vec![ControlAction::ForcedTermination, ControlAction::Resume]
            }
            _ => Vec::new(),
        }
    };

    DerivedStatus {
        phase_text: phase.label(),
        status_text: status_label(effective),
        active_actions,
    }
}

#[cfg(test)]
#[path = "tests/status_tests.rs"]
mod tests;
