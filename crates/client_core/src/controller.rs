//! Confirmation workflow for apply/rollback control actions.
//!
//! A selected action opens a confirmation; confirming issues exactly one
//! `PUT /layout-apply/{id}` through a [`LayoutApplyControl`] dispatcher.
//! Success closes the confirmation and requests a reload, failure keeps it
//! open with the error attached so the operator can retry or cancel.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{ApplyId, ApplyRecord},
    protocol::ControlResponse,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    error::ClientError,
    status::{derive_status, ControlAction, DerivedStatus},
};

/// Explicit description of a control call; mapped to endpoint and query by
/// the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub kind: ControlAction,
    pub apply_id: ApplyId,
}

#[async_trait]
pub trait LayoutApplyControl: Send + Sync {
    async fn control_apply(&self, request: &ControlRequest)
        -> Result<ControlResponse, ClientError>;
}

pub trait PermissionOracle: Send + Sync {
    fn can_control_layout_apply(&self) -> bool;
}

/// Permission fixed at construction, typically from settings.
pub struct StaticPermission(pub bool);

impl PermissionOracle for StaticPermission {
    fn can_control_layout_apply(&self) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPhase {
    Idle,
    Confirming,
    Submitting,
    /// Transient: `complete` passes through it straight back to `Idle`, so
    /// `phase()` never returns it. Observe success via `SubmitOutcome::Succeeded`.
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub action: ControlAction,
    pub request: ControlRequest,
    pub title: String,
    pub message: String,
    pub error_title: String,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFailure {
    pub title: String,
    pub message: String,
    pub api_message: Option<String>,
    pub api_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuccessBanner {
    pub message: String,
    pub response: ControlResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    ReloadRequested { apply_id: ApplyId },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("no control action is awaiting confirmation")]
    NothingSelected,
    #[error("a control request is already in flight")]
    AlreadySubmitting,
    #[error("{action} is not available for layout apply {apply_id}")]
    ActionUnavailable {
        action: ControlAction,
        apply_id: ApplyId,
    },
}

/// Proof that a submission was started; results carrying an outdated ticket
/// are dropped.
#[derive(Debug)]
pub struct SubmissionTicket {
    generation: u64,
    request: ControlRequest,
}

impl SubmissionTicket {
    pub fn request(&self) -> &ControlRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Succeeded,
    Failed(ControlFailure),
    Stale,
}

fn target_noun(is_rollback: bool) -> &'static str {
    if is_rollback {
        "the rollback"
    } else {
        "the layout apply"
    }
}

fn action_verb(action: ControlAction) -> &'static str {
    match action {
        ControlAction::Cancel => "cancel",
        ControlAction::Rollback => "cancel and roll back",
        ControlAction::ForcedTermination => "forcibly terminate",
        ControlAction::Resume => "resume",
    }
}

pub fn compose_confirmation(
    action: ControlAction,
    apply_id: ApplyId,
    is_rollback: bool,
) -> ConfirmationRequest {
    let verb = action_verb(action);
    let target = target_noun(is_rollback);
    ConfirmationRequest {
        action,
        title: action.label().to_string(),
        message: format!("Do you want to {verb} {target} {apply_id}?"),
        error_title: format!("Failed to {verb} {target}."),
        success_message: format!("Requested to {verb} {target} {apply_id}."),
        request: ControlRequest {
            kind: action,
            apply_id,
        },
    }
}

pub struct ActionController {
    dispatcher: Arc<dyn LayoutApplyControl>,
    permission: Arc<dyn PermissionOracle>,
    phase: ControlPhase,
    pending: Option<ConfirmationRequest>,
    error: Option<ControlFailure>,
    success: Option<SuccessBanner>,
    generation: u64,
    events: broadcast::Sender<ControllerEvent>,
}

impl ActionController {
    pub fn new(
        dispatcher: Arc<dyn LayoutApplyControl>,
        permission: Arc<dyn PermissionOracle>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            dispatcher,
            permission,
            phase: ControlPhase::Idle,
            pending: None,
            error: None,
            success: None,
            generation: 0,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> ControlPhase {
        self.phase
    }

    pub fn pending(&self) -> Option<&ConfirmationRequest> {
        self.pending.as_ref()
    }

    pub fn error(&self) -> Option<&ControlFailure> {
        self.error.as_ref()
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self.phase,
            ControlPhase::Confirming | ControlPhase::Submitting | ControlPhase::Failed
        )
    }

    /// Whether the confirm control should accept input.
    pub fn can_submit(&self) -> bool {
        matches!(self.phase, ControlPhase::Confirming | ControlPhase::Failed)
    }

    pub fn derive_for(&self, record: &ApplyRecord) -> DerivedStatus {
        derive_status(
            Some(record.status),
            record.rollback_status,
            self.permission.can_control_layout_apply(),
        )
    }

    /// Opens the confirmation for `action` after checking the record allows it.
    pub fn select_for_record(
        &mut self,
        action: ControlAction,
        record: &ApplyRecord,
    ) -> Result<&ConfirmationRequest, ControlError> {
        if !self.derive_for(record).active_actions.contains(&action) {
            return Err(ControlError::ActionUnavailable {
                action,
                apply_id: record.id.clone(),
            });
        }
        self.select(action, record.id.clone(), record.is_rollback())
    }

    pub fn select(
        &mut self,
        action: ControlAction,
        apply_id: ApplyId,
        is_rollback: bool,
    ) -> Result<&ConfirmationRequest, ControlError> {
        if self.phase == ControlPhase::Submitting {
            return Err(ControlError::AlreadySubmitting);
        }

        self.error = None;
        self.success = None;
        self.generation += 1;
        self.transition(ControlPhase::Confirming);
        Ok(self
            .pending
            .insert(compose_confirmation(action, apply_id, is_rollback)))
    }

    /// Closes the confirmation without calling the backend. While a request
    /// is in flight its result is discarded when it arrives.
    pub fn cancel(&mut self) {
        if self.phase == ControlPhase::Submitting {
            debug!("confirmation closed while a control request is in flight");
        }
        self.generation += 1;
        self.pending = None;
        self.error = None;
        self.transition(ControlPhase::Idle);
    }

    /// Drops every piece of state, e.g. when the owning view goes away.
    pub fn reset(&mut self) {
        self.cancel();
        self.success = None;
    }

    pub fn begin_submit(&mut self) -> Result<SubmissionTicket, ControlError> {
        match self.phase {
            ControlPhase::Submitting => return Err(ControlError::AlreadySubmitting),
            ControlPhase::Confirming | ControlPhase::Failed => {}
            ControlPhase::Idle | ControlPhase::Succeeded => {
                return Err(ControlError::NothingSelected)
            }
        }
        let request = self
            .pending
            .as_ref()
            .map(|pending| pending.request.clone())
            .ok_or(ControlError::NothingSelected)?;

        self.error = None;
        self.transition(ControlPhase::Submitting);
        Ok(SubmissionTicket {
            generation: self.generation,
            request,
        })
    }

    pub fn complete(
        &mut self,
        ticket: SubmissionTicket,
        result: Result<ControlResponse, ClientError>,
    ) -> SubmitOutcome {
        if ticket.generation != self.generation || self.phase != ControlPhase::Submitting {
            debug!(
                apply_id = %ticket.request.apply_id,
                action = %ticket.request.kind,
                "dropping result of a superseded control request"
            );
            return SubmitOutcome::Stale;
        }

        let Some(pending) = self.pending.take() else {
            self.transition(ControlPhase::Idle);
            return SubmitOutcome::Stale;
        };

        match result {
            Ok(response) => {
                info!(
                    apply_id = %ticket.request.apply_id,
                    action = %ticket.request.kind,
                    "layout apply control accepted"
                );
                self.success = Some(SuccessBanner {
                    message: pending.success_message,
                    response,
                });
                self.transition(ControlPhase::Succeeded);
                let _ = self.events.send(ControllerEvent::ReloadRequested {
                    apply_id: ticket.request.apply_id,
                });
                self.transition(ControlPhase::Idle);
                SubmitOutcome::Succeeded
            }
            Err(err) => {
                warn!(
                    apply_id = %ticket.request.apply_id,
                    action = %ticket.request.kind,
                    error = %err,
                    "layout apply control failed"
                );
                let failure = ControlFailure {
                    title: pending.error_title.clone(),
                    message: err.to_string(),
                    api_message: err.api_error().map(|api| api.message.clone()),
                    api_code: err.api_error().map(|api| api.code.clone()),
                };
                self.pending = Some(pending);
                self.error = Some(failure.clone());
                self.transition(ControlPhase::Failed);
                SubmitOutcome::Failed(failure)
            }
        }
    }

    pub async fn confirm(&mut self) -> Result<SubmitOutcome, ControlError> {
        let ticket = self.begin_submit()?;
        let result = self.dispatcher.control_apply(ticket.request()).await;
        Ok(self.complete(ticket, result))
    }

    /// Success banner of the last accepted request; returned once.
    pub fn take_success(&mut self) -> Option<SuccessBanner> {
        self.success.take()
    }

    fn transition(&mut self, next: ControlPhase) {
        if self.phase != next {
            debug!(from = ?self.phase, to = ?next, "control phase transition");
            self.phase = next;
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
