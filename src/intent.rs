//! Turns a finished connect gesture into a transition proposal and carries
//! it through confirmation.

use serde::Serialize;

use crate::backend::WorkflowBackend;
use crate::error::{DesignerError, Result, ValidationError};
use crate::model::{DEFAULT_PRIORITY, NewTransition, RecordId};

/// The confirmation form for a proposed transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDraft {
    pub from_state_key: String,
    pub to_state_key: String,
    pub event_key: String,
    pub name: String,
    pub priority: u32,
    pub condition_expression: Option<String>,
}

impl TransitionDraft {
    pub fn new(from_state_key: &str, to_state_key: &str) -> Self {
        Self {
            from_state_key: from_state_key.to_string(),
            to_state_key: to_state_key.to_string(),
            event_key: String::new(),
            name: String::new(),
            priority: DEFAULT_PRIORITY,
            condition_expression: None,
        }
    }

    /// Only `eventKey` and `name` are checked here; anything semantic is the
    /// backend's call. Values are trimmed and a blank condition is dropped.
    pub fn validate(&self) -> std::result::Result<NewTransition, ValidationError> {
        let event_key = self.event_key.trim();
        if event_key.is_empty() {
            return Err(ValidationError::EmptyEventKey);
        }
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let condition_expression = self
            .condition_expression
            .as_deref()
            .map(str::trim)
            .filter(|expr| !expr.is_empty())
            .map(str::to_string);
        Ok(NewTransition {
            from_state_key: self.from_state_key.clone(),
            to_state_key: self.to_state_key.clone(),
            event_key: event_key.to_string(),
            name: name.to_string(),
            priority: self.priority,
            condition_expression,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingProposal {
    pub draft: TransitionDraft,
    /// Message from the last failed submit, shown on the open form.
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct EdgeIntentEmitter {
    pending: Option<PendingProposal>,
}

impl EdgeIntentEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the confirmation form for `from -> to`, replacing any form that
    /// was still open.
    pub fn propose_edge(&mut self, from_state_key: &str, to_state_key: &str) -> &TransitionDraft {
        tracing::debug!(from_state_key, to_state_key, "transition proposed");
        let proposal = self.pending.insert(PendingProposal {
            draft: TransitionDraft::new(from_state_key, to_state_key),
            error: None,
        });
        &proposal.draft
    }

    pub fn pending(&self) -> Option<&PendingProposal> {
        self.pending.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut TransitionDraft> {
        self.pending.as_mut().map(|proposal| &mut proposal.draft)
    }

    pub fn cancel(&mut self) -> Option<PendingProposal> {
        self.pending.take()
    }

    /// Validates and sends the open draft. On success the form closes and the
    /// committed transition is returned; the caller reloads the definition.
    /// On any failure the form stays open with the error recorded on it.
    pub fn submit<B: WorkflowBackend + ?Sized>(
        &mut self,
        backend: &B,
        definition_id: &RecordId,
    ) -> Result<NewTransition> {
        let proposal = self.pending.as_mut().ok_or(DesignerError::NoPendingProposal)?;
        let transition = match proposal.draft.validate() {
            Ok(transition) => transition,
            Err(err) => {
                proposal.error = Some(err.to_string());
                return Err(err.into());
            }
        };
        if let Err(err) = backend.add_transition(definition_id, &transition) {
            tracing::warn!(%definition_id, error = %err, "transition rejected");
            proposal.error = Some(err.to_string());
            return Err(err.into());
        }
        tracing::info!(
            %definition_id,
            from = %transition.from_state_key,
            to = %transition.to_state_key,
            event = %transition.event_key,
            "transition committed"
        );
        self.pending = None;
        Ok(transition)
    }
}
