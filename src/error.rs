//! Core error taxonomy
//!
//! Only state transitions are rejected outright. Analysis and scoring recover
//! locally (degraded report, conservative tier) and report through logs.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::case::CaseStatus;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("case not found: {0}")]
    NotFound(Uuid),

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: CaseStatus, to: CaseStatus },

    #[error("score {score} is below the escalation threshold")]
    BelowEscalationThreshold { score: u8 },

    #[error("resolution metadata is required to resolve a case")]
    MissingResolution,

    #[error("inference service failure: {0}")]
    Inference(String),

    #[error("repository error")]
    Repository(#[source] anyhow::Error),

    #[error("document store error")]
    Document(#[source] anyhow::Error),

    #[error("scheduling error")]
    Scheduling(#[source] anyhow::Error),

    #[error("notification error")]
    Notification(#[source] anyhow::Error),
}

impl CoreError {
    /// Stable machine-readable code for the caller's error envelope.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::BelowEscalationThreshold { .. } => "BELOW_ESCALATION_THRESHOLD",
            Self::MissingResolution => "MISSING_RESOLUTION",
            Self::Inference(_) => "INFERENCE_ERROR",
            Self::Repository(_) => "REPOSITORY_ERROR",
            Self::Document(_) => "DOCUMENT_ERROR",
            Self::Scheduling(_) => "SCHEDULING_ERROR",
            Self::Notification(_) => "NOTIFICATION_ERROR",
        }
    }

    /// Whether the caller sent a structurally invalid request (as opposed to
    /// an internal collaborator failure).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. }
                | Self::BelowEscalationThreshold { .. }
                | Self::MissingResolution
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
