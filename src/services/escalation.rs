//! Escalation lifecycle
//!
//! Owns the transition table for case statuses and the per-case locks that
//! serialize concurrent transition attempts. Side effects of entering a
//! status (notifications, reminders) are driven by the facade; this module
//! answers only "is this move legal" and "apply it".

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::case::{Case, CaseStatus, Resolution, TransitionRequest};
use crate::error::{CoreError, CoreResult};

/// Score at or above which a case escalates to board review.
pub const ESCALATION_THRESHOLD: u8 = 4;

/// Legal transitions between case statuses.
///
/// ```text
/// Open        → Escalated (score-gated) | Disputed
/// Escalated   → UnderReview | Disputed | Resolved
/// UnderReview → Disputed | Resolved
/// Disputed    → Resolved
/// Resolved    → (terminal)
/// ```
pub fn is_legal_transition(from: CaseStatus, to: CaseStatus) -> bool {
    use CaseStatus::*;

    matches!(
        (from, to),
        (Open, Escalated)
            | (Escalated, UnderReview)
            | (Open, Disputed)
            | (UnderReview, Disputed)
            | (Escalated, Disputed)
            | (UnderReview, Resolved)
            | (Escalated, Resolved)
            | (Disputed, Resolved)
    )
}

/// Validate a requested transition against the table and its guards.
pub fn validate_transition(
    case: &Case,
    target: CaseStatus,
    request: &TransitionRequest,
) -> CoreResult<()> {
    if !is_legal_transition(case.status, target) {
        return Err(CoreError::InvalidTransition {
            from: case.status,
            to: target,
        });
    }

    // Escalation is earned, not requested: the threshold applies whether the
    // move is automatic or manual.
    if case.status == CaseStatus::Open
        && target == CaseStatus::Escalated
        && case.score < ESCALATION_THRESHOLD
    {
        return Err(CoreError::BelowEscalationThreshold { score: case.score });
    }

    if target == CaseStatus::Resolved {
        let resolved_by_ok = request
            .resolved_by
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        if !resolved_by_ok || request.notes.is_none() {
            return Err(CoreError::MissingResolution);
        }
    }

    Ok(())
}

/// Apply a validated transition. Call `validate_transition` first.
pub fn apply_transition(
    case: &mut Case,
    target: CaseStatus,
    request: &TransitionRequest,
    now: DateTime<Utc>,
) {
    case.status = target;
    if target == CaseStatus::Resolved {
        case.resolution = Some(Resolution {
            resolved_by: request.resolved_by.clone().unwrap_or_default(),
            notes: request.notes.clone().unwrap_or_default(),
            resolved_at: now,
        });
    }
}

/// Per-case async locks so two concurrent requests cannot both transition
/// the same case. The registry itself is a cheap synchronous map; the guard
/// held across repository awaits is a tokio mutex.
#[derive(Default)]
pub struct TransitionLocks {
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl TransitionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_case(&self, case_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(case_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
