//! Case domain types
//!
//! A case is the unit of work tracked through analysis and escalation: a
//! contract under review or a reported incident/violation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::analysis::AnalysisReport;

/// Case lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Open,
    UnderReview,
    Escalated,
    Resolved,
    Disputed,
}

impl CaseStatus {
    /// Whether this is a terminal status (no further transitions allowed).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseStatus::Open => write!(f, "open"),
            CaseStatus::UnderReview => write!(f, "under_review"),
            CaseStatus::Escalated => write!(f, "escalated"),
            CaseStatus::Resolved => write!(f, "resolved"),
            CaseStatus::Disputed => write!(f, "disputed"),
        }
    }
}

/// Case category (closed set)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseCategory {
    ServiceAgreement,
    Lease,
    Employment,
    Procurement,
    Nda,
    SafetyViolation,
    ConductViolation,
    RegulatoryViolation,
}

impl CaseCategory {
    /// Contract categories get negotiation-oriented analysis; violation
    /// categories get incident-oriented analysis.
    pub fn is_contract(self) -> bool {
        matches!(
            self,
            Self::ServiceAgreement | Self::Lease | Self::Employment | Self::Procurement | Self::Nda
        )
    }

    /// Human-readable label used in prompts and notifications.
    pub fn label(self) -> &'static str {
        match self {
            Self::ServiceAgreement => "service agreement",
            Self::Lease => "lease agreement",
            Self::Employment => "employment contract",
            Self::Procurement => "procurement contract",
            Self::Nda => "non-disclosure agreement",
            Self::SafetyViolation => "safety violation",
            Self::ConductViolation => "conduct violation",
            Self::RegulatoryViolation => "regulatory violation",
        }
    }
}

impl std::fmt::Display for CaseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseCategory::ServiceAgreement => write!(f, "service_agreement"),
            CaseCategory::Lease => write!(f, "lease"),
            CaseCategory::Employment => write!(f, "employment"),
            CaseCategory::Procurement => write!(f, "procurement"),
            CaseCategory::Nda => write!(f, "nda"),
            CaseCategory::SafetyViolation => write!(f, "safety_violation"),
            CaseCategory::ConductViolation => write!(f, "conduct_violation"),
            CaseCategory::RegulatoryViolation => write!(f, "regulatory_violation"),
        }
    }
}

/// Resolution metadata, present only on resolved cases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resolution {
    pub resolved_by: String,
    pub notes: String,
    pub resolved_at: DateTime<Utc>,
}

/// Case entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: Uuid,
    /// Free-text subject identity used for repeat-offense matching; may be empty.
    pub subject_name: String,
    pub subject_address: String,
    pub category: CaseCategory,
    /// Key into the external document store; the core only reads the text.
    pub document_ref: String,
    pub status: CaseStatus,
    /// Severity/repeat-offense tier, 1..=5. Recomputed, never accumulated.
    pub score: u8,
    pub analysis_report: Option<AnalysisReport>,
    /// Immutable; the ordering key for scoring.
    pub created_at: DateTime<Utc>,
    pub resolution: Option<Resolution>,
}

impl Case {
    pub fn new(input: NewCase, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_name: input.subject_name,
            subject_address: input.subject_address,
            category: input.category,
            document_ref: input.document_ref,
            status: CaseStatus::Open,
            score: 1,
            analysis_report: None,
            created_at: now,
            resolution: None,
        }
    }
}

/// Input for creating a case
#[derive(Debug, Clone, Deserialize)]
pub struct NewCase {
    pub subject_name: String,
    pub subject_address: String,
    pub category: CaseCategory,
    pub document_ref: String,
}

/// Caller-supplied metadata accompanying a transition request.
///
/// `resolved_by`/`notes` are required when the target status is `Resolved`
/// and ignored otherwise.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
