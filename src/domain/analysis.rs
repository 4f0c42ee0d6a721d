//! Analysis report types
//!
//! These model the structured output the inference passes are prompted to
//! produce. Field-level `#[serde(default)]` keeps decoding tolerant: the
//! service routinely omits fields, and a missing field must not sink a pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary pass output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseSummary {
    #[serde(default)]
    pub executive_summary: String,
    #[serde(default)]
    pub key_terms: Vec<String>,
    #[serde(default)]
    pub critical_dates: Vec<String>,
    #[serde(default)]
    pub obligations: Vec<String>,
}

/// A single identified risk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiskItem {
    #[serde(default)]
    pub category: String,
    /// Clamped to 1..=5 after parsing.
    #[serde(default)]
    pub severity: i32,
    /// Clamped to 0.0..=1.0 after parsing.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub mitigations: Vec<String>,
}

impl RiskItem {
    /// Clamp severity and confidence into their documented ranges.
    pub fn clamped(mut self) -> Self {
        self.severity = self.severity.clamp(1, 5);
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }
}

/// Suggestion flavor: a balanced redraft or one favoring our side.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    #[default]
    Balanced,
    Favorable,
}

impl std::fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionType::Balanced => write!(f, "balanced"),
            SuggestionType::Favorable => write!(f, "favorable"),
        }
    }
}

/// Suggestion pass output item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    #[serde(rename = "type", default)]
    pub suggestion_type: SuggestionType,
    #[serde(default)]
    pub original_text: Option<String>,
    #[serde(default)]
    pub suggested_text: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub negotiation_tips: Vec<String>,
}

/// Aggregated analysis output, owned by its case and replaced wholesale on
/// each re-analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    pub summary: CaseSummary,
    pub risks: Vec<RiskItem>,
    pub suggestions: Vec<Suggestion>,
    /// Free-structured sub-report; shape varies by category.
    pub category_insight: serde_json::Value,
    pub compliance: serde_json::Value,
    /// True if any pass fell back to its documented default.
    pub degraded: bool,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// The report produced when no pass could run at all (for example the
    /// document text was unreadable): every sub-object at its default,
    /// flagged degraded.
    pub fn degraded_default(now: DateTime<Utc>) -> Self {
        Self {
            summary: CaseSummary::default(),
            risks: Vec::new(),
            suggestions: Vec::new(),
            category_insight: serde_json::json!({}),
            compliance: serde_json::json!({}),
            degraded: true,
            generated_at: now,
        }
    }
}
