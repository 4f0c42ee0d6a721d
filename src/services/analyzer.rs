//! Analysis orchestrator
//!
//! Runs the five analysis passes against the inference service and folds the
//! results into one `AnalysisReport`. Each pass is independently
//! fault-tolerant: an inference error, a timeout, or unparseable output
//! degrades that pass to its documented default and never aborts the others.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::domain::analysis::{AnalysisReport, CaseSummary, RiskItem, Suggestion};
use crate::domain::case::Case;
use crate::services::inference::InferenceService;
use crate::services::parser::{parse_structured, ExpectedShape, StructuredOutcome};
use crate::services::prompts;

/// Severity at or above which the suggestion pass runs.
pub const SUGGESTION_SEVERITY_GATE: i32 = 4;

pub struct Analyzer {
    inference: Arc<dyn InferenceService>,
    temperature: f64,
    max_tokens: u32,
    excerpt_chars: usize,
    pass_timeout: Duration,
}

impl Analyzer {
    pub fn new(inference: Arc<dyn InferenceService>, settings: &Settings) -> Self {
        Self {
            inference,
            temperature: settings.inference_temperature,
            max_tokens: settings.inference_max_tokens,
            excerpt_chars: settings.analysis_excerpt_chars,
            pass_timeout: Duration::from_secs(settings.pass_timeout_seconds),
        }
    }

    /// Run all passes and aggregate. Never fails: the worst case is a report
    /// built entirely from defaults with `degraded = true`.
    pub async fn analyze(&self, case: &Case, document_text: &str) -> AnalysisReport {
        let excerpt = prompts::bounded_excerpt(document_text, self.excerpt_chars);
        let mut degraded = false;

        // The four independent passes fan out concurrently; suggestions are
        // gated on risk severity and run after.
        let (summary_out, risks_out, insight_out, compliance_out) = tokio::join!(
            self.run_pass(
                case.id,
                "summary",
                prompts::summary_prompt(case, excerpt),
                ExpectedShape::Object,
                json!({}),
            ),
            self.run_pass(
                case.id,
                "risks",
                prompts::risk_prompt(case, excerpt),
                ExpectedShape::Array,
                json!([]),
            ),
            self.run_pass(
                case.id,
                "category_insight",
                prompts::category_insight_prompt(case, excerpt),
                ExpectedShape::Object,
                json!({}),
            ),
            self.run_pass(
                case.id,
                "compliance",
                prompts::compliance_prompt(case, excerpt),
                ExpectedShape::Object,
                json!({}),
            ),
        );

        let summary: CaseSummary = decode_pass(case.id, "summary", summary_out, &mut degraded);
        let risks: Vec<RiskItem> = decode_pass::<Vec<RiskItem>>(case.id, "risks", risks_out, &mut degraded)
            .into_iter()
            .map(RiskItem::clamped)
            .collect();

        degraded |= insight_out.is_degraded();
        let category_insight = insight_out.into_value();
        degraded |= compliance_out.is_degraded();
        let compliance = compliance_out.into_value();

        let suggestions = if risks.iter().any(|r| r.severity >= SUGGESTION_SEVERITY_GATE) {
            let outcome = self
                .run_pass(
                    case.id,
                    "suggestions",
                    prompts::suggestion_prompt(case, excerpt, &risks),
                    ExpectedShape::Array,
                    json!([]),
                )
                .await;
            decode_pass::<Vec<Suggestion>>(case.id, "suggestions", outcome, &mut degraded)
        } else {
            // No high-severity risk: skip the pass entirely rather than
            // spend an inference call.
            debug!(case_id = %case.id, "no high-severity risks, skipping suggestion pass");
            Vec::new()
        };

        AnalysisReport {
            summary,
            risks,
            suggestions,
            category_insight,
            compliance,
            degraded,
            generated_at: chrono::Utc::now(),
        }
    }

    async fn run_pass(
        &self,
        case_id: Uuid,
        pass: &'static str,
        prompt: String,
        shape: ExpectedShape,
        default: Value,
    ) -> StructuredOutcome {
        let call = self.inference.infer(&prompt, self.temperature, self.max_tokens);
        match timeout(self.pass_timeout, call).await {
            Ok(Ok(text)) => {
                let outcome = parse_structured(&text, shape, default);
                match &outcome {
                    StructuredOutcome::Parsed(_) => {
                        debug!(case_id = %case_id, pass = pass, "pass parsed");
                    }
                    StructuredOutcome::Degraded(_) => {
                        warn!(case_id = %case_id, pass = pass, "pass output unparseable, using default");
                    }
                }
                outcome
            }
            Ok(Err(e)) => {
                warn!(case_id = %case_id, pass = pass, error = %e, "inference failure, using default");
                StructuredOutcome::Degraded(default)
            }
            Err(_) => {
                warn!(
                    case_id = %case_id,
                    pass = pass,
                    timeout_ms = self.pass_timeout.as_millis() as u64,
                    "pass timed out, using default"
                );
                StructuredOutcome::Degraded(default)
            }
        }
    }
}

/// Decode a parsed pass value into its typed sub-object. A decode failure is
/// the same as unparseable output: default plus the degraded flag.
fn decode_pass<T: DeserializeOwned + Default>(
    case_id: Uuid,
    pass: &'static str,
    outcome: StructuredOutcome,
    degraded: &mut bool,
) -> T {
    match outcome {
        StructuredOutcome::Parsed(value) => match serde_json::from_value::<T>(value) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(case_id = %case_id, pass = pass, error = %e, "pass output failed typed decode, using default");
                *degraded = true;
                T::default()
            }
        },
        StructuredOutcome::Degraded(_) => {
            *degraded = true;
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::case::{CaseCategory, NewCase};
    use crate::error::CoreError;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;

    fn test_settings() -> Settings {
        Settings {
            env: crate::config::Environment::Dev,
            inference_url: "http://inference:8000".to_string(),
            inference_token: "test-token".to_string(),
            inference_timeout_seconds: 120,
            inference_temperature: 0.2,
            inference_max_tokens: 2048,
            analysis_excerpt_chars: 24_000,
            pass_timeout_seconds: 5,
            review_board_recipients: vec!["review-board@internal".to_string()],
        }
    }

    fn sample_case() -> Case {
        Case::new(
            NewCase {
                subject_name: "Acme Corp".to_string(),
                subject_address: "123 Main St".to_string(),
                category: CaseCategory::ServiceAgreement,
                document_ref: "doc-1".to_string(),
            },
            Utc::now(),
        )
    }

    /// Routes each pass to a canned response by the role line in its prompt.
    struct ScriptedInference {
        calls: Mutex<Vec<&'static str>>,
        summary: Result<String, String>,
        risks: Result<String, String>,
        suggestions: Result<String, String>,
        insight: Result<String, String>,
        compliance: Result<String, String>,
    }

    impl ScriptedInference {
        fn happy(risk_severity: i32) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                summary: Ok(
                    r#"{"executive_summary":"Standard services deal","key_terms":["net-30"],"critical_dates":["2026-09-01"],"obligations":["monthly reporting"]}"#
                        .to_string(),
                ),
                risks: Ok(format!(
                    r#"[{{"category":"liability","severity":{risk_severity},"confidence":0.9,"description":"Uncapped liability","rationale":"No cap clause","mitigations":["add cap"]}}]"#
                )),
                suggestions: Ok(
                    r#"[{"type":"balanced","original_text":null,"suggested_text":"Cap liability at fees paid.","rationale":"Aligns with market","negotiation_tips":["offer mutual cap"]}]"#
                        .to_string(),
                ),
                insight: Ok(r#"{"market_norms":"typical"}"#.to_string()),
                compliance: Ok(r#"{"violations":[]}"#.to_string()),
            }
        }

        fn pass_for(prompt: &str) -> &'static str {
            if prompt.contains("case analyst") {
                "summary"
            } else if prompt.contains("risk assessor") {
                "risks"
            } else if prompt.contains("negotiation advisor") {
                "suggestions"
            } else if prompt.contains("domain specialist") {
                "insight"
            } else {
                "compliance"
            }
        }
    }

    #[async_trait]
    impl InferenceService for ScriptedInference {
        async fn infer(
            &self,
            prompt: &str,
            _temperature: f64,
            _max_tokens: u32,
        ) -> Result<String, CoreError> {
            let pass = Self::pass_for(prompt);
            self.calls.lock().push(pass);
            let scripted = match pass {
                "summary" => &self.summary,
                "risks" => &self.risks,
                "suggestions" => &self.suggestions,
                "insight" => &self.insight,
                _ => &self.compliance,
            };
            scripted.clone().map_err(CoreError::Inference)
        }
    }

    #[tokio::test]
    async fn aggregates_all_five_passes() {
        let scripted = Arc::new(ScriptedInference::happy(5));
        let analyzer = Analyzer::new(scripted.clone(), &test_settings());
        let report = analyzer.analyze(&sample_case(), "contract text").await;

        assert!(!report.degraded);
        assert_eq!(report.summary.executive_summary, "Standard services deal");
        assert_eq!(report.risks.len(), 1);
        assert_eq!(report.risks[0].severity, 5);
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.category_insight["market_norms"], "typical");
        assert_eq!(report.compliance["violations"], serde_json::json!([]));
        assert_eq!(scripted.calls.lock().len(), 5);
    }

    #[tokio::test]
    async fn low_severity_skips_the_suggestion_pass() {
        let scripted = Arc::new(ScriptedInference::happy(2));
        let analyzer = Analyzer::new(scripted.clone(), &test_settings());
        let report = analyzer.analyze(&sample_case(), "contract text").await;

        assert!(report.suggestions.is_empty());
        let calls = scripted.calls.lock();
        assert_eq!(calls.len(), 4);
        assert!(!calls.contains(&"suggestions"));
    }

    #[tokio::test]
    async fn failing_pass_degrades_without_sinking_the_others() {
        let mut scripted = ScriptedInference::happy(5);
        scripted.summary = Err("gateway 502".to_string());
        let analyzer = Analyzer::new(Arc::new(scripted), &test_settings());
        let report = analyzer.analyze(&sample_case(), "contract text").await;

        assert!(report.degraded);
        assert_eq!(report.summary, CaseSummary::default());
        assert_eq!(report.risks.len(), 1);
        assert_eq!(report.suggestions.len(), 1);
    }

    #[tokio::test]
    async fn prose_only_output_degrades_that_pass() {
        let mut scripted = ScriptedInference::happy(5);
        scripted.compliance = Ok("Sorry, I cannot analyze this.".to_string());
        let analyzer = Analyzer::new(Arc::new(scripted), &test_settings());
        let report = analyzer.analyze(&sample_case(), "contract text").await;

        assert!(report.degraded);
        assert_eq!(report.compliance, serde_json::json!({}));
        // Siblings unaffected.
        assert_eq!(report.risks.len(), 1);
    }

    #[tokio::test]
    async fn out_of_range_values_are_clamped_after_parsing() {
        let mut scripted = ScriptedInference::happy(5);
        scripted.risks = Ok(
            r#"[{"category":"x","severity":9,"confidence":1.8,"description":"d","rationale":"r","mitigations":[]}]"#
                .to_string(),
        );
        let analyzer = Analyzer::new(Arc::new(scripted), &test_settings());
        let report = analyzer.analyze(&sample_case(), "contract text").await;

        assert_eq!(report.risks[0].severity, 5);
        assert_eq!(report.risks[0].confidence, 1.0);
    }

    #[tokio::test]
    async fn ill_typed_parse_degrades_to_default() {
        let mut scripted = ScriptedInference::happy(5);
        // Valid JSON array, wrong element type for risks.
        scripted.risks = Ok(r#"["just", "strings"]"#.to_string());
        let analyzer = Analyzer::new(Arc::new(scripted), &test_settings());
        let report = analyzer.analyze(&sample_case(), "contract text").await;

        assert!(report.degraded);
        assert!(report.risks.is_empty());
        // No high-severity risks survive, so no suggestions either.
        assert!(report.suggestions.is_empty());
    }

    struct StalledInference;

    #[async_trait]
    impl InferenceService for StalledInference {
        async fn infer(
            &self,
            _prompt: &str,
            _temperature: f64,
            _max_tokens: u32,
        ) -> Result<String, CoreError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_passes_time_out_to_defaults() {
        let analyzer = Analyzer::new(Arc::new(StalledInference), &test_settings());
        let report = analyzer.analyze(&sample_case(), "contract text").await;

        assert!(report.degraded);
        assert_eq!(report.summary, CaseSummary::default());
        assert!(report.risks.is_empty());
        assert!(report.suggestions.is_empty());
        assert_eq!(report.category_insight, serde_json::json!({}));
        assert_eq!(report.compliance, serde_json::json!({}));
    }
}
