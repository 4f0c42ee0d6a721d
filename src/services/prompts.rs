//! Prompt builders for the analysis passes.
//!
//! Every prompt demands strict JSON with an explicit schema, because the
//! parser's fallback chain should be the safety net, not the plan.

use crate::domain::analysis::RiskItem;
use crate::domain::case::Case;

const JSON_ONLY: &str =
    "Respond with JSON only. No prose before or after. No markdown fences unless unavoidable.";

/// Per-category analysis focus, appended to every pass prompt.
fn category_focus(case: &Case) -> &'static str {
    use crate::domain::case::CaseCategory::*;
    match case.category {
        ServiceAgreement => {
            "Focus on service levels, termination rights, liability caps and payment terms."
        }
        Lease => "Focus on term, rent escalation, maintenance duties, deposit and exit clauses.",
        Employment => {
            "Focus on compensation, restrictive covenants, termination grounds and notice periods."
        }
        Procurement => "Focus on delivery obligations, acceptance criteria, warranties and penalties.",
        Nda => "Focus on definition of confidential information, carve-outs, term and remedies.",
        SafetyViolation => {
            "Focus on the hazard, affected parties, regulatory duties and prior warnings."
        }
        ConductViolation => {
            "Focus on the conduct alleged, involved parties, policy provisions and evidence."
        }
        RegulatoryViolation => {
            "Focus on the regulation implicated, exposure, deadlines and remediation duties."
        }
    }
}

fn case_header(case: &Case) -> String {
    format!(
        "Case category: {}. Subject: {}. Subject address: {}.",
        case.category.label(),
        if case.subject_name.is_empty() { "(unknown)" } else { &case.subject_name },
        if case.subject_address.is_empty() { "(unknown)" } else { &case.subject_address },
    )
}

pub fn summary_prompt(case: &Case, excerpt: &str) -> String {
    format!(
        "You are a case analyst. {header} {focus}\n\
         Summarize the document below as a JSON object with exactly these keys:\n\
         {{\"executive_summary\": string, \"key_terms\": [string], \
         \"critical_dates\": [string], \"obligations\": [string]}}\n\
         {json_only}\n\nDOCUMENT:\n{excerpt}",
        header = case_header(case),
        focus = category_focus(case),
        json_only = JSON_ONLY,
    )
}

pub fn risk_prompt(case: &Case, excerpt: &str) -> String {
    format!(
        "You are a risk assessor. {header} {focus}\n\
         List the risks in the document below as a JSON array. Each element:\n\
         {{\"category\": string, \"severity\": integer 1-5, \"confidence\": number 0-1, \
         \"description\": string, \"rationale\": string, \"mitigations\": [string]}}\n\
         Order from most to least severe. {json_only}\n\nDOCUMENT:\n{excerpt}",
        header = case_header(case),
        focus = category_focus(case),
        json_only = JSON_ONLY,
    )
}

pub fn suggestion_prompt(case: &Case, excerpt: &str, risks: &[RiskItem]) -> String {
    let risk_lines: Vec<String> = risks
        .iter()
        .filter(|r| r.severity >= 4)
        .map(|r| format!("- [severity {}] {}: {}", r.severity, r.category, r.description))
        .collect();

    format!(
        "You are a negotiation advisor. {header} {focus}\n\
         High-severity risks already identified:\n{risks}\n\
         Propose improvements as a JSON array. Each element:\n\
         {{\"type\": \"balanced\" | \"favorable\", \"original_text\": string or null, \
         \"suggested_text\": string, \"rationale\": string, \"negotiation_tips\": [string]}}\n\
         {json_only}\n\nDOCUMENT:\n{excerpt}",
        header = case_header(case),
        focus = category_focus(case),
        risks = risk_lines.join("\n"),
        json_only = JSON_ONLY,
    )
}

pub fn category_insight_prompt(case: &Case, excerpt: &str) -> String {
    let angle = if case.category.is_contract() {
        "market norms for this contract type, unusual clauses, missing protections"
    } else {
        "incident pattern, aggravating and mitigating factors, recommended immediate actions"
    };
    format!(
        "You are a domain specialist. {header} {focus}\n\
         Produce a category insight report covering: {angle}.\n\
         Respond as a single JSON object; choose keys that fit the content. {json_only}\n\n\
         DOCUMENT:\n{excerpt}",
        header = case_header(case),
        focus = category_focus(case),
        angle = angle,
        json_only = JSON_ONLY,
    )
}

pub fn compliance_prompt(case: &Case, excerpt: &str) -> String {
    format!(
        "You are a compliance reviewer. {header} {focus}\n\
         Assess compliance exposure in the document below: applicable rules, \
         apparent violations, required filings or cures.\n\
         Respond as a single JSON object; choose keys that fit the content. {json_only}\n\n\
         DOCUMENT:\n{excerpt}",
        header = case_header(case),
        focus = category_focus(case),
        json_only = JSON_ONLY,
    )
}

/// Char-boundary-safe prefix of `text`, at most `max_chars` bytes, so a pass
/// never exceeds the service's input-size limit.
pub fn bounded_excerpt(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut end = max_chars;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
