//! Repeat-subject scoring
//!
//! A case's tier reflects how often its subject has appeared before. Matching
//! is fuzzy on purpose: subject identity is free text, so two records for the
//! same subject rarely agree byte-for-byte.

use crate::domain::case::Case;

/// Bidirectional case-insensitive substring match. Empty fields never match:
/// an absent identity is not a wildcard.
pub fn field_matches(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// Count prior cases (strictly earlier `created_at`) matching the case's
/// subject, per identity dimension, and take the max.
///
/// Max rather than sum: a repeat subject matched on both name and address is
/// one repeat subject, not two.
pub fn match_count(case: &Case, prior: &[Case]) -> usize {
    let earlier = prior
        .iter()
        .filter(|p| p.id != case.id && p.created_at < case.created_at);

    let mut address_matches = 0usize;
    let mut name_matches = 0usize;
    for p in earlier {
        if field_matches(&p.subject_address, &case.subject_address) {
            address_matches += 1;
        }
        if field_matches(&p.subject_name, &case.subject_name) {
            name_matches += 1;
        }
    }

    address_matches.max(name_matches)
}

/// Map a match count onto the 1..=5 tier.
pub fn score_for_matches(matches: usize) -> u8 {
    match matches {
        0 => 1,
        1 => 2,
        2 => 3,
        3 => 4,
        _ => 5,
    }
}

pub fn score_case(case: &Case, prior: &[Case]) -> u8 {
    score_for_matches(match_count(case, prior))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::case::{CaseCategory, NewCase};
    use chrono::{Duration, Utc};

    fn case_at(name: &str, address: &str, days_ago: i64) -> Case {
        Case::new(
            NewCase {
                subject_name: name.to_string(),
                subject_address: address.to_string(),
                category: CaseCategory::ConductViolation,
                document_ref: "doc".to_string(),
            },
            Utc::now() - Duration::days(days_ago),
        )
    }

    #[test]
    fn tier_table_matches_the_contract() {
        assert_eq!(score_for_matches(0), 1);
        assert_eq!(score_for_matches(1), 2);
        assert_eq!(score_for_matches(2), 3);
        assert_eq!(score_for_matches(3), 4);
        assert_eq!(score_for_matches(4), 5);
        assert_eq!(score_for_matches(17), 5);
    }

    #[test]
    fn matching_is_case_insensitive_and_bidirectional() {
        assert!(field_matches("123 Main St", "123 MAIN ST"));
        assert!(field_matches("123 Main St, Suite 4", "123 main st"));
        assert!(field_matches("main st", "123 Main St, Suite 4"));
        assert!(!field_matches("456 Oak Ave", "123 Main St"));
    }

    #[test]
    fn empty_identity_fields_never_match() {
        assert!(!field_matches("", ""));
        assert!(!field_matches("  ", "123 Main St"));
        assert!(!field_matches("123 Main St", ""));

        let subject = case_at("", "", 0);
        let prior = vec![case_at("", "", 10), case_at("Anyone", "Anywhere", 5)];
        assert_eq!(match_count(&subject, &prior), 0);
        assert_eq!(score_case(&subject, &prior), 1);
    }

    #[test]
    fn dimensions_take_the_max_not_the_sum() {
        // 2 prior matches by address, 3 different prior matches by name.
        let subject = case_at("Jordan Smith", "99 River Rd", 0);
        let prior = vec![
            case_at("A Corp", "99 River Rd", 10),
            case_at("B Corp", "99 river rd, apt 2", 9),
            case_at("Jordan Smith", "1 Elm St", 8),
            case_at("jordan smith", "2 Elm St", 7),
            case_at("Jordan Smith Jr", "3 Elm St", 6),
        ];
        assert_eq!(match_count(&subject, &prior), 3);
        assert_eq!(score_case(&subject, &prior), 4);
    }

    #[test]
    fn only_strictly_earlier_cases_count() {
        let subject = case_at("Acme", "123 Main St", 5);
        let prior = vec![
            case_at("Acme", "123 Main St", 10), // earlier: counts
            case_at("Acme", "123 Main St", 1),  // later: ignored
        ];
        assert_eq!(match_count(&subject, &prior), 1);
        assert_eq!(score_case(&subject, &prior), 2);
    }

    #[test]
    fn a_case_never_matches_itself() {
        let subject = case_at("Acme", "123 Main St", 5);
        let mut snapshot = vec![subject.clone()];
        snapshot.push(case_at("Acme", "123 Main St", 10));
        assert_eq!(match_count(&subject, &snapshot), 1);
    }

    #[test]
    fn fourth_occurrence_reaches_the_top_tier() {
        let subject = case_at("Acme", "123 Main St", 0);
        let prior: Vec<Case> = (1..=4).map(|d| case_at("Other", "123 Main St", d)).collect();
        assert_eq!(score_case(&subject, &prior), 5);
    }
}
