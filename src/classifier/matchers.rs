//! Intent predicate matchers
//!
//! Each matcher is an independent predicate over the lowercased question
//! text and the extracted hints. Matchers are evaluated in priority order;
//! the first hit decides the strategy. Greeting detection sits first so
//! small talk never reaches a gateway.

use crate::types::{RoutingHints, Strategy};

/// One named predicate feeding the priority list
pub struct IntentMatcher {
    /// Stable rule name, used in verbose logs and tests
    pub name: &'static str,

    /// Strategy this matcher routes to
    pub strategy: Strategy,

    predicate: fn(&str, &RoutingHints) -> bool,
}

impl IntentMatcher {
    pub fn matches(&self, lowered: &str, hints: &RoutingHints) -> bool {
        (self.predicate)(lowered, hints)
    }
}

/// The default matcher list, in priority order
pub fn default_matchers() -> Vec<IntentMatcher> {
    vec![
        IntentMatcher {
            name: "greeting",
            strategy: Strategy::Conversational,
            predicate: is_greeting,
        },
        IntentMatcher {
            name: "mutation-request",
            strategy: Strategy::Unsupported,
            predicate: is_mutation_request,
        },
        IntentMatcher {
            name: "cross-document-comparison",
            strategy: Strategy::AdvancedHybrid,
            predicate: is_cross_document_comparison,
        },
        IntentMatcher {
            name: "document-verification",
            strategy: Strategy::Semantic,
            predicate: is_document_verification,
        },
        IntentMatcher {
            name: "candidate-recommendation",
            strategy: Strategy::Hybrid,
            predicate: is_candidate_recommendation,
        },
        IntentMatcher {
            name: "attribute-aggregate",
            strategy: Strategy::Sql,
            predicate: is_attribute_or_aggregate,
        },
        IntentMatcher {
            name: "cross-reference",
            strategy: Strategy::Hybrid,
            predicate: is_cross_reference,
        },
    ]
}

const GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "how are you",
    "thanks",
    "thank you",
    "bye",
    "goodbye",
];

fn is_greeting(lowered: &str, _hints: &RoutingHints) -> bool {
    let stripped = lowered.trim_end_matches(['!', '.', '?', ' ']);
    // Short messages only; "hi, how many engineers do we have" is a query
    if stripped.len() > 40 {
        return false;
    }
    GREETINGS
        .iter()
        .any(|g| stripped == *g || stripped.starts_with(&format!("{} ", g)) && stripped.len() <= g.len() + 15)
}

const MUTATION_VERBS: &[&str] = &[
    "delete ",
    "remove ",
    "update ",
    "insert ",
    "add a new",
    "add an employee",
    "change the",
    "set the",
    "edit ",
];

fn is_mutation_request(lowered: &str, _hints: &RoutingHints) -> bool {
    MUTATION_VERBS.iter().any(|v| lowered.contains(v))
}

const COMPARISON_TERMS: &[&str] = &["compare", " versus ", " vs ", "difference between", "against"];

fn is_cross_document_comparison(lowered: &str, hints: &RoutingHints) -> bool {
    hints.document_scopes.len() >= 2 && COMPARISON_TERMS.iter().any(|t| lowered.contains(t))
}

const VERIFICATION_PHRASES: &[&str] = &[
    "does the resume",
    "does the review",
    "what does",
    "according to",
    "mention",
    "say about",
    "show me examples",
];

fn is_document_verification(lowered: &str, hints: &RoutingHints) -> bool {
    if hints.document_scopes.len() == 1 {
        return true;
    }
    hints.document_scopes.is_empty()
        && VERIFICATION_PHRASES.iter().any(|p| lowered.contains(p))
        && (lowered.contains("resume") || lowered.contains("review") || lowered.contains("document"))
}

const RECOMMENDATION_PHRASES: &[&str] = &[
    "best candidate",
    "best candidates",
    "who should lead",
    "who should run",
    "who should we",
    "recommend",
    "good fit",
    "top candidates",
    "best person",
    "best people",
    "who is best",
    "who are the best",
];

fn is_candidate_recommendation(lowered: &str, _hints: &RoutingHints) -> bool {
    RECOMMENDATION_PHRASES.iter().any(|p| lowered.contains(p))
}

const AGGREGATE_PHRASES: &[&str] = &[
    "how many",
    "count",
    "number of",
    "list all",
    "show me all",
    "show all",
    "which department",
    "which team",
    "average",
    "most common",
    "top 5",
    "top five",
    "top 10",
];

fn is_attribute_or_aggregate(lowered: &str, hints: &RoutingHints) -> bool {
    if AGGREGATE_PHRASES.iter().any(|p| lowered.contains(p)) {
        return true;
    }
    // A named employee plus a skill term is a plain attribute lookup
    !hints.entities.is_empty() && !hints.skills.is_empty() && !lowered.contains("experience")
}

fn is_cross_reference(lowered: &str, hints: &RoutingHints) -> bool {
    COMPARISON_TERMS.iter().any(|t| lowered.contains(t))
        || (!hints.skills.is_empty() && lowered.contains("experience"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> RoutingHints {
        RoutingHints::default()
    }

    fn first_match(text: &str, hints: &RoutingHints) -> Option<&'static str> {
        let lowered = text.to_lowercase();
        default_matchers()
            .into_iter()
            .find(|m| m.matches(&lowered, hints))
            .map(|m| m.name)
    }

    #[test]
    fn test_greetings_match() {
        assert_eq!(first_match("hello", &hints()), Some("greeting"));
        assert_eq!(first_match("Hi!", &hints()), Some("greeting"));
        assert_eq!(first_match("thank you", &hints()), Some("greeting"));
    }

    #[test]
    fn test_greeting_prefix_does_not_swallow_queries() {
        assert_ne!(
            first_match("hi, how many engineers do we have in the platform org", &hints()),
            Some("greeting")
        );
    }

    #[test]
    fn test_mutation_routed_unsupported() {
        assert_eq!(
            first_match("delete Bob Smith from the database", &hints()),
            Some("mutation-request")
        );
        assert_eq!(
            first_match("update Alice's department to Design", &hints()),
            Some("mutation-request")
        );
    }

    #[test]
    fn test_cross_document_comparison_needs_two_scopes() {
        let mut h = hints();
        h.document_scopes = vec!["alice_resume".to_string(), "bob_review".to_string()];
        assert_eq!(
            first_match("compare Alice's resume with Bob's review", &h),
            Some("cross-document-comparison")
        );

        h.document_scopes.truncate(1);
        assert_ne!(
            first_match("compare Alice's resume with the team", &h),
            Some("cross-document-comparison")
        );
    }

    #[test]
    fn test_single_document_verification() {
        let mut h = hints();
        h.document_scopes = vec!["alice_resume".to_string()];
        assert_eq!(
            first_match("does Alice's resume mention Kubernetes?", &h),
            Some("document-verification")
        );
    }

    #[test]
    fn test_recommendation() {
        assert_eq!(
            first_match("Who are the best candidates to lead Project Phoenix?", &hints()),
            Some("candidate-recommendation")
        );
    }

    #[test]
    fn test_aggregate() {
        assert_eq!(
            first_match("How many Python developers do we have?", &hints()),
            Some("attribute-aggregate")
        );
        assert_eq!(
            first_match("List all employees in Engineering", &hints()),
            Some("attribute-aggregate")
        );
    }

    #[test]
    fn test_cross_reference_fallthrough() {
        let mut h = hints();
        h.skills = vec!["Java".to_string()];
        assert_eq!(
            first_match("What leadership experience backs up the Java skills we track?", &h),
            Some("cross-reference")
        );
    }

    #[test]
    fn test_unmatched_text_matches_nothing() {
        assert_eq!(first_match("ramblings about the weather and lunch plans", &hints()), None);
    }
}
