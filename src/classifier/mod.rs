//! Query classification
//!
//! Rule-first: the ordered predicate matchers in [`matchers`] decide most
//! questions without any network call. Unmatched questions fall through to
//! the delegate with the strategy-enum schema; a delegate failure or timeout
//! defaults to Hybrid, the broadest coverage, rather than failing the
//! request.

use std::sync::Arc;
use std::time::Duration;

use crate::delegate::{classification_prompt, parse_strategy, Delegate};
use crate::types::{Question, RoutingHints, Strategy};

pub mod matchers;
pub use matchers::{default_matchers, IntentMatcher};

/// Document kinds recognized in possessive references ("Alice's resume")
const DOC_KINDS: &[&str] = &["resume", "review", "brief", "report"];

/// Leading question/command words never treated as named entities
const QUESTION_WORDS: &[&str] = &[
    "who", "what", "which", "whose", "how", "does", "do", "did", "is", "are", "was", "were",
    "show", "list", "find", "compare", "tell", "give", "can", "could", "please", "the", "a",
    "an", "my", "our", "their",
];

/// Skill vocabulary used for hint extraction when none is supplied
fn default_lexicon() -> Vec<String> {
    [
        "Python",
        "JavaScript",
        "TypeScript",
        "React",
        "Node.js",
        "Machine Learning",
        "Docker",
        "Kubernetes",
        "AWS",
        "SQL",
        "API Design",
        "Leadership",
        "Communication",
        "Project Management",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Classifier output: strategy plus routing hints
#[derive(Debug, Clone)]
pub struct Classification {
    pub strategy: Strategy,

    pub hints: RoutingHints,

    /// Name of the rule that matched; None when the delegate (or the Hybrid
    /// default) decided
    pub rule: Option<&'static str>,
}

/// Classifier configuration
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Bound on the delegate classification call
    pub delegate_timeout: Duration,

    /// Proficiency floor injected for candidate-recommendation questions
    pub recommendation_floor: f64,

    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            delegate_timeout: Duration::from_secs(10),
            recommendation_floor: 0.8,
            verbose: false,
        }
    }
}

/// Rule-first query classifier with delegate fallback
pub struct QueryClassifier {
    matchers: Vec<IntentMatcher>,
    lexicon: Vec<String>,
    delegate: Option<Arc<dyn Delegate>>,
    config: ClassifierConfig,
}

impl QueryClassifier {
    /// Create a classifier with the default matchers and lexicon
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            matchers: default_matchers(),
            lexicon: default_lexicon(),
            delegate: None,
            config,
        }
    }

    /// Attach a delegate for unmatched questions
    pub fn with_delegate(mut self, delegate: Arc<dyn Delegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Replace the skill lexicon
    pub fn with_lexicon(mut self, lexicon: Vec<String>) -> Self {
        self.lexicon = lexicon;
        self
    }

    /// Classify a question into a strategy plus routing hints
    pub async fn classify(&self, question: &Question) -> Classification {
        let mut hints = extract_hints(&question.text, &self.lexicon);
        let lowered = question.text.to_lowercase();

        for matcher in &self.matchers {
            if matcher.matches(&lowered, &hints) {
                if self.config.verbose {
                    eprintln!("[CLASSIFY] rule={} -> {:?}", matcher.name, matcher.strategy);
                }
                if matcher.name == "candidate-recommendation" {
                    hints.numeric_filters.push(self.config.recommendation_floor);
                }
                return Classification {
                    strategy: matcher.strategy,
                    hints,
                    rule: Some(matcher.name),
                };
            }
        }

        let strategy = self.delegate_strategy(question).await;
        if self.config.verbose {
            eprintln!("[CLASSIFY] delegate/default -> {:?}", strategy);
        }
        Classification {
            strategy,
            hints,
            rule: None,
        }
    }

    /// Ask the delegate for a strategy; any failure defaults to Hybrid
    async fn delegate_strategy(&self, question: &Question) -> Strategy {
        let delegate = match &self.delegate {
            Some(d) => d,
            None => return Strategy::Hybrid,
        };

        let prompt = classification_prompt(&question.text, &question.recent_turns);
        let call = delegate.complete(&prompt);

        match tokio::time::timeout(self.config.delegate_timeout, call).await {
            Ok(Ok(response)) => parse_strategy(&response).unwrap_or(Strategy::Hybrid),
            Ok(Err(e)) => {
                if self.config.verbose {
                    eprintln!("[CLASSIFY] delegate failed: {}", e);
                }
                Strategy::Hybrid
            }
            Err(_) => {
                if self.config.verbose {
                    eprintln!("[CLASSIFY] delegate timed out");
                }
                Strategy::Hybrid
            }
        }
    }
}

/// Extract routing hints from question text
pub fn extract_hints(text: &str, lexicon: &[String]) -> RoutingHints {
    let mut hints = RoutingHints::default();
    let lowered = text.to_lowercase();

    for skill in lexicon {
        if lowered.contains(&skill.to_lowercase()) {
            hints.skills.push(skill.clone());
        }
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let mut run: Vec<String> = Vec::new();

    for (i, raw) in words.iter().enumerate() {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '\'')
            .collect();

        // Possessive document references: "Alice's resume"
        if let Some(owner) = cleaned.strip_suffix("'s") {
            if is_name_like(owner) {
                push_unique(&mut hints.entities, owner.to_string());
                if let Some(kind) = words.get(i + 1).and_then(|w| doc_kind(w)) {
                    push_unique(
                        &mut hints.document_scopes,
                        format!("{}_{}", owner.to_lowercase(), kind),
                    );
                }
            }
            flush_entity_run(&mut run, &mut hints, lexicon);
            continue;
        }

        let numeric: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if numeric.chars().any(|c| c.is_ascii_digit()) && cleaned.chars().all(|c| !c.is_alphabetic()) {
            if let Ok(value) = numeric.parse::<f64>() {
                hints.numeric_filters.push(value);
            }
            flush_entity_run(&mut run, &mut hints, lexicon);
            continue;
        }

        if is_name_like(&cleaned) && !QUESTION_WORDS.contains(&cleaned.to_lowercase().as_str()) {
            run.push(cleaned);
        } else {
            flush_entity_run(&mut run, &mut hints, lexicon);
        }
    }
    flush_entity_run(&mut run, &mut hints, lexicon);

    hints
}

/// Capitalized, more than one character
fn is_name_like(word: &str) -> bool {
    word.len() > 1 && word.chars().next().is_some_and(|c| c.is_uppercase())
}

fn doc_kind(word: &str) -> Option<&'static str> {
    let lowered: String = word
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    DOC_KINDS.iter().find(|k| **k == lowered).copied()
}

/// Close a run of capitalized words, keeping it unless it is a known skill
fn flush_entity_run(run: &mut Vec<String>, hints: &mut RoutingHints, lexicon: &[String]) {
    if run.is_empty() {
        return;
    }
    let candidate = run.join(" ");
    run.clear();

    let is_skill = lexicon.iter().any(|s| s.eq_ignore_ascii_case(&candidate));
    if !is_skill {
        push_unique(&mut hints.entities, candidate);
    }
}

fn push_unique(items: &mut Vec<String>, value: String) {
    if !items.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
        items.push(value);
    }
}
