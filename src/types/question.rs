//! Question and strategy types
//!
//! A Question is consumed exactly once per request; the Strategy chosen for
//! it is immutable and determines which gateways the orchestrator invokes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incoming natural-language question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Raw question text
    pub text: String,

    /// Session this question belongs to, when part of a conversation
    pub session_id: Option<Uuid>,

    /// Arrival timestamp
    pub arrived_at: DateTime<Utc>,

    /// Recent conversation turns, newest last
    #[serde(default)]
    pub recent_turns: Vec<String>,
}

impl Question {
    /// Create a standalone question arriving now
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: None,
            arrived_at: Utc::now(),
            recent_turns: Vec::new(),
        }
    }

    /// Attach a session id
    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Attach recent conversation turns
    pub fn with_turns(mut self, turns: Vec<String>) -> Self {
        self.recent_turns = turns;
        self
    }
}

/// Retrieval strategy selected for a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Structured path only
    Sql,
    /// Semantic path only
    Semantic,
    /// Structured and semantic paths, dispatched concurrently
    Hybrid,
    /// Per-document semantic fan-out plus the structured path
    AdvancedHybrid,
    /// Greeting or small talk; no gateway dispatch
    Conversational,
    /// Out of scope (e.g. a mutation request); no gateway dispatch
    Unsupported,
}

impl Strategy {
    /// Whether this strategy dispatches the structured path
    pub fn uses_structured(&self) -> bool {
        matches!(self, Strategy::Sql | Strategy::Hybrid | Strategy::AdvancedHybrid)
    }

    /// Whether this strategy dispatches the semantic path
    pub fn uses_semantic(&self) -> bool {
        matches!(
            self,
            Strategy::Semantic | Strategy::Hybrid | Strategy::AdvancedHybrid
        )
    }

    /// Strategy name as used on the response surface
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sql => "sql",
            Strategy::Semantic => "semantic",
            Strategy::Hybrid => "hybrid",
            Strategy::AdvancedHybrid => "advanced_hybrid",
            Strategy::Conversational => "conversational",
            Strategy::Unsupported => "unsupported",
        }
    }

    /// Parse a strategy name returned by a delegate
    ///
    /// Accepts the surface names plus a few spellings delegates produce.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_matches('"').to_lowercase().as_str() {
            "sql" | "structured" => Some(Strategy::Sql),
            "semantic" | "rag" => Some(Strategy::Semantic),
            "hybrid" => Some(Strategy::Hybrid),
            "advanced_hybrid" | "advanced-hybrid" => Some(Strategy::AdvancedHybrid),
            "conversational" => Some(Strategy::Conversational),
            "unsupported" => Some(Strategy::Unsupported),
            _ => None,
        }
    }
}

/// Routing hints extracted during classification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingHints {
    /// Named employees mentioned in the question
    pub entities: Vec<String>,

    /// Named unstructured sources ("alice_resume", "bob_review")
    pub document_scopes: Vec<String>,

    /// Skill terms recognized against the lexicon
    pub skills: Vec<String>,

    /// Numeric filters ("more than 3 years" -> 3.0)
    pub numeric_filters: Vec<f64>,
}

impl RoutingHints {
    /// Whether any hint was extracted at all
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.document_scopes.is_empty()
            && self.skills.is_empty()
            && self.numeric_filters.is_empty()
    }
}

/// A generated structured query, ready for gateway execution
///
/// Carries both the SQL text (for the response surface) and a parameterized
/// filter that gateway implementations may execute directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredQuerySpec {
    /// Generated query text
    pub text: String,

    /// Target entity names, when the query narrows to specific employees
    pub target_entities: Vec<String>,

    /// Skill terms the query filters on
    pub skills: Vec<String>,

    /// Minimum proficiency filter, when present
    pub min_proficiency: Option<f64>,

    /// Generation attempt: 1, or 2 after one corrective regeneration
    pub attempt: u8,

    /// False when generation itself produced nothing usable
    pub valid: bool,
}

impl StructuredQuerySpec {
    /// First-attempt spec
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_entities: Vec::new(),
            skills: Vec::new(),
            min_proficiency: None,
            attempt: 1,
            valid: true,
        }
    }
}
