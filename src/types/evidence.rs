//! Evidence, candidate, and response surface types

use serde::{Deserialize, Serialize};

use crate::types::Strategy;

/// Which backend an Evidence record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// A row from the structured store
    StructuredRow,
    /// A passage from the semantic store
    DocumentPassage,
}

/// Identifies exactly where an Evidence record came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Table + row id in the structured store
    Row { table: String, row_id: i64 },
    /// Document + chunk offset in the semantic store
    Passage { document: String, chunk_index: usize },
}

impl EvidenceSource {
    /// Human-readable identifier for citations
    pub fn identifier(&self) -> String {
        match self {
            EvidenceSource::Row { table, row_id } => format!("{}#{}", table, row_id),
            EvidenceSource::Passage { document, chunk_index } => {
                format!("{}@{}", document, chunk_index)
            }
        }
    }

    /// The source kind this identifier belongs to
    pub fn kind(&self) -> SourceKind {
        match self {
            EvidenceSource::Row { .. } => SourceKind::StructuredRow,
            EvidenceSource::Passage { .. } => SourceKind::DocumentPassage,
        }
    }
}

/// A single sourced fact or excerpt with a confidence score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    /// Where this evidence came from
    pub source: EvidenceSource,

    /// Excerpt text supporting the claim
    pub excerpt: String,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Optional numeric metric carried from the source (e.g. proficiency)
    pub metric: Option<f64>,
}

impl Evidence {
    /// Build an evidence record, clamping confidence into [0, 1]
    pub fn new(source: EvidenceSource, excerpt: impl Into<String>, confidence: f64) -> Self {
        Self {
            source,
            excerpt: excerpt.into(),
            confidence: confidence.clamp(0.0, 1.0),
            metric: None,
        }
    }

    /// Attach a numeric metric
    pub fn with_metric(mut self, metric: f64) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Source kind shortcut
    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }
}

/// An entity under evaluation with its supporting evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Entity id (employee id in the demo domain)
    pub entity_id: i64,

    /// Display name
    pub name: String,

    /// Supporting evidence, ordered by descending confidence
    pub evidence: Vec<Evidence>,

    /// Aggregate score; deterministic and monotone in the evidence set
    pub score: f64,
}

/// The single response surface returned for every question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Synthesized answer text with per-claim citations
    pub answer: String,

    /// Strategy that produced this response
    pub query_type: Strategy,

    /// Ranked candidates, best first
    pub results: Vec<Candidate>,

    /// Generated structured query, present only when one was executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,

    /// True when at least one dispatched branch failed or timed out
    pub degraded: bool,

    /// End-to-end latency in milliseconds
    pub elapsed_ms: u64,
}

impl QueryResponse {
    /// Response carrying no retrieval work (conversational / unsupported)
    pub fn direct(answer: impl Into<String>, query_type: Strategy, elapsed_ms: u64) -> Self {
        Self {
            answer: answer.into(),
            query_type,
            results: Vec::new(),
            sql_query: None,
            degraded: false,
            elapsed_ms,
        }
    }
}
