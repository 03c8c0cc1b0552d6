//! Gateway interfaces over the two retrieval backends
//!
//! The orchestrator only ever talks to these traits; whether rows and
//! passages come from fixtures or a real database/vector index is an
//! implementation detail. Both backends are read-only and stateless from
//! the orchestrator's point of view.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::types::StructuredQuerySpec;

pub mod demo;
pub mod memory;

pub use memory::{InMemorySemanticGateway, InMemoryStructuredGateway};

/// A result row: field name to value
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Rows returned by a structured query execution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredResult {
    pub rows: Vec<Row>,
}

impl StructuredResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A ranked passage returned by semantic retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Document identifier ("alice_resume")
    pub document: String,

    /// Employee the document belongs to, when known at ingestion time
    pub employee_id: Option<i64>,

    /// Chunk offset within the document
    pub chunk_index: usize,

    /// Excerpt text
    pub excerpt: String,

    /// Similarity score in [0, 1]
    pub similarity: f64,
}

/// Read path over tabular employee/skill facts
///
/// Execution failures must carry a description usable as corrective context
/// for the one-shot query regeneration.
#[async_trait]
pub trait StructuredGateway: Send + Sync {
    async fn execute(&self, spec: &StructuredQuerySpec) -> Result<StructuredResult>;
}

/// Similarity-search read path over unstructured document text
#[async_trait]
pub trait SemanticGateway: Send + Sync {
    /// Retrieve the `top_k` passages most similar to `query`, optionally
    /// scoped to the named documents.
    async fn search(
        &self,
        query: &str,
        scope: Option<&[String]>,
        top_k: usize,
    ) -> Result<Vec<Passage>>;
}
