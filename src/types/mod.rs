//! Type definitions module
//!
//! Core request-scoped types flowing through the query pipeline.

pub mod question;

// Re-export commonly used types
pub use question::{Question, RoutingHints, Strategy, StructuredQuerySpec};

// Evidence and response surface types
pub mod evidence;
pub use evidence::{Candidate, Evidence, EvidenceSource, QueryResponse, SourceKind};
