//! End-to-end query pipeline: classify -> retrieve -> normalize -> synthesize
//!
//! One logical task per question. The pipeline owns no mutable state across
//! requests; each call produces a fresh, request-scoped evidence set.

use std::sync::Arc;
use std::time::Instant;

use crate::classifier::{ClassifierConfig, QueryClassifier};
use crate::delegate::Delegate;
use crate::errors::{QueryError, Result};
use crate::gateway::{SemanticGateway, StructuredGateway};
use crate::normalize::{EvidenceNormalizer, NormalizerConfig};
use crate::orchestrator::{OrchestratorConfig, RetrievalOrchestrator};
use crate::synthesis::{AnswerSynthesizer, SynthesisInput, SynthesizerConfig};
use crate::types::{Question, QueryResponse, Strategy};

/// Structured rows cite this table on the response surface
const FACT_TABLE: &str = "employee_skills";

/// Pipeline configuration, one section per stage
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub classifier: ClassifierConfig,
    pub orchestrator: OrchestratorConfig,
    pub normalizer: NormalizerConfig,
    pub synthesizer: SynthesizerConfig,
}

impl PipelineConfig {
    /// Propagate one verbose flag to every stage
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.classifier.verbose = verbose;
        self.orchestrator.verbose = verbose;
        self.synthesizer.verbose = verbose;
        self
    }
}

/// The query pipeline
pub struct QueryPipeline {
    classifier: QueryClassifier,
    orchestrator: RetrievalOrchestrator,
    normalizer: EvidenceNormalizer,
    synthesizer: AnswerSynthesizer,
}

impl QueryPipeline {
    /// Build a pipeline over the two gateways
    pub fn new(
        structured: Arc<dyn StructuredGateway>,
        semantic: Arc<dyn SemanticGateway>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            classifier: QueryClassifier::new(config.classifier),
            orchestrator: RetrievalOrchestrator::new(structured, semantic, config.orchestrator),
            normalizer: EvidenceNormalizer::new(config.normalizer),
            synthesizer: AnswerSynthesizer::new(config.synthesizer),
        }
    }

    /// Wire one delegate into classification, query generation, and prose
    pub fn with_delegate(mut self, delegate: Arc<dyn Delegate>) -> Self {
        self.classifier = self.classifier.with_delegate(Arc::clone(&delegate));
        self.orchestrator = self.orchestrator.with_delegate(Arc::clone(&delegate));
        self.synthesizer = self.synthesizer.with_delegate(delegate);
        self
    }

    /// Answer one question
    ///
    /// Branch failures degrade the response; only the total failure of every
    /// dispatched branch surfaces as an error.
    pub async fn ask(&self, question: &Question) -> Result<QueryResponse> {
        let started = Instant::now();

        let classification = self.classifier.classify(question).await;

        match classification.strategy {
            Strategy::Conversational => {
                return Ok(QueryResponse::direct(
                    greeting_answer(),
                    Strategy::Conversational,
                    elapsed_ms(started),
                ));
            }
            Strategy::Unsupported => {
                return Ok(QueryResponse::direct(
                    unsupported_answer(),
                    Strategy::Unsupported,
                    elapsed_ms(started),
                ));
            }
            _ => {}
        }

        let outcome = self
            .orchestrator
            .retrieve(&question.text, classification.strategy, &classification.hints)
            .await;

        if outcome.total_failure() {
            return Err(QueryError::AllBranchesFailed);
        }

        let mut records = Vec::new();
        if let Some(structured) = &outcome.structured {
            records.extend(self.normalizer.from_rows(FACT_TABLE, &structured.rows));
        }
        records.extend(self.normalizer.from_passages(&outcome.passages));

        let degraded = outcome.degraded();
        let mut response = self
            .synthesizer
            .synthesize(SynthesisInput {
                question: question.text.clone(),
                strategy: classification.strategy,
                records,
                sql_query: outcome.sql_query,
                degraded,
            })
            .await;

        response.elapsed_ms = elapsed_ms(started);
        Ok(response)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn greeting_answer() -> &'static str {
    "Hello! I can answer questions about the people, skills, and documents in \
     your talent directory. How can I help you today?"
}

fn unsupported_answer() -> &'static str {
    "This assistant answers read-only questions about the workforce. It cannot \
     add, change, or delete records."
}
