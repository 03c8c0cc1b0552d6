//! Answer synthesis
//!
//! Merges normalized evidence across branches into ranked candidates and a
//! cited answer. Ranking and scoring are fully deterministic over the
//! evidence set; only the optional delegate prose pass may vary run to run,
//! and it can never change ranking, citations, or flags.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::delegate::{prose_prompt, Delegate};
use crate::normalize::{EvidenceNormalizer, NormalizedEvidence};
use crate::types::{Candidate, QueryResponse, SourceKind, Strategy};

pub mod scorer;
pub use scorer::{CandidateScorer, ScoreWeights};

/// Synthesizer configuration
#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    /// Scoring weights
    pub weights: ScoreWeights,

    /// Candidates below this aggregate score are dropped as noise
    pub min_candidate_score: f64,

    /// Evidence records cited per candidate in the answer text
    pub max_cited: usize,

    /// Bound on the optional delegate prose call
    pub delegate_timeout: Duration,

    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            min_candidate_score: 0.02,
            max_cited: 3,
            delegate_timeout: Duration::from_secs(15),
            verbose: false,
        }
    }
}

/// Everything the synthesizer needs for one response
#[derive(Debug, Clone)]
pub struct SynthesisInput {
    pub question: String,
    pub strategy: Strategy,
    pub records: Vec<NormalizedEvidence>,
    pub sql_query: Option<String>,
    pub degraded: bool,
}

/// Builds the final response from merged evidence
pub struct AnswerSynthesizer {
    scorer: CandidateScorer,
    normalizer: EvidenceNormalizer,
    delegate: Option<Arc<dyn Delegate>>,
    config: SynthesizerConfig,
}

impl AnswerSynthesizer {
    pub fn new(config: SynthesizerConfig) -> Self {
        Self {
            scorer: CandidateScorer::new(config.weights.clone()),
            normalizer: EvidenceNormalizer::default(),
            delegate: None,
            config,
        }
    }

    /// Attach a delegate for the prose pass
    pub fn with_delegate(mut self, delegate: Arc<dyn Delegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Synthesize the response; `elapsed_ms` is filled by the pipeline
    pub async fn synthesize(&self, mut input: SynthesisInput) -> QueryResponse {
        let records = self.normalizer.dedup(std::mem::take(&mut input.records));
        let (candidates, unattributed) = self.build_candidates(records);

        let draft = self.compose_answer(&input, &candidates, &unattributed);

        // The delegate may only restate the draft; everything rankable is
        // already fixed at this point.
        let answer = self.maybe_reword(&input.question, draft).await;

        QueryResponse {
            answer,
            query_type: input.strategy,
            results: candidates,
            sql_query: input.sql_query,
            degraded: input.degraded,
            elapsed_ms: 0,
        }
    }

    /// Group attributed evidence into scored, ranked candidates
    fn build_candidates(
        &self,
        records: Vec<NormalizedEvidence>,
    ) -> (Vec<Candidate>, Vec<NormalizedEvidence>) {
        let mut grouped: BTreeMap<i64, Candidate> = BTreeMap::new();
        let mut unattributed = Vec::new();

        for record in records {
            match &record.entity {
                Some(entity) => {
                    let candidate = grouped.entry(entity.id).or_insert_with(|| Candidate {
                        entity_id: entity.id,
                        name: String::new(),
                        evidence: Vec::new(),
                        score: 0.0,
                    });
                    if candidate.name.is_empty() && !entity.name.is_empty() {
                        candidate.name = entity.name.clone();
                    }
                    candidate.evidence.push(record.evidence);
                }
                None => unattributed.push(record),
            }
        }

        let mut candidates: Vec<Candidate> = grouped
            .into_values()
            .map(|mut candidate| {
                if candidate.name.is_empty() {
                    candidate.name = format!("employee #{}", candidate.entity_id);
                }
                self.normalizer.order(&mut candidate.evidence);
                candidate.score = self.scorer.aggregate(&candidate.evidence);
                candidate
            })
            .filter(|c| c.score >= self.config.min_candidate_score)
            .collect();

        // Stable total order: branch completion order can never leak in
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });

        (candidates, unattributed)
    }

    /// Deterministic answer text with per-claim citations
    fn compose_answer(
        &self,
        input: &SynthesisInput,
        candidates: &[Candidate],
        unattributed: &[NormalizedEvidence],
    ) -> String {
        let mut lines: Vec<String> = Vec::new();

        if input.degraded {
            lines.push(
                "Note: some sources were unavailable for this question; the answer below \
                 is built from partial evidence."
                    .to_string(),
            );
        }

        if candidates.is_empty() && unattributed.is_empty() {
            lines.push(format!(
                "No matching evidence was found for \"{}\". Try rephrasing, or widening \
                 the skills or people you are asking about.",
                input.question
            ));
            return lines.join("\n");
        }

        if !candidates.is_empty() {
            lines.push(format!(
                "Found {} matching candidate(s), ranked by evidence strength:",
                candidates.len()
            ));
            for (rank, candidate) in candidates.iter().enumerate() {
                lines.push(format!(
                    "{}. {} (score {:.2}, {} evidence record(s))",
                    rank + 1,
                    candidate.name,
                    candidate.score,
                    candidate.evidence.len()
                ));
                for evidence in candidate.evidence.iter().take(self.config.max_cited) {
                    lines.push(format!(
                        "   - [{} {}] {}",
                        kind_label(evidence.kind()),
                        evidence.source.identifier(),
                        evidence.excerpt
                    ));
                }
            }
        }

        if !unattributed.is_empty() {
            lines.push("Additional context from documents:".to_string());
            for record in unattributed.iter().take(self.config.max_cited) {
                lines.push(format!(
                    "   - [{} {}] {}",
                    kind_label(record.evidence.kind()),
                    record.evidence.source.identifier(),
                    record.evidence.excerpt
                ));
            }
        }

        lines.join("\n")
    }

    /// Optionally have the delegate restate the draft as prose
    async fn maybe_reword(&self, question: &str, draft: String) -> String {
        let delegate = match &self.delegate {
            Some(d) => d,
            None => return draft,
        };

        let prompt = prose_prompt(question, &draft);
        match tokio::time::timeout(self.config.delegate_timeout, delegate.complete(&prompt)).await {
            Ok(Ok(prose)) if !prose.trim().is_empty() => prose.trim().to_string(),
            _ => {
                if self.config.verbose {
                    eprintln!("[SYNTH] delegate prose failed, keeping deterministic draft");
                }
                draft
            }
        }
    }
}

fn kind_label(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::StructuredRow => "structured",
        SourceKind::DocumentPassage => "document",
    }
}
