//! Evidence normalization
//!
//! Maps raw gateway results into canonical [`Evidence`] records, merges
//! duplicates, and fixes the within-candidate ordering: descending
//! confidence, ties broken structured-before-unstructured, since structured
//! facts are the more verifiable source.

use crate::gateway::{Passage, Row};
use crate::types::{Evidence, EvidenceSource, SourceKind};

/// Snippet length cap for passage excerpts
const EXCERPT_CAP: usize = 240;

/// Entity an evidence record is attributed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub id: i64,
    pub name: String,
}

/// Evidence plus its attribution, when one is known
#[derive(Debug, Clone)]
pub struct NormalizedEvidence {
    pub entity: Option<EntityRef>,
    pub evidence: Evidence,
}

/// Normalizer configuration
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Confidence for structured rows without a stored confidence column
    pub default_row_confidence: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            default_row_confidence: 0.6,
        }
    }
}

/// Maps gateway results into Evidence
#[derive(Debug, Clone, Default)]
pub struct EvidenceNormalizer {
    config: NormalizerConfig,
}

impl EvidenceNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalize structured rows
    ///
    /// Confidence comes from a stored confidence/proficiency column when
    /// present; stored percentages (values above 1) are scaled into [0, 1].
    pub fn from_rows(&self, table: &str, rows: &[Row]) -> Vec<NormalizedEvidence> {
        rows.iter()
            .map(|row| {
                let row_id = row
                    .get("row_id")
                    .and_then(|v| v.as_i64())
                    .unwrap_or_default();

                let confidence = row
                    .get("confidence")
                    .or_else(|| row.get("proficiency"))
                    .and_then(|v| v.as_f64())
                    .map(|c| if c > 1.0 { c / 100.0 } else { c })
                    .unwrap_or(self.config.default_row_confidence);

                let source = EvidenceSource::Row {
                    table: table.to_string(),
                    row_id,
                };

                let evidence =
                    Evidence::new(source, row_excerpt(row), confidence).with_metric(confidence);

                NormalizedEvidence {
                    entity: entity_from_row(row),
                    evidence,
                }
            })
            .collect()
    }

    /// Normalize semantic passages; confidence is the similarity score
    pub fn from_passages(&self, passages: &[Passage]) -> Vec<NormalizedEvidence> {
        passages
            .iter()
            .map(|p| {
                let source = EvidenceSource::Passage {
                    document: p.document.clone(),
                    chunk_index: p.chunk_index,
                };

                let mut excerpt = p.excerpt.clone();
                if excerpt.len() > EXCERPT_CAP {
                    let cut = excerpt
                        .char_indices()
                        .take_while(|(i, _)| *i < EXCERPT_CAP)
                        .last()
                        .map(|(i, c)| i + c.len_utf8())
                        .unwrap_or(EXCERPT_CAP);
                    excerpt.truncate(cut);
                    excerpt.push_str("...");
                }

                NormalizedEvidence {
                    entity: p.employee_id.map(|id| EntityRef {
                        id,
                        name: String::new(),
                    }),
                    evidence: Evidence::new(source, excerpt, p.similarity),
                }
            })
            .collect()
    }

    /// Merge records referencing the same source with overlapping excerpts,
    /// keeping the higher confidence and the longer excerpt
    pub fn dedup(&self, mut records: Vec<NormalizedEvidence>) -> Vec<NormalizedEvidence> {
        let mut merged: Vec<NormalizedEvidence> = Vec::with_capacity(records.len());

        for record in records.drain(..) {
            let duplicate = merged.iter_mut().find(|kept| {
                kept.evidence.source == record.evidence.source
                    && excerpts_overlap(&kept.evidence.excerpt, &record.evidence.excerpt)
            });

            match duplicate {
                Some(kept) => {
                    if record.evidence.confidence > kept.evidence.confidence {
                        kept.evidence.confidence = record.evidence.confidence;
                        kept.evidence.metric = record.evidence.metric.or(kept.evidence.metric);
                    }
                    if record.evidence.excerpt.len() > kept.evidence.excerpt.len() {
                        kept.evidence.excerpt = record.evidence.excerpt;
                    }
                    if kept.entity.is_none() {
                        kept.entity = record.entity;
                    }
                }
                None => merged.push(record),
            }
        }

        merged
    }

    /// Within-candidate ordering: descending confidence, structured first on
    /// ties, then by identifier so the order is total
    pub fn order(&self, evidence: &mut [Evidence]) {
        evidence.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| kind_rank(a.kind()).cmp(&kind_rank(b.kind())))
                .then_with(|| a.source.identifier().cmp(&b.source.identifier()))
        });
    }
}

fn kind_rank(kind: SourceKind) -> u8 {
    match kind {
        SourceKind::StructuredRow => 0,
        SourceKind::DocumentPassage => 1,
    }
}

fn entity_from_row(row: &Row) -> Option<EntityRef> {
    let id = row.get("employee_id").and_then(|v| v.as_i64())?;
    let name = row
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    Some(EntityRef { id, name })
}

/// Readable excerpt for a structured row
fn row_excerpt(row: &Row) -> String {
    let name = row.get("name").and_then(|v| v.as_str());
    let skill = row.get("skill").and_then(|v| v.as_str());
    let confidence = row.get("confidence").and_then(|v| v.as_f64());
    let source_type = row.get("source_type").and_then(|v| v.as_str());

    match (name, skill, confidence) {
        (Some(name), Some(skill), Some(confidence)) => {
            let via = source_type.map(|s| format!(", via {}", s)).unwrap_or_default();
            format!("{}: {} proficiency {:.0}%{}", name, skill, confidence, via)
        }
        _ => row
            .iter()
            .filter(|(k, _)| *k != "row_id")
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn excerpts_overlap(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return true;
    }
    a.contains(b) || b.contains(a)
}
