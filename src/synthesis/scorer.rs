//! Candidate aggregate scoring
//!
//! Per source kind, evidence combines as a noisy-OR mass: each record
//! closes a fraction of the remaining doubt, so adding evidence never
//! lowers the mass. The aggregate is a weighted sum of the two kind masses
//! plus a corroboration term on the smaller mass, which is strictly
//! positive exactly when both kinds support the candidate. The aggregate
//! is a ranking score, not a probability, so it is left unclamped.

use serde::{Deserialize, Serialize};

use crate::types::{Evidence, SourceKind};

/// Scoring weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight for the structured evidence mass (0.55)
    pub structured: f64,

    /// Weight for the semantic evidence mass (0.45)
    pub semantic: f64,

    /// Corroboration weight applied to the smaller kind mass (0.25)
    pub corroboration: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            structured: 0.55,
            semantic: 0.45,
            corroboration: 0.25,
        }
    }
}

/// Deterministic candidate scorer
#[derive(Debug, Clone, Default)]
pub struct CandidateScorer {
    weights: ScoreWeights,
}

impl CandidateScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Aggregate score over a candidate's evidence set
    ///
    /// Deterministic and order-independent: the masses are products over the
    /// set, so evidence arrival order cannot change the result.
    pub fn aggregate(&self, evidence: &[Evidence]) -> f64 {
        let structured_mass = kind_mass(evidence, SourceKind::StructuredRow);
        let semantic_mass = kind_mass(evidence, SourceKind::DocumentPassage);

        self.weights.structured * structured_mass
            + self.weights.semantic * semantic_mass
            + self.weights.corroboration * structured_mass.min(semantic_mass)
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }
}

/// Noisy-OR mass of one source kind: 1 - Π(1 - confidence)
fn kind_mass(evidence: &[Evidence], kind: SourceKind) -> f64 {
    let remaining_doubt: f64 = evidence
        .iter()
        .filter(|e| e.kind() == kind)
        .map(|e| 1.0 - e.confidence.clamp(0.0, 1.0))
        .product();
    1.0 - remaining_doubt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EvidenceSource;
    use quickcheck_macros::quickcheck;

    fn structured(confidence: f64) -> Evidence {
        Evidence::new(
            EvidenceSource::Row {
                table: "employee_skills".to_string(),
                row_id: 1,
            },
            "row",
            confidence,
        )
    }

    fn semantic(confidence: f64) -> Evidence {
        Evidence::new(
            EvidenceSource::Passage {
                document: "alice_resume".to_string(),
                chunk_index: 0,
            },
            "passage",
            confidence,
        )
    }

    #[test]
    fn test_empty_evidence_scores_zero() {
        let scorer = CandidateScorer::default();
        assert_eq!(scorer.aggregate(&[]), 0.0);
    }

    #[test]
    fn test_corroboration_beats_single_source() {
        let scorer = CandidateScorer::default();

        let cross_kind = scorer.aggregate(&[structured(0.9), semantic(0.9)]);
        let same_kind = scorer.aggregate(&[semantic(0.9), semantic(0.9)]);

        assert!(
            cross_kind > same_kind,
            "cross-kind {} must strictly beat same-kind {}",
            cross_kind,
            same_kind
        );
    }

    #[test]
    fn test_structured_outranks_semantic_at_equal_confidence() {
        let scorer = CandidateScorer::default();
        assert!(scorer.aggregate(&[structured(0.8)]) > scorer.aggregate(&[semantic(0.8)]));
    }

    #[test]
    fn test_order_independent() {
        let scorer = CandidateScorer::default();
        let forward = scorer.aggregate(&[structured(0.7), semantic(0.5), semantic(0.3)]);
        let backward = scorer.aggregate(&[semantic(0.3), semantic(0.5), structured(0.7)]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let scorer = CandidateScorer::default();
        let evidence = vec![structured(0.9), semantic(0.6), semantic(0.4)];
        let first = scorer.aggregate(&evidence);
        for _ in 0..10 {
            assert_eq!(scorer.aggregate(&evidence), first);
        }
    }

    /// Adding corroborating evidence never lowers the score
    #[quickcheck]
    fn prop_monotone_under_added_evidence(confidences: Vec<u8>, extra: u8, extra_structured: bool) -> bool {
        let scorer = CandidateScorer::default();

        let evidence: Vec<Evidence> = confidences
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let confidence = f64::from(*c) / 255.0;
                if i % 2 == 0 {
                    structured(confidence)
                } else {
                    semantic(confidence)
                }
            })
            .collect();

        let before = scorer.aggregate(&evidence);

        let mut grown = evidence;
        let added = f64::from(extra) / 255.0;
        grown.push(if extra_structured {
            structured(added)
        } else {
            semantic(added)
        });

        scorer.aggregate(&grown) >= before
    }
}
