//! In-memory gateway implementations
//!
//! Fixture-backed stores behind the gateway traits, mirroring the relational
//! shape of the production talent database (employees, skills, per-employee
//! proficiency rows with a stored confidence column) and a chunked document
//! store with lexical-overlap similarity. The orchestrator cannot tell these
//! apart from network-backed gateways.

use async_trait::async_trait;
use serde_json::json;

use crate::errors::{QueryError, Result};
use crate::gateway::{Passage, Row, SemanticGateway, StructuredGateway, StructuredResult};
use crate::types::StructuredQuerySpec;

/// Words per chunk when ingesting documents
const CHUNK_SIZE: usize = 80;

/// Word overlap between consecutive chunks
const CHUNK_OVERLAP: usize = 16;

/// Minimum similarity for a chunk to count as a match
const MIN_SIMILARITY: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct EmployeeRecord {
    pub id: i64,
    pub name: String,
    pub department: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct SkillRecord {
    pub id: i64,
    pub name: String,
    pub category: String,
}

/// One employee-skill fact; confidence is stored as 0..=100
#[derive(Debug, Clone)]
pub struct ProficiencyRecord {
    pub id: i64,
    pub employee_id: i64,
    pub skill_id: i64,
    pub confidence: u8,
    pub source_type: String,
}

/// Tabular store of employee/skill facts behind [`StructuredGateway`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryStructuredGateway {
    employees: Vec<EmployeeRecord>,
    skills: Vec<SkillRecord>,
    proficiencies: Vec<ProficiencyRecord>,
}

impl InMemoryStructuredGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_employee(
        &mut self,
        id: i64,
        name: impl Into<String>,
        department: impl Into<String>,
        role: impl Into<String>,
    ) {
        self.employees.push(EmployeeRecord {
            id,
            name: name.into(),
            department: department.into(),
            role: role.into(),
        });
    }

    pub fn add_skill(&mut self, id: i64, name: impl Into<String>, category: impl Into<String>) {
        self.skills.push(SkillRecord {
            id,
            name: name.into(),
            category: category.into(),
        });
    }

    /// Record a proficiency fact; panics in fixtures referencing an unknown
    /// skill name, which is always a bug in the fixture itself.
    pub fn add_proficiency(
        &mut self,
        employee_id: i64,
        skill_name: &str,
        confidence: u8,
        source_type: impl Into<String>,
    ) {
        let skill_id = self
            .skills
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(skill_name))
            .map(|s| s.id)
            .unwrap_or_else(|| panic!("fixture references unknown skill: {}", skill_name));

        let id = self.proficiencies.len() as i64 + 1;
        self.proficiencies.push(ProficiencyRecord {
            id,
            employee_id,
            skill_id,
            confidence: confidence.min(100),
            source_type: source_type.into(),
        });
    }

    pub fn employee_count(&self) -> usize {
        self.employees.len()
    }

    fn skill_name(&self, skill_id: i64) -> &str {
        self.skills
            .iter()
            .find(|s| s.id == skill_id)
            .map(|s| s.name.as_str())
            .unwrap_or("unknown")
    }

    fn matches_spec(&self, record: &ProficiencyRecord, spec: &StructuredQuerySpec) -> bool {
        let employee = match self.employees.iter().find(|e| e.id == record.employee_id) {
            Some(e) => e,
            None => return false,
        };

        if !spec.skills.is_empty() {
            let skill = self.skill_name(record.skill_id);
            let wanted = spec
                .skills
                .iter()
                .any(|s| s.eq_ignore_ascii_case(skill));
            if !wanted {
                return false;
            }
        }

        if !spec.target_entities.is_empty() {
            let named = spec.target_entities.iter().any(|entity| {
                employee
                    .name
                    .to_lowercase()
                    .contains(&entity.to_lowercase())
            });
            if !named {
                return false;
            }
        }

        if let Some(floor) = spec.min_proficiency {
            if f64::from(record.confidence) / 100.0 < floor {
                return false;
            }
        }

        true
    }
}

#[async_trait]
impl StructuredGateway for InMemoryStructuredGateway {
    /// Executes the parameterized filter of the spec. Specs carrying only
    /// raw query text are rejected with a description naming the supported
    /// filters, which the orchestrator feeds back into regeneration.
    async fn execute(&self, spec: &StructuredQuerySpec) -> Result<StructuredResult> {
        if !spec.valid {
            return Err(QueryError::Generic(
                "query generation produced no executable specification".to_string(),
            ));
        }

        let has_filter = !spec.skills.is_empty()
            || !spec.target_entities.is_empty()
            || spec.min_proficiency.is_some();
        if !has_filter {
            return Err(QueryError::Generic(
                "unsupported query text: this store executes parameterized filters \
                 over (skill, employee, min_proficiency); regenerate with explicit filters"
                    .to_string(),
            ));
        }

        let mut rows = Vec::new();
        for record in &self.proficiencies {
            if !self.matches_spec(record, spec) {
                continue;
            }
            let employee = self
                .employees
                .iter()
                .find(|e| e.id == record.employee_id)
                .expect("proficiency rows always reference a stored employee");

            let mut row = Row::new();
            row.insert("row_id".to_string(), json!(record.id));
            row.insert("employee_id".to_string(), json!(employee.id));
            row.insert("name".to_string(), json!(employee.name));
            row.insert("department".to_string(), json!(employee.department));
            row.insert("role".to_string(), json!(employee.role));
            row.insert("skill".to_string(), json!(self.skill_name(record.skill_id)));
            row.insert("confidence".to_string(), json!(record.confidence));
            row.insert("source_type".to_string(), json!(record.source_type));
            rows.push(row);
        }

        Ok(StructuredResult { rows })
    }
}

#[derive(Debug, Clone)]
struct StoredChunk {
    document: String,
    employee_id: Option<i64>,
    chunk_index: usize,
    text: String,
    tokens: Vec<String>,
}

/// Chunked document store behind [`SemanticGateway`]
///
/// Similarity is lexical token overlap, which is deterministic and good
/// enough to stand in for an embedding index in demos and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySemanticGateway {
    chunks: Vec<StoredChunk>,
    document_count: usize,
}

impl InMemorySemanticGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a document: chunk it and index each chunk's tokens
    pub fn add_document(
        &mut self,
        name: impl Into<String>,
        employee_id: Option<i64>,
        text: &str,
    ) {
        let name = name.into();
        let words: Vec<&str> = text.split_whitespace().collect();
        let step = CHUNK_SIZE - CHUNK_OVERLAP;

        let mut chunk_index = 0;
        let mut start = 0;
        while start < words.len() {
            let end = (start + CHUNK_SIZE).min(words.len());
            let chunk_text = words[start..end].join(" ");
            self.chunks.push(StoredChunk {
                document: name.clone(),
                employee_id,
                chunk_index,
                tokens: tokenize(&chunk_text),
                text: chunk_text,
            });
            chunk_index += 1;
            if end == words.len() {
                break;
            }
            start += step;
        }
        self.document_count += 1;
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[async_trait]
impl SemanticGateway for InMemorySemanticGateway {
    async fn search(
        &self,
        query: &str,
        scope: Option<&[String]>,
        top_k: usize,
    ) -> Result<Vec<Passage>> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<Passage> = self
            .chunks
            .iter()
            .filter(|chunk| match scope {
                Some(names) if !names.is_empty() => names
                    .iter()
                    .any(|n| chunk.document.eq_ignore_ascii_case(n)),
                _ => true,
            })
            .filter_map(|chunk| {
                let similarity = overlap_similarity(&query_tokens, &chunk.tokens);
                if similarity < MIN_SIMILARITY {
                    return None;
                }
                Some(Passage {
                    document: chunk.document.clone(),
                    employee_id: chunk.employee_id,
                    chunk_index: chunk.chunk_index,
                    excerpt: chunk.text.clone(),
                    similarity,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.cmp(&b.document))
                .then_with(|| a.chunk_index.cmp(&b.chunk_index))
        });
        scored.truncate(top_k);

        Ok(scored)
    }
}

/// Function words that carry no retrieval signal
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "about", "across", "all", "any", "but", "can", "could", "did",
    "does", "for", "from", "had", "has", "have", "her", "his", "him", "how", "into", "its",
    "not", "our", "out", "say", "says", "said", "she", "should", "than", "that", "the", "their",
    "them", "then", "they", "this", "through", "was", "were", "what", "when", "where", "which",
    "who", "whom", "whose", "why", "will", "with", "would", "you", "your",
];

/// Lowercased alphanumeric tokens; short words and stopwords dropped
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

/// Fraction of query tokens present in the chunk
fn overlap_similarity(query_tokens: &[String], chunk_tokens: &[String]) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let hits = query_tokens
        .iter()
        .filter(|t| chunk_tokens.binary_search(t).is_ok())
        .count();
    hits as f64 / query_tokens.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_store() -> InMemoryStructuredGateway {
        let mut gw = InMemoryStructuredGateway::new();
        gw.add_employee(1, "Alice Johnson", "Engineering", "Senior Software Engineer");
        gw.add_employee(2, "Bob Smith", "Data Science", "ML Engineer");
        gw.add_skill(1, "Python", "technical");
        gw.add_skill(2, "Leadership", "soft");
        gw.add_proficiency(1, "Python", 92, "resume");
        gw.add_proficiency(1, "Leadership", 88, "review");
        gw.add_proficiency(2, "Python", 60, "resume");
        gw
    }

    #[tokio::test]
    async fn test_skill_filter() {
        let gw = small_store();
        let mut spec = StructuredQuerySpec::new("SELECT ...");
        spec.skills = vec!["python".to_string()];

        let result = gw.execute(&spec).await.unwrap();
        assert_eq!(result.rows.len(), 2);
        assert!(result.rows.iter().all(|r| r["skill"] == "Python"));
    }

    #[tokio::test]
    async fn test_proficiency_floor() {
        let gw = small_store();
        let mut spec = StructuredQuerySpec::new("SELECT ...");
        spec.skills = vec!["Python".to_string()];
        spec.min_proficiency = Some(0.8);

        let result = gw.execute(&spec).await.unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["employee_id"], 1);
    }

    #[tokio::test]
    async fn test_entity_filter() {
        let gw = small_store();
        let mut spec = StructuredQuerySpec::new("SELECT ...");
        spec.target_entities = vec!["Bob".to_string()];

        let result = gw.execute(&spec).await.unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["name"], "Bob Smith");
    }

    #[tokio::test]
    async fn test_filterless_spec_rejected_with_description() {
        let gw = small_store();
        let spec = StructuredQuerySpec::new("SELECT * FROM employees");

        let err = gw.execute(&spec).await.unwrap_err();
        assert!(err.to_string().contains("parameterized filters"));
    }

    #[tokio::test]
    async fn test_semantic_search_ranks_by_overlap() {
        let mut gw = InMemorySemanticGateway::new();
        gw.add_document(
            "alice_resume",
            Some(1),
            "Led the Project Phoenix platform migration using Python and careful API design",
        );
        gw.add_document(
            "bob_review",
            Some(2),
            "Bob delivered solid data pipelines this quarter and mentored two analysts",
        );

        let passages = gw.search("Project Phoenix Python", None, 5).await.unwrap();
        assert!(!passages.is_empty());
        assert_eq!(passages[0].document, "alice_resume");
        assert!(passages[0].similarity > 0.5);
    }

    #[tokio::test]
    async fn test_semantic_scope_restricts_documents() {
        let mut gw = InMemorySemanticGateway::new();
        gw.add_document("alice_resume", Some(1), "Python platform work on Phoenix");
        gw.add_document("bob_resume", Some(2), "Python data work on pipelines");

        let scope = vec!["bob_resume".to_string()];
        let passages = gw.search("Python work", Some(&scope), 5).await.unwrap();
        assert!(passages.iter().all(|p| p.document == "bob_resume"));
    }

    #[test]
    fn test_chunking_overlaps() {
        let mut gw = InMemorySemanticGateway::new();
        let long_text = (0..200).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ");
        gw.add_document("long_doc", None, &long_text);
        assert!(gw.chunk_count() > 2);
    }

    #[test]
    fn test_similarity_bounds() {
        let q = tokenize("python api design");
        let c = tokenize("python api design and more python");
        let sim = overlap_similarity(&q, &c);
        assert!(sim > 0.99 && sim <= 1.0);

        let none = overlap_similarity(&q, &tokenize("unrelated content entirely"));
        assert_eq!(none, 0.0);
    }
}
