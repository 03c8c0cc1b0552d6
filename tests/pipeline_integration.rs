//! Integration tests for the full query pipeline
//!
//! Exercises the end-to-end flow against stub and fixture gateways without
//! any delegate wired: classification, concurrent dispatch, timeout
//! handling, corrective regeneration, and deterministic synthesis.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use talentlens::errors::{QueryError, Result};
use talentlens::gateway::{
    InMemorySemanticGateway, InMemoryStructuredGateway, Passage, Row, SemanticGateway,
    StructuredGateway, StructuredResult,
};
use talentlens::orchestrator::OrchestratorConfig;
use talentlens::pipeline::{PipelineConfig, QueryPipeline};
use talentlens::types::{Question, Strategy, StructuredQuerySpec};

/// Structured stub: configurable latency, counts calls, optionally fails
/// the first N executions
struct StructuredStub {
    calls: AtomicUsize,
    delay: Duration,
    fail_first: usize,
}

impl StructuredStub {
    fn new(delay: Duration, fail_first: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
            fail_first,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StructuredGateway for StructuredStub {
    async fn execute(&self, _spec: &StructuredQuerySpec) -> Result<StructuredResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if call < self.fail_first {
            return Err(QueryError::Generic(
                "no such column: proficency (did you mean confidence?)".to_string(),
            ));
        }

        let mut row = Row::new();
        row.insert("row_id".to_string(), serde_json::json!(1));
        row.insert("employee_id".to_string(), serde_json::json!(1));
        row.insert("name".to_string(), serde_json::json!("Alice Johnson"));
        row.insert("skill".to_string(), serde_json::json!("Python"));
        row.insert("confidence".to_string(), serde_json::json!(95));
        row.insert("source_type".to_string(), serde_json::json!("resume"));
        Ok(StructuredResult { rows: vec![row] })
    }
}

/// Semantic stub: configurable latency and call counting
struct SemanticStub {
    calls: AtomicUsize,
    delay: Duration,
}

impl SemanticStub {
    fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SemanticGateway for SemanticStub {
    async fn search(
        &self,
        _query: &str,
        _scope: Option<&[String]>,
        _top_k: usize,
    ) -> Result<Vec<Passage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(vec![Passage {
            document: "alice_review".to_string(),
            employee_id: Some(1),
            chunk_index: 0,
            excerpt: "coordinated four teams through the launch".to_string(),
            similarity: 0.75,
        }])
    }
}

/// Semantic stub that never completes
struct NeverReturns;

#[async_trait]
impl SemanticGateway for NeverReturns {
    async fn search(
        &self,
        _query: &str,
        _scope: Option<&[String]>,
        _top_k: usize,
    ) -> Result<Vec<Passage>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

struct FailingStructured;

#[async_trait]
impl StructuredGateway for FailingStructured {
    async fn execute(&self, _spec: &StructuredQuerySpec) -> Result<StructuredResult> {
        Err(QueryError::Generic("database is offline".to_string()))
    }
}

struct FailingSemantic;

#[async_trait]
impl SemanticGateway for FailingSemantic {
    async fn search(
        &self,
        _query: &str,
        _scope: Option<&[String]>,
        _top_k: usize,
    ) -> Result<Vec<Passage>> {
        Err(QueryError::SemanticRetrieval("vector index is offline".to_string()))
    }
}

fn short_timeouts() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.orchestrator = OrchestratorConfig {
        structured_timeout: Duration::from_millis(800),
        semantic_timeout: Duration::from_millis(800),
        delegate_timeout: Duration::from_millis(200),
        top_k: 5,
        verbose: false,
    };
    config
}

/// The 5-employee fixture behind the end-to-end recommendation property:
/// ids 1 and 3 average above 0.85 on {Python, API Design, Leadership},
/// everyone else sits below the recommendation floor.
fn phoenix_fixture() -> (InMemoryStructuredGateway, InMemorySemanticGateway) {
    let mut structured = InMemoryStructuredGateway::new();
    structured.add_employee(1, "Alice Johnson", "Engineering", "Senior Software Engineer");
    structured.add_employee(2, "Bob Smith", "Data Science", "ML Engineer");
    structured.add_employee(3, "Carol Davis", "Engineering", "Full Stack Developer");
    structured.add_employee(4, "David Wilson", "Product", "Product Manager");
    structured.add_employee(5, "Eva Martinez", "Design", "UX Designer");

    structured.add_skill(1, "Python", "technical");
    structured.add_skill(2, "API Design", "technical");
    structured.add_skill(3, "Leadership", "soft");
    structured.add_skill(4, "SQL", "technical");
    structured.add_skill(5, "JavaScript", "technical");

    structured.add_proficiency(1, "Python", 90, "resume");
    structured.add_proficiency(1, "API Design", 88, "github");
    structured.add_proficiency(1, "Leadership", 86, "review");
    structured.add_proficiency(3, "Python", 87, "resume");
    structured.add_proficiency(3, "API Design", 92, "github");
    structured.add_proficiency(3, "Leadership", 85, "review");
    structured.add_proficiency(2, "Python", 75, "resume");
    structured.add_proficiency(4, "SQL", 70, "resume");
    structured.add_proficiency(5, "JavaScript", 65, "resume");

    let mut semantic = InMemorySemanticGateway::new();
    semantic.add_document(
        "alice_review",
        Some(1),
        "Alice coordinated the Project Phoenix launch across four teams and is \
         the strongest technical lead in the org.",
    );
    semantic.add_document(
        "carol_resume",
        Some(3),
        "Carol drove Project Phoenix delivery, owning the API surface and \
         stepping up as lead for the final phase.",
    );
    semantic.add_document(
        "bob_resume",
        Some(2),
        "Bob built the skills-extraction model powering talent search, with a \
         deep data pipeline background.",
    );
    semantic.add_document(
        "david_review",
        Some(4),
        "David owns the quarterly roadmap and runs stakeholder alignment with \
         unusually clear written briefs.",
    );
    semantic.add_document(
        "eva_review",
        Some(5),
        "Eva reshaped the onboarding flow research and pushed accessibility \
         fixes through three release cycles.",
    );

    (structured, semantic)
}

#[tokio::test]
async fn conversational_questions_touch_no_gateway() {
    let structured = Arc::new(StructuredStub::new(Duration::ZERO, 0));
    let semantic = Arc::new(SemanticStub::new(Duration::ZERO));
    let pipeline = QueryPipeline::new(structured.clone(), semantic.clone(), short_timeouts());

    let response = pipeline.ask(&Question::new("hello!")).await.unwrap();

    assert_eq!(response.query_type, Strategy::Conversational);
    assert_eq!(structured.call_count(), 0);
    assert_eq!(semantic.call_count(), 0);
    assert!(response.results.is_empty());
    assert!(response.sql_query.is_none());
}

#[tokio::test]
async fn hybrid_branches_dispatch_concurrently() {
    let structured = Arc::new(StructuredStub::new(Duration::from_millis(300), 0));
    let semantic = Arc::new(SemanticStub::new(Duration::from_millis(400)));

    let mut config = short_timeouts();
    config.orchestrator.structured_timeout = Duration::from_secs(2);
    config.orchestrator.semantic_timeout = Duration::from_secs(2);
    let pipeline = QueryPipeline::new(structured.clone(), semantic.clone(), config);

    let started = Instant::now();
    let response = pipeline
        .ask(&Question::new("Who are the best candidates to lead the migration?"))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(response.query_type, Strategy::Hybrid);
    assert_eq!(structured.call_count(), 1);
    assert_eq!(semantic.call_count(), 1);
    // Overlapping latencies: ~max(300, 400), never the 700ms sum
    assert!(
        elapsed >= Duration::from_millis(400),
        "finished before the slowest branch: {:?}",
        elapsed
    );
    assert!(
        elapsed <= Duration::from_millis(450),
        "branches appear to have run serially: {:?}",
        elapsed
    );
    assert!(!response.degraded);
}

#[tokio::test]
async fn failed_query_regenerated_exactly_once() {
    let structured = Arc::new(StructuredStub::new(Duration::ZERO, 1));
    let semantic = Arc::new(SemanticStub::new(Duration::ZERO));
    let pipeline = QueryPipeline::new(structured.clone(), semantic, short_timeouts());

    let response = pipeline
        .ask(&Question::new("How many Python developers do we have?"))
        .await
        .unwrap();

    assert_eq!(response.query_type, Strategy::Sql);
    assert_eq!(structured.call_count(), 2, "exactly one regeneration");
    assert!(!response.degraded);
    assert!(response.sql_query.is_some());
    assert!(!response.results.is_empty());
}

#[tokio::test]
async fn hanging_semantic_branch_degrades_within_ceiling() {
    let structured = Arc::new(StructuredStub::new(Duration::ZERO, 0));
    let mut config = short_timeouts();
    config.orchestrator.semantic_timeout = Duration::from_millis(300);
    let ceiling = config.orchestrator.ceiling();

    let pipeline = QueryPipeline::new(structured, Arc::new(NeverReturns), config);

    let started = Instant::now();
    let response = pipeline
        .ask(&Question::new("Who are the best candidates to lead the rollout?"))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(
        elapsed <= ceiling + Duration::from_millis(200),
        "response took {:?}, ceiling {:?}",
        elapsed,
        ceiling
    );
    assert!(response.degraded);
    assert!(response.answer.contains("some sources were unavailable"));
    // Structured evidence survives the dead semantic branch
    assert!(!response.results.is_empty());
    assert_eq!(response.results[0].name, "Alice Johnson");
}

#[tokio::test]
async fn total_branch_failure_is_an_error_not_a_degraded_response() {
    let pipeline = QueryPipeline::new(
        Arc::new(FailingStructured),
        Arc::new(FailingSemantic),
        short_timeouts(),
    );

    let result = pipeline
        .ask(&Question::new("Who are the best candidates to lead the rollout?"))
        .await;

    assert!(matches!(result, Err(QueryError::AllBranchesFailed)));
}

#[tokio::test]
async fn single_branch_failure_keeps_the_other_branch() {
    let semantic = Arc::new(SemanticStub::new(Duration::ZERO));
    let pipeline = QueryPipeline::new(Arc::new(FailingStructured), semantic, short_timeouts());

    let response = pipeline
        .ask(&Question::new("Who are the best candidates to lead the rollout?"))
        .await
        .unwrap();

    assert!(response.degraded);
    assert!(!response.results.is_empty(), "semantic evidence retained");
}

#[tokio::test]
async fn phoenix_recommendation_end_to_end() {
    let (structured, semantic) = phoenix_fixture();
    let pipeline = QueryPipeline::new(
        Arc::new(structured),
        Arc::new(semantic),
        PipelineConfig::default(),
    );

    let response = pipeline
        .ask(&Question::new("Who are the best candidates to lead Project Phoenix?"))
        .await
        .unwrap();

    assert_eq!(response.query_type, Strategy::Hybrid);
    assert!(!response.degraded);
    assert!(response.sql_query.as_deref().is_some_and(|sql| !sql.is_empty()));

    let ids: Vec<i64> = response.results.iter().map(|c| c.entity_id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![1, 3], "exactly ids 1 and 3, got {:?}", ids);

    // Ordered by descending aggregate score
    assert!(response.results[0].score >= response.results[1].score);

    // Every candidate cites both source kinds
    for candidate in &response.results {
        assert!(candidate
            .evidence
            .iter()
            .any(|e| matches!(e.kind(), talentlens::types::SourceKind::StructuredRow)));
        assert!(candidate
            .evidence
            .iter()
            .any(|e| matches!(e.kind(), talentlens::types::SourceKind::DocumentPassage)));
    }
}

#[tokio::test]
async fn repeated_questions_rank_identically() {
    let (structured, semantic) = phoenix_fixture();
    let pipeline = QueryPipeline::new(
        Arc::new(structured),
        Arc::new(semantic),
        PipelineConfig::default(),
    );
    let question = Question::new("Who are the best candidates to lead Project Phoenix?");

    let first = pipeline.ask(&question).await.unwrap();
    for _ in 0..3 {
        let again = pipeline.ask(&question).await.unwrap();
        assert_eq!(again.answer, first.answer);
        let ids: Vec<i64> = again.results.iter().map(|c| c.entity_id).collect();
        let first_ids: Vec<i64> = first.results.iter().map(|c| c.entity_id).collect();
        assert_eq!(ids, first_ids);
        for (a, b) in again.results.iter().zip(first.results.iter()) {
            assert_eq!(a.score, b.score);
        }
    }
}

#[tokio::test]
async fn empty_store_yields_distinct_no_results_answer() {
    let pipeline = QueryPipeline::new(
        Arc::new(InMemoryStructuredGateway::new()),
        Arc::new(InMemorySemanticGateway::new()),
        short_timeouts(),
    );

    let response = pipeline
        .ask(&Question::new("How many Python developers do we have?"))
        .await
        .unwrap();

    assert!(!response.degraded, "no evidence is not an error");
    assert!(response.results.is_empty());
    assert!(response.answer.contains("No matching evidence"));
}

#[tokio::test]
async fn cross_document_comparison_uses_advanced_hybrid() {
    let (structured, mut semantic) = phoenix_fixture();
    semantic.add_document(
        "alice_resume",
        Some(1),
        "Alice Johnson: Python platform work and API design ownership on the \
         Phoenix rebuild.",
    );

    let pipeline = QueryPipeline::new(
        Arc::new(structured),
        Arc::new(semantic),
        PipelineConfig::default(),
    );

    let response = pipeline
        .ask(&Question::new("Compare Alice's resume with Carol's resume"))
        .await
        .unwrap();

    assert_eq!(response.query_type, Strategy::AdvancedHybrid);
    // Each cited passage is attributed to one of the named documents
    for candidate in &response.results {
        for evidence in &candidate.evidence {
            if let talentlens::types::EvidenceSource::Passage { document, .. } = &evidence.source {
                assert!(
                    document == "alice_resume" || document == "carol_resume",
                    "passage leaked from unscoped document: {}",
                    document
                );
            }
        }
    }
}
