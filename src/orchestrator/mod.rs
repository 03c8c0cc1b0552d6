//! Retrieval orchestration
//!
//! Given a strategy and routing hints, dispatches the structured and/or
//! semantic paths — concurrently where the strategy allows it — applies a
//! bounded timeout to every external call, and performs at most one
//! corrective regeneration of a failed structured query. A branch failure
//! degrades the outcome; it never fails the request on its own.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use crate::delegate::{parse_query_text, query_generation_prompt, Delegate};
use crate::errors::{QueryError, Result};
use crate::gateway::{Passage, SemanticGateway, StructuredGateway, StructuredResult};
use crate::types::{RoutingHints, Strategy, StructuredQuerySpec};

/// Schema description handed to the delegate for query generation
const SCHEMA_TEXT: &str = "\
CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, department TEXT, role TEXT);
CREATE TABLE skills (id INTEGER PRIMARY KEY, skill_name TEXT, category TEXT);
CREATE TABLE employee_skills (id INTEGER PRIMARY KEY, employee_id INTEGER, skill_id INTEGER,
    confidence INTEGER CHECK (confidence >= 0 AND confidence <= 100), source_type TEXT);";

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Bound on one structured execution
    pub structured_timeout: Duration,

    /// Bound on one semantic retrieval call
    pub semantic_timeout: Duration,

    /// Bound on one delegate generation call
    pub delegate_timeout: Duration,

    /// Passages requested per semantic call
    pub top_k: usize,

    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            structured_timeout: Duration::from_secs(8),
            semantic_timeout: Duration::from_secs(8),
            delegate_timeout: Duration::from_secs(12),
            top_k: 5,
            verbose: false,
        }
    }
}

impl OrchestratorConfig {
    /// Fixed ceiling on one retrieval pass. Every external call is
    /// independently bounded, so the worst case is the structured branch
    /// spending its corrective retry (two executions, two generation calls)
    /// while the slowest semantic branch runs out its own bound.
    pub fn ceiling(&self) -> Duration {
        let structured_worst = (self.structured_timeout + self.delegate_timeout) * 2;
        structured_worst.max(self.semantic_timeout)
    }
}

/// Raw results of one retrieval pass, before normalization
#[derive(Debug, Default)]
pub struct RetrievalOutcome {
    /// Rows from the structured branch, when it was dispatched and succeeded
    pub structured: Option<StructuredResult>,

    /// Passages from all semantic branches, each tagged with its document
    pub passages: Vec<Passage>,

    /// Last generated structured query text, when one was generated
    pub sql_query: Option<String>,

    /// Branches dispatched for this strategy
    pub dispatched: usize,

    /// Branches that failed or timed out
    pub failed: usize,
}

impl RetrievalOutcome {
    /// At least one branch failed, but not all of them
    pub fn degraded(&self) -> bool {
        self.failed > 0 && self.failed < self.dispatched
    }

    /// Every dispatched branch failed
    pub fn total_failure(&self) -> bool {
        self.dispatched > 0 && self.failed == self.dispatched
    }
}

/// Strategy-driven fan-out over the two gateways
pub struct RetrievalOrchestrator {
    structured: Arc<dyn StructuredGateway>,
    semantic: Arc<dyn SemanticGateway>,
    delegate: Option<Arc<dyn Delegate>>,
    config: OrchestratorConfig,
}

impl RetrievalOrchestrator {
    pub fn new(
        structured: Arc<dyn StructuredGateway>,
        semantic: Arc<dyn SemanticGateway>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            structured,
            semantic,
            delegate: None,
            config,
        }
    }

    /// Attach a delegate for structured-query generation
    pub fn with_delegate(mut self, delegate: Arc<dyn Delegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run retrieval for one classified question
    ///
    /// Conversational and Unsupported strategies dispatch nothing; every
    /// other strategy dispatches its branches with per-branch timeouts and
    /// collects whatever completed.
    pub async fn retrieve(
        &self,
        question: &str,
        strategy: Strategy,
        hints: &RoutingHints,
    ) -> RetrievalOutcome {
        match strategy {
            Strategy::Conversational | Strategy::Unsupported => RetrievalOutcome::default(),
            Strategy::Sql => self.retrieve_structured_only(question, hints).await,
            Strategy::Semantic => self.retrieve_semantic_only(question, hints).await,
            Strategy::Hybrid => self.retrieve_hybrid(question, hints).await,
            Strategy::AdvancedHybrid => self.retrieve_advanced_hybrid(question, hints).await,
        }
    }

    async fn retrieve_structured_only(
        &self,
        question: &str,
        hints: &RoutingHints,
    ) -> RetrievalOutcome {
        let mut outcome = RetrievalOutcome {
            dispatched: 1,
            ..Default::default()
        };

        match self.structured_branch(question, hints).await {
            Ok((result, sql)) => {
                outcome.structured = Some(result);
                outcome.sql_query = Some(sql);
            }
            Err((err, sql)) => {
                self.log_branch_failure("structured", &err);
                outcome.failed = 1;
                outcome.sql_query = sql;
            }
        }
        outcome
    }

    async fn retrieve_semantic_only(&self, question: &str, hints: &RoutingHints) -> RetrievalOutcome {
        let mut outcome = RetrievalOutcome {
            dispatched: 1,
            ..Default::default()
        };

        let scope = if hints.document_scopes.is_empty() {
            None
        } else {
            Some(hints.document_scopes.as_slice())
        };

        match self.semantic_branch(question, scope).await {
            Ok(passages) => outcome.passages = passages,
            Err(err) => {
                self.log_branch_failure("semantic", &err);
                outcome.failed = 1;
            }
        }
        outcome
    }

    /// Structured and semantic branches dispatched concurrently; either
    /// failure is non-fatal.
    async fn retrieve_hybrid(&self, question: &str, hints: &RoutingHints) -> RetrievalOutcome {
        let mut outcome = RetrievalOutcome {
            dispatched: 2,
            ..Default::default()
        };

        let scope = if hints.document_scopes.is_empty() {
            None
        } else {
            Some(hints.document_scopes.as_slice())
        };

        let (structured, semantic) = tokio::join!(
            self.structured_branch(question, hints),
            self.semantic_branch(question, scope),
        );

        match structured {
            Ok((result, sql)) => {
                outcome.structured = Some(result);
                outcome.sql_query = Some(sql);
            }
            Err((err, sql)) => {
                self.log_branch_failure("structured", &err);
                outcome.failed += 1;
                outcome.sql_query = sql;
            }
        }

        match semantic {
            Ok(passages) => outcome.passages = passages,
            Err(err) => {
                self.log_branch_failure("semantic", &err);
                outcome.failed += 1;
            }
        }

        outcome
    }

    /// One semantic task per named document plus the structured branch, all
    /// concurrent. Passages keep their originating document for attribution.
    async fn retrieve_advanced_hybrid(
        &self,
        question: &str,
        hints: &RoutingHints,
    ) -> RetrievalOutcome {
        if hints.document_scopes.is_empty() {
            return self.retrieve_hybrid(question, hints).await;
        }

        let mut outcome = RetrievalOutcome {
            dispatched: 1 + hints.document_scopes.len(),
            ..Default::default()
        };

        let semantic_tasks: Vec<_> = hints
            .document_scopes
            .iter()
            .map(|scope| {
                let gateway = Arc::clone(&self.semantic);
                let question = question.to_string();
                let scope = vec![scope.clone()];
                let timeout = self.config.semantic_timeout;
                let top_k = self.config.top_k;
                tokio::spawn(async move {
                    with_timeout(timeout, gateway.search(&question, Some(&scope), top_k)).await
                })
            })
            .collect();

        let (structured, semantic_results) =
            tokio::join!(self.structured_branch(question, hints), join_all(semantic_tasks));

        match structured {
            Ok((result, sql)) => {
                outcome.structured = Some(result);
                outcome.sql_query = Some(sql);
            }
            Err((err, sql)) => {
                self.log_branch_failure("structured", &err);
                outcome.failed += 1;
                outcome.sql_query = sql;
            }
        }

        for joined in semantic_results {
            match joined {
                Ok(Ok(passages)) => outcome.passages.extend(passages),
                Ok(Err(err)) => {
                    self.log_branch_failure("semantic", &err);
                    outcome.failed += 1;
                }
                Err(join_err) => {
                    self.log_branch_failure(
                        "semantic",
                        &QueryError::SemanticRetrieval(join_err.to_string()),
                    );
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Execute the structured path with at most one corrective regeneration.
    /// The error side carries the last generated query text so the response
    /// surface can still report what was attempted.
    async fn structured_branch(
        &self,
        question: &str,
        hints: &RoutingHints,
    ) -> std::result::Result<(StructuredResult, String), (QueryError, Option<String>)> {
        let spec = self.generate_spec(question, hints, None).await;

        let first_error = match self.execute_spec(&spec).await {
            Ok(result) => return Ok((result, spec.text)),
            Err(err) => err,
        };

        if self.config.verbose {
            eprintln!("[RETRIEVE] structured attempt 1 failed: {}", first_error);
        }

        // Feed the error text back as corrective context, exactly once
        let retry = self
            .generate_spec(question, hints, Some((&spec.text, &first_error.to_string())))
            .await;

        match self.execute_spec(&retry).await {
            Ok(result) => Ok((result, retry.text)),
            Err(err) => Err((
                QueryError::StructuredQuery {
                    attempts: 2,
                    message: err.to_string(),
                },
                Some(retry.text),
            )),
        }
    }

    async fn execute_spec(&self, spec: &StructuredQuerySpec) -> Result<StructuredResult> {
        with_timeout(self.config.structured_timeout, self.structured.execute(spec)).await
    }

    async fn semantic_branch(
        &self,
        question: &str,
        scope: Option<&[String]>,
    ) -> Result<Vec<Passage>> {
        with_timeout(
            self.config.semantic_timeout,
            self.semantic.search(question, scope, self.config.top_k),
        )
        .await
    }

    /// Build a StructuredQuerySpec: filters from hints, query text from the
    /// delegate when one is wired (template text otherwise). A delegate
    /// failure here silently falls back to the template; only execution
    /// failures consume the one retry.
    async fn generate_spec(
        &self,
        question: &str,
        hints: &RoutingHints,
        failed: Option<(&str, &str)>,
    ) -> StructuredQuerySpec {
        let broaden = failed.is_some();
        let mut spec = template_spec(hints, broaden);

        if let Some(delegate) = &self.delegate {
            let prompt = query_generation_prompt(question, SCHEMA_TEXT, failed);
            let call = delegate.complete(&prompt);
            if let Ok(Ok(response)) = tokio::time::timeout(self.config.delegate_timeout, call).await
            {
                let text = parse_query_text(&response);
                if !text.is_empty() {
                    spec.text = text;
                }
            } else if self.config.verbose {
                eprintln!("[RETRIEVE] delegate generation unavailable, using template");
            }
        }

        if broaden {
            spec.attempt = 2;
        }
        spec
    }

    fn log_branch_failure(&self, branch: &str, err: &QueryError) {
        if self.config.verbose {
            eprintln!("[RETRIEVE] {} branch omitted: {}", branch, err);
        }
    }
}

/// Bound a gateway/delegate call; elapsing fails only this branch
async fn with_timeout<T>(
    duration: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(duration, call).await {
        Ok(result) => result,
        Err(_) => Err(QueryError::UpstreamTimeout {
            duration_ms: duration.as_millis() as u64,
        }),
    }
}

/// Template query generation from routing hints
///
/// A proficiency floor without explicit skills ranks the whole roster;
/// entity tokens in that shape name initiatives, not employees, and are
/// left out of the filter. The corrective second attempt broadens: entity
/// filters are dropped, and a spec with no usable filter at all falls back
/// to a mid-range floor.
fn template_spec(hints: &RoutingHints, broaden: bool) -> StructuredQuerySpec {
    let floor = hints
        .numeric_filters
        .iter()
        .copied()
        .filter(|v| (0.0..=1.0).contains(v))
        .fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.max(v)))
        });

    let mut spec = StructuredQuerySpec::new(String::new());
    spec.skills = hints.skills.clone();
    spec.min_proficiency = floor;

    let broad_ranking = floor.is_some() && spec.skills.is_empty();
    if !broad_ranking && !broaden {
        spec.target_entities = hints.entities.clone();
    }

    if broaden && spec.skills.is_empty() && spec.min_proficiency.is_none() {
        spec.min_proficiency = Some(0.5);
    }

    spec.text = render_sql(&spec);
    spec
}

/// Readable SQL for the response surface, mirroring the talent schema
fn render_sql(spec: &StructuredQuerySpec) -> String {
    let mut clauses: Vec<String> = Vec::new();

    if !spec.skills.is_empty() {
        let list = spec
            .skills
            .iter()
            .map(|s| format!("'{}'", s.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(", ");
        clauses.push(format!("s.skill_name IN ({})", list));
    }

    if let Some(floor) = spec.min_proficiency {
        clauses.push(format!("es.confidence >= {:.0}", floor * 100.0));
    }

    if !spec.target_entities.is_empty() {
        let like = spec
            .target_entities
            .iter()
            .map(|e| format!("e.name LIKE '%{}%'", e.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(" OR ");
        clauses.push(format!("({})", like));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("\nWHERE {}", clauses.join("\n  AND "))
    };

    format!(
        "SELECT e.id AS employee_id, e.name, e.department, e.role,\n       \
         s.skill_name AS skill, es.confidence, es.source_type\n\
         FROM employees e\n\
         JOIN employee_skills es ON es.employee_id = e.id\n\
         JOIN skills s ON s.id = es.skill_id{}\n\
         ORDER BY es.confidence DESC;",
        where_clause
    )
}
