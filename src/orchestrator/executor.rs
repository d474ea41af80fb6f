//! Per-query coordination of retrieval, fusion and reasoning

use super::result::{QueryResult, QueryStatus, StageTiming};
use crate::config::PipelineSettings;
use crate::evidence::{EvidenceItem, EvidenceSet};
use crate::fusion::ResultFusionEngine;
use crate::metrics::Metrics;
use crate::pipeline::{Pipeline, Stage, StageError, StageResult, StageRunner};
use crate::query::Query;
use crate::reasoning::{clean_response, Reasoner};
use crate::retrieval::{RetrievalError, SimilarityScorer, WebRetriever};
use crate::routing::{QueryClassifier, RoutingDecision};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Drives one query from intake to [`QueryResult`].
///
/// Collaborators are injected at construction and shared across queries; all per-query state
/// lives in the run itself.
#[derive(Clone)]
pub struct Orchestrator {
    scorer: SimilarityScorer,
    web: WebRetriever,
    runner: StageRunner,
    classifier: QueryClassifier,
    fusion: ResultFusionEngine,
    policy: PipelineSettings,
    metrics: Arc<Metrics>,
}

/// What a run learned before it finished or was cut off
#[derive(Debug, Default)]
struct RunTrace {
    routing: Option<RoutingDecision>,
    degraded: bool,
}

struct Completed {
    answer: String,
    evidence: EvidenceSet,
}

impl Orchestrator {
    pub fn new(
        scorer: SimilarityScorer,
        web: WebRetriever,
        reasoner: Arc<dyn Reasoner>,
        domain: impl Into<String>,
        policy: PipelineSettings,
    ) -> Self {
        let runner = StageRunner::new(reasoner, domain, policy.stage_timeout(), policy.retry_count);

        Self {
            scorer,
            web,
            runner,
            classifier: QueryClassifier::new(policy.similarity_threshold),
            fusion: ResultFusionEngine::new(policy.max_evidence),
            policy,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Share a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    pub fn web(&self) -> &WebRetriever {
        &self.web
    }

    pub fn reasoner(&self) -> &dyn Reasoner {
        self.runner.reasoner()
    }

    pub fn policy(&self) -> &PipelineSettings {
        &self.policy
    }

    /// Answer a query. Never fails; every outcome is a status on the result.
    pub async fn run(&self, query: Query) -> QueryResult {
        let start = Instant::now();
        let deadline = start + self.policy.overall_deadline();
        let mut pipeline = Pipeline::new();
        let mut trace = RunTrace::default();

        info!("Processing query {}: '{}'", query.id(), query.text());

        let outcome = timeout(
            self.policy.overall_deadline(),
            self.drive(&mut pipeline, &mut trace, &query, deadline),
        )
        .await;

        let (status, answer, sources, evidence_count, error) = match outcome {
            Ok(Ok(done)) => {
                let status = if done.evidence.is_empty() {
                    QueryStatus::NoEvidence
                } else if trace.degraded {
                    QueryStatus::Partial
                } else {
                    QueryStatus::Ok
                };
                (
                    status,
                    done.answer,
                    done.evidence.provenance(),
                    done.evidence.len(),
                    None,
                )
            }
            Ok(Err(e)) => {
                warn!("Query {} failed: {}", query.id(), e);
                (QueryStatus::Failed, String::new(), Vec::new(), 0, Some(e.to_string()))
            }
            Err(_) => {
                pipeline.fail();
                warn!(
                    "Query {} exceeded the {:?} deadline in state {}",
                    query.id(),
                    self.policy.overall_deadline(),
                    pipeline.state()
                );
                (
                    QueryStatus::Timeout,
                    String::new(),
                    Vec::new(),
                    0,
                    Some(format!(
                        "deadline of {:?} exceeded",
                        self.policy.overall_deadline()
                    )),
                )
            }
        };

        let stage_timings: Vec<StageTiming> =
            pipeline.stage_results().iter().map(StageTiming::from).collect();
        for timing in &stage_timings {
            self.metrics.record_stage_time(timing.stage, timing.duration_ms);
        }
        self.metrics.record_query(status);

        let elapsed = start.elapsed();
        info!(
            "Query {} finished with {} in {:?} ({} sources)",
            query.id(),
            status,
            elapsed,
            sources.len()
        );

        QueryResult {
            request_id: query.id().to_string(),
            answer,
            sources,
            status,
            routing: trace.routing,
            evidence_count,
            elapsed,
            stage_timings,
            error,
            completed_at: Utc::now(),
        }
    }

    async fn drive(
        &self,
        pipeline: &mut Pipeline,
        trace: &mut RunTrace,
        query: &Query,
        deadline: Instant,
    ) -> Result<Completed, StageError> {
        let until = self.before_synthesis(deadline);
        let analysis = self.runner.analyze(pipeline, query, until).await?;
        let evidence = self.retrieve(pipeline, trace, query, until).await?;
        let answer = self
            .runner
            .synthesize(pipeline, query, &analysis, &evidence)
            .await?;

        Ok(Completed {
            answer: clean_response(&answer),
            evidence,
        })
    }

    /// Steps before SYNTHESIZE must end by this instant so one synthesis attempt still fits
    fn before_synthesis(&self, deadline: Instant) -> Instant {
        deadline
            .checked_sub(self.policy.stage_timeout())
            .unwrap_or(deadline)
    }

    fn retrieval_budget(&self, until: Instant) -> Duration {
        self.policy
            .retrieval_timeout()
            .min(until.saturating_duration_since(Instant::now()))
    }

    /// Local search, routing, conditional web search and fusion
    async fn retrieve(
        &self,
        pipeline: &mut Pipeline,
        trace: &mut RunTrace,
        query: &Query,
        until: Instant,
    ) -> Result<EvidenceSet, StageError> {
        if let Err(e) = pipeline.begin(Stage::Retrieve) {
            pipeline.fail();
            return Err(StageError::Execution {
                stage: Stage::Retrieve,
                message: e.to_string(),
            });
        }
        let start = Instant::now();

        let local = match self.search_local(query, until).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Local search failed for {}, treating as empty: {}", query.id(), e);
                trace.degraded = true;
                Vec::new()
            }
        };

        let routing = self.classifier.classify(query, &local);
        trace.routing = Some(routing);

        let web = if routing.route.requires_web() {
            match self.search_web(query, until).await {
                Ok(items) => items,
                Err(e) => {
                    warn!("Web search failed for {}, continuing without it: {}", query.id(), e);
                    trace.degraded = true;
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let evidence = self.fusion.fuse(routing, local, web);
        debug!("Query {} has {} evidence items", query.id(), evidence.len());

        pipeline.record(StageResult::succeeded(
            Stage::Retrieve,
            String::new(),
            start.elapsed(),
            1,
        ));
        Ok(evidence)
    }

    async fn search_local(
        &self,
        query: &Query,
        until: Instant,
    ) -> Result<Vec<EvidenceItem>, RetrievalError> {
        let source = self.scorer.index_name();
        let result = timeout(
            self.retrieval_budget(until),
            self.scorer.search(query.text(), self.policy.local_top_k),
        )
        .await
        .unwrap_or(Err(RetrievalError::Timeout));

        self.record_source(source, &result);
        result
    }

    async fn search_web(
        &self,
        query: &Query,
        until: Instant,
    ) -> Result<Vec<EvidenceItem>, RetrievalError> {
        let source = self.web.provider_name();
        let result = timeout(
            self.retrieval_budget(until),
            self.web.search(query.text(), self.policy.web_max_results),
        )
        .await
        .unwrap_or(Err(RetrievalError::Timeout));

        self.record_source(source, &result);
        result
    }

    fn record_source(&self, source: &str, result: &Result<Vec<EvidenceItem>, RetrievalError>) {
        match result {
            Ok(_) => self.metrics.record_success(source),
            Err(RetrievalError::NotConfigured) => {}
            Err(_) => self.metrics.record_error(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::SourceKind;
    use crate::reasoning::ReasoningError;
    use crate::retrieval::{Neighbor, SearchProvider, UnconfiguredProvider, VectorIndex, WebHit};
    use crate::routing::Route;
    use async_trait::async_trait;
    use futures::future::join_all;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeIndex {
        result: Result<Vec<Neighbor>, RetrievalError>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeIndex {
        fn with(neighbors: &[(&str, f64)]) -> Arc<Self> {
            let neighbors = neighbors
                .iter()
                .enumerate()
                .map(|(i, (text, score))| Neighbor {
                    text: text.to_string(),
                    score: *score,
                    doc_id: format!("doc_{}", i),
                })
                .collect();
            Self::returning(Ok(neighbors), Duration::ZERO)
        }

        fn returning(result: Result<Vec<Neighbor>, RetrievalError>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                result,
                delay,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl VectorIndex for FakeIndex {
        fn name(&self) -> &str {
            "fake-index"
        }

        async fn nearest_neighbors(
            &self,
            _query: &str,
            _k: usize,
        ) -> Result<Vec<Neighbor>, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        }
    }

    struct FakeWeb {
        result: Result<Vec<WebHit>, RetrievalError>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeWeb {
        fn with(snippets: &[&str]) -> Arc<Self> {
            let hits = snippets
                .iter()
                .enumerate()
                .map(|(i, s)| WebHit {
                    snippet: s.to_string(),
                    url: format!("https://site{}.example", i + 1),
                    rank: i as u32 + 1,
                })
                .collect();
            Self::returning(Ok(hits))
        }

        fn returning(result: Result<Vec<WebHit>, RetrievalError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn stalled(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(Vec::new()),
                delay,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SearchProvider for FakeWeb {
        fn name(&self) -> &str {
            "fake-web"
        }

        async fn web_search(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> Result<Vec<WebHit>, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        }
    }

    /// Answers every stage, optionally stalling the first calls of a stage or slowing a stage down
    #[derive(Default)]
    struct FakeReasoner {
        stalls: Mutex<HashMap<Stage, usize>>,
        delays: HashMap<Stage, Duration>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<(Stage, String)>>,
    }

    impl FakeReasoner {
        fn stalling(stage: Stage, times: usize) -> Arc<Self> {
            let reasoner = Self::default();
            reasoner.stalls.lock().unwrap().insert(stage, times);
            Arc::new(reasoner)
        }

        fn slow(delays: &[(Stage, Duration)]) -> Arc<Self> {
            Arc::new(Self {
                delays: delays.iter().copied().collect(),
                ..Self::default()
            })
        }

        fn prompt_for(&self, stage: Stage) -> Option<String> {
            self.prompts
                .lock()
                .unwrap()
                .iter()
                .find(|(s, _)| *s == stage)
                .map(|(_, p)| p.clone())
        }
    }

    #[async_trait]
    impl Reasoner for FakeReasoner {
        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-model"
        }

        async fn complete(&self, stage: Stage, prompt: &str) -> Result<String, ReasoningError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push((stage, prompt.to_string()));

            let stall = {
                let mut stalls = self.stalls.lock().unwrap();
                match stalls.get_mut(&stage) {
                    Some(n) if *n > 0 => {
                        *n -= 1;
                        true
                    }
                    _ => false,
                }
            };
            if stall {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            if let Some(delay) = self.delays.get(&stage) {
                tokio::time::sleep(*delay).await;
            }

            Ok(format!("{} output", stage))
        }
    }

    fn policy() -> PipelineSettings {
        PipelineSettings {
            stage_timeout: 0.05,
            retrieval_timeout: 0.05,
            overall_deadline: 2.0,
            ..PipelineSettings::default()
        }
    }

    fn orchestrator(
        index: Arc<FakeIndex>,
        web: Arc<dyn SearchProvider>,
        reasoner: Arc<FakeReasoner>,
        policy: PipelineSettings,
    ) -> Orchestrator {
        Orchestrator::new(
            SimilarityScorer::new(index),
            WebRetriever::new(web),
            reasoner,
            "Red Dead Redemption 2",
            policy,
        )
    }

    fn query(text: &str) -> Query {
        Query::parse(text).unwrap()
    }

    fn timing_stages(result: &QueryResult) -> Vec<Stage> {
        result.stage_timings.iter().map(|t| t.stage).collect()
    }

    #[tokio::test]
    async fn test_confident_local_match_skips_web() {
        let index = FakeIndex::with(&[
            ("The Arabian is the fastest horse.", 1.1),
            ("Horses need brushing.", 2.9),
        ]);
        let web = FakeWeb::with(&["web snippet"]);
        let orch = orchestrator(index, web.clone(), Arc::new(FakeReasoner::default()), policy());

        let result = orch.run(query("best horse in RDR2")).await;

        assert_eq!(result.status, QueryStatus::Ok);
        assert_eq!(result.routing.unwrap().route, Route::LocalOnly);
        assert_eq!(result.routing.unwrap().best_score, Some(1.1));
        assert_eq!(web.calls.load(Ordering::SeqCst), 0);
        assert!(result.sources.iter().all(|p| p.source == SourceKind::Local));
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.answer, "SYNTHESIZE output");
        assert_eq!(
            timing_stages(&result),
            vec![Stage::Analyze, Stage::Retrieve, Stage::Synthesize]
        );
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let index = FakeIndex::with(&[("Exactly on the boundary here.", 2.2)]);
        let web = FakeWeb::with(&["web snippet"]);
        let orch = orchestrator(index, web.clone(), Arc::new(FakeReasoner::default()), policy());

        let result = orch.run(query("boundary")).await;

        assert_eq!(result.routing.unwrap().route, Route::LocalOnly);
        assert_eq!(web.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_local_candidates_goes_to_web() {
        let index = FakeIndex::with(&[]);
        let web = FakeWeb::with(&["Patch 1.32 fixed stability.", "Online update notes."]);
        let orch = orchestrator(index, web.clone(), Arc::new(FakeReasoner::default()), policy());

        let result = orch.run(query("today's RDR2 patch notes")).await;

        assert_eq!(result.status, QueryStatus::Ok);
        assert_eq!(result.routing.unwrap().route, Route::WebOnly);
        assert_eq!(web.calls.load(Ordering::SeqCst), 1);
        let refs: Vec<&str> = result.sources.iter().map(|p| p.reference.as_str()).collect();
        assert_eq!(refs, vec!["https://site1.example", "https://site2.example"]);
    }

    #[tokio::test]
    async fn test_weak_local_match_uses_both_sources() {
        let index = FakeIndex::with(&[("Some loosely related text.", 3.4)]);
        let web = FakeWeb::with(&["A better web answer."]);
        let orch = orchestrator(
            index.clone(),
            web.clone(),
            Arc::new(FakeReasoner::default()),
            policy(),
        );

        let result = orch.run(query("legendary bear location")).await;

        assert_eq!(result.status, QueryStatus::Ok);
        assert_eq!(result.routing.unwrap().route, Route::Hybrid);
        assert_eq!(index.calls.load(Ordering::SeqCst), 1);
        assert_eq!(web.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.sources[0].source, SourceKind::Local);
        assert_eq!(result.sources[1].source, SourceKind::Web);
    }

    #[tokio::test]
    async fn test_web_failure_with_local_evidence_is_partial() {
        let index = FakeIndex::with(&[("Loosely related local fact.", 3.0)]);
        let web = FakeWeb::returning(Err(RetrievalError::Quota));
        let orch = orchestrator(index, web, Arc::new(FakeReasoner::default()), policy());

        let result = orch.run(query("legendary bear location")).await;

        assert_eq!(result.status, QueryStatus::Partial);
        assert!(!result.answer.is_empty());
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].reference, "doc_0");
        assert_eq!(orch.metrics().reliability("fake-web"), 0.0);
    }

    #[tokio::test]
    async fn test_unconfigured_web_is_absorbed() {
        let index = FakeIndex::with(&[("Loosely related local fact.", 3.0)]);
        let web = Arc::new(UnconfiguredProvider::new("serper"));
        let orch = orchestrator(index, web, Arc::new(FakeReasoner::default()), policy());

        let result = orch.run(query("legendary bear location")).await;

        assert_eq!(result.status, QueryStatus::Partial);
        assert_eq!(orch.metrics().reliability("serper"), 100.0);
    }

    #[tokio::test]
    async fn test_no_evidence_still_synthesizes() {
        let index = FakeIndex::with(&[]);
        let web = FakeWeb::with(&[]);
        let reasoner = Arc::new(FakeReasoner::default());
        let orch = orchestrator(index, web, reasoner.clone(), policy());

        let result = orch.run(query("something nobody knows")).await;

        assert_eq!(result.status, QueryStatus::NoEvidence);
        assert!(result.sources.is_empty());
        assert_eq!(result.answer, "SYNTHESIZE output");
        let prompt = reasoner.prompt_for(Stage::Synthesize).unwrap();
        assert!(prompt.contains("could not find"));
    }

    #[tokio::test]
    async fn test_web_outage_without_local_is_no_evidence() {
        let index = FakeIndex::with(&[]);
        let web = FakeWeb::returning(Err(RetrievalError::Timeout));
        let orch = orchestrator(index, web, Arc::new(FakeReasoner::default()), policy());

        let result = orch.run(query("today's RDR2 patch notes")).await;

        assert_eq!(result.status, QueryStatus::NoEvidence);
        assert_eq!(result.routing.unwrap().route, Route::WebOnly);
    }

    #[tokio::test]
    async fn test_local_failure_degrades_to_web() {
        let index = FakeIndex::returning(
            Err(RetrievalError::Network("connection refused".to_string())),
            Duration::ZERO,
        );
        let web = FakeWeb::with(&["Web fallback fact."]);
        let orch = orchestrator(index, web.clone(), Arc::new(FakeReasoner::default()), policy());

        let result = orch.run(query("best horse")).await;

        assert_eq!(result.status, QueryStatus::Partial);
        assert_eq!(result.routing.unwrap().route, Route::WebOnly);
        assert_eq!(web.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_local_search_is_cut_off() {
        let index = FakeIndex::returning(
            Ok(vec![Neighbor {
                text: "Too late to matter.".to_string(),
                score: 0.5,
                doc_id: "doc_0".to_string(),
            }]),
            Duration::from_millis(500),
        );
        let web = FakeWeb::with(&["Web fact."]);
        let orch = orchestrator(index, web, Arc::new(FakeReasoner::default()), policy());

        let result = orch.run(query("best horse")).await;

        assert_eq!(result.status, QueryStatus::Partial);
        assert_eq!(result.routing.unwrap().route, Route::WebOnly);
        assert!(result.sources.iter().all(|p| p.source == SourceKind::Web));
    }

    #[tokio::test]
    async fn test_stage_timeout_retried_once() {
        let index = FakeIndex::with(&[("The Arabian is the fastest horse.", 1.1)]);
        let reasoner = FakeReasoner::stalling(Stage::Analyze, 1);
        let orch = orchestrator(index, FakeWeb::with(&[]), reasoner.clone(), policy());

        let result = orch.run(query("best horse")).await;

        assert_eq!(result.status, QueryStatus::Ok);
        assert_eq!(reasoner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.timing(Stage::Analyze).unwrap().attempts, 2);
    }

    #[tokio::test]
    async fn test_second_stage_timeout_fails_without_sources() {
        let index = FakeIndex::with(&[("The Arabian is the fastest horse.", 1.1)]);
        let reasoner = FakeReasoner::stalling(Stage::Synthesize, 2);
        let orch = orchestrator(index, FakeWeb::with(&[]), reasoner.clone(), policy());

        let result = orch.run(query("best horse")).await;

        assert_eq!(result.status, QueryStatus::Failed);
        assert!(result.sources.is_empty());
        assert!(result.answer.is_empty());
        assert_eq!(reasoner.calls.load(Ordering::SeqCst), 3);
        let synth = result.timing(Stage::Synthesize).unwrap();
        assert!(!synth.success);
        assert_eq!(synth.attempts, 2);
        assert!(result.error.unwrap().contains("SYNTHESIZE"));
    }

    #[tokio::test]
    async fn test_analysis_failure_skips_retrieval() {
        let index = FakeIndex::with(&[("The Arabian is the fastest horse.", 1.1)]);
        let reasoner = FakeReasoner::stalling(Stage::Analyze, 2);
        let orch = orchestrator(index.clone(), FakeWeb::with(&[]), reasoner, policy());

        let result = orch.run(query("best horse")).await;

        assert_eq!(result.status, QueryStatus::Failed);
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
        assert!(result.routing.is_none());
    }

    #[tokio::test]
    async fn test_slow_earlier_steps_leave_room_for_synthesis() {
        let index = FakeIndex::returning(Ok(Vec::new()), Duration::from_secs(10));
        let web = FakeWeb::stalled(Duration::from_secs(10));
        let reasoner = FakeReasoner::slow(&[
            (Stage::Analyze, Duration::from_millis(100)),
            (Stage::Synthesize, Duration::from_millis(300)),
        ]);
        let policy = PipelineSettings {
            stage_timeout: 0.4,
            retrieval_timeout: 0.4,
            overall_deadline: 1.2,
            ..PipelineSettings::default()
        };
        let orch = orchestrator(index, web.clone(), reasoner, policy);

        let result = orch.run(query("best horse")).await;

        assert_eq!(result.status, QueryStatus::NoEvidence);
        assert_eq!(result.answer, "SYNTHESIZE output");
        assert_eq!(
            timing_stages(&result),
            vec![Stage::Analyze, Stage::Retrieve, Stage::Synthesize]
        );
        assert_eq!(web.calls.load(Ordering::SeqCst), 1);
        assert!(result.elapsed < Duration::from_millis(1200));
    }

    #[tokio::test]
    async fn test_overall_deadline() {
        let index = FakeIndex::with(&[("The Arabian is the fastest horse.", 1.1)]);
        let reasoner = FakeReasoner::stalling(Stage::Synthesize, 2);
        let policy = PipelineSettings {
            stage_timeout: 0.4,
            retrieval_timeout: 0.1,
            overall_deadline: 0.6,
            ..PipelineSettings::default()
        };
        let orch = orchestrator(index, FakeWeb::with(&[]), reasoner, policy);

        let result = orch.run(query("best horse")).await;

        assert_eq!(result.status, QueryStatus::Timeout);
        assert!(result.answer.is_empty());
        assert!(result.sources.is_empty());
        assert_eq!(timing_stages(&result), vec![Stage::Analyze, Stage::Retrieve]);
        assert!(result.elapsed < Duration::from_millis(1000));
        assert_eq!(orch.metrics().status_count(QueryStatus::Timeout), 1);
    }

    #[tokio::test]
    async fn test_sources_come_from_evidence() {
        let index = FakeIndex::with(&[
            ("Shared fact about camps.", 2.8),
            ("Local only fact.", 3.1),
        ]);
        let web = FakeWeb::with(&["shared fact about  CAMPS.", "Web only fact."]);
        let orch = orchestrator(index, web, Arc::new(FakeReasoner::default()), policy());

        let result = orch.run(query("gang camps")).await;

        let allowed: HashSet<String> = [
            "local:doc_0",
            "local:doc_1",
            "web:https://site1.example",
            "web:https://site2.example",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert!(result.sources.iter().all(|p| allowed.contains(&p.to_string())));
        // the web copy of the shared fact was deduplicated away
        assert!(result.sources.iter().all(|p| p.reference != "https://site1.example"));
        assert_eq!(result.evidence_count, 3);
    }

    #[tokio::test]
    async fn test_concurrent_queries_are_independent() {
        let index = FakeIndex::with(&[("The Arabian is the fastest horse.", 1.1)]);
        let reasoner = Arc::new(FakeReasoner::default());
        let orch = orchestrator(index, FakeWeb::with(&[]), reasoner, policy());

        let results = join_all((0..8).map(|i| {
            let orch = orch.clone();
            async move { orch.run(query(&format!("question {}", i))).await }
        }))
        .await;

        let ids: HashSet<&str> = results.iter().map(|r| r.request_id.as_str()).collect();
        assert_eq!(ids.len(), 8);
        assert!(results.iter().all(|r| r.status == QueryStatus::Ok));
        assert_eq!(orch.metrics().total_queries(), 8);
    }
}
