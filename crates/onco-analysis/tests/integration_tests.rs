//! End-to-end controller tests against an in-memory analysis service.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use onco_analysis::chart::{Domain, Series};
use onco_analysis::render::Primitive;
use onco_analysis::stats::StepCurve;
use onco_analysis::{
    AnalysisController, AnalysisRequest, AnalysisResult, AnalysisService, AnalysisState,
    AnalysisType, ChartConfig, ChartId, ErrorKind, Scene, SubmitOutcome, SurfaceRegistry,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const CHART: &str = "analysis-chart";

// ============================================================================
// Fakes
// ============================================================================

/// Answers each call with the next scripted response.
struct ScriptedService {
    responses: Mutex<VecDeque<anyhow::Result<Value>>>,
    calls: AtomicUsize,
}

impl ScriptedService {
    fn new(responses: Vec<anyhow::Result<Value>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn run(&self, _request: &AnalysisRequest) -> anyhow::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted response left")))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Holds each call open until the test sends its response, keyed by gene.
struct ChannelService {
    pending: Mutex<HashMap<String, oneshot::Receiver<anyhow::Result<Value>>>>,
    started: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl AnalysisService for ChannelService {
    async fn run(&self, request: &AnalysisRequest) -> anyhow::Result<Value> {
        let rx = self
            .pending
            .lock()
            .remove(&request.gene)
            .ok_or_else(|| anyhow!("unexpected request for {}", request.gene))?;
        let _ = self.started.send(request.gene.clone());
        rx.await?
    }

    fn name(&self) -> &str {
        "channel"
    }
}

struct Harness {
    controller: AnalysisController,
    registry: Arc<SurfaceRegistry>,
}

impl Harness {
    fn new(service: Arc<dyn AnalysisService>) -> Self {
        init_tracing();
        let registry = Arc::new(SurfaceRegistry::new());
        registry.mount_scene(ChartId::from(CHART));
        let controller = AnalysisController::new(
            service,
            registry.clone(),
            ChartId::from(CHART),
            ChartConfig::default(),
        );
        Self {
            controller,
            registry,
        }
    }

    fn scene(&self) -> Scene {
        self.registry
            .snapshot(&ChartId::from(CHART))
            .unwrap()
            .unwrap()
    }

    fn texts(&self) -> Vec<String> {
        self.scene()
            .primitives
            .into_iter()
            .filter_map(|p| match p {
                Primitive::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }
}

fn survival_request(gene: &str) -> AnalysisRequest {
    AnalysisRequest::new("brca_tcga_pub2015", AnalysisType::Survival, gene)
}

fn survival_payload(gene: &str) -> Value {
    json!({
        "gene": gene,
        "sample_count": 2,
        "kmData": [
            {"time": 10, "survival": 0.5, "censored": false},
            {"time": 0, "survival": 1.0, "censored": false}
        ]
    })
}

// ============================================================================
// Request races
// ============================================================================

fn channel_harness(genes: &[&str]) -> (
    Arc<Harness>,
    HashMap<String, oneshot::Sender<anyhow::Result<Value>>>,
    mpsc::UnboundedReceiver<String>,
) {
    let mut pending = HashMap::new();
    let mut senders = HashMap::new();
    for gene in genes {
        let (tx, rx) = oneshot::channel();
        pending.insert(gene.to_string(), rx);
        senders.insert(gene.to_string(), tx);
    }
    let (started_tx, started_rx) = mpsc::unbounded_channel();
    let service = ChannelService {
        pending: Mutex::new(pending),
        started: started_tx,
    };
    (Arc::new(Harness::new(Arc::new(service))), senders, started_rx)
}

fn spawn_submit(
    harness: &Arc<Harness>,
    gene: &str,
) -> tokio::task::JoinHandle<onco_analysis::Result<SubmitOutcome>> {
    let harness = harness.clone();
    let request = survival_request(gene);
    tokio::spawn(async move { harness.controller.submit(&request).await })
}

#[tokio::test]
async fn test_newer_response_first_wins() {
    let (harness, mut senders, mut started) = channel_harness(&["TP53", "BRCA1"]);

    let first = spawn_submit(&harness, "TP53");
    assert_eq!(started.recv().await.as_deref(), Some("TP53"));
    let second = spawn_submit(&harness, "BRCA1");
    assert_eq!(started.recv().await.as_deref(), Some("BRCA1"));

    let _ = senders.remove("BRCA1").unwrap().send(Ok(survival_payload("BRCA1")));
    assert_eq!(second.await.unwrap().unwrap(), SubmitOutcome::Rendered);

    let _ = senders.remove("TP53").unwrap().send(Ok(survival_payload("TP53")));
    assert_eq!(first.await.unwrap().unwrap(), SubmitOutcome::Superseded);

    assert_eq!(harness.controller.state(), AnalysisState::Rendered);
    match harness.controller.result() {
        Some(AnalysisResult::Survival(s)) => assert_eq!(s.gene, "BRCA1"),
        other => panic!("unexpected result {other:?}"),
    }
    assert!(harness
        .texts()
        .contains(&"Kaplan-Meier Survival Plot: BRCA1".to_string()));
}

#[tokio::test]
async fn test_older_response_first_is_discarded() {
    let (harness, mut senders, mut started) = channel_harness(&["TP53", "BRCA1"]);

    let first = spawn_submit(&harness, "TP53");
    assert_eq!(started.recv().await.as_deref(), Some("TP53"));
    let second = spawn_submit(&harness, "BRCA1");
    assert_eq!(started.recv().await.as_deref(), Some("BRCA1"));

    let _ = senders.remove("TP53").unwrap().send(Ok(survival_payload("TP53")));
    assert_eq!(first.await.unwrap().unwrap(), SubmitOutcome::Superseded);
    assert_eq!(
        harness.controller.state(),
        AnalysisState::Loading { generation: 2 }
    );
    assert!(harness.scene().primitives.is_empty());

    let _ = senders.remove("BRCA1").unwrap().send(Ok(survival_payload("BRCA1")));
    assert_eq!(second.await.unwrap().unwrap(), SubmitOutcome::Rendered);
    assert!(harness
        .texts()
        .contains(&"Kaplan-Meier Survival Plot: BRCA1".to_string()));
}

#[tokio::test]
async fn test_stale_failure_does_not_overwrite_result() {
    let (harness, mut senders, mut started) = channel_harness(&["TP53", "BRCA1"]);

    let first = spawn_submit(&harness, "TP53");
    assert_eq!(started.recv().await.as_deref(), Some("TP53"));
    let second = spawn_submit(&harness, "BRCA1");
    assert_eq!(started.recv().await.as_deref(), Some("BRCA1"));

    let _ = senders.remove("BRCA1").unwrap().send(Ok(survival_payload("BRCA1")));
    assert_eq!(second.await.unwrap().unwrap(), SubmitOutcome::Rendered);

    let _ = senders
        .remove("TP53")
        .unwrap()
        .send(Err(anyhow!("connection reset")));
    assert_eq!(first.await.unwrap().unwrap(), SubmitOutcome::Superseded);

    assert_eq!(harness.controller.state(), AnalysisState::Rendered);
    assert_eq!(harness.controller.last_error_message(), None);
}

// ============================================================================
// Validation and failures
// ============================================================================

#[tokio::test]
async fn test_validation_error_skips_service() {
    let service = Arc::new(ScriptedService::new(Vec::new()));
    let harness = Harness::new(service.clone());

    let request = AnalysisRequest::new("brca_tcga_pub2015", AnalysisType::Correlation, "TP53");
    let err = harness.controller.submit(&request).await.unwrap_err();

    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert_eq!(
        err.user_message().as_deref(),
        Some("Second gene is required for correlation analysis")
    );
    assert_eq!(service.calls(), 0);
    assert_eq!(harness.controller.state(), AnalysisState::Idle);

    let request = AnalysisRequest::new("brca_tcga_pub2015", AnalysisType::Differential, "TP53");
    let err = harness.controller.submit(&request).await.unwrap_err();
    assert_eq!(
        err.user_message().as_deref(),
        Some("Clinical feature is required for differential analysis")
    );
}

#[tokio::test]
async fn test_request_failure_reports_generic_message() {
    let service = Arc::new(ScriptedService::new(vec![Err(anyhow!(
        "Analysis API Error 500 Internal Server Error: boom"
    ))]));
    let harness = Harness::new(service);

    let outcome = harness
        .controller
        .submit(&survival_request("TP53"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Failed {
            kind: ErrorKind::RequestFailed
        }
    );
    assert_eq!(
        harness.controller.last_error_message().as_deref(),
        Some("Failed to run analysis")
    );
    assert!(harness.controller.result().is_none());
}

#[tokio::test]
async fn test_missing_data_clears_previous_chart() {
    let service = Arc::new(ScriptedService::new(vec![
        Ok(survival_payload("TP53")),
        Ok(json!({"sample_count": 3})),
    ]));
    let harness = Harness::new(service);
    let request = survival_request("TP53");

    assert_eq!(
        harness.controller.submit(&request).await.unwrap(),
        SubmitOutcome::Rendered
    );
    assert!(!harness.scene().primitives.is_empty());

    let outcome = harness.controller.submit(&request).await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Failed {
            kind: ErrorKind::MissingData
        }
    );
    assert!(harness.scene().primitives.is_empty());
    assert!(harness.controller.result().is_none());
    // logged only
    assert_eq!(harness.controller.last_error_message(), None);
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_perfect_correlation_scenario() {
    let service = Arc::new(ScriptedService::new(vec![Ok(json!({
        "GeneA": "TP53",
        "GeneB": "BRCA1",
        "GeneA_point": [1, 2, 3, 4, 5],
        "GeneB_point": [2, 4, 6, 8, 10]
    }))]));
    let harness = Harness::new(service);
    let request = AnalysisRequest::new("brca_tcga_pub2015", AnalysisType::Correlation, "TP53")
        .with_gene2("BRCA1");

    harness.controller.submit(&request).await.unwrap();

    let texts = harness.texts();
    assert!(texts.contains(&"r = 1.000".to_string()));
    assert!(texts.contains(&"p-value ≈ 0.0000".to_string()));
    assert!(texts.contains(&"n = 5 data points".to_string()));

    let spec = harness.controller.chart_spec().unwrap();
    match spec.series_named("regression") {
        Some(Series::Line { points, .. }) => {
            assert_eq!(points[0], (1.0, 2.0));
            assert_eq!(points[1], (5.0, 10.0));
        }
        other => panic!("expected regression line, got {other:?}"),
    }
}

#[tokio::test]
async fn test_kaplan_meier_step_scenario() {
    let service = Arc::new(ScriptedService::new(vec![Ok(survival_payload("TP53"))]));
    let harness = Harness::new(service);

    harness
        .controller
        .submit(&survival_request("TP53"))
        .await
        .unwrap();

    let Some(AnalysisResult::Survival(result)) = harness.controller.result() else {
        panic!("expected survival result");
    };
    assert_eq!(result.km_data[0].time, 0.0);
    assert_eq!(StepCurve::new(&result.km_data).value_at(5.0), 1.0);

    let spec = harness.controller.chart_spec().unwrap();
    match spec.domain_x {
        Domain::Continuous { min, max, .. } => {
            assert_eq!(min, 0.0);
            assert!((max - 11.0).abs() < 1e-9);
        }
        other => panic!("unexpected domain {other:?}"),
    }
}

#[tokio::test]
async fn test_race_remap_scenario_exports_svg() {
    let service = Arc::new(ScriptedService::new(vec![Ok(json!({"analyses": {"Race": {
        "p_value": 0.0321,
        "plots": {
            "Male": {"min": 1, "Q1": 2, "median": 3, "Q3": 4, "max": 5},
            "Female": {"min": 2, "Q1": 3, "median": 4, "Q3": 5, "max": 6}
        }
    }}}))]));
    let harness = Harness::new(service);
    let request = AnalysisRequest::new("brca_tcga_pub2015", AnalysisType::Differential, "TP53")
        .with_clinical_feature("Race");

    assert_eq!(
        harness.controller.submit(&request).await.unwrap(),
        SubmitOutcome::Rendered
    );

    let svg = harness.controller.export_svg().unwrap();
    for label in ["White", "Black", "Asian", "Other", "p-value: 0.0321"] {
        assert!(svg.contains(label), "missing {label}");
    }
    assert!(!svg.contains(">Male<"));
}

#[tokio::test]
async fn test_rendering_is_idempotent() {
    let payload = survival_payload("TP53");
    let service = Arc::new(ScriptedService::new(vec![Ok(payload.clone()), Ok(payload)]));
    let harness = Harness::new(service);
    let request = survival_request("TP53");

    harness.controller.submit(&request).await.unwrap();
    let first = harness.scene();
    harness.controller.submit(&request).await.unwrap();
    assert_eq!(harness.scene(), first);
}

#[test]
fn test_concurrent_renders_never_interleave() {
    use onco_analysis::render::render_spec;
    use onco_analysis::{ChartSpec, ResultNormalizer};

    let registry = SurfaceRegistry::new();
    let id = ChartId::from(CHART);
    registry.mount_scene(id.clone());
    let request = survival_request("TP53");
    let spec: ChartSpec = ResultNormalizer::new()
        .normalize(&request, &survival_payload("TP53"))
        .unwrap()
        .spec;

    let mut single = onco_analysis::SceneSurface::new();
    render_spec(&spec, &ChartConfig::default(), &mut single).unwrap();
    let expected = single.primitives().len();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..20 {
                    registry
                        .with_surface(&id, |surface| {
                            render_spec(&spec, &ChartConfig::default(), surface)
                        })
                        .unwrap()
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(registry.snapshot(&id).unwrap().unwrap().primitives.len(), expected);
}
