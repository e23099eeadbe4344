//! Analysis request orchestration.
//!
//! [`AnalysisController`] validates a request, calls the
//! [`AnalysisService`], normalizes the response and renders the chart on the
//! surface registered under its [`ChartId`].
//!
//! # Stale responses
//!
//! Every accepted submission takes a [`RequestTicket`]. When a response
//! arrives its ticket must still be the latest one issued; otherwise the
//! response is dropped and the state is left to the newer submission.
//!
//! # Locking
//!
//! The controller state sits behind a `parking_lot::RwLock`. The lock is
//! never held across the service call, only while a response is applied.

mod state;

pub use state::{AnalysisState, ErrorKind, RequestGeneration, RequestTicket, SubmitOutcome};

use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::chart::ChartSpec;
use crate::config::ChartConfig;
use crate::error::{AnalysisError, REQUEST_FAILED_MESSAGE, Result};
use crate::normalizer::{NormalizedResult, ResultNormalizer};
use crate::render::{ChartId, SurfaceRegistry, render_spec};
use crate::service::AnalysisService;
use crate::types::{AnalysisRequest, AnalysisResult};

#[derive(Debug)]
struct ControllerState {
    state: AnalysisState,
    result: Option<NormalizedResult>,
    error_message: Option<String>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            state: AnalysisState::Idle,
            result: None,
            error_message: None,
        }
    }
}

/// Drives one analysis view: submit, await, normalize, render.
pub struct AnalysisController {
    service: Arc<dyn AnalysisService>,
    surfaces: Arc<SurfaceRegistry>,
    chart_id: ChartId,
    chart_config: ChartConfig,
    normalizer: ResultNormalizer,
    generation: RequestGeneration,
    inner: RwLock<ControllerState>,
}

static_assertions::assert_impl_all!(AnalysisController: Send, Sync);

impl AnalysisController {
    pub fn new(
        service: Arc<dyn AnalysisService>,
        surfaces: Arc<SurfaceRegistry>,
        chart_id: ChartId,
        chart_config: ChartConfig,
    ) -> Self {
        Self {
            service,
            surfaces,
            chart_id,
            chart_config,
            normalizer: ResultNormalizer::new(),
            generation: RequestGeneration::new(),
            inner: RwLock::new(ControllerState::default()),
        }
    }

    pub fn chart_id(&self) -> &ChartId {
        &self.chart_id
    }

    /// Validate, run and render `request`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Validation`] when a required field is
    /// missing; the state is left unchanged and no request is sent. Service
    /// and payload failures are reported through the returned
    /// [`SubmitOutcome`] and [`state()`](Self::state).
    pub async fn submit(&self, request: &AnalysisRequest) -> Result<SubmitOutcome> {
        let ticket = self.begin(request)?;
        let response = self.service.run(request).await;
        Ok(self.complete(ticket, request, response))
    }

    /// Accept `request` and enter `Loading`.
    ///
    /// The previous result is dropped; nothing is exported while loading.
    pub fn begin(&self, request: &AnalysisRequest) -> Result<RequestTicket> {
        request.validate()?;

        let mut inner = self.inner.write();
        let ticket = self.generation.next();
        inner.state = AnalysisState::Loading {
            generation: ticket.generation(),
        };
        inner.result = None;
        inner.error_message = None;

        info!(
            "Submitting {} analysis for {} on '{}' via {} (generation {})",
            request.analysis_type,
            request.gene,
            request.dataset_id,
            self.service.name(),
            ticket.generation()
        );
        Ok(ticket)
    }

    /// Apply the service response for `ticket`.
    pub fn complete(
        &self,
        ticket: RequestTicket,
        request: &AnalysisRequest,
        response: anyhow::Result<Value>,
    ) -> SubmitOutcome {
        let mut inner = self.inner.write();
        if !self.generation.is_current(ticket) {
            debug!(
                "Discarding stale {} response (generation {}, latest {})",
                request.analysis_type,
                ticket.generation(),
                self.generation.latest()
            );
            return SubmitOutcome::Superseded;
        }

        let raw = match response {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{} analysis request failed: {:#}", request.analysis_type, e);
                inner.result = None;
                inner.error_message = Some(REQUEST_FAILED_MESSAGE.to_string());
                self.clear_surface();
                return Self::fail(&mut inner, ErrorKind::RequestFailed);
            }
        };

        let normalized = match self.normalizer.normalize(request, &raw) {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!(
                    "Discarding {} result for {}: {} ({})",
                    request.analysis_type,
                    request.gene,
                    e,
                    e.error_code()
                );
                inner.result = None;
                self.clear_surface();
                return Self::fail(&mut inner, ErrorKind::MissingData);
            }
        };

        let rendered = self
            .surfaces
            .with_surface(&self.chart_id, |surface| {
                render_spec(&normalized.spec, &self.chart_config, surface)
            })
            .and_then(|r| r);
        inner.result = Some(normalized);

        match rendered {
            Ok(()) => {
                debug!("Rendered chart '{}'", self.chart_id);
                inner.state = AnalysisState::Rendered;
                SubmitOutcome::Rendered
            }
            Err(e) => {
                error!("Failed to render chart '{}': {}", self.chart_id, e);
                inner.error_message = e.user_message();
                Self::fail(&mut inner, ErrorKind::RenderFailed)
            }
        }
    }

    fn fail(inner: &mut ControllerState, kind: ErrorKind) -> SubmitOutcome {
        inner.state = AnalysisState::Failed { kind };
        SubmitOutcome::Failed { kind }
    }

    fn clear_surface(&self) {
        let cleared = self
            .surfaces
            .with_surface(&self.chart_id, |surface| surface.clear(&self.chart_config));
        if let Err(e) = cleared {
            debug!("Nothing to clear: {}", e);
        }
    }

    pub fn state(&self) -> AnalysisState {
        self.inner.read().state
    }

    /// The last successfully normalized result.
    pub fn result(&self) -> Option<AnalysisResult> {
        self.inner.read().result.as_ref().map(|n| n.result.clone())
    }

    pub fn chart_spec(&self) -> Option<ChartSpec> {
        self.inner.read().result.as_ref().map(|n| n.spec.clone())
    }

    /// Message to show the user for the last failure, if it is user-visible.
    pub fn last_error_message(&self) -> Option<String> {
        self.inner.read().error_message.clone()
    }

    /// The current chart as an SVG document.
    pub fn export_svg(&self) -> Result<String> {
        if self.inner.read().result.is_none() {
            return Err(AnalysisError::MissingData(
                "no chart has been rendered".to_string(),
            ));
        }
        self.surfaces.export_svg(&self.chart_id)
    }

    /// The series `series` of the current chart as CSV.
    pub fn export_csv(&self, series: &str) -> Result<String> {
        let inner = self.inner.read();
        let normalized = inner.result.as_ref().ok_or_else(|| {
            AnalysisError::MissingData("no chart has been rendered".to_string())
        })?;
        crate::export::series_csv(&normalized.spec, series)
    }

    /// Drop the result, invalidate in-flight requests and clear the chart.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        self.generation.invalidate();
        *inner = ControllerState::default();
        self.clear_surface();
        debug!("Reset analysis view '{}'", self.chart_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Scene;
    use crate::types::AnalysisType;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticService(Value);

    #[async_trait]
    impl AnalysisService for StaticService {
        async fn run(&self, _request: &AnalysisRequest) -> anyhow::Result<Value> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    fn controller(payload: Value) -> (AnalysisController, Arc<SurfaceRegistry>) {
        let registry = Arc::new(SurfaceRegistry::new());
        let id = ChartId::from("analysis");
        registry.mount_scene(id.clone());
        let controller = AnalysisController::new(
            Arc::new(StaticService(payload)),
            registry.clone(),
            id,
            ChartConfig::default(),
        );
        (controller, registry)
    }

    fn survival_request() -> AnalysisRequest {
        AnalysisRequest::new("brca_tcga", AnalysisType::Survival, "TP53")
    }

    fn survival_payload() -> Value {
        json!({"kmData": [
            {"time": 0, "survival": 1.0, "censored": false},
            {"time": 10, "survival": 0.5, "censored": false}
        ], "sample_count": 2})
    }

    fn scene(registry: &SurfaceRegistry) -> Scene {
        registry.snapshot(&ChartId::from("analysis")).unwrap().unwrap()
    }

    #[test]
    fn test_begin_validates() {
        let (controller, _) = controller(json!({}));
        let request = AnalysisRequest::new("brca_tcga", AnalysisType::Survival, " ");
        let err = controller.begin(&request).unwrap_err();
        assert_eq!(err.user_message().as_deref(), Some("Gene is required"));
        assert_eq!(controller.state(), AnalysisState::Idle);
    }

    #[test]
    fn test_complete_renders() {
        let (controller, registry) = controller(json!({}));
        let request = survival_request();
        let ticket = controller.begin(&request).unwrap();
        assert_eq!(controller.state(), AnalysisState::Loading { generation: 1 });

        let outcome = controller.complete(ticket, &request, Ok(survival_payload()));
        assert_eq!(outcome, SubmitOutcome::Rendered);
        assert_eq!(controller.state(), AnalysisState::Rendered);
        assert!(controller.result().is_some());
        assert!(!scene(&registry).primitives.is_empty());
    }

    #[test]
    fn test_begin_drops_previous_result() {
        let (controller, _) = controller(json!({}));
        let request = survival_request();
        let ticket = controller.begin(&request).unwrap();
        controller.complete(ticket, &request, Ok(survival_payload()));
        assert!(controller.result().is_some());

        let next = AnalysisRequest::new("brca_tcga", AnalysisType::Correlation, "TP53")
            .with_gene2("BRCA1");
        controller.begin(&next).unwrap();
        assert_eq!(controller.state(), AnalysisState::Loading { generation: 2 });
        assert!(controller.result().is_none());
        assert!(controller.chart_spec().is_none());
        assert!(controller.export_svg().is_err());
        assert!(controller.export_csv("survival").is_err());
    }

    #[test]
    fn test_export_csv_of_current_chart() {
        let (controller, _) = controller(json!({}));
        let request = survival_request();
        let ticket = controller.begin(&request).unwrap();
        controller.complete(ticket, &request, Ok(survival_payload()));

        assert_eq!(
            controller.export_csv("survival").unwrap(),
            "Time (months),Survival Probability\n0,1\n10,0.5\n"
        );
        assert_eq!(
            controller.export_csv("regression").unwrap_err().error_code(),
            "MISSING_DATA"
        );
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let (controller, registry) = controller(json!({}));
        let request = survival_request();
        let first = controller.begin(&request).unwrap();
        let second = controller.begin(&request).unwrap();

        assert_eq!(
            controller.complete(first, &request, Ok(survival_payload())),
            SubmitOutcome::Superseded
        );
        assert_eq!(controller.state(), AnalysisState::Loading { generation: 2 });
        assert!(scene(&registry).primitives.is_empty());

        let outcome = controller.complete(second, &request, Err(anyhow::anyhow!("boom")));
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                kind: ErrorKind::RequestFailed
            }
        );
        assert_eq!(
            controller.last_error_message().as_deref(),
            Some("Failed to run analysis")
        );
    }

    #[test]
    fn test_render_failure_without_surface() {
        let registry = Arc::new(SurfaceRegistry::new());
        let controller = AnalysisController::new(
            Arc::new(StaticService(survival_payload())),
            registry,
            ChartId::from("unmounted"),
            ChartConfig::default(),
        );
        let request = survival_request();
        let ticket = controller.begin(&request).unwrap();
        let outcome = controller.complete(ticket, &request, Ok(survival_payload()));
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                kind: ErrorKind::RenderFailed
            }
        );
        assert!(controller.chart_spec().is_some());
    }

    #[test]
    fn test_reset_clears_everything() {
        let (controller, registry) = controller(json!({}));
        let request = survival_request();
        let ticket = controller.begin(&request).unwrap();
        controller.complete(ticket, &request, Ok(survival_payload()));
        assert!(controller.export_svg().is_ok());

        controller.reset();
        assert_eq!(controller.state(), AnalysisState::Idle);
        assert!(controller.result().is_none());
        assert!(scene(&registry).primitives.is_empty());
        assert!(controller.export_svg().is_err());
    }
}
