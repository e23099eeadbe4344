//! Genomic/Clinical Analysis Core
//!
//! Statistics, result normalization and chart rendering for analyses run
//! against a genomic/clinical dataset backend.
//!
//! # Overview
//!
//! - **Statistics**: Pearson correlation, regression line, an approximate
//!   p-value and Kaplan-Meier step-curve semantics ([`stats`])
//! - **Normalization**: per-analysis payload validation into a typed
//!   [`AnalysisResult`], with category remapping for stratified box plots
//!   ([`normalizer`])
//! - **Charts**: a drawing-independent [`ChartSpec`] with d3-compatible
//!   scales ([`chart`])
//! - **Rendering**: five chart renderers drawing on registered surfaces,
//!   with SVG export ([`render`])
//! - **Orchestration**: an async controller that discards stale responses
//!   ([`controller`])
//! - **Dataset summary**: typed summary sections, the summary Kaplan-Meier
//!   curves and mutation burden scatter ([`summary`])
//! - **Export**: CSV of chart series and summary sections ([`export`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use onco_analysis::{
//!     AnalysisController, AnalysisRequest, AnalysisType, ChartConfig, ChartId,
//!     HttpAnalysisService, ServiceConfig, SurfaceRegistry,
//! };
//! use std::sync::Arc;
//!
//! let service = Arc::new(HttpAnalysisService::new(ServiceConfig::from_env()?)?);
//! let surfaces = Arc::new(SurfaceRegistry::new());
//! let chart = ChartId::from("analysis");
//! surfaces.mount_scene(chart.clone());
//!
//! let controller =
//!     AnalysisController::new(service, surfaces, chart, ChartConfig::default());
//!
//! let request = AnalysisRequest::new("brca_tcga", AnalysisType::Correlation, "TP53")
//!     .with_gene2("BRCA1");
//! controller.submit(&request).await?;
//! std::fs::write("correlation.svg", controller.export_svg()?)?;
//! ```
//!
//! # Features
//!
//! - `http` (default): the reqwest-backed [`service::HttpAnalysisService`]

pub mod chart;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod normalizer;
pub mod render;
pub mod service;
pub mod stats;
pub mod summary;
pub mod types;

// Re-exports for convenient access
pub use chart::{ChartKind, ChartSpec};
pub use config::{
    ChartConfig, ChartConfigBuilder, ConfigValidationError, Margin, ServiceConfig,
    ServiceConfigBuilder,
};
pub use controller::{
    AnalysisController, AnalysisState, ErrorKind, RequestGeneration, RequestTicket,
    SubmitOutcome,
};
pub use error::{AnalysisError, Result, ResultExt};
pub use normalizer::{CategoryRemapper, NormalizedResult, PlotOrigin, ResultNormalizer};
pub use render::{
    ChartId, ChartRenderer, DrawingSurface, Primitive, Scene, SceneSurface, SurfaceRegistry,
    renderer_for,
};
pub use service::AnalysisService;
#[cfg(feature = "http")]
pub use service::HttpAnalysisService;
pub use stats::{CorrelationSummary, Regression, Regulation};
pub use summary::{DatasetSummary, SummarySection};
pub use types::{
    AnalysisRequest, AnalysisResult, AnalysisType, BoxStats, CategoryStats, ClinicalFeature,
    ClinicalRecord, DatasetInfo,
};
