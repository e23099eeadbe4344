//! Result normalization: raw analysis payloads to typed results and charts.
//!
//! The analysis endpoint answers every request type with a differently
//! shaped JSON document. [`ResultNormalizer`] validates that document once,
//! against the request that produced it, and turns it into an
//! [`AnalysisResult`] and its [`ChartSpec`]. Nothing downstream inspects raw
//! JSON.
//!
//! Stratified payloads additionally go through the [`CategoryRemapper`].

pub mod payload;
pub mod remap;

pub use payload::{AnalysesPayload, CorrelationPayload, FeatureBlock, SurvivalPayload};
pub use remap::{CategoryRemapper, PlotOrigin, RemappedPlots, placeholder_stats, target_categories};

use serde_json::Value;
use tracing::{debug, warn};

use crate::chart::ChartSpec;
use crate::error::{AnalysisError, Result};
use crate::types::{
    AnalysisRequest, AnalysisResult, AnalysisType, ClinicalFeature, CorrelationResult,
    DifferentialResult, MethylationResult, StratifiedResult, SurvivalResult,
};

/// A validated result together with its chart.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResult {
    pub result: AnalysisResult,
    pub spec: ChartSpec,
}

/// Validates raw payloads and builds chart specs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultNormalizer {
    remapper: CategoryRemapper,
}

impl ResultNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate `raw` as the answer to `request`.
    ///
    /// Fails with `MissingData` when a field required by the request's
    /// analysis type is absent or malformed.
    pub fn parse(&self, request: &AnalysisRequest, raw: &Value) -> Result<AnalysisResult> {
        if !raw.is_object() {
            return Err(AnalysisError::MissingData(
                "analysis result is not a JSON object".to_string(),
            ));
        }

        match request.analysis_type {
            AnalysisType::Correlation => {
                let payload = CorrelationPayload::parse(raw)?;
                Ok(AnalysisResult::Correlation(CorrelationResult {
                    gene_a: payload.gene_a.unwrap_or_else(|| request.gene.clone()),
                    gene_b: payload
                        .gene_b
                        .or_else(|| request.gene2.clone())
                        .unwrap_or_default(),
                    points_a: payload.points_a,
                    points_b: payload.points_b,
                }))
            }
            AnalysisType::Survival => {
                let payload = SurvivalPayload::parse(raw)?;
                Ok(AnalysisResult::Survival(SurvivalResult {
                    gene: payload.gene.unwrap_or_else(|| request.gene.clone()),
                    km_data: payload.km_data,
                    sample_count: payload.sample_count,
                }))
            }
            AnalysisType::Differential => {
                let feature = required_feature(request)?;
                let analyses = AnalysesPayload::parse(raw)?;
                match analyses.gene_table() {
                    Some(genes) => Ok(AnalysisResult::Differential(DifferentialResult {
                        gene: request.gene.clone(),
                        feature,
                        genes: genes?,
                    })),
                    None => self.stratified(request, feature, &analyses),
                }
            }
            AnalysisType::Methylation => {
                let feature = required_feature(request)?;
                let analyses = AnalysesPayload::parse(raw)?;
                match analyses.methylation_groups() {
                    Some(groups) => Ok(AnalysisResult::Methylation(MethylationResult {
                        gene: request.gene.clone(),
                        groups: groups?,
                    })),
                    None => self.stratified(request, feature, &analyses),
                }
            }
        }
    }

    /// Parse `raw` and build its chart.
    pub fn normalize(&self, request: &AnalysisRequest, raw: &Value) -> Result<NormalizedResult> {
        let result = self.parse(request, raw)?;
        let spec = ChartSpec::from_result(&result);
        debug!(
            "Normalized {} result into {} ({} series)",
            request.analysis_type,
            spec.kind.display_name(),
            spec.series.len()
        );
        Ok(NormalizedResult { result, spec })
    }

    fn stratified(
        &self,
        request: &AnalysisRequest,
        feature: ClinicalFeature,
        analyses: &AnalysesPayload,
    ) -> Result<AnalysisResult> {
        let block = analyses
            .feature_block(feature.as_str())
            .ok_or_else(|| AnalysisError::MissingData(format!("analyses.{feature}")))??;

        let remapped = self.remapper.remap(&feature, block.plots);
        if remapped.origin.has_placeholders() {
            warn!(
                "Stratified plot for {} by {} contains placeholder statistics ({:?})",
                request.gene, feature, remapped.origin
            );
        }

        Ok(AnalysisResult::Stratified(StratifiedResult {
            gene: request.gene.clone(),
            feature,
            p_value: block.p_value,
            correlation: block.correlation,
            plots: remapped.plots,
            origin: remapped.origin,
        }))
    }
}

fn required_feature(request: &AnalysisRequest) -> Result<ClinicalFeature> {
    request.feature().cloned().ok_or_else(|| {
        AnalysisError::Validation(format!(
            "Clinical feature is required for {} analysis",
            request.analysis_type
        ))
    })
}
