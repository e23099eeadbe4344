//! Domain types shared across the analysis pipeline.
//!
//! Requests flow out to the analysis service; the normalized
//! [`AnalysisResult`] variants flow back in and feed the chart builders.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{AnalysisError, Result};
use crate::normalizer::PlotOrigin;

// ============================================================================
// Request Types
// ============================================================================

/// The statistical analysis a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Expression correlation between two genes.
    Correlation,
    /// Differential expression across a clinical feature.
    Differential,
    /// Kaplan-Meier survival for one gene.
    Survival,
    /// Methylation levels across a clinical feature.
    #[serde(alias = "Methylation")]
    Methylation,
}

impl AnalysisType {
    /// Get a human-readable name for this analysis type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Correlation => "Correlation Analysis",
            Self::Differential => "Differential Expression",
            Self::Survival => "Survival Analysis",
            Self::Methylation => "Methylation Analysis",
        }
    }

    /// Wire name sent in the `type` field of the request body.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correlation => "correlation",
            Self::Differential => "differential",
            Self::Survival => "survival",
            Self::Methylation => "methylation",
        }
    }

    /// Whether a request of this type must name a clinical feature.
    pub fn requires_clinical_feature(&self) -> bool {
        matches!(self, Self::Differential | Self::Methylation)
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clinical feature used to stratify an analysis.
///
/// Known features keep their display spelling on the wire ("Cancer State",
/// "Tumor Histology"). Anything else is carried through as [`Other`](Self::Other).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClinicalFeature {
    Age,
    Gender,
    Race,
    CancerState,
    TumorHistology,
    Other(String),
}

impl ClinicalFeature {
    /// The feature's display name, which is also its wire name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::Race => "Race",
            Self::CancerState => "Cancer State",
            Self::TumorHistology => "Tumor Histology",
            Self::Other(name) => name,
        }
    }

    /// Whether the feature partitions patients into named categories
    /// (as opposed to expression or age groups).
    pub fn is_categorical(&self) -> bool {
        matches!(
            self,
            Self::Gender | Self::Race | Self::CancerState | Self::TumorHistology
        )
    }
}

impl From<String> for ClinicalFeature {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "age" => Self::Age,
            "gender" => Self::Gender,
            "race" => Self::Race,
            "cancer state" => Self::CancerState,
            "tumor histology" => Self::TumorHistology,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ClinicalFeature {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ClinicalFeature> for String {
    fn from(value: ClinicalFeature) -> Self {
        match value {
            ClinicalFeature::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ClinicalFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single analysis submission, created on submit and dropped once resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub dataset_id: String,
    pub analysis_type: AnalysisType,
    pub gene: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_feature: Option<ClinicalFeature>,
}

impl AnalysisRequest {
    /// Create a request without a second gene or clinical feature.
    pub fn new(
        dataset_id: impl Into<String>,
        analysis_type: AnalysisType,
        gene: impl Into<String>,
    ) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            analysis_type,
            gene: gene.into(),
            gene2: None,
            clinical_feature: None,
        }
    }

    /// Set the second gene (correlation only).
    pub fn with_gene2(mut self, gene2: impl Into<String>) -> Self {
        self.gene2 = Some(gene2.into());
        self
    }

    /// Set the clinical feature used for stratification.
    pub fn with_clinical_feature(mut self, feature: impl Into<ClinicalFeature>) -> Self {
        self.clinical_feature = Some(feature.into());
        self
    }

    /// The clinical feature, if present and non-blank.
    pub fn feature(&self) -> Option<&ClinicalFeature> {
        self.clinical_feature
            .as_ref()
            .filter(|f| !f.as_str().trim().is_empty())
    }

    /// Check that every field required by the analysis type is present.
    ///
    /// Runs before any network call; failures are form errors.
    pub fn validate(&self) -> Result<()> {
        if self.dataset_id.trim().is_empty() {
            return Err(AnalysisError::Validation(
                "Dataset is required".to_string(),
            ));
        }

        if self.gene.trim().is_empty() {
            return Err(AnalysisError::Validation("Gene is required".to_string()));
        }

        if self.analysis_type == AnalysisType::Correlation
            && self.gene2.as_deref().is_none_or(|g| g.trim().is_empty())
        {
            return Err(AnalysisError::Validation(
                "Second gene is required for correlation analysis".to_string(),
            ));
        }

        if self.analysis_type.requires_clinical_feature() && self.feature().is_none() {
            return Err(AnalysisError::Validation(format!(
                "Clinical feature is required for {} analysis",
                self.analysis_type
            )));
        }

        Ok(())
    }

    /// The JSON body posted to the analysis endpoint.
    pub fn body(&self) -> AnalysisRequestBody<'_> {
        AnalysisRequestBody {
            analysis_type: self.analysis_type,
            gene: &self.gene,
            gene2: self.gene2.as_deref(),
            clinical_feature: self.feature().map(ClinicalFeature::as_str),
        }
    }
}

/// Wire body of an analysis request: `{type, gene, gene2, clinicalFeature}`.
#[derive(Debug, Serialize)]
pub struct AnalysisRequestBody<'a> {
    #[serde(rename = "type")]
    pub analysis_type: AnalysisType,
    pub gene: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene2: Option<&'a str>,
    #[serde(rename = "clinicalFeature", skip_serializing_if = "Option::is_none")]
    pub clinical_feature: Option<&'a str>,
}

// ============================================================================
// Result Types
// ============================================================================

/// Five-number summary of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub min: f64,
    #[serde(rename = "Q1")]
    pub q1: f64,
    pub median: f64,
    #[serde(rename = "Q3")]
    pub q3: f64,
    pub max: f64,
}

impl BoxStats {
    pub fn new(min: f64, q1: f64, median: f64, q3: f64, max: f64) -> Self {
        Self {
            min,
            q1,
            median,
            q3,
            max,
        }
    }

    /// The five values in ascending order of their role.
    pub fn values(&self) -> [f64; 5] {
        [self.min, self.q1, self.median, self.q3, self.max]
    }

    /// `min <= Q1 <= median <= Q3 <= max`, all finite.
    pub fn is_ordered(&self) -> bool {
        let v = self.values();
        v.iter().all(|x| x.is_finite()) && v.windows(2).all(|w| w[0] <= w[1])
    }
}

/// A labelled box: one category of a stratified or methylation plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub label: String,
    pub stats: BoxStats,
}

impl CategoryStats {
    pub fn new(label: impl Into<String>, stats: BoxStats) -> Self {
        Self {
            label: label.into(),
            stats,
        }
    }
}

/// Paired expression values of two genes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub gene_a: String,
    pub gene_b: String,
    pub points_a: Vec<f64>,
    pub points_b: Vec<f64>,
}

/// One Kaplan-Meier observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KmPoint {
    pub time: f64,
    pub survival: f64,
    pub censored: bool,
}

/// Kaplan-Meier data, sorted by time ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalResult {
    pub gene: String,
    pub km_data: Vec<KmPoint>,
    pub sample_count: u64,
}

/// One row of a differential-expression table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneExpression {
    pub name: String,
    pub log2_fold_change: f64,
    pub p_value: f64,
}

/// Differential expression over a gene table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialResult {
    /// The requested gene, highlighted when present in the table.
    pub gene: String,
    pub feature: ClinicalFeature,
    pub genes: Vec<GeneExpression>,
}

/// Box statistics of one gene broken down by a clinical feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratifiedResult {
    pub gene: String,
    pub feature: ClinicalFeature,
    pub p_value: Option<f64>,
    /// Correlation coefficient returned for continuous features (Age).
    pub correlation: Option<f64>,
    /// Categories in target order, after remapping.
    pub plots: Vec<CategoryStats>,
    pub origin: PlotOrigin,
}

/// Methylation levels per structural group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethylationResult {
    pub gene: String,
    pub groups: Vec<CategoryStats>,
}

/// A validated analysis result, one variant per chart kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisResult {
    Correlation(CorrelationResult),
    Survival(SurvivalResult),
    Differential(DifferentialResult),
    Stratified(StratifiedResult),
    Methylation(MethylationResult),
}

// ============================================================================
// Dataset Types
// ============================================================================

/// A dataset entry as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    pub name: String,
    /// Cancer type the dataset belongs to.
    #[serde(rename = "type")]
    pub cancer_type: String,
}

/// One patient row of a dataset's clinical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    pub patient_id: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub age: Option<f64>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub survival_months: Option<f64>,
}

/// Accept a number, a numeric string, or null.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ------------------------------------------------------------------------
    // AnalysisType
    // ------------------------------------------------------------------------

    #[test]
    fn test_analysis_type_accepts_legacy_spelling() {
        let t: AnalysisType = serde_json::from_str("\"Methylation\"").unwrap();
        assert_eq!(t, AnalysisType::Methylation);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"methylation\"");
    }

    #[test]
    fn test_analysis_type_display_name() {
        assert_eq!(AnalysisType::Survival.display_name(), "Survival Analysis");
        assert!(AnalysisType::Differential.requires_clinical_feature());
        assert!(!AnalysisType::Correlation.requires_clinical_feature());
    }

    // ------------------------------------------------------------------------
    // ClinicalFeature
    // ------------------------------------------------------------------------

    #[test]
    fn test_clinical_feature_parsing() {
        assert_eq!(ClinicalFeature::from("Cancer State"), ClinicalFeature::CancerState);
        assert_eq!(ClinicalFeature::from("race"), ClinicalFeature::Race);
        assert_eq!(
            ClinicalFeature::from("BRCA1 Expression"),
            ClinicalFeature::Other("BRCA1 Expression".to_string())
        );
    }

    #[test]
    fn test_clinical_feature_serde_uses_display_name() {
        let json = serde_json::to_string(&ClinicalFeature::TumorHistology).unwrap();
        assert_eq!(json, "\"Tumor Histology\"");
        let parsed: ClinicalFeature = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ClinicalFeature::TumorHistology);
    }

    #[test]
    fn test_clinical_feature_is_categorical() {
        assert!(ClinicalFeature::Gender.is_categorical());
        assert!(ClinicalFeature::CancerState.is_categorical());
        assert!(!ClinicalFeature::Age.is_categorical());
        assert!(!ClinicalFeature::Other("x".into()).is_categorical());
    }

    // ------------------------------------------------------------------------
    // AnalysisRequest
    // ------------------------------------------------------------------------

    #[test]
    fn test_validate_requires_gene() {
        let req = AnalysisRequest::new("brca", AnalysisType::Survival, "  ");
        let err = req.validate().unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
        assert_eq!(err.user_message().as_deref(), Some("Gene is required"));
    }

    #[test]
    fn test_validate_correlation_requires_gene2() {
        let req = AnalysisRequest::new("brca", AnalysisType::Correlation, "TP53");
        assert!(matches!(req.validate(), Err(AnalysisError::Validation(_))));

        let req = req.with_gene2("BRCA1");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_differential_requires_feature() {
        let req = AnalysisRequest::new("brca", AnalysisType::Differential, "TP53");
        assert!(matches!(req.validate(), Err(AnalysisError::Validation(_))));

        let req = req.with_clinical_feature("");
        assert!(req.validate().is_err());

        let req = req.with_clinical_feature("Race");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_survival_ignores_feature() {
        let req = AnalysisRequest::new("brca", AnalysisType::Survival, "TP53");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_request_body_wire_format() {
        let req = AnalysisRequest::new("brca", AnalysisType::Methylation, "TP53")
            .with_clinical_feature(ClinicalFeature::CancerState);
        let body = serde_json::to_value(req.body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "type": "methylation",
                "gene": "TP53",
                "clinicalFeature": "Cancer State"
            })
        );
    }

    // ------------------------------------------------------------------------
    // BoxStats / dataset rows
    // ------------------------------------------------------------------------

    #[test]
    fn test_box_stats_wire_keys() {
        let stats: BoxStats = serde_json::from_str(
            r#"{"min": 1.0, "Q1": 2.0, "median": 3.0, "Q3": 4.0, "max": 5.0}"#,
        )
        .unwrap();
        assert_eq!(stats, BoxStats::new(1.0, 2.0, 3.0, 4.0, 5.0));
        assert!(stats.is_ordered());
        assert!(!BoxStats::new(1.0, 3.0, 2.0, 4.0, 5.0).is_ordered());
        assert!(!BoxStats::new(f64::NAN, 1.0, 2.0, 3.0, 4.0).is_ordered());
    }

    #[test]
    fn test_clinical_record_lenient_numbers() {
        let record: ClinicalRecord = serde_json::from_str(
            r#"{"patient_id": "TCGA-A1", "age": "58", "race": "WHITE",
                "gender": "Female", "stage": null, "status": "Alive",
                "survival_months": 31.2}"#,
        )
        .unwrap();
        assert_eq!(record.age, Some(58.0));
        assert_eq!(record.stage, None);
        assert_eq!(record.survival_months, Some(31.2));
    }
}
