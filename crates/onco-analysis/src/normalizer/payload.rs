//! Wire shapes of the analysis endpoint and their validation.
//!
//! Every shape is deserialized straight from the raw `serde_json::Value`.
//! A missing or mistyped field is reported as `MissingData` naming the field.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{AnalysisError, Result};
use crate::stats::sort_by_time;
use crate::types::{BoxStats, CategoryStats, GeneExpression, KmPoint};

/// Key of the methylation groups inside `analyses`.
pub const METHYLATIONS_KEY: &str = "Methylations";
/// Key of the differential gene table inside `analyses`.
pub const GENES_KEY: &str = "genes";

fn missing(what: impl Into<String>) -> AnalysisError {
    AnalysisError::MissingData(what.into())
}

fn shaped<'de, T: Deserialize<'de>>(raw: &'de Value, what: &str) -> Result<T> {
    T::deserialize(raw).map_err(|e| missing(format!("malformed {what}: {e}")))
}

fn ensure_finite(values: &[f64], field: &str) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(missing(format!("{field}[{i}] is not a finite number"))),
        None => Ok(()),
    }
}

// ============================================================================
// Correlation
// ============================================================================

#[derive(Debug, Deserialize)]
struct CorrelationWire {
    #[serde(rename = "GeneA")]
    gene_a: Option<String>,
    #[serde(rename = "GeneB")]
    gene_b: Option<String>,
    #[serde(rename = "GeneA_point")]
    points_a: Option<Vec<f64>>,
    #[serde(rename = "GeneB_point")]
    points_b: Option<Vec<f64>>,
}

/// Validated correlation payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationPayload {
    pub gene_a: Option<String>,
    pub gene_b: Option<String>,
    pub points_a: Vec<f64>,
    pub points_b: Vec<f64>,
}

impl CorrelationPayload {
    pub fn parse(raw: &Value) -> Result<Self> {
        let wire: CorrelationWire = shaped(raw, "correlation result")?;
        let points_a = wire.points_a.ok_or_else(|| missing("GeneA_point"))?;
        let points_b = wire.points_b.ok_or_else(|| missing("GeneB_point"))?;

        if points_a.len() != points_b.len() {
            return Err(missing(format!(
                "GeneA_point and GeneB_point differ in length ({} vs {})",
                points_a.len(),
                points_b.len()
            )));
        }
        if points_a.is_empty() {
            return Err(missing("GeneA_point is empty"));
        }
        ensure_finite(&points_a, "GeneA_point")?;
        ensure_finite(&points_b, "GeneB_point")?;

        Ok(Self {
            gene_a: wire.gene_a.filter(|g| !g.is_empty()),
            gene_b: wire.gene_b.filter(|g| !g.is_empty()),
            points_a,
            points_b,
        })
    }
}

// ============================================================================
// Survival
// ============================================================================

#[derive(Debug, Deserialize)]
struct SurvivalWire {
    gene: Option<String>,
    #[serde(rename = "kmData")]
    km_data: Option<Vec<KmPoint>>,
    sample_count: Option<u64>,
}

/// Validated Kaplan-Meier payload, sorted by time.
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalPayload {
    pub gene: Option<String>,
    pub km_data: Vec<KmPoint>,
    pub sample_count: u64,
}

impl SurvivalPayload {
    pub fn parse(raw: &Value) -> Result<Self> {
        let wire: SurvivalWire = shaped(raw, "survival result")?;
        let mut km_data = wire.km_data.ok_or_else(|| missing("kmData"))?;
        validate_km(&mut km_data, "kmData")?;

        Ok(Self {
            gene: wire.gene,
            km_data,
            sample_count: wire.sample_count.unwrap_or(0),
        })
    }
}

/// Check a Kaplan-Meier series named `field` and sort it by time.
///
/// Requires at least one point, `time >= 0`, `survival` within `[0, 1]`
/// and survival that never increases over time.
pub fn validate_km(km_data: &mut [KmPoint], field: &str) -> Result<()> {
    if km_data.is_empty() {
        return Err(missing(format!("{field} is empty")));
    }

    for (i, p) in km_data.iter().enumerate() {
        if !p.time.is_finite() || p.time < 0.0 {
            return Err(missing(format!("{field}[{i}].time must be >= 0")));
        }
        if !(0.0..=1.0).contains(&p.survival) {
            return Err(missing(format!("{field}[{i}].survival must be within [0, 1]")));
        }
    }

    sort_by_time(km_data);
    if let Some(w) = km_data.windows(2).find(|w| w[1].survival > w[0].survival) {
        return Err(missing(format!(
            "{field}: survival increases from {} to {} at time {}",
            w[0].survival, w[1].survival, w[1].time
        )));
    }
    Ok(())
}

// ============================================================================
// Analyses blocks
// ============================================================================

/// The `analyses` object shared by stratified, differential and methylation
/// payloads. Keys keep their payload order.
#[derive(Debug, Clone)]
pub struct AnalysesPayload {
    analyses: Map<String, Value>,
}

impl AnalysesPayload {
    pub fn parse(raw: &Value) -> Result<Self> {
        match raw.get("analyses") {
            Some(Value::Object(analyses)) => Ok(Self {
                analyses: analyses.clone(),
            }),
            Some(_) => Err(missing("analyses is not an object")),
            None => Err(missing("analyses")),
        }
    }

    /// The differential gene table, if present.
    pub fn gene_table(&self) -> Option<Result<Vec<GeneExpression>>> {
        let raw = self.analyses.get(GENES_KEY)?;
        Some(parse_gene_table(raw))
    }

    /// The methylation groups, if present.
    pub fn methylation_groups(&self) -> Option<Result<Vec<CategoryStats>>> {
        let raw = self.analyses.get(METHYLATIONS_KEY)?;
        Some(parse_methylation_groups(raw))
    }

    /// The stratified block for a clinical feature, if present.
    pub fn feature_block(&self, feature: &str) -> Option<Result<FeatureBlock>> {
        let raw = self.analyses.get(feature)?;
        Some(FeatureBlock::parse(raw, feature))
    }
}

fn parse_gene_table(raw: &Value) -> Result<Vec<GeneExpression>> {
    let genes: Vec<GeneExpression> = shaped(raw, "gene table")?;
    for g in &genes {
        if !g.log2_fold_change.is_finite() {
            return Err(missing(format!("log2_fold_change of {} is not finite", g.name)));
        }
        if !(g.p_value > 0.0 && g.p_value <= 1.0) {
            return Err(missing(format!(
                "p_value of {} must be within (0, 1], got {}",
                g.name, g.p_value
            )));
        }
    }
    Ok(genes)
}

fn parse_methylation_groups(raw: &Value) -> Result<Vec<CategoryStats>> {
    let Value::Object(groups) = raw else {
        return Err(missing("Methylations is not an object"));
    };
    let groups = parse_box_map(groups, METHYLATIONS_KEY)?;
    if groups.is_empty() {
        return Err(missing("Methylations is empty"));
    }
    Ok(groups)
}

fn parse_box(raw: &Value, label: &str) -> Result<BoxStats> {
    let stats: BoxStats = shaped(raw, &format!("box statistics for '{label}'"))?;
    if !stats.is_ordered() {
        return Err(missing(format!(
            "box statistics for '{label}' are not ordered min <= Q1 <= median <= Q3 <= max"
        )));
    }
    Ok(stats)
}

fn parse_box_map(map: &Map<String, Value>, field: &str) -> Result<Vec<CategoryStats>> {
    map.iter()
        .map(|(label, raw)| {
            parse_box(raw, label)
                .map(|stats| CategoryStats::new(label.clone(), stats))
                .map_err(|e| e.with_context(field.to_string()))
        })
        .collect()
}

fn describe_column<'a>(table: &'a Map<String, Value>, key: &str) -> Result<&'a Map<String, Value>> {
    match table.get(key) {
        Some(Value::Object(col)) => Ok(col),
        _ => Err(missing(format!("stats.{key}"))),
    }
}

fn describe_value(col: &Map<String, Value>, key: &str, group: &str) -> Result<f64> {
    col.get(group)
        .and_then(Value::as_f64)
        .ok_or_else(|| missing(format!("stats.{key}.{group}")))
}

/// Per-group summary table as produced by a dataframe `describe()`:
/// `{"min": {group: v}, "25%": {..}, "50%": {..}, "75%": {..}, "max": {..}}`.
fn parse_describe_table(table: &Map<String, Value>) -> Result<Vec<CategoryStats>> {
    let min = describe_column(table, "min")?;
    let q1 = describe_column(table, "25%")?;
    let median = describe_column(table, "50%")?;
    let q3 = describe_column(table, "75%")?;
    let max = describe_column(table, "max")?;

    min.keys()
        .map(|group| {
            let stats = BoxStats::new(
                describe_value(min, "min", group)?,
                describe_value(q1, "25%", group)?,
                describe_value(median, "50%", group)?,
                describe_value(q3, "75%", group)?,
                describe_value(max, "max", group)?,
            );
            if !stats.is_ordered() {
                return Err(missing(format!("stats for '{group}' are not ordered")));
            }
            Ok(CategoryStats::new(group.clone(), stats))
        })
        .collect()
}

/// One feature's entry in `analyses`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBlock {
    pub p_value: Option<f64>,
    pub correlation: Option<f64>,
    /// Box statistics in payload order; `None` when the backend sent none.
    pub plots: Option<Vec<CategoryStats>>,
}

#[derive(Debug, Deserialize)]
struct FeatureWire {
    p_value: Option<f64>,
    correlation: Option<f64>,
    plots: Option<Map<String, Value>>,
    stats: Option<Map<String, Value>>,
}

impl FeatureBlock {
    fn parse(raw: &Value, feature: &str) -> Result<Self> {
        let wire: FeatureWire = shaped(raw, &format!("analyses.{feature}"))?;

        if let Some(p) = wire.p_value
            && !(0.0..=1.0).contains(&p)
        {
            return Err(missing(format!("analyses.{feature}.p_value out of range: {p}")));
        }
        if let Some(r) = wire.correlation
            && !r.is_finite()
        {
            return Err(missing(format!("analyses.{feature}.correlation is not finite")));
        }

        let plots = match (wire.plots, wire.stats) {
            (Some(plots), _) if !plots.is_empty() => Some(parse_box_map(&plots, "plots")?),
            (_, Some(table)) if !table.is_empty() => Some(parse_describe_table(&table)?),
            _ => None,
        };

        Ok(Self {
            p_value: wire.p_value,
            correlation: wire.correlation,
            plots,
        })
    }
}
