//! Canonical chart model.
//!
//! A [`ChartSpec`] is the drawing-independent description of a chart: its
//! domains, data series and annotations. It is built once from a validated
//! [`AnalysisResult`](crate::types::AnalysisResult) and then handed to a
//! renderer.

mod build;
pub mod palette;
pub mod scale;

pub use build::{
    box_value_domain, correlation_spec, methylation_spec, mutation_scatter_spec, stratified_spec,
    summary_km_spec, survival_spec, volcano_spec,
};
pub use scale::{BandScale, LinearScale};

use serde::{Deserialize, Serialize};

use crate::types::{AnalysisResult, BoxStats};

/// Which chart a spec describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Correlation,
    Survival,
    Volcano,
    StratifiedBox,
    MethylationBox,
}

impl ChartKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Correlation => "Correlation Scatter",
            Self::Survival => "Kaplan-Meier Curve",
            Self::Volcano => "Volcano Plot",
            Self::StratifiedBox => "Stratified Box Plot",
            Self::MethylationBox => "Methylation Box Plot",
        }
    }
}

/// Axis domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Domain {
    /// Numeric interval; `nice` extends it to round tick values.
    Continuous { min: f64, max: f64, nice: bool },
    /// Ordered category labels laid out as bands.
    Categorical { labels: Vec<String>, padding: f64 },
}

impl Domain {
    pub fn continuous(min: f64, max: f64) -> Self {
        Self::Continuous {
            min,
            max,
            nice: false,
        }
    }
}

/// Axis titles. `x_offset` is the distance of the x title below the plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisLabels {
    pub x: String,
    pub y: String,
    pub x_offset: f64,
}

/// Stroke style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
    /// Dash length, for dashed lines.
    pub dash: Option<f64>,
}

impl Stroke {
    pub fn solid(color: &str, width: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
            dash: None,
        }
    }

    pub fn dashed(color: &str, width: f64, dash: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
            dash: Some(dash),
        }
    }
}

/// A point mark in data coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub fill: Option<String>,
    pub stroke: Option<Stroke>,
    pub opacity: f64,
}

impl Marker {
    pub fn filled(x: f64, y: f64, radius: f64, fill: &str) -> Self {
        Self {
            x,
            y,
            radius,
            fill: Some(fill.to_string()),
            stroke: None,
            opacity: 1.0,
        }
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// An unfilled ring.
    pub fn ring(x: f64, y: f64, radius: f64, stroke: Stroke) -> Self {
        Self {
            x,
            y,
            radius,
            fill: None,
            stroke: Some(stroke),
            opacity: 1.0,
        }
    }
}

/// How consecutive line vertices are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    Linear,
    /// Hold each value until the next x, then jump.
    StepAfter,
}

/// One box of a box plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxGlyph {
    pub label: String,
    pub stats: BoxStats,
    pub fill: String,
}

/// A named data series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Series {
    Scatter {
        name: String,
        points: Vec<Marker>,
    },
    Line {
        name: String,
        points: Vec<(f64, f64)>,
        curve: Curve,
        stroke: Stroke,
    },
    Boxes {
        name: String,
        boxes: Vec<BoxGlyph>,
    },
}

impl Series {
    pub fn name(&self) -> &str {
        match self {
            Self::Scatter { name, .. } | Self::Line { name, .. } | Self::Boxes { name, .. } => name,
        }
    }
}

/// A line of statistics text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub text: String,
    pub bold: bool,
}

impl StatLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// The key shape drawn next to a legend entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Swatch {
    Dot {
        fill: Option<String>,
        stroke: Option<Stroke>,
    },
    Square {
        fill: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendItem {
    pub label: String,
    pub swatch: Swatch,
}

/// Text and markers drawn over the data.
///
/// `inset` positions are measured leftwards from the right edge of the plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// Lines of text stacked from the top of the plot.
    Stats { inset: f64, lines: Vec<StatLine> },
    Legend {
        inset: f64,
        top: f64,
        spacing: f64,
        items: Vec<LegendItem>,
    },
    /// Bold text next to a data point.
    Label { x: f64, y: f64, text: String },
}

/// Drawing-independent description of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: AxisLabels,
    pub domain_x: Domain,
    pub domain_y: Domain,
    pub rotate_x_labels: bool,
    pub series: Vec<Series>,
    pub annotations: Vec<Annotation>,
}

impl ChartSpec {
    /// Build the chart for a validated analysis result.
    pub fn from_result(result: &AnalysisResult) -> Self {
        match result {
            AnalysisResult::Correlation(r) => correlation_spec(r),
            AnalysisResult::Survival(r) => survival_spec(r),
            AnalysisResult::Differential(r) => volcano_spec(r),
            AnalysisResult::Stratified(r) => stratified_spec(r),
            AnalysisResult::Methylation(r) => methylation_spec(r),
        }
    }

    /// Look up a series by name.
    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name() == name)
    }

    /// All stat text lines, in order.
    pub fn stat_lines(&self) -> impl Iterator<Item = &StatLine> {
        self.annotations
            .iter()
            .filter_map(|a| match a {
                Annotation::Stats { lines, .. } => Some(lines),
                _ => None,
            })
            .flatten()
    }
}

impl AnalysisResult {
    /// The chart kind this result is drawn as.
    pub fn chart_kind(&self) -> ChartKind {
        match self {
            Self::Correlation(_) => ChartKind::Correlation,
            Self::Survival(_) => ChartKind::Survival,
            Self::Differential(_) => ChartKind::Volcano,
            Self::Stratified(_) => ChartKind::StratifiedBox,
            Self::Methylation(_) => ChartKind::MethylationBox,
        }
    }
}
