//! CSV export of chart data.
//!
//! Chart series export under their axis titles. Dataset summary sections
//! use the same writer (see [`crate::summary::SummarySection::to_csv`]).

use csv::Writer;

use crate::chart::{ChartSpec, Series};
use crate::error::{AnalysisError, Result};

/// Write a header record followed by `rows` as a CSV document.
pub fn write_csv<H, R>(headers: H, rows: impl IntoIterator<Item = R>) -> Result<String>
where
    H: IntoIterator,
    H::Item: AsRef<[u8]>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AnalysisError::Export(e.error().to_string()))?;
    String::from_utf8(bytes).map_err(|e| AnalysisError::Export(e.to_string()))
}

/// The series `name` of `spec` as CSV.
///
/// Scatter and line series give one `x,y` row per point, headed by the axis
/// titles. Box series give one row per category.
pub fn series_csv(spec: &ChartSpec, name: &str) -> Result<String> {
    let series = spec.series_named(name).ok_or_else(|| {
        AnalysisError::MissingData(format!(
            "{} has no '{name}' series",
            spec.kind.display_name()
        ))
    })?;
    let headers = [spec.labels.x.as_str(), spec.labels.y.as_str()];

    match series {
        Series::Scatter { points, .. } => write_csv(
            headers,
            points.iter().map(|m| [m.x.to_string(), m.y.to_string()]),
        ),
        Series::Line { points, .. } => write_csv(
            headers,
            points.iter().map(|(x, y)| [x.to_string(), y.to_string()]),
        ),
        Series::Boxes { boxes, .. } => write_csv(
            ["Category", "Min", "Q1", "Median", "Q3", "Max"],
            boxes.iter().map(|b| {
                let s = b.stats;
                [
                    b.label.clone(),
                    s.min.to_string(),
                    s.q1.to_string(),
                    s.median.to_string(),
                    s.q3.to_string(),
                    s.max.to_string(),
                ]
            }),
        ),
    }
}
