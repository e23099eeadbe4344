use super::{ChartRenderer, DrawingSurface, Frame, draw_xy_series, required_series};
use crate::chart::{ChartKind, ChartSpec};
use crate::error::Result;

/// Scatter plot with an optional regression line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationRenderer;

impl ChartRenderer for CorrelationRenderer {
    fn kind(&self) -> ChartKind {
        ChartKind::Correlation
    }

    fn draw_body(
        &self,
        spec: &ChartSpec,
        frame: &Frame,
        surface: &mut dyn DrawingSurface,
    ) -> Result<()> {
        draw_xy_series(frame, required_series(spec, "points")?, surface)?;
        // absent when the fit is undefined
        if let Some(regression) = spec.series_named("regression") {
            draw_xy_series(frame, regression, surface)?;
        }
        Ok(())
    }
}
