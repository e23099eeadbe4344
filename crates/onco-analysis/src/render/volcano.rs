use super::{ChartRenderer, DrawingSurface, Frame, draw_xy_series, required_series};
use crate::chart::{ChartKind, ChartSpec};
use crate::error::Result;

const REFERENCE_LINES: [&str; 3] = ["significance_threshold", "fold_change_down", "fold_change_up"];

/// Volcano plot: threshold lines under the gene points, then the
/// highlighted gene ring.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolcanoRenderer;

impl ChartRenderer for VolcanoRenderer {
    fn kind(&self) -> ChartKind {
        ChartKind::Volcano
    }

    fn draw_body(
        &self,
        spec: &ChartSpec,
        frame: &Frame,
        surface: &mut dyn DrawingSurface,
    ) -> Result<()> {
        for name in REFERENCE_LINES {
            draw_xy_series(frame, required_series(spec, name)?, surface)?;
        }
        draw_xy_series(frame, required_series(spec, "genes")?, surface)?;
        if let Some(highlight) = spec.series_named("highlight") {
            draw_xy_series(frame, highlight, surface)?;
        }
        Ok(())
    }
}
