use super::{ChartRenderer, DrawingSurface, Frame, Primitive};
use crate::chart::{BoxGlyph, ChartKind, ChartSpec, Series, Stroke, palette};
use crate::error::{AnalysisError, Result};

const BOX_OPACITY: f64 = 0.8;
const MEDIAN_WIDTH: f64 = 2.0;

fn box_series(spec: &ChartSpec) -> Result<&[BoxGlyph]> {
    spec.series
        .iter()
        .find_map(|s| match s {
            Series::Boxes { boxes, .. } => Some(boxes.as_slice()),
            _ => None,
        })
        .ok_or_else(|| {
            AnalysisError::Render(format!("{} has no box series", spec.kind.display_name()))
        })
}

fn hline(y: f64, x0: f64, x1: f64, width: f64) -> Primitive {
    Primitive::Line {
        from: (x0, y),
        to: (x1, y),
        stroke: Stroke::solid(palette::BLACK, width),
    }
}

fn vline(x: f64, y0: f64, y1: f64) -> Primitive {
    Primitive::Line {
        from: (x, y0),
        to: (x, y1),
        stroke: Stroke::solid(palette::BLACK, 1.0),
    }
}

/// Draw one box per glyph: IQR rectangle, median, whiskers and caps.
fn draw_boxes(frame: &Frame, boxes: &[BoxGlyph], surface: &mut dyn DrawingSurface) -> Result<()> {
    let band = frame.x_band()?;
    let bw = band.bandwidth();
    let y = &frame.y;

    for glyph in boxes {
        let Some(x) = band.position(&glyph.label) else {
            return Err(AnalysisError::Render(format!(
                "box '{}' has no band on the x axis",
                glyph.label
            )));
        };
        let s = &glyph.stats;
        let center = x + bw / 2.0;

        surface.draw(Primitive::Rect {
            origin: (x, y.map(s.q3)),
            width: bw,
            height: (y.map(s.q1) - y.map(s.q3)).max(0.0),
            fill: Some(glyph.fill.clone()),
            stroke: Some(Stroke::solid(palette::BLACK, 1.0)),
            opacity: BOX_OPACITY,
        });
        surface.draw(hline(y.map(s.median), x, x + bw, MEDIAN_WIDTH));
        surface.draw(vline(center, y.map(s.q1), y.map(s.min)));
        surface.draw(vline(center, y.map(s.q3), y.map(s.max)));
        surface.draw(hline(y.map(s.min), x + bw / 4.0, x + bw * 3.0 / 4.0, 1.0));
        surface.draw(hline(y.map(s.max), x + bw / 4.0, x + bw * 3.0 / 4.0, 1.0));
    }
    Ok(())
}

/// Box plot of a gene across clinical feature categories.
#[derive(Debug, Clone, Copy, Default)]
pub struct StratifiedBoxRenderer;

impl ChartRenderer for StratifiedBoxRenderer {
    fn kind(&self) -> ChartKind {
        ChartKind::StratifiedBox
    }

    fn draw_body(
        &self,
        spec: &ChartSpec,
        frame: &Frame,
        surface: &mut dyn DrawingSurface,
    ) -> Result<()> {
        draw_boxes(frame, box_series(spec)?, surface)
    }
}

/// Box plot of methylation levels per group.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethylationBoxRenderer;

impl ChartRenderer for MethylationBoxRenderer {
    fn kind(&self) -> ChartKind {
        ChartKind::MethylationBox
    }

    fn draw_body(
        &self,
        spec: &ChartSpec,
        frame: &Frame,
        surface: &mut dyn DrawingSurface,
    ) -> Result<()> {
        draw_boxes(frame, box_series(spec)?, surface)
    }
}
