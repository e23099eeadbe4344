//! Chart rendering onto drawing surfaces.
//!
//! Every chart kind has a [`ChartRenderer`]. The provided
//! [`ChartRenderer::render`] clears the surface and draws the shared frame
//! (title, axes, axis labels), then the kind-specific body, then the
//! annotations. Rendering the same spec twice leaves the surface in the same
//! state as rendering it once.

mod boxplot;
mod correlation;
mod survival;
pub mod surface;
pub mod svg;
mod volcano;

pub use boxplot::{MethylationBoxRenderer, StratifiedBoxRenderer};
pub use correlation::CorrelationRenderer;
pub use surface::{
    AxisOrient, ChartId, DrawingSurface, Primitive, Scene, SceneSurface, SurfaceRegistry,
    TextAnchor, TextStyle, Tick,
};
pub use survival::SurvivalRenderer;
pub use volcano::VolcanoRenderer;

use tracing::trace;

use crate::chart::scale::DEFAULT_TICKS;
use crate::chart::{
    Annotation, BandScale, ChartKind, ChartSpec, Curve, Domain, LinearScale, Marker, Series,
    Stroke, Swatch,
};
use crate::config::ChartConfig;
use crate::error::{AnalysisError, Result};
use crate::stats::step_after_vertices;

const TITLE_FONT_SIZE: f64 = 16.0;
const LABEL_FONT_SIZE: f64 = 12.0;
const TITLE_OFFSET: f64 = -20.0;
const Y_LABEL_OFFSET: f64 = -40.0;
const STAT_TOP: f64 = 20.0;
const STAT_LINE_HEIGHT: f64 = 20.0;
const LEGEND_DOT_RADIUS: f64 = 4.0;
const LEGEND_SQUARE: f64 = 15.0;

// ============================================================================
// Frame
// ============================================================================

/// Horizontal scale of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum XScale {
    Linear(LinearScale),
    Band(BandScale),
}

/// Scales and plot-area size for one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub x: XScale,
    pub y: LinearScale,
}

impl Frame {
    /// Build the scales for `spec` inside the plot area of `config`.
    pub fn new(spec: &ChartSpec, config: &ChartConfig) -> Result<Self> {
        config.validate()?;
        let width = config.inner_width();
        let height = config.inner_height();

        let x = match &spec.domain_x {
            Domain::Continuous { min, max, nice } => {
                XScale::Linear(linear(*min, *max, (0.0, width), *nice))
            }
            Domain::Categorical { labels, padding } => {
                XScale::Band(BandScale::new(labels.clone(), (0.0, width), *padding))
            }
        };
        let y = match &spec.domain_y {
            Domain::Continuous { min, max, nice } => linear(*min, *max, (height, 0.0), *nice),
            Domain::Categorical { .. } => {
                return Err(AnalysisError::Render(format!(
                    "{} has a categorical y axis",
                    spec.kind.display_name()
                )));
            }
        };

        Ok(Self {
            width,
            height,
            x,
            y,
        })
    }

    /// The continuous x scale, for charts that plot numeric x values.
    pub fn x_linear(&self) -> Result<&LinearScale> {
        match &self.x {
            XScale::Linear(scale) => Ok(scale),
            XScale::Band(_) => Err(AnalysisError::Render(
                "numeric series drawn on a categorical x axis".to_string(),
            )),
        }
    }

    /// The band x scale, for box plots.
    pub fn x_band(&self) -> Result<&BandScale> {
        match &self.x {
            XScale::Band(scale) => Ok(scale),
            XScale::Linear(_) => Err(AnalysisError::Render(
                "box series drawn on a continuous x axis".to_string(),
            )),
        }
    }

    /// Map a data point to plot coordinates.
    pub fn point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok((self.x_linear()?.map(x), self.y.map(y)))
    }
}

fn linear(min: f64, max: f64, range: (f64, f64), nice: bool) -> LinearScale {
    let scale = LinearScale::new((min, max), range);
    if nice { scale.nice(DEFAULT_TICKS) } else { scale }
}

fn format_tick(value: f64, precision: usize) -> String {
    let text = format!("{value:.precision$}");
    // d3 prints negative zero as "0"
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}

fn linear_ticks(scale: &LinearScale) -> Vec<Tick> {
    let precision = scale.tick_precision(DEFAULT_TICKS);
    scale
        .ticks(DEFAULT_TICKS)
        .into_iter()
        .map(|v| Tick {
            offset: scale.map(v),
            label: format_tick(v, precision),
        })
        .collect()
}

fn band_ticks(scale: &BandScale) -> Vec<Tick> {
    scale
        .labels()
        .iter()
        .filter_map(|label| {
            scale.center(label).map(|offset| Tick {
                offset,
                label: label.clone(),
            })
        })
        .collect()
}

// ============================================================================
// Shared drawing
// ============================================================================

fn text(position: (f64, f64), content: impl Into<String>, style: TextStyle) -> Primitive {
    Primitive::Text {
        position,
        text: content.into(),
        style,
    }
}

fn draw_frame(spec: &ChartSpec, frame: &Frame, surface: &mut dyn DrawingSurface) {
    surface.draw(text(
        (frame.width / 2.0, TITLE_OFFSET),
        spec.title.as_str(),
        TextStyle::new(TITLE_FONT_SIZE)
            .bold()
            .anchor(TextAnchor::Middle),
    ));

    let x_ticks = match &frame.x {
        XScale::Linear(scale) => linear_ticks(scale),
        XScale::Band(scale) => band_ticks(scale),
    };
    surface.draw(Primitive::Axis {
        orient: AxisOrient::Bottom,
        offset: frame.height,
        range: (0.0, frame.width),
        ticks: x_ticks,
        rotate_labels: spec.rotate_x_labels,
    });
    surface.draw(Primitive::Axis {
        orient: AxisOrient::Left,
        offset: 0.0,
        range: (frame.height, 0.0),
        ticks: linear_ticks(&frame.y),
        rotate_labels: false,
    });

    surface.draw(text(
        (frame.width / 2.0, frame.height + spec.labels.x_offset),
        spec.labels.x.as_str(),
        TextStyle::new(LABEL_FONT_SIZE).anchor(TextAnchor::Middle),
    ));
    surface.draw(text(
        (-frame.height / 2.0, Y_LABEL_OFFSET),
        spec.labels.y.as_str(),
        TextStyle::new(LABEL_FONT_SIZE)
            .anchor(TextAnchor::Middle)
            .rotate(-90.0),
    ));
}

/// Draw point markers in data coordinates.
pub(crate) fn draw_markers(
    frame: &Frame,
    markers: &[Marker],
    surface: &mut dyn DrawingSurface,
) -> Result<()> {
    for m in markers {
        surface.draw(Primitive::Circle {
            center: frame.point(m.x, m.y)?,
            radius: m.radius,
            fill: m.fill.clone(),
            stroke: m.stroke.clone(),
            opacity: m.opacity,
        });
    }
    Ok(())
}

/// Draw a line series in data coordinates.
pub(crate) fn draw_line(
    frame: &Frame,
    points: &[(f64, f64)],
    curve: Curve,
    stroke: &Stroke,
    surface: &mut dyn DrawingSurface,
) -> Result<()> {
    let vertices = match curve {
        Curve::Linear => points.to_vec(),
        Curve::StepAfter => step_after_vertices(points),
    };
    let mapped = vertices
        .iter()
        .map(|&(x, y)| frame.point(x, y))
        .collect::<Result<Vec<_>>>()?;

    match mapped.as_slice() {
        [] | [_] => {}
        [from, to] => surface.draw(Primitive::Line {
            from: *from,
            to: *to,
            stroke: stroke.clone(),
        }),
        _ => surface.draw(Primitive::Path {
            points: mapped,
            stroke: stroke.clone(),
        }),
    }
    Ok(())
}

/// Draw a scatter or line series; box series are rejected.
pub(crate) fn draw_xy_series(
    frame: &Frame,
    series: &Series,
    surface: &mut dyn DrawingSurface,
) -> Result<()> {
    match series {
        Series::Scatter { points, .. } => draw_markers(frame, points, surface),
        Series::Line {
            points,
            curve,
            stroke,
            ..
        } => draw_line(frame, points, *curve, stroke, surface),
        Series::Boxes { name, .. } => Err(AnalysisError::Render(format!(
            "box series '{name}' on an x/y chart"
        ))),
    }
}

/// Look up a series every spec of this kind carries.
pub(crate) fn required_series<'a>(spec: &'a ChartSpec, name: &str) -> Result<&'a Series> {
    spec.series_named(name).ok_or_else(|| {
        AnalysisError::Render(format!(
            "{} is missing its '{name}' series",
            spec.kind.display_name()
        ))
    })
}

fn draw_annotations(
    spec: &ChartSpec,
    frame: &Frame,
    surface: &mut dyn DrawingSurface,
) -> Result<()> {
    for annotation in &spec.annotations {
        match annotation {
            Annotation::Stats { inset, lines } => {
                let x = frame.width - inset;
                for (i, line) in lines.iter().enumerate() {
                    let mut style = TextStyle::new(LABEL_FONT_SIZE);
                    if line.bold {
                        style = style.bold();
                    }
                    let y = STAT_TOP + STAT_LINE_HEIGHT * i as f64;
                    surface.draw(text((x, y), line.text.as_str(), style));
                }
            }
            Annotation::Legend {
                inset,
                top,
                spacing,
                items,
            } => {
                let x = frame.width - inset;
                for (i, item) in items.iter().enumerate() {
                    let y = top + spacing * i as f64;
                    let label_at = match &item.swatch {
                        Swatch::Dot { fill, stroke } => {
                            surface.draw(Primitive::Circle {
                                center: (x, y),
                                radius: LEGEND_DOT_RADIUS,
                                fill: fill.clone(),
                                stroke: stroke.clone(),
                                opacity: 1.0,
                            });
                            (x + 15.0, y + 4.0)
                        }
                        Swatch::Square { fill } => {
                            surface.draw(Primitive::Rect {
                                origin: (x, y),
                                width: LEGEND_SQUARE,
                                height: LEGEND_SQUARE,
                                fill: Some(fill.clone()),
                                stroke: None,
                                opacity: 1.0,
                            });
                            (x + 20.0, y + 12.0)
                        }
                    };
                    surface.draw(text(
                        label_at,
                        item.label.as_str(),
                        TextStyle::new(LABEL_FONT_SIZE),
                    ));
                }
            }
            Annotation::Label { x, y, text: label } => {
                let (px, py) = frame.point(*x, *y)?;
                surface.draw(text(
                    (px + 10.0, py - 10.0),
                    label.as_str(),
                    TextStyle::new(LABEL_FONT_SIZE).bold(),
                ));
            }
        }
    }
    Ok(())
}

// ============================================================================
// Renderer trait
// ============================================================================

/// Draws one kind of chart.
pub trait ChartRenderer: Send + Sync {
    fn kind(&self) -> ChartKind;

    /// Draw the data of `spec`; the frame and annotations are handled by
    /// [`render`](Self::render).
    fn draw_body(
        &self,
        spec: &ChartSpec,
        frame: &Frame,
        surface: &mut dyn DrawingSurface,
    ) -> Result<()>;

    /// Clear `surface` and draw `spec` on it.
    fn render(
        &self,
        spec: &ChartSpec,
        config: &ChartConfig,
        surface: &mut dyn DrawingSurface,
    ) -> Result<()> {
        if spec.kind != self.kind() {
            return Err(AnalysisError::Render(format!(
                "{} renderer cannot draw a {}",
                self.kind().display_name(),
                spec.kind.display_name()
            )));
        }

        let frame = Frame::new(spec, config)?;
        surface.clear(config);
        trace!("Rendering {} ({}x{})", spec.kind.display_name(), frame.width, frame.height);

        draw_frame(spec, &frame, surface);
        self.draw_body(spec, &frame, surface)?;
        draw_annotations(spec, &frame, surface)
    }
}

static CORRELATION: CorrelationRenderer = CorrelationRenderer;
static SURVIVAL: SurvivalRenderer = SurvivalRenderer;
static VOLCANO: VolcanoRenderer = VolcanoRenderer;
static STRATIFIED_BOX: StratifiedBoxRenderer = StratifiedBoxRenderer;
static METHYLATION_BOX: MethylationBoxRenderer = MethylationBoxRenderer;

/// The renderer for `kind`.
pub fn renderer_for(kind: ChartKind) -> &'static dyn ChartRenderer {
    match kind {
        ChartKind::Correlation => &CORRELATION,
        ChartKind::Survival => &SURVIVAL,
        ChartKind::Volcano => &VOLCANO,
        ChartKind::StratifiedBox => &STRATIFIED_BOX,
        ChartKind::MethylationBox => &METHYLATION_BOX,
    }
}

/// Render `spec` with the renderer for its kind.
pub fn render_spec(
    spec: &ChartSpec,
    config: &ChartConfig,
    surface: &mut dyn DrawingSurface,
) -> Result<()> {
    renderer_for(spec.kind).render(spec, config, surface)
}
