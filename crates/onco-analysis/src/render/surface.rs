//! Drawing surfaces and the per-chart surface registry.
//!
//! Renderers draw through the [`DrawingSurface`] trait in plot coordinates
//! (origin at the top-left of the area inside the margins). Surfaces are
//! owned by a [`SurfaceRegistry`] keyed by [`ChartId`]; each render pass
//! takes the surface's lock for one clear-then-draw sequence, so passes on
//! the same chart never interleave.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::chart::Stroke;
use crate::config::ChartConfig;
use crate::error::{AnalysisError, Result};

// ============================================================================
// Primitives
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub size: f64,
    pub bold: bool,
    pub anchor: TextAnchor,
    /// Rotation in degrees, applied before positioning (SVG `rotate()`).
    pub rotate: Option<f64>,
}

impl TextStyle {
    pub fn new(size: f64) -> Self {
        Self {
            size,
            bold: false,
            anchor: TextAnchor::Start,
            rotate: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn anchor(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn rotate(mut self, degrees: f64) -> Self {
        self.rotate = Some(degrees);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrient {
    Bottom,
    Left,
}

/// A labelled tick at `offset` along the axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub offset: f64,
    pub label: String,
}

/// The drawing operations a surface supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Line {
        from: (f64, f64),
        to: (f64, f64),
        stroke: Stroke,
    },
    /// Open polyline through `points`.
    Path {
        points: Vec<(f64, f64)>,
        stroke: Stroke,
    },
    Circle {
        center: (f64, f64),
        radius: f64,
        fill: Option<String>,
        stroke: Option<Stroke>,
        opacity: f64,
    },
    Rect {
        origin: (f64, f64),
        width: f64,
        height: f64,
        fill: Option<String>,
        stroke: Option<Stroke>,
        opacity: f64,
    },
    Text {
        position: (f64, f64),
        text: String,
        style: TextStyle,
    },
    /// An axis line with ticks. `offset` is the y of a bottom axis or the x
    /// of a left axis; `range` is its extent along the other direction.
    Axis {
        orient: AxisOrient,
        offset: f64,
        range: (f64, f64),
        ticks: Vec<Tick>,
        rotate_labels: bool,
    },
}

// ============================================================================
// Surfaces
// ============================================================================

/// Everything drawn on a surface since its last clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub viewport: ChartConfig,
    pub primitives: Vec<Primitive>,
}

/// A 2-D vector canvas owned by one chart.
pub trait DrawingSurface: Send {
    /// Remove everything drawn so far and size the surface to `viewport`.
    fn clear(&mut self, viewport: &ChartConfig);

    fn draw(&mut self, primitive: Primitive);

    /// The current contents, for surfaces that retain them.
    fn snapshot(&self) -> Option<Scene> {
        None
    }
}

/// In-memory surface recording every primitive drawn on it.
#[derive(Debug, Clone, Default)]
pub struct SceneSurface {
    viewport: ChartConfig,
    primitives: Vec<Primitive>,
}

impl SceneSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl DrawingSurface for SceneSurface {
    fn clear(&mut self, viewport: &ChartConfig) {
        self.viewport = *viewport;
        self.primitives.clear();
    }

    fn draw(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    fn snapshot(&self) -> Option<Scene> {
        Some(Scene {
            viewport: self.viewport,
            primitives: self.primitives.clone(),
        })
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Stable identifier of a chart container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChartId(String);

impl ChartId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChartId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type SharedSurface = Arc<Mutex<Box<dyn DrawingSurface>>>;

/// Maps chart ids to their owned drawing surfaces.
///
/// A surface is mounted when its view appears and unmounted when the view
/// is torn down.
#[derive(Default)]
pub struct SurfaceRegistry {
    surfaces: RwLock<HashMap<ChartId, SharedSurface>>,
}

impl fmt::Debug for SurfaceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceRegistry")
            .field("charts", &self.surfaces.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `surface` under `id`, replacing any surface already there.
    pub fn mount(&self, id: ChartId, surface: impl DrawingSurface + 'static) {
        debug!("Mounting drawing surface for chart '{}'", id);
        let surface: Box<dyn DrawingSurface> = Box::new(surface);
        self.surfaces.write().insert(id, Arc::new(Mutex::new(surface)));
    }

    /// Mount a recording [`SceneSurface`] under `id`.
    pub fn mount_scene(&self, id: ChartId) {
        self.mount(id, SceneSurface::new());
    }

    /// Drop the surface under `id`. Returns whether one was mounted.
    pub fn unmount(&self, id: &ChartId) -> bool {
        debug!("Unmounting drawing surface for chart '{}'", id);
        self.surfaces.write().remove(id).is_some()
    }

    pub fn is_mounted(&self, id: &ChartId) -> bool {
        self.surfaces.read().contains_key(id)
    }

    /// Run `f` with exclusive access to the surface under `id`.
    ///
    /// The registry lock is released before `f` runs; only the surface
    /// itself stays locked for the duration of the call.
    pub fn with_surface<R>(
        &self,
        id: &ChartId,
        f: impl FnOnce(&mut dyn DrawingSurface) -> R,
    ) -> Result<R> {
        let surface = self
            .surfaces
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| AnalysisError::SurfaceNotFound(id.to_string()))?;
        let mut guard = surface.lock();
        Ok(f(&mut **guard))
    }

    /// Current contents of the surface under `id`.
    pub fn snapshot(&self, id: &ChartId) -> Result<Option<Scene>> {
        self.with_surface(id, |surface| surface.snapshot())
    }

    /// Serialize the chart under `id` as a standalone SVG document.
    pub fn export_svg(&self, id: &ChartId) -> Result<String> {
        let scene = self.snapshot(id)?.ok_or_else(|| {
            AnalysisError::Render(format!("surface for chart '{id}' does not retain its contents"))
        })?;
        Ok(super::svg::to_svg(&scene)?)
    }
}
