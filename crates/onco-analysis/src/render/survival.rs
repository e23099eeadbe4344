use super::{ChartRenderer, DrawingSurface, Frame, draw_xy_series, required_series};
use crate::chart::{ChartKind, ChartSpec};
use crate::error::Result;

/// Kaplan-Meier step curve with censoring and event markers drawn on top.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurvivalRenderer;

impl ChartRenderer for SurvivalRenderer {
    fn kind(&self) -> ChartKind {
        ChartKind::Survival
    }

    fn draw_body(
        &self,
        spec: &ChartSpec,
        frame: &Frame,
        surface: &mut dyn DrawingSurface,
    ) -> Result<()> {
        for name in ["survival", "censored", "events"] {
            draw_xy_series(frame, required_series(spec, name)?, surface)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartConfig;
    use crate::render::{Primitive, SceneSurface};
    use crate::types::{AnalysisResult, KmPoint, SurvivalResult};
    use pretty_assertions::assert_eq;

    fn km(time: f64, survival: f64, censored: bool) -> KmPoint {
        KmPoint {
            time,
            survival,
            censored,
        }
    }

    fn render(km_data: Vec<KmPoint>) -> Vec<Primitive> {
        let spec = ChartSpec::from_result(&AnalysisResult::Survival(SurvivalResult {
            gene: "TP53".to_string(),
            km_data,
            sample_count: 42,
        }));
        let mut surface = SceneSurface::new();
        SurvivalRenderer
            .render(&spec, &ChartConfig::default(), &mut surface)
            .unwrap();
        surface.primitives().to_vec()
    }

    #[test]
    fn test_step_path_vertices() {
        let prims = render(vec![
            km(0.0, 1.0, false),
            km(5.0, 0.8, false),
            km(10.0, 0.6, true),
        ]);
        let path = prims
            .iter()
            .find_map(|p| match p {
                Primitive::Path { points, .. } => Some(points.clone()),
                _ => None,
            })
            .unwrap();

        // x domain [0, 11] over 510px, y domain [0, 1] over 300px
        let px = |t: f64| t / 11.0 * 510.0;
        let py = |s: f64| 300.0 - s * 300.0;
        let expected = [
            (0.0, 1.0),
            (5.0, 1.0),
            (5.0, 0.8),
            (10.0, 0.8),
            (10.0, 0.6),
        ];
        assert_eq!(path.len(), expected.len());
        for ((x, y), (t, s)) in path.iter().zip(expected) {
            assert!((x - px(t)).abs() < 1e-9);
            assert!((y - py(s)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_censored_and_event_markers() {
        let prims = render(vec![
            km(0.0, 1.0, false),
            km(5.0, 0.8, false),
            km(10.0, 0.6, true),
        ]);
        // legend dots sit at the annotation inset
        let markers: Vec<_> = prims
            .iter()
            .filter_map(|p| match p {
                Primitive::Circle {
                    center,
                    fill,
                    stroke,
                    ..
                } if center.0 != 510.0 - 150.0 => Some((fill.clone(), stroke.is_some())),
                _ => None,
            })
            .collect();

        assert_eq!(
            markers,
            vec![
                (Some("white".to_string()), true),
                (Some("red".to_string()), false),
                (Some("red".to_string()), false),
            ]
        );
    }

    #[test]
    fn test_sample_count_annotation() {
        let prims = render(vec![km(0.0, 1.0, false)]);
        assert!(prims.iter().any(
            |p| matches!(p, Primitive::Text { text, .. } if text == "Sample Count: 42")
        ));
    }
}
