//! Per-kind construction of [`ChartSpec`]s.

use tracing::debug;

use super::palette;
use super::{
    Annotation, AxisLabels, BoxGlyph, ChartKind, ChartSpec, Curve, Domain, LegendItem, Marker,
    Series, StatLine, Stroke, Swatch,
};
use crate::stats::{
    CorrelationSummary, FOLD_CHANGE_THRESHOLD, Regulation, SIGNIFICANCE_LEVEL, StepCurve,
    least_squares, neg_log10,
};
use crate::types::{
    CategoryStats, CorrelationResult, DifferentialResult, KmPoint, MethylationResult,
    StratifiedResult, SurvivalResult,
};

/// Stat text and legends start this far left of the plot's right edge.
const ANNOTATION_INSET: f64 = 150.0;
/// Box plot p-value text sits further left than the legend.
const BOX_STATS_INSET: f64 = 200.0;
const LINE_HEIGHT: f64 = 20.0;

const VOLCANO_FC_RANGE: f64 = 4.0;
const VOLCANO_MAX_NEG_LOG_P: f64 = 10.0;

fn extent(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Data extent padded by 10% on each side: `[min * 0.9, max * 1.1]`.
fn padded_extent(values: &[f64]) -> Domain {
    let (lo, hi) = extent(values);
    if !(lo.is_finite() && hi.is_finite()) {
        return Domain::continuous(0.0, 1.0);
    }
    Domain::continuous(lo * 0.9, hi * 1.1)
}

fn labels(x: impl Into<String>, y: impl Into<String>) -> AxisLabels {
    AxisLabels {
        x: x.into(),
        y: y.into(),
        x_offset: 40.0,
    }
}

// ============================================================================
// Correlation
// ============================================================================

/// Scatter of the paired expression values with a regression line and
/// r / p / n annotations.
pub fn correlation_spec(result: &CorrelationResult) -> ChartSpec {
    let xs = &result.points_a;
    let ys = &result.points_b;
    let summary = CorrelationSummary::compute(xs, ys);

    let points = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| Marker::filled(x, y, 5.0, palette::STEEL_BLUE).with_opacity(0.7))
        .collect();
    let mut series = vec![Series::Scatter {
        name: "points".to_string(),
        points,
    }];

    if let Some(reg) = summary.regression {
        let (x0, x1) = extent(xs);
        series.push(Series::Line {
            name: "regression".to_string(),
            points: vec![(x0, reg.predict(x0)), (x1, reg.predict(x1))],
            curve: Curve::Linear,
            stroke: Stroke::solid(palette::RED, 2.0),
        });
    }

    let r_line = match summary.r {
        Some(r) => format!("r = {r:.3}"),
        None => "r = n/a".to_string(),
    };
    let p_line = match summary.p_value {
        Some(p) => format!("p-value ≈ {p:.4}"),
        None => "p-value: not applicable".to_string(),
    };

    ChartSpec {
        kind: ChartKind::Correlation,
        title: format!("Correlation: {} vs {}", result.gene_a, result.gene_b),
        labels: labels(
            format!("{} Expression", result.gene_a),
            format!("{} Expression", result.gene_b),
        ),
        domain_x: padded_extent(xs),
        domain_y: padded_extent(ys),
        rotate_x_labels: false,
        series,
        annotations: vec![Annotation::Stats {
            inset: ANNOTATION_INSET,
            lines: vec![
                StatLine::plain(r_line),
                StatLine::plain(p_line),
                StatLine::plain(format!("n = {} data points", summary.n)),
            ],
        }],
    }
}

// ============================================================================
// Survival
// ============================================================================

fn censored_marker(x: f64, y: f64) -> Marker {
    Marker::filled(x, y, 4.0, palette::WHITE).with_stroke(Stroke::solid(palette::RED, 2.0))
}

/// Kaplan-Meier step curve with censored and event markers.
///
/// Expects `km_data` sorted by time.
pub fn survival_spec(result: &SurvivalResult) -> ChartSpec {
    km_spec(
        format!("Kaplan-Meier Survival Plot: {}", result.gene),
        "Survival Probability",
        &result.km_data,
        1.0,
        Some(result.sample_count),
    )
}

/// Kaplan-Meier curve of a dataset summary, on a percentage scale.
///
/// Expects `km_data` sorted by time.
pub fn summary_km_spec(title: impl Into<String>, km_data: &[KmPoint]) -> ChartSpec {
    km_spec(title.into(), "% Event-free", km_data, 100.0, None)
}

/// Shared Kaplan-Meier layout; survival values are multiplied by `y_max`.
fn km_spec(
    title: String,
    y_label: &str,
    km_data: &[KmPoint],
    y_max: f64,
    sample_count: Option<u64>,
) -> ChartSpec {
    let curve = StepCurve::new(km_data);
    let max_time = curve.max_time().unwrap_or(0.0);

    let line = km_data.iter().map(|p| (p.time, p.survival * y_max)).collect();
    let (censored, events): (Vec<&KmPoint>, Vec<&KmPoint>) =
        km_data.iter().partition(|p| p.censored);

    let series = vec![
        Series::Line {
            name: "survival".to_string(),
            points: line,
            curve: Curve::StepAfter,
            stroke: Stroke::solid(palette::STEEL_BLUE, 2.0),
        },
        Series::Scatter {
            name: "censored".to_string(),
            points: censored
                .iter()
                .map(|p| censored_marker(p.time, p.survival * y_max))
                .collect(),
        },
        Series::Scatter {
            name: "events".to_string(),
            points: events
                .iter()
                .map(|p| Marker::filled(p.time, p.survival * y_max, 4.0, palette::RED))
                .collect(),
        },
    ];

    let lines = sample_count
        .map(|n| vec![StatLine::plain(format!("Sample Count: {n}"))])
        .unwrap_or_default();

    ChartSpec {
        kind: ChartKind::Survival,
        title,
        labels: labels("Time (months)", y_label),
        domain_x: Domain::continuous(0.0, max_time * 1.1),
        domain_y: Domain::continuous(0.0, y_max),
        rotate_x_labels: false,
        series,
        annotations: vec![
            Annotation::Stats {
                inset: ANNOTATION_INSET,
                lines,
            },
            Annotation::Legend {
                inset: ANNOTATION_INSET,
                top: 2.0 * LINE_HEIGHT,
                spacing: LINE_HEIGHT,
                items: vec![
                    LegendItem {
                        label: "Censored".to_string(),
                        swatch: Swatch::Dot {
                            fill: Some(palette::WHITE.to_string()),
                            stroke: Some(Stroke::solid(palette::RED, 2.0)),
                        },
                    },
                    LegendItem {
                        label: "Event".to_string(),
                        swatch: Swatch::Dot {
                            fill: Some(palette::RED.to_string()),
                            stroke: None,
                        },
                    },
                ],
            },
        ],
    }
}

// ============================================================================
// Mutation burden scatter
// ============================================================================

/// Mutation count against fraction of genome altered, one point per sample,
/// with a least-squares trend line when the fractions vary.
///
/// The trend spans `x` from 0 to the domain's right edge.
pub fn mutation_scatter_spec(fractions: &[f64], counts: &[f64]) -> ChartSpec {
    let points = fractions
        .iter()
        .zip(counts)
        .map(|(&x, &y)| {
            Marker::filled(x, y, 4.0, palette::STEEL_BLUE)
                .with_stroke(Stroke::solid(palette::DARK_GRAY, 1.0))
                .with_opacity(0.7)
        })
        .collect();
    let mut series = vec![Series::Scatter {
        name: "points".to_string(),
        points,
    }];

    let (_, max_x) = extent(fractions);
    let x_end = if max_x.is_finite() && max_x > 0.0 {
        max_x * 1.1
    } else {
        1.0
    };

    let mut y_values = counts.to_vec();
    let mut lines = vec![StatLine::plain(format!("n = {} samples", counts.len()))];
    match least_squares(fractions, counts) {
        Ok(fit) => {
            let trend = [(0.0, fit.predict(0.0)), (x_end, fit.predict(x_end))];
            y_values.extend(trend.iter().map(|&(_, y)| y));
            series.push(Series::Line {
                name: "regression".to_string(),
                points: trend.to_vec(),
                curve: Curve::Linear,
                stroke: Stroke::dashed(palette::CORAL, 2.0, 2.0),
            });
            lines.push(StatLine::plain(format!(
                "y = {:.2}x + {:.2}",
                fit.slope, fit.intercept
            )));
        }
        Err(e) => debug!("Mutation scatter drawn without trend line: {e}"),
    }

    ChartSpec {
        kind: ChartKind::Correlation,
        title: "Mutation Count vs Fraction Genome Altered".to_string(),
        labels: labels("Fraction Genome Altered", "Mutation Count"),
        domain_x: Domain::continuous(0.0, x_end),
        domain_y: padded_extent(&y_values),
        rotate_x_labels: false,
        series,
        annotations: vec![Annotation::Stats {
            inset: ANNOTATION_INSET,
            lines,
        }],
    }
}

// ============================================================================
// Volcano
// ============================================================================

fn regulation_color(regulation: Regulation) -> &'static str {
    match regulation {
        Regulation::Up => palette::RED,
        Regulation::Down => palette::BLUE,
        Regulation::NotSignificant => palette::GRAY,
    }
}

fn reference_line(name: &str, from: (f64, f64), to: (f64, f64)) -> Series {
    Series::Line {
        name: name.to_string(),
        points: vec![from, to],
        curve: Curve::Linear,
        stroke: Stroke::dashed(palette::GRAY, 1.0, 4.0),
    }
}

/// Volcano plot of fold change against significance, on fixed axes.
///
/// Points outside the fixed domains are drawn where they fall.
pub fn volcano_spec(result: &DifferentialResult) -> ChartSpec {
    let fc = FOLD_CHANGE_THRESHOLD.log2();
    let p_line = neg_log10(SIGNIFICANCE_LEVEL);

    let mut series = vec![
        reference_line(
            "significance_threshold",
            (-VOLCANO_FC_RANGE, p_line),
            (VOLCANO_FC_RANGE, p_line),
        ),
        reference_line("fold_change_down", (-fc, 0.0), (-fc, VOLCANO_MAX_NEG_LOG_P)),
        reference_line("fold_change_up", (fc, 0.0), (fc, VOLCANO_MAX_NEG_LOG_P)),
        Series::Scatter {
            name: "genes".to_string(),
            points: result
                .genes
                .iter()
                .map(|g| {
                    let color = regulation_color(Regulation::classify(g.log2_fold_change, g.p_value));
                    Marker::filled(g.log2_fold_change, neg_log10(g.p_value), 4.0, color)
                        .with_opacity(0.7)
                })
                .collect(),
        },
    ];

    let mut annotations = Vec::new();
    let highlighted = result
        .genes
        .iter()
        .find(|g| g.name.to_uppercase() == result.gene.to_uppercase());
    match highlighted {
        Some(g) => {
            let (x, y) = (g.log2_fold_change, neg_log10(g.p_value));
            series.push(Series::Scatter {
                name: "highlight".to_string(),
                points: vec![Marker::ring(x, y, 6.0, Stroke::solid(palette::BLACK, 2.0))],
            });
            annotations.push(Annotation::Label {
                x,
                y,
                text: result.gene.clone(),
            });
        }
        None => debug!("Gene {} not present in differential table", result.gene),
    }

    annotations.push(Annotation::Legend {
        inset: ANNOTATION_INSET,
        top: LINE_HEIGHT,
        spacing: LINE_HEIGHT,
        items: vec![
            LegendItem {
                label: "Upregulated".to_string(),
                swatch: Swatch::Dot {
                    fill: Some(palette::RED.to_string()),
                    stroke: None,
                },
            },
            LegendItem {
                label: "Downregulated".to_string(),
                swatch: Swatch::Dot {
                    fill: Some(palette::BLUE.to_string()),
                    stroke: None,
                },
            },
        ],
    });

    ChartSpec {
        kind: ChartKind::Volcano,
        title: format!("Differential Expression: {}", result.feature),
        labels: labels("Log2 Fold Change", "-log10(p-value)"),
        domain_x: Domain::continuous(-VOLCANO_FC_RANGE, VOLCANO_FC_RANGE),
        domain_y: Domain::continuous(0.0, VOLCANO_MAX_NEG_LOG_P),
        rotate_x_labels: false,
        series,
        annotations,
    }
}

// ============================================================================
// Box plots
// ============================================================================

/// Y domain covering every box value: `[min * 0.9, max * 1.1]`, with 0 and
/// 100 standing in for a zero or undefined bound.
pub fn box_value_domain(boxes: &[CategoryStats]) -> (f64, f64) {
    let values: Vec<f64> = boxes
        .iter()
        .flat_map(|b| b.stats.values())
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        return (0.0, 100.0);
    }

    let (lo, hi) = extent(&values);
    let lo = lo * 0.9;
    let hi = hi * 1.1;
    let lo = if lo == 0.0 || !lo.is_finite() { 0.0 } else { lo };
    let hi = if hi == 0.0 || !hi.is_finite() { 100.0 } else { hi };
    (lo, hi)
}

fn box_domain_y(boxes: &[CategoryStats]) -> Domain {
    let (min, max) = box_value_domain(boxes);
    Domain::Continuous {
        min,
        max,
        nice: true,
    }
}

fn category_labels(boxes: &[CategoryStats]) -> Vec<String> {
    boxes.iter().map(|b| b.label.clone()).collect()
}

fn square(label: &str, fill: &str) -> LegendItem {
    LegendItem {
        label: label.to_string(),
        swatch: Swatch::Square {
            fill: fill.to_string(),
        },
    }
}

/// Box plot of one gene across the categories of a clinical feature.
pub fn stratified_spec(result: &StratifiedResult) -> ChartSpec {
    let categorical = result.feature.is_categorical();
    let boxes: Vec<BoxGlyph> = result
        .plots
        .iter()
        .enumerate()
        .map(|(i, c)| BoxGlyph {
            label: c.label.clone(),
            stats: c.stats,
            fill: if categorical {
                palette::category_color(i).to_string()
            } else {
                palette::expression_group_color(&c.label).to_string()
            },
        })
        .collect();

    let mut lines = vec![match result.p_value {
        Some(p) => StatLine::bold(format!("p-value: {p:.4}")),
        None => StatLine::bold("p-value: n/a"),
    }];
    if let Some(r) = result.correlation {
        lines.push(StatLine::plain(format!("r = {r:.3}")));
    }

    let legend_items = if categorical {
        boxes.iter().map(|b| square(&b.label, &b.fill)).collect()
    } else {
        vec![
            square("High Expression", palette::HIGH_EXPRESSION),
            square("Low Expression", palette::LOW_EXPRESSION),
        ]
    };
    let legend_top = LINE_HEIGHT * (lines.len() as f64 + 1.0);

    let x_label = if categorical {
        AxisLabels {
            x: format!("{} Categories", result.feature),
            y: "Survival Rate (%)".to_string(),
            x_offset: 45.0,
        }
    } else {
        labels("Expression Groups", "Survival Rate (%)")
    };

    ChartSpec {
        kind: ChartKind::StratifiedBox,
        title: format!("Survival Analysis: {} by {}", result.gene, result.feature),
        labels: x_label,
        domain_x: Domain::Categorical {
            labels: category_labels(&result.plots),
            padding: if categorical { 0.4 } else { 0.3 },
        },
        domain_y: box_domain_y(&result.plots),
        rotate_x_labels: categorical && result.plots.len() > 3,
        series: vec![Series::Boxes {
            name: result.feature.to_string(),
            boxes,
        }],
        annotations: vec![
            Annotation::Stats {
                inset: BOX_STATS_INSET,
                lines,
            },
            Annotation::Legend {
                inset: ANNOTATION_INSET,
                top: legend_top,
                spacing: 25.0,
                items: legend_items,
            },
        ],
    }
}

/// Box plot of methylation levels per structural group.
pub fn methylation_spec(result: &MethylationResult) -> ChartSpec {
    let boxes = result
        .groups
        .iter()
        .map(|c| BoxGlyph {
            label: c.label.clone(),
            stats: c.stats,
            fill: palette::LOW_EXPRESSION.to_string(),
        })
        .collect();

    ChartSpec {
        kind: ChartKind::MethylationBox,
        title: format!("Methylation Analysis: {}", result.gene),
        labels: labels("Methylation Type", "Methylation Level"),
        domain_x: Domain::Categorical {
            labels: category_labels(&result.groups),
            padding: 0.3,
        },
        domain_y: box_domain_y(&result.groups),
        rotate_x_labels: false,
        series: vec![Series::Boxes {
            name: "methylation".to_string(),
            boxes,
        }],
        annotations: Vec::new(),
    }
}
