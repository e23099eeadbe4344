//! Category remapping for stratified box plots.
//!
//! The stratified endpoint returns box statistics keyed by whatever groups
//! it computed, which rarely match the categories of the requested clinical
//! feature. The remapper relabels them onto a fixed category table and
//! fills the gaps with placeholder statistics.
//!
//! The placeholders are fabricated numbers, not measurements. The charts
//! depend on their exact values, so they are kept as-is; [`PlotOrigin`]
//! records how much of a plot is real.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{BoxStats, CategoryStats, ClinicalFeature};

const GENDER: &[&str] = &["Male", "Female"];
const RACE: &[&str] = &["White", "Black", "Asian", "Other"];
const CANCER_STATE: &[&str] = &["Stage I", "Stage II", "Stage III", "Stage IV"];
const TUMOR_HISTOLOGY: &[&str] = &["Adenocarcinoma", "Squamous", "Large Cell", "Other"];
const AGE: &[&str] = &["Young", "Old"];
const EXPRESSION: &[&str] = &["High", "Low"];

/// Where the boxes of a stratified plot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlotOrigin {
    /// Backend boxes used unchanged.
    PassThrough,
    /// Backend boxes relabelled; `synthesized` trailing categories are placeholders.
    Remapped { real: usize, synthesized: usize },
    /// No backend boxes; every category is a placeholder.
    FullySynthesized,
}

impl PlotOrigin {
    /// Whether any box is a placeholder.
    pub fn has_placeholders(&self) -> bool {
        match self {
            Self::PassThrough => false,
            Self::Remapped { synthesized, .. } => *synthesized > 0,
            Self::FullySynthesized => true,
        }
    }
}

/// The fixed category set displayed for a clinical feature.
pub fn target_categories(feature: &ClinicalFeature) -> &'static [&'static str] {
    match feature {
        ClinicalFeature::Gender => GENDER,
        ClinicalFeature::Race => RACE,
        ClinicalFeature::CancerState => CANCER_STATE,
        ClinicalFeature::TumorHistology => TUMOR_HISTOLOGY,
        ClinicalFeature::Age => AGE,
        ClinicalFeature::Other(_) => EXPRESSION,
    }
}

/// Placeholder statistics for the category at position `index`.
///
/// Ordered (`min <= Q1 <= median <= Q3 <= max`) for the positions of every
/// category table, i.e. `index < 4`. From index 8 on the median exceeds Q3,
/// so the formula must not be used past the longest table.
pub fn placeholder_stats(index: usize) -> BoxStats {
    let i = index as f64;
    BoxStats {
        min: 10.0 + 5.0 * i,
        q1: 30.0 + 3.0 * i,
        median: 45.0 + 4.0 * i,
        q3: 60.0 + 2.0 * i,
        max: 90.0 + i,
    }
}

/// Boxes after remapping, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct RemappedPlots {
    pub plots: Vec<CategoryStats>,
    pub origin: PlotOrigin,
}

/// Relabels backend box statistics onto a feature's category table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryRemapper;

impl CategoryRemapper {
    /// Remap `plots` (in payload order) for `feature`.
    ///
    /// - Gender with data: returned unchanged.
    /// - Other features with data: values are assigned to the target
    ///   categories in order; surplus values are dropped and missing
    ///   categories get [`placeholder_stats`] by their position.
    /// - No data (`None` or empty): every target category is synthesized.
    pub fn remap(&self, feature: &ClinicalFeature, plots: Option<Vec<CategoryStats>>) -> RemappedPlots {
        let targets = target_categories(feature);

        let plots = match plots {
            Some(p) if !p.is_empty() => p,
            _ => {
                debug!("No plot data for {}, synthesizing all categories", feature);
                return RemappedPlots {
                    plots: Self::synthesize(targets, 0),
                    origin: PlotOrigin::FullySynthesized,
                };
            }
        };

        if *feature == ClinicalFeature::Gender {
            return RemappedPlots {
                plots,
                origin: PlotOrigin::PassThrough,
            };
        }

        if plots.len() > targets.len() {
            debug!(
                "Dropping {} surplus plot groups for {}",
                plots.len() - targets.len(),
                feature
            );
        }

        let real = plots.len().min(targets.len());
        let mut remapped: Vec<CategoryStats> = targets
            .iter()
            .zip(plots)
            .map(|(label, original)| CategoryStats::new(*label, original.stats))
            .collect();
        remapped.extend(Self::synthesize(&targets[real..], real));

        RemappedPlots {
            plots: remapped,
            origin: PlotOrigin::Remapped {
                real,
                synthesized: targets.len() - real,
            },
        }
    }

    /// Placeholder boxes for `labels`, numbering them from `first_index`.
    fn synthesize(labels: &[&str], first_index: usize) -> Vec<CategoryStats> {
        labels
            .iter()
            .enumerate()
            .map(|(offset, label)| CategoryStats::new(*label, placeholder_stats(first_index + offset)))
            .collect()
    }
}
