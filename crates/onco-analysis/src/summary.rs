//! Dataset summary: category distributions, histograms, detail tables, the
//! mutation burden scatter and two Kaplan-Meier curves.
//!
//! The Kaplan-Meier curves and the scatter become [`ChartSpec`]s drawn by the
//! survival and correlation renderers. Every section exports as CSV.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::chart::{ChartSpec, mutation_scatter_spec, summary_km_spec};
use crate::error::{AnalysisError, Result};
use crate::export::write_csv;
use crate::normalizer::payload::validate_km;
use crate::types::KmPoint;

fn null_as_na<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| "NA".to_string()))
}

/// Sample count of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    #[serde(deserialize_with = "null_as_na")]
    pub category: String,
    pub value: u64,
}

/// Sample count of one histogram bin, e.g. `"10-20"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeCount {
    pub range: String,
    pub count: u64,
}

/// A detail table; each row maps column names to cell values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

impl SummaryTable {
    fn cell(row: &Map<String, Value>, column: &str) -> String {
        match row.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Mutation burden of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationPoint {
    pub mutation_count: f64,
    pub fraction_genome_altered: f64,
}

/// Summary payload of a dataset. Missing sections deserialize empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatasetSummary {
    pub samples_per_patient: Vec<CategoryCount>,
    pub overall_survival_status: Vec<CategoryCount>,
    pub sample_type: Vec<CategoryCount>,
    pub sex: Vec<CategoryCount>,
    pub ethnicity_category: Vec<CategoryCount>,
    pub race_category: Vec<CategoryCount>,
    pub adjuvant_therapy: Vec<CategoryCount>,
    pub ajcc_metastasis: Vec<CategoryCount>,
    pub ajcc_publication: Vec<CategoryCount>,
    pub ajcc_tumor: Vec<CategoryCount>,

    pub genomic_profile: SummaryTable,
    pub cancer_type_detailed: SummaryTable,
    pub mutated_genes: SummaryTable,
    pub cna_genes: SummaryTable,
    pub brachytherapy: SummaryTable,
    pub cent17_copy_number: SummaryTable,

    pub mutation_count: Vec<RangeCount>,
    pub fraction_genomic_altered: Vec<RangeCount>,
    pub birth_from_diagnosis: Vec<RangeCount>,
    pub days_to_followup: Vec<RangeCount>,
    pub days_to_collection: Vec<RangeCount>,
    pub death_from_diagnosis: Vec<RangeCount>,

    pub mutation_vs_fraction: Vec<MutationPoint>,

    pub km_overall: Vec<KmPoint>,
    pub km_disease_free: Vec<KmPoint>,
}

/// One section of a [`DatasetSummary`], borrowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SummarySection<'a> {
    Distribution(&'a [CategoryCount]),
    Histogram(&'a [RangeCount]),
    Table(&'a SummaryTable),
    Scatter(&'a [MutationPoint]),
    Survival(&'a [KmPoint]),
}

impl SummarySection<'_> {
    /// The section as CSV with its conventional headers.
    pub fn to_csv(&self) -> Result<String> {
        match self {
            Self::Distribution(counts) => write_csv(
                ["Category", "Value"],
                counts
                    .iter()
                    .map(|c| [c.category.clone(), c.value.to_string()]),
            ),
            Self::Histogram(bins) => write_csv(
                ["Range", "Count"],
                bins.iter().map(|b| [b.range.clone(), b.count.to_string()]),
            ),
            Self::Table(table) => write_csv(
                &table.columns,
                table.rows.iter().map(|row| {
                    table
                        .columns
                        .iter()
                        .map(|c| SummaryTable::cell(row, c))
                        .collect::<Vec<_>>()
                }),
            ),
            Self::Scatter(points) => write_csv(
                ["Mutation Count", "Fraction Genome Altered"],
                points.iter().map(|p| {
                    [
                        p.mutation_count.to_string(),
                        p.fraction_genome_altered.to_string(),
                    ]
                }),
            ),
            Self::Survival(km) => write_csv(
                ["Time", "Survival", "Censored"],
                km.iter().map(|p| {
                    [
                        p.time.to_string(),
                        p.survival.to_string(),
                        p.censored.to_string(),
                    ]
                }),
            ),
        }
    }
}

impl DatasetSummary {
    /// Look up a section by its payload key, e.g. `"sampleType"`.
    pub fn section(&self, id: &str) -> Option<SummarySection<'_>> {
        use SummarySection::*;

        let section = match id {
            "samplesPerPatient" => Distribution(&self.samples_per_patient),
            "overallSurvivalStatus" => Distribution(&self.overall_survival_status),
            "sampleType" => Distribution(&self.sample_type),
            "sex" => Distribution(&self.sex),
            "ethnicityCategory" => Distribution(&self.ethnicity_category),
            "raceCategory" => Distribution(&self.race_category),
            "adjuvantTherapy" => Distribution(&self.adjuvant_therapy),
            "ajccMetastasis" => Distribution(&self.ajcc_metastasis),
            "ajccPublication" => Distribution(&self.ajcc_publication),
            "ajccTumor" => Distribution(&self.ajcc_tumor),

            "genomicProfile" => Table(&self.genomic_profile),
            "cancerTypeDetailed" => Table(&self.cancer_type_detailed),
            "mutatedGenes" => Table(&self.mutated_genes),
            "cnaGenes" => Table(&self.cna_genes),
            "brachytherapy" => Table(&self.brachytherapy),
            "cent17CopyNumber" => Table(&self.cent17_copy_number),

            "mutationCount" => Histogram(&self.mutation_count),
            "fractionGenomicAltered" => Histogram(&self.fraction_genomic_altered),
            "birthFromDiagnosis" => Histogram(&self.birth_from_diagnosis),
            "daysToFollowup" => Histogram(&self.days_to_followup),
            "daysToCollection" => Histogram(&self.days_to_collection),
            "deathFromDiagnosis" => Histogram(&self.death_from_diagnosis),

            "mutationVsFraction" => Scatter(&self.mutation_vs_fraction),

            "kmOverall" => Survival(&self.km_overall),
            "kmDiseaseFree" => Survival(&self.km_disease_free),
            _ => return None,
        };
        Some(section)
    }

    /// The section `id` as CSV.
    pub fn section_csv(&self, id: &str) -> Result<String> {
        self.section(id)
            .ok_or_else(|| AnalysisError::MissingData(format!("summary has no '{id}' section")))?
            .to_csv()
    }

    /// Overall survival curve, drawn by the survival renderer.
    pub fn overall_survival_spec(&self) -> Result<ChartSpec> {
        km_chart("KM Plot: Overall (months)", &self.km_overall, "kmOverall")
    }

    /// Disease-free survival curve, drawn by the survival renderer.
    pub fn disease_free_spec(&self) -> Result<ChartSpec> {
        km_chart(
            "KM Plot: Disease Free (months)",
            &self.km_disease_free,
            "kmDiseaseFree",
        )
    }

    /// Mutation count against fraction of genome altered, with a trend line
    /// when there are at least two samples.
    pub fn mutation_scatter_spec(&self) -> Result<ChartSpec> {
        if self.mutation_vs_fraction.is_empty() {
            return Err(AnalysisError::MissingData(
                "mutationVsFraction is empty".to_string(),
            ));
        }
        let (fractions, counts): (Vec<f64>, Vec<f64>) = self
            .mutation_vs_fraction
            .iter()
            .map(|p| (p.fraction_genome_altered, p.mutation_count))
            .unzip();
        Ok(mutation_scatter_spec(&fractions, &counts))
    }
}

fn km_chart(title: &str, km_data: &[KmPoint], field: &str) -> Result<ChartSpec> {
    let mut km_data = km_data.to_vec();
    validate_km(&mut km_data, field)?;
    Ok(summary_km_spec(title, &km_data))
}
