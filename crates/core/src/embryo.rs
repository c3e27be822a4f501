//! Per-embryo result records.
//!
//! A [`RawResultRow`] is read from the results table, consumed once, and turned into an
//! immutable [`EmbryoResult`]: the parsed events and status map, the overall category, the
//! autosome description and the presentation severity. Problems confined to the row become
//! warnings on the record; building a record never fails.

use crate::autosomes::describe_autosomes;
use crate::classification::{LabCall, OverallCategory, OverallClassifier};
use crate::constants::{NOT_REPORTABLE, UNRESOLVED_AUTOSOMES};
use crate::linkage::embryo_id;
use crate::notation::{parse_notation, ChromosomeEvent};
use crate::presentation::Severity;
use crate::status::ChromosomeStatusMap;
use crate::table::{Field, Table, TableRow};
use crate::{CoreConfig, PipelineResult, RowWarning};
use serde::Serialize;
use std::path::PathBuf;

pub const SAMPLE_NAME: Field = Field::new("sample name", &["Sample name", "Sample Name", "Sample"]);
pub const RESULT: Field = Field::new("result", &["Result", "CNV Result", "Results"]);
pub const CONCLUSION: Field = Field::new("conclusion", &["Conclusion"]);
pub const QC: Field = Field::new("qc", &["QC", "QC Status"]);
pub const AUTOSOMES: Field = Field::new("autosomes", &["AUTOSOMES", "Autosomes"]);
pub const SEX: Field = Field::new("sex", &["SEX", "Sex Chromosomes", "Sex"]);
pub const MT_COPY: Field = Field::new("mtcopy", &["MTcopy", "MT copy", "mtDNA copy"]);

/// Header marker used to find the header line of a results export.
pub const RESULTS_HEADER_MARKER: &str = "sample name";

/// Lab text that reads as a normal sex-chromosome complement.
const NORMAL_SEX_TEXT: [&str; 3] = ["normal", "xx", "xy"];

/// Lab text that reads as a normal autosome complement.
const NORMAL_AUTOSOME_TEXT: [&str; 2] = ["normal", "euploid"];

/// One row of the results table, as supplied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResultRow {
    /// Source line of the row in the results sheet, for audit.
    pub row_number: usize,
    pub sample_name: String,
    pub notation: String,
    pub conclusion: String,
    pub qc: String,
    pub autosomes: String,
    pub sex: String,
    pub mt_copy: String,
}

#[derive(Clone, Copy, Debug)]
struct ResultColumns {
    sample_name: usize,
    notation: usize,
    conclusion: usize,
    qc: Option<usize>,
    autosomes: Option<usize>,
    sex: Option<usize>,
    mt_copy: Option<usize>,
}

impl ResultColumns {
    fn resolve(table: &Table) -> PipelineResult<Self> {
        Ok(Self {
            sample_name: table.require_column(&SAMPLE_NAME)?,
            notation: table.require_column(&RESULT)?,
            conclusion: table.require_column(&CONCLUSION)?,
            qc: table.column(&QC),
            autosomes: table.column(&AUTOSOMES),
            sex: table.column(&SEX),
            mt_copy: table.column(&MT_COPY),
        })
    }

    fn read(&self, row: &TableRow<'_>) -> RawResultRow {
        RawResultRow {
            row_number: row.number,
            sample_name: row.at(self.sample_name).to_string(),
            notation: row.at(self.notation).to_string(),
            conclusion: row.at(self.conclusion).to_string(),
            qc: row.get(self.qc).to_string(),
            autosomes: row.get(self.autosomes).to_string(),
            sex: row.get(self.sex).to_string(),
            mt_copy: row.get(self.mt_copy).to_string(),
        }
    }
}

/// Reads every data row of the results table.
///
/// # Errors
///
/// Returns [`crate::PipelineError::MissingColumn`] if the sample name, result or conclusion
/// column is absent and [`crate::PipelineError::EmptyTable`] if there are no data rows.
pub fn load_result_rows(table: &Table) -> PipelineResult<Vec<RawResultRow>> {
    let columns = ResultColumns::resolve(table)?;
    if table.is_empty() {
        return Err(crate::PipelineError::EmptyTable {
            table: table.name(),
        });
    }
    Ok(table.rows().map(|row| columns.read(&row)).collect())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SexChromosomeStatus {
    Normal,
    Abnormal,
}

/// The lab's own text for the sample, kept for audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabText {
    pub notation: String,
    pub conclusion: String,
    pub qc: String,
    pub autosomes: String,
    pub sex: String,
}

/// Normalised result for one embryo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbryoResult {
    pub embryo_id: String,
    pub sample_name: String,
    pub category: OverallCategory,
    pub interpretation: &'static str,
    pub result_description: &'static str,
    #[serde(flatten)]
    pub statuses: ChromosomeStatusMap,
    pub autosomes: String,
    pub sex_chromosomes: SexChromosomeStatus,
    pub severity: Severity,
    pub severity_hex: &'static str,
    pub mt_copy: String,
    pub events: Vec<ChromosomeEvent>,
    pub lab: LabText,
    pub cnv_image: Option<PathBuf>,
    pub warnings: Vec<RowWarning>,
}

impl EmbryoResult {
    /// Builds the record for one result row.
    ///
    /// # Arguments
    ///
    /// * `row` - Result row as supplied by the lab.
    /// * `config` - Vocabulary and thresholds for the overall classifier.
    /// * `cnv_image` - Chart image paired with this sample, if any.
    pub fn build(row: &RawResultRow, config: &CoreConfig, cnv_image: Option<PathBuf>) -> Self {
        let parsed = parse_notation(&row.notation);
        let statuses = ChromosomeStatusMap::from_events(&parsed.events);

        let classification = OverallClassifier::new(config).classify(
            &LabCall {
                qc: &row.qc,
                conclusion: &row.conclusion,
                notation: &row.notation,
            },
            &statuses,
            parsed.has_unparsed(),
        );
        let category = classification.category;
        let severity = Severity::for_record(category, &statuses);

        let mut warnings = parsed.warnings;
        warnings.extend(classification.warnings);

        let autosomes = autosome_description(category, &statuses, &row.autosomes);
        if autosomes_disagree(category, &statuses, &row.autosomes) {
            warnings.push(RowWarning::AutosomeTextDisagrees {
                autosomes: row.autosomes.clone(),
            });
        }

        for warning in &warnings {
            tracing::warn!(
                row = row.row_number,
                sample = %row.sample_name,
                "{warning}"
            );
        }

        Self {
            embryo_id: embryo_id(&row.sample_name),
            sample_name: row.sample_name.clone(),
            category,
            interpretation: category.interpretation(),
            result_description: category.result_description(),
            autosomes,
            sex_chromosomes: sex_chromosome_status(&row.sex, &statuses),
            severity,
            severity_hex: severity.hex(),
            mt_copy: mt_copy_value(category, &row.mt_copy),
            statuses,
            events: parsed.events,
            lab: LabText {
                notation: row.notation.clone(),
                conclusion: row.conclusion.clone(),
                qc: row.qc.clone(),
                autosomes: row.autosomes.clone(),
                sex: row.sex.clone(),
            },
            cnv_image,
            warnings,
        }
    }
}

fn autosome_description(
    category: OverallCategory,
    statuses: &ChromosomeStatusMap,
    lab_autosomes: &str,
) -> String {
    if !category.is_reportable() {
        return NOT_REPORTABLE.to_string();
    }

    // An abnormal call with nothing parsed: fall back to the lab's own wording.
    if category != OverallCategory::Normal && statuses.is_all_normal() {
        let lab = lab_autosomes.trim();
        return if lab.is_empty() || is_normal_autosome_text(lab) {
            UNRESOLVED_AUTOSOMES.to_string()
        } else {
            lab.to_string()
        };
    }

    describe_autosomes(statuses)
}

fn autosomes_disagree(
    category: OverallCategory,
    statuses: &ChromosomeStatusMap,
    lab_autosomes: &str,
) -> bool {
    let lab = lab_autosomes.trim();
    if !category.is_reportable() || lab.is_empty() {
        return false;
    }
    is_normal_autosome_text(lab) != statuses.is_all_normal()
}

fn is_normal_autosome_text(text: &str) -> bool {
    NORMAL_AUTOSOME_TEXT
        .iter()
        .any(|normal| text.trim().eq_ignore_ascii_case(normal))
}

fn sex_chromosome_status(lab_sex: &str, statuses: &ChromosomeStatusMap) -> SexChromosomeStatus {
    let lab = lab_sex.trim();
    let lab_normal = lab.is_empty()
        || NORMAL_SEX_TEXT
            .iter()
            .any(|normal| lab.eq_ignore_ascii_case(normal));

    if lab_normal && !statuses.has_sex_chromosome_event() {
        SexChromosomeStatus::Normal
    } else {
        SexChromosomeStatus::Abnormal
    }
}

fn mt_copy_value(category: OverallCategory, lab_mt_copy: &str) -> String {
    match (category, lab_mt_copy.trim()) {
        (OverallCategory::Normal, value) if !value.is_empty() => value.to_string(),
        _ => NOT_REPORTABLE.to_string(),
    }
}
