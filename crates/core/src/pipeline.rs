//! Batch assembly.
//!
//! Runs the whole pipeline for one lab run: roster rows become patients, every result row is
//! linked to at most one patient and turned into an [`EmbryoResult`], and whatever could not
//! be linked is reported alongside. Everything a batch needs travels in a [`BatchContext`].

use crate::embryo::{load_result_rows, EmbryoResult, RawResultRow, RESULTS_HEADER_MARKER};
use crate::images::ChartImageIndex;
use crate::linkage::{normalise, AmbiguousMatch, Link, Linker};
use crate::roster::{load_roster, PatientRecord};
use crate::constants::{RESULTS_SHEET, ROSTER_SHEET};
use crate::table::{Table, Workbook};
use crate::{CoreConfig, PipelineError, PipelineResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Explicit per-batch state: configuration, report date and chart images.
#[derive(Clone, Debug)]
pub struct BatchContext {
    config: Arc<CoreConfig>,
    report_date: NaiveDate,
    chart_images: ChartImageIndex,
}

impl BatchContext {
    pub fn new(config: Arc<CoreConfig>, report_date: NaiveDate) -> Self {
        Self {
            config,
            report_date,
            chart_images: ChartImageIndex::default(),
        }
    }

    pub fn with_chart_images(mut self, chart_images: ChartImageIndex) -> Self {
        self.chart_images = chart_images;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn report_date(&self) -> NaiveDate {
        self.report_date
    }

    pub fn chart_images(&self) -> &ChartImageIndex {
        &self.chart_images
    }
}

/// A patient with the embryos linked to it, in results-table order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatientBatch {
    pub patient: PatientRecord,
    pub embryos: Vec<EmbryoResult>,
    /// Set when no result row linked to this patient.
    pub no_embryos: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub patients: usize,
    pub result_rows: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
    pub warnings: usize,
    pub skipped_roster_rows: usize,
}

/// A result row that matched no roster row. The row is still parsed so its warnings reach
/// the audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnmatchedRow {
    pub row_number: usize,
    pub sample_name: String,
    pub normalised: String,
    pub result: EmbryoResult,
}

/// Patient to embryo hierarchy for one batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub patients: Vec<PatientBatch>,
    pub unmatched: Vec<UnmatchedRow>,
    pub ambiguous: Vec<AmbiguousMatch>,
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Every result row is either attached to exactly one patient or listed as unmatched.
    pub fn accounts_for_all_rows(&self) -> bool {
        let attached: usize = self.patients.iter().map(|p| p.embryos.len()).sum();
        attached + self.unmatched.len() == self.summary.result_rows
            && attached == self.summary.matched
    }

    pub fn to_json(&self) -> PipelineResult<String> {
        serde_json::to_string_pretty(self).map_err(PipelineError::Serialization)
    }

    pub fn to_yaml(&self) -> PipelineResult<String> {
        serde_yaml::to_string(self).map_err(PipelineError::YamlSerialization)
    }
}

/// Runs one batch over already loaded tables.
///
/// # Errors
///
/// Structural problems only: a missing required column or an empty table. Row-level problems
/// are recorded in the report.
pub fn run_batch(
    context: &BatchContext,
    roster_table: &Table,
    results_table: &Table,
) -> PipelineResult<BatchReport> {
    let roster = load_roster(
        roster_table,
        context.config().default_specimen(),
        context.report_date(),
    )?;
    let rows = load_result_rows(results_table)?;

    let linker = Linker::new(roster.patients.iter().map(PatientRecord::link_keys).collect());

    let mut embryos: Vec<Vec<EmbryoResult>> = vec![Vec::new(); roster.patients.len()];
    let mut unmatched = Vec::new();
    let mut ambiguous = Vec::new();

    for row in &rows {
        match linker.link(&row.sample_name) {
            Link::Matched {
                roster_index,
                basis,
                tied_with,
            } => {
                let patient = &roster.patients[roster_index];
                tracing::debug!(
                    row = row.row_number,
                    sample = %row.sample_name,
                    patient = %patient.patient_name,
                    ?basis,
                    "linked result row"
                );

                if !tied_with.is_empty() {
                    let also_matched: Vec<String> = tied_with
                        .iter()
                        .map(|&i| roster.patients[i].patient_name.to_string())
                        .collect();
                    tracing::warn!(
                        row = row.row_number,
                        sample = %row.sample_name,
                        chosen = %patient.patient_name,
                        also_matched = ?also_matched,
                        "ambiguous link resolved by roster order"
                    );
                    ambiguous.push(AmbiguousMatch {
                        row_number: row.row_number,
                        sample_name: row.sample_name.clone(),
                        basis,
                        chosen: patient.patient_name.to_string(),
                        also_matched,
                    });
                }

                embryos[roster_index].push(build_embryo(context, row));
            }
            Link::Unmatched => {
                tracing::warn!(
                    row = row.row_number,
                    sample = %row.sample_name,
                    "result row matched no roster patient"
                );
                unmatched.push(UnmatchedRow {
                    row_number: row.row_number,
                    sample_name: row.sample_name.clone(),
                    normalised: normalise(&row.sample_name),
                    result: build_embryo(context, row),
                });
            }
        }
    }

    let patients: Vec<PatientBatch> = roster
        .patients
        .into_iter()
        .zip(embryos)
        .map(|(patient, embryos)| {
            let no_embryos = embryos.is_empty();
            if no_embryos {
                tracing::warn!(patient = %patient.patient_name, "no result rows linked to patient");
            }
            PatientBatch {
                patient,
                embryos,
                no_embryos,
            }
        })
        .collect();

    let matched: usize = patients.iter().map(|p| p.embryos.len()).sum();
    let warnings: usize = patients
        .iter()
        .flat_map(|p| &p.embryos)
        .chain(unmatched.iter().map(|u| &u.result))
        .map(|e| e.warnings.len())
        .sum();

    let summary = BatchSummary {
        patients: patients.len(),
        result_rows: rows.len(),
        matched,
        unmatched: unmatched.len(),
        ambiguous: ambiguous.len(),
        warnings,
        skipped_roster_rows: roster.skipped_rows,
    };

    tracing::info!(
        patients = summary.patients,
        result_rows = summary.result_rows,
        matched = summary.matched,
        unmatched = summary.unmatched,
        ambiguous = summary.ambiguous,
        warnings = summary.warnings,
        "batch processed"
    );

    Ok(BatchReport {
        patients,
        unmatched,
        ambiguous,
        summary,
    })
}

fn build_embryo(context: &BatchContext, row: &RawResultRow) -> EmbryoResult {
    let image = context
        .chart_images()
        .lookup(&row.sample_name)
        .map(Path::to_path_buf);
    EmbryoResult::build(row, context.config(), image)
}

/// Loads both tables from disk and runs the batch.
///
/// The results export may carry preamble lines; its header is the first line with a
/// "sample name" cell.
pub fn process_files(
    context: &BatchContext,
    roster_path: &Path,
    results_path: &Path,
) -> PipelineResult<BatchReport> {
    let roster_table = Table::from_path("roster", roster_path, None)?;
    let results_table = Table::from_path("results", results_path, Some(RESULTS_HEADER_MARKER))?;
    run_batch(context, &roster_table, &results_table)
}

/// Loads the roster (`Details`) and results (`summary`) sheets of one run workbook and runs
/// the batch. The results sheet gets the same header search as a results export.
pub fn process_workbook(
    context: &BatchContext,
    workbook_path: &Path,
) -> PipelineResult<BatchReport> {
    let mut workbook = Workbook::open(workbook_path)?;
    let roster_table = workbook.table("roster", ROSTER_SHEET, None)?;
    let results_table = workbook.table("results", RESULTS_SHEET, Some(RESULTS_HEADER_MARKER))?;
    run_batch(context, &roster_table, &results_table)
}
