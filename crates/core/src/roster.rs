//! Patient roster.
//!
//! Each roster row describes one patient: identity, referral details and the biopsy dates.
//! Demographic fields are carried through to the report unchanged except for dates, which are
//! normalised to the report format.

use crate::constants::{NO_SPOUSE, REPORT_DATE_FORMAT, ROSTER_DATE_FORMATS};
use crate::linkage::LinkKeys;
use crate::table::{Field, Table, TableRow};
use crate::PipelineResult;
use chrono::NaiveDate;
use pgta_types::NonEmptyText;
use serde::Serialize;

pub const PATIENT_NAME: Field =
    Field::new("patient name", &["Patient Name", "Patient_Name", "Patient"]);
pub const SAMPLE_IDENTIFIER: Field = Field::new(
    "sample identifier",
    &["Sample ID", "PIN", "Patient ID", "Sample_ID", "SampleID"],
);
pub const SPOUSE_NAME: Field =
    Field::new("spouse name", &["Spouse Name", "Husband Name", "Partner Name"]);
pub const AGE: Field = Field::new("age", &["Age", "Patient Age"]);
pub const SAMPLE_NUMBER: Field =
    Field::new("sample number", &["Sample Number", "Sample No", "Sample_Number"]);
pub const REFERRING_CLINICIAN: Field = Field::new(
    "referring clinician",
    &["Referring Clinician", "Referring Doctor", "Clinician"],
);
pub const HOSPITAL_CLINIC: Field = Field::new(
    "hospital/clinic",
    &["Center name", "Hospital", "Clinic", "Center", "Hospital/Clinic"],
);
pub const SPECIMEN: Field = Field::new("specimen", &["Specimen Type", "Sample Type", "Specimen"]);
pub const BIOPSY_PERFORMED_BY: Field =
    Field::new("biopsy performed by", &["EMBRYOLOGIST NAME", "Biologist"]);
pub const INDICATION: Field = Field::new("indication", &["Indication", "Clinical Indication"]);
pub const BIOPSY_DATE: Field = Field::new("biopsy date", &["Date of Biopsy", "Biopsy Date"]);
pub const COLLECTION_DATE: Field = Field::new(
    "sample collection date",
    &["Sample Collection Date", "Date of Collection", "Collection Date"],
);
pub const RECEIPT_DATE: Field =
    Field::new("sample receipt date", &["Date Sample Received", "Receipt Date"]);
pub const REPORT_DATE: Field = Field::new("report date", &["Report Date", "Date of Report"]);

/// One patient from the roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatientRecord {
    pub patient_name: NonEmptyText,
    /// "w/o" when the roster has no spouse.
    pub spouse_name: String,
    /// PIN / sample identifier used for linkage.
    pub pin: String,
    pub age: String,
    pub sample_number: String,
    pub referring_clinician: String,
    pub hospital_clinic: String,
    pub specimen: String,
    pub biopsy_performed_by: String,
    pub indication: String,
    pub biopsy_date: String,
    pub sample_collection_date: String,
    pub sample_receipt_date: String,
    pub report_date: String,
}

impl PatientRecord {
    pub fn link_keys(&self) -> LinkKeys {
        LinkKeys::new(&self.pin, self.patient_name.as_str())
    }
}

/// Roster rows that produced patients, and how many rows were skipped for a blank name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Roster {
    pub patients: Vec<PatientRecord>,
    pub skipped_rows: usize,
}

/// Resolved column positions for the roster table.
#[derive(Clone, Copy, Debug)]
struct RosterColumns {
    patient_name: usize,
    sample_identifier: usize,
    spouse_name: Option<usize>,
    age: Option<usize>,
    sample_number: Option<usize>,
    referring_clinician: Option<usize>,
    hospital_clinic: Option<usize>,
    specimen: Option<usize>,
    biopsy_performed_by: Option<usize>,
    indication: Option<usize>,
    biopsy_date: Option<usize>,
    collection_date: Option<usize>,
    receipt_date: Option<usize>,
    report_date: Option<usize>,
}

impl RosterColumns {
    fn resolve(table: &Table) -> PipelineResult<Self> {
        Ok(Self {
            patient_name: table.require_column(&PATIENT_NAME)?,
            sample_identifier: table.require_column(&SAMPLE_IDENTIFIER)?,
            spouse_name: table.column(&SPOUSE_NAME),
            age: table.column(&AGE),
            sample_number: table.column(&SAMPLE_NUMBER),
            referring_clinician: table.column(&REFERRING_CLINICIAN),
            hospital_clinic: table.column(&HOSPITAL_CLINIC),
            specimen: table.column(&SPECIMEN),
            biopsy_performed_by: table.column(&BIOPSY_PERFORMED_BY),
            indication: table.column(&INDICATION),
            biopsy_date: table.column(&BIOPSY_DATE),
            collection_date: table.column(&COLLECTION_DATE),
            receipt_date: table.column(&RECEIPT_DATE),
            report_date: table.column(&REPORT_DATE),
        })
    }
}

/// Builds patient records from a roster table.
///
/// # Arguments
///
/// * `table` - Roster table; patient name and sample identifier columns are required.
/// * `default_specimen` - Specimen text used when the roster has none.
/// * `report_date` - Batch report date, used when a row carries no report date.
///
/// # Errors
///
/// Returns [`crate::PipelineError::MissingColumn`] if a required column is absent and
/// [`crate::PipelineError::EmptyTable`] if the table has no data rows.
pub fn load_roster(
    table: &Table,
    default_specimen: &str,
    report_date: NaiveDate,
) -> PipelineResult<Roster> {
    let columns = RosterColumns::resolve(table)?;
    if table.is_empty() {
        return Err(crate::PipelineError::EmptyTable {
            table: table.name(),
        });
    }

    let mut roster = Roster {
        patients: Vec::with_capacity(table.len()),
        skipped_rows: 0,
    };

    for row in table.rows() {
        match patient_from_row(&row, &columns, default_specimen, report_date) {
            Some(patient) => roster.patients.push(patient),
            None => {
                tracing::warn!(row = row.number, "skipping roster row without a patient name");
                roster.skipped_rows += 1;
            }
        }
    }

    Ok(roster)
}

fn patient_from_row(
    row: &TableRow<'_>,
    columns: &RosterColumns,
    default_specimen: &str,
    report_date: NaiveDate,
) -> Option<PatientRecord> {
    let patient_name = NonEmptyText::new(row.at(columns.patient_name)).ok()?;
    let text = |column: Option<usize>| row.get(column).to_string();
    let or_default = |column: Option<usize>, default: &str| {
        let value = row.get(column);
        if value.is_empty() {
            default.to_string()
        } else {
            value.to_string()
        }
    };

    let biopsy_date = format_roster_date(row.get(columns.biopsy_date));
    let collection_date = match row.get(columns.collection_date) {
        "" => biopsy_date.clone(),
        raw => format_roster_date(raw),
    };
    let report_date = match row.get(columns.report_date) {
        "" => report_date.format(REPORT_DATE_FORMAT).to_string(),
        raw => format_roster_date(raw),
    };

    Some(PatientRecord {
        patient_name,
        spouse_name: or_default(columns.spouse_name, NO_SPOUSE),
        pin: row.at(columns.sample_identifier).to_string(),
        age: text(columns.age),
        sample_number: text(columns.sample_number),
        referring_clinician: text(columns.referring_clinician),
        hospital_clinic: text(columns.hospital_clinic),
        specimen: or_default(columns.specimen, default_specimen),
        biopsy_performed_by: text(columns.biopsy_performed_by),
        indication: text(columns.indication),
        biopsy_date,
        sample_collection_date: collection_date,
        sample_receipt_date: format_roster_date(row.get(columns.receipt_date)),
        report_date,
    })
}

/// Normalises a roster date to `DD/MM/YYYY`.
///
/// A time part after a space is ignored. Day-first is tried before month-first, so
/// `03/04/2025` is the 3rd of April. Text that is not a date is returned unchanged.
pub fn format_roster_date(raw: &str) -> String {
    let date_part = raw.trim().split(' ').next().unwrap_or_default();
    if date_part.is_empty() {
        return String::new();
    }

    ROSTER_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .map(|date| date.format(REPORT_DATE_FORMAT).to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}
