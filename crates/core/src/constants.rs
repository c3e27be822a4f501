//! Constants used throughout the PGT-A core crate.
//!
//! Report wording lives here so every rendering surface receives identical text.

/// Autosome description when no chromosome is abnormal.
pub const NORMAL_AUTOSOMES: &str = "Normal";

/// Autosome description for categories that cannot be reported (inconclusive runs).
pub const NOT_REPORTABLE: &str = "NA";

/// Autosome description when an abnormal call has no parseable notation and no lab text.
pub const UNRESOLVED_AUTOSOMES: &str = "Unresolved";

/// Placeholder used for absent spouse names on reports.
pub const NO_SPOUSE: &str = "w/o";

/// Specimen used when the roster leaves the column blank.
pub const DEFAULT_SPECIMEN: &str = "Day 6 Trophectoderm Biopsy";

/// Date format printed on reports.
pub const REPORT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Input date formats accepted from roster spreadsheets, tried in order.
pub const ROSTER_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];

/// Spreadsheet spellings of an empty cell.
pub const NULL_CELL_SPELLINGS: [&str; 4] = ["nan", "none", "nat", "null"];

/// Mosaic percentage at or above which a mosaic embryo is graded high level.
pub const DEFAULT_MOSAIC_HIGH_THRESHOLD: u8 = 50;

/// Number of simultaneously mosaic chromosomes that makes a mosaic embryo complex.
pub const DEFAULT_COMPLEX_MOSAIC_CHROMOSOMES: usize = 3;

/// Number of abnormal chromosomes from which an embryo is reported as multiply abnormal.
pub const DEFAULT_MULTIPLE_ABNORMALITY_EVENTS: usize = 3;

/// Image extensions recognised as CNV charts.
pub const CHART_IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Environment variable naming a vocabulary YAML file.
pub const VOCABULARY_FILE_ENV: &str = "PGTA_VOCABULARY_FILE";

/// Environment variable holding the batch report date (YYYY-MM-DD).
pub const REPORT_DATE_ENV: &str = "PGTA_REPORT_DATE";

/// Run workbook sheet holding the patient roster, matched case-insensitively.
pub const ROSTER_SHEET: &str = "Details";

/// Run workbook sheet holding the per-sample results, matched case-insensitively.
pub const RESULTS_SHEET: &str = "summary";
