//! # PGT-A Core
//!
//! Result normalisation and record linkage for PGT-A lab runs.
//!
//! This crate turns two spreadsheets into a patient → embryo hierarchy:
//! - the lab's free-text CNV notation is parsed into per-chromosome events and statuses
//! - every sample gets an overall clinical category, an autosome description and a severity
//! - result rows are linked to roster patients by normalised identifier or name
//!
//! **No rendering concerns**: PDF/DOCX layout belongs to the report renderers, which consume
//! [`BatchReport`] and perform no further interpretation of the lab's text.

pub mod autosomes;
pub mod classification;
pub mod config;
pub mod constants;
pub mod embryo;
pub mod error;
pub mod images;
pub mod linkage;
pub mod notation;
pub mod pipeline;
pub mod presentation;
pub mod roster;
pub mod status;
pub mod table;
pub mod vocabulary;
pub mod warnings;

pub use classification::{MosaicLevel, OverallCategory};
pub use config::CoreConfig;
pub use embryo::{EmbryoResult, RawResultRow};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{process_files, process_workbook, run_batch, BatchContext, BatchReport};
pub use presentation::Severity;
pub use roster::PatientRecord;
pub use status::{ChromosomeStatusMap, CnvStatus};
pub use vocabulary::Vocabulary;
pub use warnings::RowWarning;
