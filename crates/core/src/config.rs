//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the pipeline. Nothing here is read from the environment during processing; the
//! CLI resolves environment values and hands them in.

use crate::constants::{
    DEFAULT_COMPLEX_MOSAIC_CHROMOSOMES, DEFAULT_MOSAIC_HIGH_THRESHOLD,
    DEFAULT_MULTIPLE_ABNORMALITY_EVENTS, DEFAULT_SPECIMEN,
};
use crate::vocabulary::Vocabulary;
use crate::{PipelineError, PipelineResult};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    vocabulary: Vocabulary,
    mosaic_high_threshold: u8,
    complex_mosaic_chromosomes: usize,
    multiple_abnormality_events: usize,
    default_specimen: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if the mosaic threshold is outside 1–100, a
    /// chromosome or event count is below 2, or the default specimen is blank, and
    /// [`PipelineError::InvalidVocabulary`] if the vocabulary does not validate.
    pub fn new(
        vocabulary: Vocabulary,
        mosaic_high_threshold: u8,
        complex_mosaic_chromosomes: usize,
        multiple_abnormality_events: usize,
        default_specimen: String,
    ) -> PipelineResult<Self> {
        vocabulary.validate()?;

        if !(1..=100).contains(&mosaic_high_threshold) {
            return Err(PipelineError::InvalidInput(format!(
                "mosaic_high_threshold must be between 1 and 100, got {mosaic_high_threshold}"
            )));
        }
        if complex_mosaic_chromosomes < 2 {
            return Err(PipelineError::InvalidInput(
                "complex_mosaic_chromosomes must be at least 2".into(),
            ));
        }
        if multiple_abnormality_events < 2 {
            return Err(PipelineError::InvalidInput(
                "multiple_abnormality_events must be at least 2".into(),
            ));
        }
        if default_specimen.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "default_specimen cannot be empty".into(),
            ));
        }

        Ok(Self {
            vocabulary,
            mosaic_high_threshold,
            complex_mosaic_chromosomes,
            multiple_abnormality_events,
            default_specimen,
        })
    }

    /// Default thresholds with the given vocabulary.
    pub fn with_vocabulary(vocabulary: Vocabulary) -> PipelineResult<Self> {
        Self::new(
            vocabulary,
            DEFAULT_MOSAIC_HIGH_THRESHOLD,
            DEFAULT_COMPLEX_MOSAIC_CHROMOSOMES,
            DEFAULT_MULTIPLE_ABNORMALITY_EVENTS,
            DEFAULT_SPECIMEN.to_string(),
        )
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Mosaic percentage at or above which a mosaic embryo is graded high level.
    pub fn mosaic_high_threshold(&self) -> u8 {
        self.mosaic_high_threshold
    }

    /// Number of simultaneously mosaic chromosomes that makes a mosaic embryo complex.
    pub fn complex_mosaic_chromosomes(&self) -> usize {
        self.complex_mosaic_chromosomes
    }

    /// Number of abnormal chromosomes that makes an abnormal embryo "multiple".
    pub fn multiple_abnormality_events(&self) -> usize {
        self.multiple_abnormality_events
    }

    pub fn default_specimen(&self) -> &str {
        &self.default_specimen
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            vocabulary: Vocabulary::default(),
            mosaic_high_threshold: DEFAULT_MOSAIC_HIGH_THRESHOLD,
            complex_mosaic_chromosomes: DEFAULT_COMPLEX_MOSAIC_CHROMOSOMES,
            multiple_abnormality_events: DEFAULT_MULTIPLE_ABNORMALITY_EVENTS,
            default_specimen: DEFAULT_SPECIMEN.to_string(),
        }
    }
}

/// Resolve the lab vocabulary without reading environment variables.
///
/// If `override_file` is provided it must be a readable YAML vocabulary; otherwise the
/// built-in vocabulary is used.
pub fn resolve_vocabulary(override_file: Option<PathBuf>) -> PipelineResult<Vocabulary> {
    match override_file {
        Some(path) if path.is_file() => Vocabulary::from_file(&path),
        Some(path) => Err(PipelineError::InvalidInput(format!(
            "vocabulary file {} does not exist",
            path.display()
        ))),
        None => Ok(Vocabulary::default()),
    }
}

/// Parse the report date from an optional string value (`YYYY-MM-DD`).
///
/// If `value` is `None` or empty/whitespace, returns `today`.
pub fn report_date_from_env_value(
    value: Option<String>,
    today: NaiveDate,
) -> PipelineResult<NaiveDate> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        Some(v) => NaiveDate::parse_from_str(&v, "%Y-%m-%d").map_err(|err| {
            PipelineError::InvalidInput(format!("report date {v:?} is not YYYY-MM-DD: {err}"))
        }),
        None => Ok(today),
    }
}
