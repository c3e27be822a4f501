//! Lab vocabulary: the keyword table used to read QC flags and lab conclusions.
//!
//! The lab's wording changes over time, so the phrases that drive the overall classifier are
//! data rather than code. A built-in table reproduces the current wording; a YAML file with
//! the same shape can replace it.
//!
//! ```yaml
//! version: 1
//! inconclusive:
//!   - match: contains
//!     words: [RESEQUENCING]
//! normal:
//!   - match: exact
//!     text: EUPLOID
//! ```

use crate::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// One vocabulary entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case", deny_unknown_fields)]
pub enum Phrase {
    /// Every word must occur somewhere in the text (case-insensitive substring).
    Contains { words: Vec<String> },
    /// The whole trimmed text must equal this (case-insensitive).
    Exact { text: String },
}

impl Phrase {
    pub fn contains(words: &[&str]) -> Self {
        Phrase::Contains {
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn exact(text: &str) -> Self {
        Phrase::Exact {
            text: text.to_string(),
        }
    }

    /// Tests this phrase against text that has already been upper-cased and trimmed.
    fn matches_upper(&self, upper: &str) -> bool {
        match self {
            Phrase::Contains { words } => words
                .iter()
                .all(|w| upper.contains(w.trim().to_uppercase().as_str())),
            Phrase::Exact { text } => upper == text.trim().to_uppercase(),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Phrase::Contains { words } => {
                words.is_empty() || words.iter().any(|w| w.trim().is_empty())
            }
            Phrase::Exact { text } => text.trim().is_empty(),
        }
    }
}

/// Phrase classes, in the order the overall classifier consults them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhraseClass {
    QcFail,
    Inconclusive,
    LowDna,
    Chaotic,
    Normal,
    Mosaic,
    Abnormal,
}

/// Versioned keyword table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vocabulary {
    pub version: u32,
    /// Values of the QC column that mean the sample failed QC.
    #[serde(default)]
    pub qc_fail: Vec<Phrase>,
    #[serde(default)]
    pub inconclusive: Vec<Phrase>,
    #[serde(default)]
    pub low_dna: Vec<Phrase>,
    #[serde(default)]
    pub chaotic: Vec<Phrase>,
    pub normal: Vec<Phrase>,
    pub mosaic: Vec<Phrase>,
    pub abnormal: Vec<Phrase>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            version: 1,
            qc_fail: vec![Phrase::exact("FAIL"), Phrase::exact("FAILED")],
            inconclusive: vec![
                Phrase::contains(&["INCONCLUSIVE"]),
                Phrase::contains(&["RESEQUENCING"]),
                Phrase::contains(&["RE-SEQUENCING"]),
            ],
            low_dna: vec![
                Phrase::contains(&["LOW", "DNA"]),
                Phrase::contains(&["LOW", "READS"]),
                Phrase::contains(&["INSUFFICIENT", "DNA"]),
            ],
            chaotic: vec![
                Phrase::contains(&["CHAOTIC"]),
                Phrase::contains(&["HIGHLY ABNORMAL"]),
            ],
            normal: vec![
                Phrase::contains(&["NO COPY NUMBER ABNORMALITY"]),
                Phrase::exact("EUPLOID"),
                Phrase::exact("NORMAL"),
            ],
            mosaic: vec![Phrase::contains(&["MOSAIC"])],
            abnormal: vec![
                Phrase::contains(&["ABNORMAL"]),
                Phrase::contains(&["ANEUPLOID"]),
                Phrase::contains(&["MONOSOMY"]),
                Phrase::contains(&["TRISOMY"]),
            ],
        }
    }
}

impl Vocabulary {
    /// Parse a vocabulary from YAML text and validate it.
    ///
    /// Schema mismatches report the failing field path (e.g. `normal[1].text`).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidVocabulary`] if the YAML does not match the schema,
    /// contains unknown keys, or contains blank phrases.
    pub fn from_yaml(yaml_text: &str) -> PipelineResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let vocabulary: Vocabulary = serde_path_to_error::deserialize(deserializer).map_err(
            |err| {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                PipelineError::InvalidVocabulary(format!("schema mismatch at {path}: {source}"))
            },
        )?;
        vocabulary.validate()?;
        Ok(vocabulary)
    }

    /// Read and parse a vocabulary file.
    pub fn from_file(path: &std::path::Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(PipelineError::FileRead)?;
        Self::from_yaml(&text)
    }

    /// Render this vocabulary as YAML.
    pub fn to_yaml(&self) -> PipelineResult<String> {
        serde_yaml::to_string(self).map_err(PipelineError::YamlSerialization)
    }

    /// Checks that the table can classify anything at all.
    pub fn validate(&self) -> PipelineResult<()> {
        let classes = [
            ("qc_fail", &self.qc_fail),
            ("inconclusive", &self.inconclusive),
            ("low_dna", &self.low_dna),
            ("chaotic", &self.chaotic),
            ("normal", &self.normal),
            ("mosaic", &self.mosaic),
            ("abnormal", &self.abnormal),
        ];

        for (name, phrases) in classes {
            if let Some(index) = phrases.iter().position(Phrase::is_blank) {
                return Err(PipelineError::InvalidVocabulary(format!(
                    "{name}[{index}] is blank"
                )));
            }
        }

        for (name, phrases) in [
            ("normal", &self.normal),
            ("mosaic", &self.mosaic),
            ("abnormal", &self.abnormal),
        ] {
            if phrases.is_empty() {
                return Err(PipelineError::InvalidVocabulary(format!(
                    "{name} must contain at least one phrase"
                )));
            }
        }

        Ok(())
    }

    fn phrases(&self, class: PhraseClass) -> &[Phrase] {
        match class {
            PhraseClass::QcFail => &self.qc_fail,
            PhraseClass::Inconclusive => &self.inconclusive,
            PhraseClass::LowDna => &self.low_dna,
            PhraseClass::Chaotic => &self.chaotic,
            PhraseClass::Normal => &self.normal,
            PhraseClass::Mosaic => &self.mosaic,
            PhraseClass::Abnormal => &self.abnormal,
        }
    }

    /// Returns true if any phrase of `class` matches `text`.
    pub fn matches(&self, class: PhraseClass, text: &str) -> bool {
        let upper = text.trim().to_uppercase();
        if upper.is_empty() {
            return false;
        }
        self.phrases(class).iter().any(|p| p.matches_upper(&upper))
    }

    /// Returns true if any phrase of `class` matches any of `texts`.
    pub fn matches_any(&self, class: PhraseClass, texts: &[&str]) -> bool {
        texts.iter().any(|text| self.matches(class, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_vocabulary_is_valid() {
        Vocabulary::default()
            .validate()
            .expect("built-in vocabulary should validate");
    }

    #[test]
    fn exact_phrases_do_not_match_inside_longer_words() {
        let vocabulary = Vocabulary::default();
        assert!(vocabulary.matches(PhraseClass::Normal, " euploid "));
        assert!(!vocabulary.matches(PhraseClass::Normal, "ANEUPLOID"));
        assert!(vocabulary.matches(PhraseClass::Abnormal, "ANEUPLOID"));
    }

    #[test]
    fn contains_phrases_require_every_word() {
        let vocabulary = Vocabulary::default();
        assert!(vocabulary.matches(PhraseClass::LowDna, "Low reads, repeat biopsy"));
        assert!(vocabulary.matches(PhraseClass::LowDna, "LOW DNA CONCENTRATION"));
        assert!(!vocabulary.matches(PhraseClass::LowDna, "low level mosaic"));
    }

    #[test]
    fn empty_text_never_matches() {
        let vocabulary = Vocabulary::default();
        assert!(!vocabulary.matches(PhraseClass::Normal, "   "));
        assert!(!vocabulary.matches_any(PhraseClass::Mosaic, &["", ""]));
    }

    #[test]
    fn yaml_round_trips_through_tagged_phrases() {
        let vocabulary = Vocabulary::default();
        let yaml = vocabulary.to_yaml().expect("render yaml");
        assert!(yaml.contains("match: contains"));
        assert!(yaml.contains("match: exact"));
        let reparsed = Vocabulary::from_yaml(&yaml).expect("reparse yaml");
        assert_eq!(vocabulary, reparsed);
    }

    #[test]
    fn yaml_can_extend_the_vocabulary() {
        let input = r#"version: 2
normal:
  - match: exact
    text: EUPLOID
  - match: contains
    words: [NO ANEUPLOIDY DETECTED]
mosaic:
  - match: contains
    words: [MOSAIC]
abnormal:
  - match: contains
    words: [ABNORMAL]
"#;
        let vocabulary = Vocabulary::from_yaml(input).expect("parse yaml");
        assert_eq!(vocabulary.version, 2);
        assert!(vocabulary.qc_fail.is_empty());
        assert!(vocabulary.matches(PhraseClass::Normal, "No aneuploidy detected"));
    }

    #[test]
    fn yaml_rejects_unknown_keys_with_path() {
        let input = r#"version: 1
normal:
  - match: exact
    text: EUPLOID
    extra: nope
mosaic: []
abnormal: []
"#;
        let err = Vocabulary::from_yaml(input).expect_err("should reject unknown key");
        match err {
            PipelineError::InvalidVocabulary(msg) => {
                assert!(msg.contains("normal"), "{msg}");
            }
            other => panic!("expected InvalidVocabulary error, got {other:?}"),
        }
    }

    #[test]
    fn validation_rejects_blank_phrases_and_empty_required_classes() {
        let mut vocabulary = Vocabulary::default();
        vocabulary.chaotic.push(Phrase::contains(&[" "]));
        let err = vocabulary.validate().expect_err("blank phrase");
        assert!(matches!(err, PipelineError::InvalidVocabulary(msg) if msg.contains("chaotic[2]")));

        let mut vocabulary = Vocabulary::default();
        vocabulary.mosaic.clear();
        let err = vocabulary.validate().expect_err("empty mosaic class");
        assert!(matches!(err, PipelineError::InvalidVocabulary(msg) if msg.contains("mosaic")));
    }
}
