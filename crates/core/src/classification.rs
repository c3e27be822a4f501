//! Overall result classification.
//!
//! Combines the QC flag, the lab conclusion, the raw notation and the parsed status map into
//! one report-level category. Rules are evaluated top to bottom and the first match wins; the
//! order is clinical precedence:
//!
//! 1. QC failure or inconclusive / re-sequencing text → Inconclusive
//! 2. insufficient DNA or reads → Low DNA concentration
//! 3. chaotic or highly abnormal → Chaotic embryo
//! 4. normal conclusion, or a silent conclusion over a fully parsed all-normal map → Normal
//! 5. mosaic marker (or a map whose abnormalities are all mosaic) → Mosaic, graded
//! 6. abnormal conclusion or abnormal map → Multiple abnormalities / Abnormal by event count
//! 7. anything left (unreadable notation, unknown wording) → Inconclusive

use crate::notation::first_percentage;
use crate::status::ChromosomeStatusMap;
use crate::vocabulary::PhraseClass;
use crate::{CoreConfig, RowWarning};
use serde::Serialize;
use std::fmt;

/// Grade of a mosaic embryo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MosaicLevel {
    Low,
    High,
    Complex,
}

impl MosaicLevel {
    pub fn label(self) -> &'static str {
        match self {
            MosaicLevel::Low => "Low level mosaic",
            MosaicLevel::High => "High level mosaic",
            MosaicLevel::Complex => "Complex mosaic",
        }
    }
}

/// Report-level category. The set is closed: renderers match on these labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverallCategory {
    Normal,
    /// One or two abnormal chromosomes.
    Abnormal,
    MultipleAbnormalities,
    Mosaic(MosaicLevel),
    ChaoticEmbryo,
    Inconclusive,
    LowDnaConcentration,
}

impl OverallCategory {
    /// Summary label printed in the results table.
    pub fn label(self) -> &'static str {
        match self {
            OverallCategory::Normal => "Normal chromosome complement",
            OverallCategory::Abnormal => "Abnormal chromosome complement",
            OverallCategory::MultipleAbnormalities => "Multiple chromosomal abnormalities",
            OverallCategory::Mosaic(_) => "Mosaic chromosome complement",
            OverallCategory::ChaoticEmbryo => "Chaotic embryo",
            OverallCategory::Inconclusive => "Inconclusive",
            OverallCategory::LowDnaConcentration => "Low DNA concentration",
        }
    }

    /// Interpretation column: the mosaic grade, the chaotic call, or "NA".
    pub fn interpretation(self) -> &'static str {
        match self {
            OverallCategory::Mosaic(level) => level.label(),
            OverallCategory::ChaoticEmbryo => "Chaotic embryo",
            _ => "NA",
        }
    }

    /// Sentence used on the per-embryo result page.
    pub fn result_description(self) -> &'static str {
        match self {
            OverallCategory::Normal => "The embryo contains normal chromosome complement",
            OverallCategory::Abnormal
            | OverallCategory::MultipleAbnormalities
            | OverallCategory::ChaoticEmbryo => "The embryo contains abnormal chromosome complement",
            OverallCategory::Mosaic(_) => "The embryo contains mosaic chromosome complement",
            OverallCategory::Inconclusive | OverallCategory::LowDnaConcentration => "Inconclusive",
        }
    }

    /// False for runs that produced no interpretable copy-number profile.
    pub fn is_reportable(self) -> bool {
        !matches!(
            self,
            OverallCategory::Inconclusive | OverallCategory::LowDnaConcentration
        )
    }

    pub fn is_mosaic(self) -> bool {
        matches!(self, OverallCategory::Mosaic(_))
    }

    pub fn mosaic_level(self) -> Option<MosaicLevel> {
        match self {
            OverallCategory::Mosaic(level) => Some(level),
            _ => None,
        }
    }
}

impl fmt::Display for OverallCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for OverallCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

/// Lab-supplied text for one sample.
#[derive(Clone, Copy, Debug, Default)]
pub struct LabCall<'a> {
    pub qc: &'a str,
    pub conclusion: &'a str,
    pub notation: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub category: OverallCategory,
    pub warnings: Vec<RowWarning>,
}

impl Classification {
    fn of(category: OverallCategory) -> Self {
        Self {
            category,
            warnings: Vec::new(),
        }
    }
}

/// Classifies samples using the configured vocabulary and thresholds.
#[derive(Clone, Copy, Debug)]
pub struct OverallClassifier<'a> {
    config: &'a CoreConfig,
}

impl<'a> OverallClassifier<'a> {
    pub fn new(config: &'a CoreConfig) -> Self {
        Self { config }
    }

    /// Classifies one sample.
    ///
    /// # Arguments
    ///
    /// * `call` - QC flag, conclusion and raw notation as supplied by the lab.
    /// * `map` - Status map parsed from the notation.
    /// * `notation_incomplete` - True when some notation clause could not be parsed, in which
    ///   case an all-normal map is not evidence of a normal embryo.
    pub fn classify(
        &self,
        call: &LabCall<'_>,
        map: &ChromosomeStatusMap,
        notation_incomplete: bool,
    ) -> Classification {
        let vocabulary = self.config.vocabulary();
        let lab_text = [call.conclusion, call.notation];

        if vocabulary.matches(PhraseClass::QcFail, call.qc)
            || vocabulary.matches_any(PhraseClass::Inconclusive, &lab_text)
        {
            return Classification::of(OverallCategory::Inconclusive);
        }

        if vocabulary.matches_any(PhraseClass::LowDna, &lab_text) {
            return Classification::of(OverallCategory::LowDnaConcentration);
        }

        if vocabulary.matches_any(PhraseClass::Chaotic, &lab_text) {
            return Classification::of(OverallCategory::ChaoticEmbryo);
        }

        let conclusion_mosaic = vocabulary.matches(PhraseClass::Mosaic, call.conclusion);
        let conclusion_abnormal = vocabulary.matches(PhraseClass::Abnormal, call.conclusion);
        let conclusion_normal = vocabulary.matches(PhraseClass::Normal, call.conclusion)
            || (vocabulary.matches(PhraseClass::Normal, call.notation)
                && !conclusion_mosaic
                && !conclusion_abnormal);

        if conclusion_normal {
            let mut classification = Classification::of(OverallCategory::Normal);
            if !map.is_all_normal() {
                classification
                    .warnings
                    .push(RowWarning::ConclusionContradictsNotation {
                        conclusion: call.conclusion.trim().to_string(),
                    });
            }
            return classification;
        }

        let mosaic_marker = conclusion_mosaic
            || vocabulary.matches(PhraseClass::Mosaic, call.notation)
            || (!conclusion_abnormal
                && map.abnormal_count() > 0
                && map.abnormal().all(|(_, status)| status.is_mosaic()));

        let silent_conclusion = !mosaic_marker && !conclusion_abnormal;
        if silent_conclusion && map.is_all_normal() && !notation_incomplete {
            let mut classification = Classification::of(OverallCategory::Normal);
            if !call.conclusion.trim().is_empty() {
                classification
                    .warnings
                    .push(RowWarning::UnrecognisedConclusion {
                        conclusion: call.conclusion.trim().to_string(),
                    });
            }
            return classification;
        }

        if mosaic_marker {
            return self.grade_mosaic(call, map);
        }

        if conclusion_abnormal || !map.is_all_normal() {
            let category =
                if map.abnormal_count() >= self.config.multiple_abnormality_events() {
                    OverallCategory::MultipleAbnormalities
                } else {
                    OverallCategory::Abnormal
                };
            return Classification::of(category);
        }

        let mut classification = Classification::of(OverallCategory::Inconclusive);
        if !call.conclusion.trim().is_empty() {
            classification
                .warnings
                .push(RowWarning::UnrecognisedConclusion {
                    conclusion: call.conclusion.trim().to_string(),
                });
        }
        classification
    }

    fn grade_mosaic(&self, call: &LabCall<'_>, map: &ChromosomeStatusMap) -> Classification {
        if map.mosaic_count() >= self.config.complex_mosaic_chromosomes() {
            return Classification::of(OverallCategory::Mosaic(MosaicLevel::Complex));
        }

        let percentage = map
            .max_mosaic_percentage()
            .or_else(|| first_percentage(call.conclusion))
            .or_else(|| first_percentage(call.notation));

        match percentage {
            Some(pct) if pct >= self.config.mosaic_high_threshold() => {
                Classification::of(OverallCategory::Mosaic(MosaicLevel::High))
            }
            Some(_) => Classification::of(OverallCategory::Mosaic(MosaicLevel::Low)),
            None => Classification {
                category: OverallCategory::Mosaic(MosaicLevel::Low),
                warnings: vec![RowWarning::MosaicLevelDefaulted],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse_notation;

    fn classify(qc: &str, conclusion: &str, notation: &str) -> Classification {
        let config = CoreConfig::default();
        let parsed = parse_notation(notation);
        let map = ChromosomeStatusMap::from_events(&parsed.events);
        OverallClassifier::new(&config).classify(
            &LabCall {
                qc,
                conclusion,
                notation,
            },
            &map,
            parsed.has_unparsed(),
        )
    }

    #[test]
    fn qc_failure_outranks_mosaic_conclusion() {
        let result = classify("FAIL", "Mosaic chromosome complement", "dup(18)(~60%)");
        assert_eq!(result.category, OverallCategory::Inconclusive);
    }

    #[test]
    fn resequencing_note_is_inconclusive() {
        let result = classify("PASS", "Abnormal", "Resequencing required");
        assert_eq!(result.category, OverallCategory::Inconclusive);
    }

    #[test]
    fn low_reads_outranks_chaotic() {
        let result = classify("PASS", "Chaotic", "Low reads");
        assert_eq!(result.category, OverallCategory::LowDnaConcentration);
        assert!(!result.category.is_reportable());
    }

    #[test]
    fn chaotic_conclusion() {
        let result = classify("PASS", "Chaotic embryo", "+1,+2,-3,-4,+5");
        assert_eq!(result.category, OverallCategory::ChaoticEmbryo);
        assert_eq!(result.category.interpretation(), "Chaotic embryo");
    }

    #[test]
    fn normal_conclusion_over_normal_map() {
        let result = classify("PASS", "No copy number abnormality detected", "");
        assert_eq!(result.category, OverallCategory::Normal);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn normal_conclusion_over_abnormal_map_is_flagged() {
        let result = classify("PASS", "Euploid", "+21");
        assert_eq!(result.category, OverallCategory::Normal);
        assert!(matches!(
            result.warnings.as_slice(),
            [RowWarning::ConclusionContradictsNotation { .. }]
        ));
    }

    #[test]
    fn aneuploid_conclusion_is_not_read_as_euploid() {
        let result = classify("PASS", "Aneuploid", "-16");
        assert_eq!(result.category, OverallCategory::Abnormal);
    }

    #[test]
    fn mosaic_grades_by_percentage() {
        let low = classify("PASS", "Mosaic", "dup(18)(~30%)");
        assert_eq!(low.category, OverallCategory::Mosaic(MosaicLevel::Low));

        let high = classify("PASS", "Mosaic", "del(5)(p15.33q12.3)(~64.50Mb,~57%)");
        assert_eq!(high.category, OverallCategory::Mosaic(MosaicLevel::High));

        let boundary = classify("PASS", "Mosaic", "dup(7)(~50%)");
        assert_eq!(boundary.category, OverallCategory::Mosaic(MosaicLevel::High));
    }

    #[test]
    fn three_mosaic_chromosomes_are_complex() {
        let result = classify("PASS", "Mosaic", "dup(2)(~20%),dup(7)(~25%),del(9)(~30%)");
        assert_eq!(result.category, OverallCategory::Mosaic(MosaicLevel::Complex));
        assert_eq!(result.category.interpretation(), "Complex mosaic");
    }

    #[test]
    fn mosaic_without_percentage_defaults_low_with_warning() {
        let result = classify("PASS", "Mosaic", "mos(7)");
        assert_eq!(result.category, OverallCategory::Mosaic(MosaicLevel::Low));
        assert_eq!(result.warnings, vec![RowWarning::MosaicLevelDefaulted]);
    }

    #[test]
    fn mosaic_percentage_can_come_from_conclusion() {
        let result = classify("PASS", "Mosaic gain (~70%)", "");
        assert_eq!(result.category, OverallCategory::Mosaic(MosaicLevel::High));
    }

    #[test]
    fn all_mosaic_map_with_silent_conclusion_is_mosaic() {
        let result = classify("PASS", "", "dup(18)(~30%)");
        assert_eq!(result.category, OverallCategory::Mosaic(MosaicLevel::Low));
    }

    #[test]
    fn abnormal_counts_split_single_and_multiple() {
        let two = classify("PASS", "Abnormal", "+21,-16");
        assert_eq!(two.category, OverallCategory::Abnormal);

        let three = classify("PASS", "Abnormal", "dup(1)(p36p11)(~120Mb),dup(11)(q13q25)(~70Mb),+21");
        assert_eq!(three.category, OverallCategory::MultipleAbnormalities);
        assert_eq!(three.category.label(), "Multiple chromosomal abnormalities");
    }

    #[test]
    fn abnormal_conclusion_with_unreadable_notation_stays_abnormal() {
        let result = classify("PASS", "Abnormal", "complex rearrangement");
        assert_eq!(result.category, OverallCategory::Abnormal);
    }

    #[test]
    fn unreadable_notation_never_defaults_to_normal() {
        let result = classify("PASS", "", "complex rearrangement");
        assert_eq!(result.category, OverallCategory::Inconclusive);
    }

    #[test]
    fn silent_conclusion_with_clean_map_is_normal() {
        let result = classify("PASS", "", "");
        assert_eq!(result.category, OverallCategory::Normal);
        assert!(result.warnings.is_empty());

        let unknown = classify("PASS", "Reviewed", "");
        assert_eq!(unknown.category, OverallCategory::Normal);
        assert!(matches!(
            unknown.warnings.as_slice(),
            [RowWarning::UnrecognisedConclusion { .. }]
        ));
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(OverallCategory::Normal.to_string(), "Normal chromosome complement");
        assert_eq!(
            OverallCategory::Mosaic(MosaicLevel::High).label(),
            "Mosaic chromosome complement"
        );
        assert_eq!(OverallCategory::Inconclusive.result_description(), "Inconclusive");
        let json = serde_json::to_string(&OverallCategory::LowDnaConcentration).expect("json");
        assert_eq!(json, "\"Low DNA concentration\"");
    }
}
