//! Row-level warnings.
//!
//! A warning never aborts a batch. It is attached to the embryo record it concerns so an
//! auditor can tell a genuinely normal result apart from one where lab text could not be read.

use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowWarning {
    /// A notation clause matched no known event grammar; its chromosome stays normal.
    UnparsedClause { clause: String },
    /// An event keyword was found but the chromosome label is not 1–22, X or Y.
    InvalidChromosome { clause: String, label: String },
    /// A percentage qualifier above 100 was ignored.
    PercentageOutOfRange { clause: String, value: String },
    /// The whole notation was read with the legacy `<status>-<chromosome>` rule.
    LegacyDashFallback { notation: String },
    /// The lab conclusion reports a normal embryo but the notation lists abnormal events.
    ConclusionContradictsNotation { conclusion: String },
    /// The lab conclusion matched no vocabulary phrase.
    UnrecognisedConclusion { conclusion: String },
    /// A mosaic embryo carried no percentage, so the low-level grade was assumed.
    MosaicLevelDefaulted,
    /// The lab's own autosome text disagrees with the parsed status map.
    AutosomeTextDisagrees { autosomes: String },
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowWarning::UnparsedClause { clause } => {
                write!(f, "unparsed notation clause {clause:?}")
            }
            RowWarning::InvalidChromosome { clause, label } => {
                write!(f, "invalid chromosome {label:?} in clause {clause:?}")
            }
            RowWarning::PercentageOutOfRange { clause, value } => {
                write!(f, "ignored mosaic percentage {value}% in clause {clause:?}")
            }
            RowWarning::LegacyDashFallback { notation } => {
                write!(f, "notation {notation:?} read with the legacy dash rule")
            }
            RowWarning::ConclusionContradictsNotation { conclusion } => write!(
                f,
                "conclusion {conclusion:?} reports normal but the notation lists abnormal events"
            ),
            RowWarning::UnrecognisedConclusion { conclusion } => {
                write!(f, "unrecognised conclusion {conclusion:?}")
            }
            RowWarning::MosaicLevelDefaulted => {
                f.write_str("mosaic level defaulted to low: no percentage reported")
            }
            RowWarning::AutosomeTextDisagrees { autosomes } => write!(
                f,
                "lab autosome text {autosomes:?} disagrees with the parsed status map"
            ),
        }
    }
}
