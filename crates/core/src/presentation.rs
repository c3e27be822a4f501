//! Presentation severity.
//!
//! Renderers colour the summary and interpretation cells of each embryo. The colour is decided
//! here, once, so every output format agrees.

use crate::classification::OverallCategory;
use crate::status::{ChromosomeStatusMap, CnvStatus};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Normal or not reportable.
    Black,
    /// Non-mosaic abnormality.
    Red,
    /// Mosaicism.
    Blue,
}

impl Severity {
    pub fn hex(self) -> &'static str {
        match self {
            Severity::Black => "#000000",
            Severity::Red => "#FF0000",
            Severity::Blue => "#0000FF",
        }
    }

    pub fn for_status(status: CnvStatus) -> Self {
        if status.is_normal() {
            Severity::Black
        } else if status.is_mosaic() {
            Severity::Blue
        } else {
            Severity::Red
        }
    }

    /// Severity of a whole record.
    ///
    /// A definitive category decides on its own. Only a normal call looks at the statuses, so a
    /// normal conclusion over an abnormal notation is still highlighted.
    pub fn for_record(category: OverallCategory, map: &ChromosomeStatusMap) -> Self {
        match category {
            OverallCategory::Inconclusive | OverallCategory::LowDnaConcentration => Severity::Black,
            OverallCategory::Mosaic(_) => Severity::Blue,
            OverallCategory::Abnormal
            | OverallCategory::MultipleAbnormalities
            | OverallCategory::ChaoticEmbryo => Severity::Red,
            OverallCategory::Normal => {
                let statuses: Vec<Severity> =
                    map.abnormal().map(|(_, s)| Severity::for_status(s)).collect();
                if statuses.contains(&Severity::Red) {
                    Severity::Red
                } else if statuses.contains(&Severity::Blue) {
                    Severity::Blue
                } else {
                    Severity::Black
                }
            }
        }
    }
}
