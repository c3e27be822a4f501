//! CNV status codes and the per-chromosome status map.
//!
//! A [`ChromosomeEvent`] is classified into exactly one [`CnvStatus`]. The
//! [`ChromosomeStatusMap`] holds one status for every chromosome (1–22, X, Y) together with
//! the sparse mosaic percentages, and is the only way percentages are recorded, which keeps
//! a percentage from ever sitting on a non-mosaic chromosome.

use crate::notation::{ChromosomeEvent, EventKind};
use pgta_types::Chromosome;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Copy-number status printed in the report's CNV table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CnvStatus {
    /// Normal.
    #[default]
    N,
    /// Gain.
    G,
    /// Loss.
    L,
    /// Segmental gain.
    SG,
    /// Segmental loss.
    SL,
    /// Mosaic, direction unspecified.
    M,
    /// Mosaic gain.
    MG,
    /// Mosaic loss.
    ML,
    /// Segmental mosaic gain.
    SMG,
    /// Segmental mosaic loss.
    SML,
}

impl CnvStatus {
    pub const ALL: [CnvStatus; 10] = [
        CnvStatus::N,
        CnvStatus::G,
        CnvStatus::L,
        CnvStatus::SG,
        CnvStatus::SL,
        CnvStatus::M,
        CnvStatus::MG,
        CnvStatus::ML,
        CnvStatus::SMG,
        CnvStatus::SML,
    ];

    /// Classifies one parsed event.
    ///
    /// The base code comes from the event kind, `S` is prefixed for segmental events, and a
    /// mosaic percentage upgrades a plain gain or loss to its mosaic counterpart. A mosaic
    /// marker is always `M`, segmental or not.
    pub fn classify(event: &ChromosomeEvent) -> Self {
        let mosaic = event.mosaic_percentage.is_some();
        match (event.kind.is_gain(), event.kind, event.segmental, mosaic) {
            (_, EventKind::Mosaic, _, _) => CnvStatus::M,
            (true, _, false, false) => CnvStatus::G,
            (true, _, true, false) => CnvStatus::SG,
            (true, _, false, true) => CnvStatus::MG,
            (true, _, true, true) => CnvStatus::SMG,
            (false, _, false, false) => CnvStatus::L,
            (false, _, true, false) => CnvStatus::SL,
            (false, _, false, true) => CnvStatus::ML,
            (false, _, true, true) => CnvStatus::SML,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            CnvStatus::N => "N",
            CnvStatus::G => "G",
            CnvStatus::L => "L",
            CnvStatus::SG => "SG",
            CnvStatus::SL => "SL",
            CnvStatus::M => "M",
            CnvStatus::MG => "MG",
            CnvStatus::ML => "ML",
            CnvStatus::SMG => "SMG",
            CnvStatus::SML => "SML",
        }
    }

    /// Legend text used beneath CNV tables.
    pub fn description(self) -> &'static str {
        match self {
            CnvStatus::N => "Normal",
            CnvStatus::G => "Gain",
            CnvStatus::L => "Loss",
            CnvStatus::SG => "Segmental Gain",
            CnvStatus::SL => "Segmental Loss",
            CnvStatus::M => "Mosaic",
            CnvStatus::MG => "Mosaic Gain",
            CnvStatus::ML => "Mosaic Loss",
            CnvStatus::SMG => "Segmental Mosaic Gain",
            CnvStatus::SML => "Segmental Mosaic Loss",
        }
    }

    pub fn is_normal(self) -> bool {
        self == CnvStatus::N
    }

    pub fn is_mosaic(self) -> bool {
        matches!(
            self,
            CnvStatus::M | CnvStatus::MG | CnvStatus::ML | CnvStatus::SMG | CnvStatus::SML
        )
    }

    pub fn is_segmental(self) -> bool {
        matches!(
            self,
            CnvStatus::SG | CnvStatus::SL | CnvStatus::SMG | CnvStatus::SML
        )
    }
}

impl fmt::Display for CnvStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CnvStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        CnvStatus::ALL
            .into_iter()
            .find(|status| status.code() == upper)
            .ok_or_else(|| format!("unknown CNV status code: {s:?}"))
    }
}

/// Status for every chromosome plus the sparse mosaic percentages.
///
/// Serialises as two maps keyed by chromosome label, which is what the report renderers read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChromosomeStatusMap {
    statuses: [CnvStatus; Chromosome::COUNT],
    mosaic_percentages: BTreeMap<Chromosome, u8>,
}

impl ChromosomeStatusMap {
    /// A map with every chromosome normal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from parsed events; later events for the same chromosome win.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a ChromosomeEvent>) -> Self {
        let mut map = Self::new();
        for event in events {
            map.apply(event);
        }
        map
    }

    /// Classifies `event` and records its status and, for mosaic calls, its percentage.
    pub fn apply(&mut self, event: &ChromosomeEvent) -> CnvStatus {
        let status = CnvStatus::classify(event);
        self.set(event.chromosome, status, event.mosaic_percentage);
        status
    }

    /// Sets a status directly. The percentage is kept only for mosaic statuses.
    pub fn set(&mut self, chromosome: Chromosome, status: CnvStatus, percentage: Option<u8>) {
        self.statuses[chromosome.index()] = status;
        match percentage.filter(|_| status.is_mosaic()) {
            Some(pct) => {
                self.mosaic_percentages.insert(chromosome, pct);
            }
            None => {
                self.mosaic_percentages.remove(&chromosome);
            }
        }
    }

    pub fn status(&self, chromosome: Chromosome) -> CnvStatus {
        self.statuses[chromosome.index()]
    }

    pub fn mosaic_percentage(&self, chromosome: Chromosome) -> Option<u8> {
        self.mosaic_percentages.get(&chromosome).copied()
    }

    pub fn mosaic_percentages(&self) -> &BTreeMap<Chromosome, u8> {
        &self.mosaic_percentages
    }

    /// Every chromosome with its status, in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Chromosome, CnvStatus)> + '_ {
        Chromosome::all().map(|c| (c, self.statuses[c.index()]))
    }

    /// Chromosomes whose status is not normal, in report order.
    pub fn abnormal(&self) -> impl Iterator<Item = (Chromosome, CnvStatus)> + '_ {
        self.iter().filter(|(_, status)| !status.is_normal())
    }

    pub fn abnormal_count(&self) -> usize {
        self.abnormal().count()
    }

    pub fn mosaic_count(&self) -> usize {
        self.iter().filter(|(_, s)| s.is_mosaic()).count()
    }

    pub fn is_all_normal(&self) -> bool {
        self.statuses.iter().all(|s| s.is_normal())
    }

    pub fn has_sex_chromosome_event(&self) -> bool {
        !self.status(Chromosome::X).is_normal() || !self.status(Chromosome::Y).is_normal()
    }

    /// Highest recorded mosaic percentage.
    pub fn max_mosaic_percentage(&self) -> Option<u8> {
        self.mosaic_percentages.values().copied().max()
    }
}

struct StatusCodes<'a>(&'a ChromosomeStatusMap);

impl Serialize for StatusCodes<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(Chromosome::COUNT))?;
        for (chromosome, status) in self.0.iter() {
            map.serialize_entry(&chromosome, &status)?;
        }
        map.end()
    }
}

impl Serialize for ChromosomeStatusMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("chromosome_statuses", &StatusCodes(self))?;
        map.serialize_entry("mosaic_percentages", &self.mosaic_percentages)?;
        map.end()
    }
}
