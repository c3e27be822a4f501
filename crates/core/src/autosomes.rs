//! Autosome description generator.
//!
//! A single abnormal chromosome is written out in full; several are listed concisely in
//! chromosome order. Reviewers compare these strings positionally across embryos, so the
//! ordering (1..22, then X, then Y) is fixed.

use crate::constants::NORMAL_AUTOSOMES;
use crate::status::ChromosomeStatusMap;

/// Renders the status map as the report's autosome description.
pub fn describe_autosomes(map: &ChromosomeStatusMap) -> String {
    let abnormal: Vec<_> = map.abnormal().collect();

    match abnormal.as_slice() {
        [] => NORMAL_AUTOSOMES.to_string(),
        [(chromosome, status)] => match map.mosaic_percentage(*chromosome) {
            Some(pct) => format!("{chromosome} chromosome, CNV status {status}, Mosaic(%) {pct}"),
            None => format!("{chromosome} chromosome, CNV status {status}"),
        },
        many => many
            .iter()
            .map(|(chromosome, status)| format!("{chromosome} {status}"))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::CnvStatus;
    use pgta_types::Chromosome;

    fn chr(n: u8) -> Chromosome {
        Chromosome::autosome(n).expect("valid autosome")
    }

    #[test]
    fn normal_map_uses_sentinel() {
        assert_eq!(describe_autosomes(&ChromosomeStatusMap::new()), "Normal");
    }

    #[test]
    fn single_event_is_verbose() {
        let mut map = ChromosomeStatusMap::new();
        map.set(chr(16), CnvStatus::L, None);
        assert_eq!(describe_autosomes(&map), "16 chromosome, CNV status L");
    }

    #[test]
    fn single_mosaic_event_carries_percentage() {
        let mut map = ChromosomeStatusMap::new();
        map.set(chr(5), CnvStatus::SML, Some(57));
        assert_eq!(
            describe_autosomes(&map),
            "5 chromosome, CNV status SML, Mosaic(%) 57"
        );
    }

    #[test]
    fn several_events_are_concise_and_ordered() {
        let mut map = ChromosomeStatusMap::new();
        map.set(chr(21), CnvStatus::G, None);
        map.set(chr(13), CnvStatus::SG, None);
        map.set(chr(1), CnvStatus::SG, None);
        map.set(chr(11), CnvStatus::SG, None);
        assert_eq!(describe_autosomes(&map), "1 SG, 11 SG, 13 SG, 21 G");
    }

    #[test]
    fn sex_chromosomes_sort_after_autosomes() {
        let mut map = ChromosomeStatusMap::new();
        map.set(Chromosome::Y, CnvStatus::L, None);
        map.set(Chromosome::X, CnvStatus::G, None);
        map.set(chr(2), CnvStatus::MG, Some(40));
        assert_eq!(describe_autosomes(&map), "2 MG, X G, Y L");
    }
}
