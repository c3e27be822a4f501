//! Notation parser for per-sample CNV result strings.
//!
//! A result string holds zero or more comma-separated clauses such as
//! `del(5)(p15.33q12.3)(~64.50Mb,~57%)`, `dup(18)(~30%)`, `+21` or `Monosomy 16`.
//!
//! Parsing runs as an ordered list of tiers:
//! 1. split into clauses, only at a top-level comma that starts a new event
//! 2. per clause, sign-prefixed chromosome (`+21`, `-16`); the chromosome must follow the
//!    sign directly, and a later `mos…` word only marks the event mosaic
//! 3. per clause, keyword event (`del`, `dup`, `mos`, `monosomy`, `trisomy`)
//! 4. per clause, neutral text (`46,XX`, `euploid`) yields nothing
//! 5. anything else is an unparsed clause, reported as a [`RowWarning`]
//! 6. whole string, only when no clause produced an event and no keyword was seen: the
//!    legacy `<status>-<chromosome>` form, read as a loss
//!
//! After a keyword, the chromosome is the first digit run or standalone X/Y (`Xp22.1` counts)
//! before the group's closing `)`.
//!
//! Qualifier capture is the same for tiers 2 and 3: a `p`/`q` band followed by a digit, or a
//! size in `Mb`, marks the event segmental; a number directly before `%` is the mosaic
//! percentage.

use crate::RowWarning;
use pgta_types::Chromosome;
use serde::Serialize;

/// Event kind as written in the notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Deletion,
    Duplication,
    Mosaic,
    Gain,
    Loss,
}

impl EventKind {
    /// True for kinds that add copies.
    pub fn is_gain(self) -> bool {
        matches!(self, EventKind::Duplication | EventKind::Gain)
    }
}

/// One copy-number event on one chromosome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChromosomeEvent {
    pub chromosome: Chromosome,
    pub kind: EventKind,
    /// Band or megabase qualifier present.
    pub segmental: bool,
    pub mosaic_percentage: Option<u8>,
    /// Source clause, kept for audit.
    pub clause: String,
}

/// Result of parsing one notation string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParsedNotation {
    pub events: Vec<ChromosomeEvent>,
    pub warnings: Vec<RowWarning>,
}

impl ParsedNotation {
    /// Events ordered by chromosome (numeric, then X, then Y); stable for equal chromosomes.
    pub fn sorted_events(&self) -> Vec<&ChromosomeEvent> {
        let mut events: Vec<&ChromosomeEvent> = self.events.iter().collect();
        events.sort_by_key(|e| e.chromosome);
        events
    }

    pub fn has_unparsed(&self) -> bool {
        self.warnings.iter().any(|w| {
            matches!(
                w,
                RowWarning::UnparsedClause { .. } | RowWarning::InvalidChromosome { .. }
            )
        })
    }
}

/// Event keywords, matched case-insensitively. When two keywords occur in one clause the
/// leftmost wins; at equal positions the earlier entry wins.
const EVENT_KEYWORDS: [(&str, EventKind); 5] = [
    ("monosomy", EventKind::Loss),
    ("trisomy", EventKind::Gain),
    ("del", EventKind::Deletion),
    ("dup", EventKind::Duplication),
    ("mos", EventKind::Mosaic),
];

/// Whole-notation or clause text that states a normal result.
const NEUTRAL_TEXT: [&str; 12] = [
    "",
    "nan",
    "none",
    "null",
    "na",
    "normal",
    "euploid",
    "no copy number abnormality",
    "46,xx",
    "46,xy",
    "xx",
    "xy",
];

/// Parses one notation string. Never fails: unreadable clauses become warnings.
pub fn parse_notation(notation: &str) -> ParsedNotation {
    let mut parsed = ParsedNotation::default();
    if is_neutral(notation) {
        return parsed;
    }

    for clause in split_clauses(notation) {
        match parse_clause(clause) {
            ClauseOutcome::Event(event) => parsed.events.push(event),
            ClauseOutcome::Neutral => {}
            ClauseOutcome::Warning(warning) => parsed.warnings.push(warning),
        }
    }

    if parsed.events.is_empty() {
        if let Some(events) = legacy_dash_events(notation) {
            parsed.warnings = vec![RowWarning::LegacyDashFallback {
                notation: notation.trim().to_string(),
            }];
            parsed.events = events;
        }
    }

    parsed
}

/// Splits a notation into clauses at commas that sit outside any parenthesised qualifier and
/// are followed by a new event keyword or sign.
pub fn split_clauses(notation: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in notation.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 && starts_new_event(&notation[i + 1..]) => {
                clauses.push(&notation[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    clauses.push(&notation[start..]);

    clauses
        .into_iter()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}

fn starts_new_event(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.starts_with(['+', '-'])
        || EVENT_KEYWORDS.iter().any(|(keyword, _)| {
            rest.get(..keyword.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        })
}

fn is_neutral(text: &str) -> bool {
    let lowered = text.trim().to_ascii_lowercase();
    let compact: String = lowered.chars().filter(|c| !c.is_whitespace()).collect();
    NEUTRAL_TEXT
        .iter()
        .any(|neutral| lowered == *neutral || compact == neutral.replace(' ', ""))
}

enum ClauseOutcome {
    Event(ChromosomeEvent),
    Neutral,
    Warning(RowWarning),
}

fn parse_clause(clause: &str) -> ClauseOutcome {
    if let Some(sign) = clause.chars().next().filter(|c| matches!(c, '+' | '-')) {
        let kind = if sign == '+' {
            EventKind::Gain
        } else {
            EventKind::Loss
        };
        let rest = clause[1..].trim_start();
        let label = chromosome_at(clause, clause.len() - rest.len());
        return match build_event(clause, kind, label) {
            ClauseOutcome::Event(mut event)
                if event.mosaic_percentage.is_none() && mentions_mosaic(clause) =>
            {
                event.kind = EventKind::Mosaic;
                ClauseOutcome::Event(event)
            }
            outcome => outcome,
        };
    }

    if let Some((keyword_end, kind)) = find_keyword(clause) {
        return build_event(clause, kind, chromosome_token(clause, keyword_end));
    }

    if is_neutral(clause) {
        return ClauseOutcome::Neutral;
    }

    ClauseOutcome::Warning(RowWarning::UnparsedClause {
        clause: clause.to_string(),
    })
}

fn build_event(clause: &str, kind: EventKind, label: Option<&str>) -> ClauseOutcome {
    let Some(label) = label else {
        return ClauseOutcome::Warning(RowWarning::UnparsedClause {
            clause: clause.to_string(),
        });
    };
    let chromosome = match label.parse::<Chromosome>() {
        Ok(chromosome) => chromosome,
        Err(_) => {
            return ClauseOutcome::Warning(RowWarning::InvalidChromosome {
                clause: clause.to_string(),
                label: label.to_string(),
            })
        }
    };

    let mosaic_percentage = match percentage(clause) {
        Percentage::Absent => None,
        Percentage::Value(pct) => Some(pct),
        Percentage::OutOfRange(value) => {
            return ClauseOutcome::Warning(RowWarning::PercentageOutOfRange {
                clause: clause.to_string(),
                value,
            })
        }
    };

    ClauseOutcome::Event(ChromosomeEvent {
        chromosome,
        kind,
        segmental: is_segmental(clause),
        mosaic_percentage,
        clause: clause.to_string(),
    })
}

/// Finds the leftmost event keyword; returns the byte offset just past it.
fn find_keyword(clause: &str) -> Option<(usize, EventKind)> {
    let lowered = clause.to_ascii_lowercase();
    EVENT_KEYWORDS
        .iter()
        .filter_map(|(keyword, kind)| {
            lowered
                .find(keyword)
                .map(|pos| (pos, pos + keyword.len(), *kind))
        })
        .min_by_key(|(pos, _, _)| *pos)
        .map(|(_, end, kind)| (end, kind))
}

fn mentions_mosaic(clause: &str) -> bool {
    clause.to_ascii_lowercase().contains("mos")
}

/// First chromosome label at or after `from`, stopping at the first `)`.
fn chromosome_token(text: &str, from: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    for i in from..bytes.len() {
        if bytes[i] == b')' {
            return None;
        }
        if let Some(label) = chromosome_at(text, i) {
            return Some(label);
        }
    }
    None
}

/// Chromosome label starting exactly at `at`: a run of digits, or an X/Y that is not part of
/// a word. An X/Y directly followed by a `p`/`q` band (`Xp22.1`) still counts.
fn chromosome_at(text: &str, at: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let first = *bytes.get(at)?;

    if first.is_ascii_digit() {
        let end = bytes[at..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |len| at + len);
        return Some(&text[at..end]);
    }

    if matches!(first, b'x' | b'X' | b'y' | b'Y') {
        let prev_alpha = at > 0 && bytes[at - 1].is_ascii_alphabetic();
        let next = bytes.get(at + 1).copied();
        let standalone = !next.is_some_and(|b| b.is_ascii_alphanumeric());
        let banded = matches!(next, Some(b'p' | b'q' | b'P' | b'Q'))
            && bytes.get(at + 2).is_some_and(u8::is_ascii_digit);
        if !prev_alpha && (standalone || banded) {
            return Some(&text[at..=at]);
        }
    }

    None
}

/// Band marker (`p` or `q` followed by a digit) or a megabase size.
fn is_segmental(clause: &str) -> bool {
    let lowered = clause.to_ascii_lowercase();
    let bytes = lowered.as_bytes();
    let has_band = bytes
        .windows(2)
        .any(|w| matches!(w[0], b'p' | b'q') && w[1].is_ascii_digit());
    has_band || lowered.contains("mb")
}

enum Percentage {
    Absent,
    Value(u8),
    OutOfRange(String),
}

/// Number immediately before the first `%` that has one; decimals are rounded.
fn percentage(clause: &str) -> Percentage {
    let bytes = clause.as_bytes();
    for (pos, _) in clause.match_indices('%') {
        let mut start = pos;
        while start > 0 && (bytes[start - 1].is_ascii_digit() || bytes[start - 1] == b'.') {
            start -= 1;
        }
        let digits = clause[start..pos].trim_start_matches('.');
        if digits.is_empty() {
            continue;
        }
        let Ok(value) = digits.parse::<f64>() else {
            continue;
        };
        if value > 100.0 {
            return Percentage::OutOfRange(digits.to_string());
        }
        // value is within 0..=100 here
        return Percentage::Value(value.round() as u8);
    }
    Percentage::Absent
}

/// First in-range percentage written in free text, e.g. a conclusion such as
/// "Mosaic gain of 18 (~35%)".
pub(crate) fn first_percentage(text: &str) -> Option<u8> {
    match percentage(text) {
        Percentage::Value(pct) => Some(pct),
        Percentage::Absent | Percentage::OutOfRange(_) => None,
    }
}

/// Legacy `<status>-<chromosome>[,<chromosome>…]` notation, read as losses.
fn legacy_dash_events(notation: &str) -> Option<Vec<ChromosomeEvent>> {
    let trimmed = notation.trim();
    if trimmed.matches('-').count() != 1 || trimmed.starts_with('-') {
        return None;
    }
    if find_keyword(trimmed).is_some() {
        return None;
    }

    let (_, right) = trimmed.split_once('-')?;
    let events: Vec<ChromosomeEvent> = right
        .split(',')
        .filter_map(|token| token.trim().parse::<Chromosome>().ok())
        .map(|chromosome| ChromosomeEvent {
            chromosome,
            kind: EventKind::Loss,
            segmental: false,
            mosaic_percentage: None,
            clause: trimmed.to_string(),
        })
        .collect();

    (!events.is_empty()).then_some(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{ChromosomeStatusMap, CnvStatus};

    fn autosome(number: u8) -> Chromosome {
        Chromosome::autosome(number).expect("autosome in range")
    }

    fn single(notation: &str) -> ChromosomeEvent {
        let parsed = parse_notation(notation);
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
        assert_eq!(parsed.events.len(), 1, "{:?}", parsed.events);
        parsed.events.into_iter().next().expect("one event")
    }

    #[test]
    fn segmental_mosaic_deletion_keeps_qualifier_together() {
        let event = single("del(5)(p15.33q12.3)(~64.50Mb,~57%)");
        assert_eq!(event.chromosome, autosome(5));
        assert_eq!(event.kind, EventKind::Deletion);
        assert!(event.segmental);
        assert_eq!(event.mosaic_percentage, Some(57));
        assert_eq!(CnvStatus::classify(&event), CnvStatus::SML);
    }

    #[test]
    fn segmental_deletion_without_percentage() {
        let event = single("del(10)(q22.3q24.1)(~17.50Mb)");
        assert_eq!(event.chromosome, autosome(10));
        assert_eq!(event.mosaic_percentage, None);
        assert_eq!(CnvStatus::classify(&event), CnvStatus::SL);
    }

    #[test]
    fn whole_chromosome_mosaic_duplication() {
        let event = single("dup(18)(~30%)");
        assert_eq!(event.chromosome, autosome(18));
        assert!(!event.segmental);
        assert_eq!(event.mosaic_percentage, Some(30));
        assert_eq!(CnvStatus::classify(&event), CnvStatus::MG);
    }

    #[test]
    fn sign_prefixed_chromosomes() {
        let gain = single("+21");
        assert_eq!(gain.chromosome, autosome(21));
        assert_eq!(CnvStatus::classify(&gain), CnvStatus::G);

        let loss = single(" -16 ");
        assert_eq!(loss.chromosome, autosome(16));
        assert_eq!(CnvStatus::classify(&loss), CnvStatus::L);

        let sex = single("+X");
        assert_eq!(sex.chromosome, Chromosome::X);
    }

    #[test]
    fn sign_prefixed_with_percentage_is_mosaic() {
        let event = single("+21(~40%)");
        assert_eq!(CnvStatus::classify(&event), CnvStatus::MG);
        assert_eq!(event.mosaic_percentage, Some(40));
    }

    #[test]
    fn sex_chromosome_with_band_directly_after_it() {
        let event = single("del(Xp22.1)");
        assert_eq!(event.chromosome, Chromosome::X);
        assert_eq!(CnvStatus::classify(&event), CnvStatus::SL);

        let event = single("dup(Yq11.2)");
        assert_eq!(event.chromosome, Chromosome::Y);
        assert_eq!(CnvStatus::classify(&event), CnvStatus::SG);

        let event = single("dup(Xq28)(~12.5Mb)");
        assert_eq!(event.chromosome, Chromosome::X);
        assert_eq!(CnvStatus::classify(&event), CnvStatus::SG);
    }

    #[test]
    fn chromosome_is_not_read_past_the_group() {
        let parsed = parse_notation("del(Z)(q11)");
        assert!(parsed.events.is_empty());
        assert!(matches!(
            parsed.warnings.as_slice(),
            [RowWarning::UnparsedClause { clause }] if clause == "del(Z)(q11)"
        ));
    }

    #[test]
    fn sign_clause_keeps_its_chromosome_when_mosaic_is_mentioned() {
        let event = single("+21 (mosaic ~20%)");
        assert_eq!(event.chromosome, autosome(21));
        assert_eq!(event.mosaic_percentage, Some(20));
        assert_eq!(CnvStatus::classify(&event), CnvStatus::MG);

        let event = single("+21 (mosaic ~40%)");
        assert_eq!(event.chromosome, autosome(21));
        assert_eq!(CnvStatus::classify(&event), CnvStatus::MG);

        let event = single("-16 mosaic");
        assert_eq!(event.chromosome, autosome(16));
        assert_eq!(event.kind, EventKind::Mosaic);
        assert_eq!(CnvStatus::classify(&event), CnvStatus::M);

        let event = single("+ 21");
        assert_eq!(event.chromosome, autosome(21));
    }

    #[test]
    fn sign_without_a_chromosome_after_it_is_unparsed() {
        let parsed = parse_notation("+mosaic 21");
        assert!(parsed.events.is_empty());
        assert!(parsed.has_unparsed());
    }

    #[test]
    fn monosomy_and_trisomy_keywords() {
        let parsed = parse_notation("Monosomy 16, Trisomy 21");
        let statuses: Vec<(Chromosome, CnvStatus)> = parsed
            .events
            .iter()
            .map(|e| (e.chromosome, CnvStatus::classify(e)))
            .collect();
        assert_eq!(
            statuses,
            [
                (autosome(16), CnvStatus::L),
                (autosome(21), CnvStatus::G)
            ]
        );
    }

    #[test]
    fn letters_inside_words_are_not_sex_chromosomes() {
        let event = single("mosaic trisomy 21 (~35%)");
        assert_eq!(event.chromosome, autosome(21));
        assert_eq!(event.kind, EventKind::Mosaic);
        assert_eq!(CnvStatus::classify(&event), CnvStatus::M);
        assert_eq!(event.mosaic_percentage, Some(35));
    }

    #[test]
    fn multi_clause_notation_splits_once_per_event() {
        let notation = "dup(1)(p36.33p11.2)(~120.5Mb),dup(11)(q13.1q25)(~70Mb), dup(13)(q12.11q34)(~95Mb),+21";
        let parsed = parse_notation(notation);
        assert!(parsed.warnings.is_empty());
        let map = ChromosomeStatusMap::from_events(&parsed.events);
        let abnormal: Vec<String> = map
            .abnormal()
            .map(|(c, s)| format!("{c} {s}"))
            .collect();
        assert_eq!(abnormal, ["1 SG", "11 SG", "13 SG", "21 G"]);
    }

    #[test]
    fn clause_count_is_preserved_with_commas_inside_qualifiers() {
        let clauses = [
            "del(5)(p15.33q12.3)(~64.50Mb,~57%)",
            "dup(7)(q11.2q36.3)(~80Mb, ~45%)",
            "+21",
            "-16",
            "dup(X)(~30%)",
        ];
        for n in 1..=clauses.len() {
            let notation = clauses[..n].join(",");
            assert_eq!(split_clauses(&notation).len(), n, "{notation}");
            let parsed = parse_notation(&notation);
            assert_eq!(parsed.events.len(), n, "{notation}");
            let rejoined: Vec<String> = parsed
                .events
                .iter()
                .map(|e| e.clause.clone())
                .collect();
            assert_eq!(rejoined.join(","), notation);
        }
    }

    #[test]
    fn neutral_notations_produce_nothing() {
        for text in ["", "  ", "nan", "Euploid", "NORMAL", "46,XY", "46, XX", "No copy number abnormality"] {
            let parsed = parse_notation(text);
            assert!(parsed.events.is_empty(), "{text}");
            assert!(parsed.warnings.is_empty(), "{text}");
        }
    }

    #[test]
    fn karyotype_prefix_is_neutral() {
        let parsed = parse_notation("46,XY,+21");
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].chromosome, autosome(21));
    }

    #[test]
    fn unparsed_clauses_are_reported_and_others_survive() {
        let parsed = parse_notation("+21, something odd");
        // "something odd" is not preceded by an event comma split, so it stays in the +21 clause
        assert_eq!(parsed.events.len(), 1);

        let parsed = parse_notation("+21,-banana");
        assert_eq!(parsed.events.len(), 1);
        assert!(matches!(
            parsed.warnings.as_slice(),
            [RowWarning::UnparsedClause { clause }] if clause == "-banana"
        ));
        assert!(parsed.has_unparsed());
    }

    #[test]
    fn garbage_is_a_warning_not_an_event() {
        let parsed = parse_notation("complex rearrangement");
        assert!(parsed.events.is_empty());
        assert!(parsed.has_unparsed());
    }

    #[test]
    fn invalid_chromosome_is_reported() {
        let parsed = parse_notation("del(23)(q11)");
        assert!(parsed.events.is_empty());
        assert!(matches!(
            parsed.warnings.as_slice(),
            [RowWarning::InvalidChromosome { label, .. }] if label == "23"
        ));
    }

    #[test]
    fn percentage_above_hundred_is_rejected() {
        let parsed = parse_notation("dup(4)(~130%)");
        assert!(parsed.events.is_empty());
        assert!(matches!(
            parsed.warnings.as_slice(),
            [RowWarning::PercentageOutOfRange { value, .. }] if value == "130"
        ));
    }

    #[test]
    fn decimal_percentages_are_rounded() {
        let event = single("dup(9)(~42.6%)");
        assert_eq!(event.mosaic_percentage, Some(43));
    }

    #[test]
    fn legacy_dash_fallback_reads_a_loss() {
        let parsed = parse_notation("L-16");
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].chromosome, autosome(16));
        assert_eq!(CnvStatus::classify(&parsed.events[0]), CnvStatus::L);
        assert!(matches!(
            parsed.warnings.as_slice(),
            [RowWarning::LegacyDashFallback { .. }]
        ));
    }

    #[test]
    fn legacy_dash_fallback_never_reads_deletions() {
        let parsed = parse_notation("del-abc");
        assert!(parsed.events.is_empty());
        assert!(parsed.has_unparsed());

        let parsed = parse_notation("L-16-2");
        assert!(parsed.events.is_empty());
    }

    #[test]
    fn sorted_events_order_numeric_then_sex_chromosomes() {
        let parsed = parse_notation("+Y,dup(X)(~30%),+21,-2");
        let order: Vec<String> = parsed
            .sorted_events()
            .iter()
            .map(|e| e.chromosome.to_string())
            .collect();
        assert_eq!(order, ["2", "21", "X", "Y"]);
    }
}
