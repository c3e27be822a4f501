//! Record linkage between the patient roster and the per-sample results table.
//!
//! The two tables are keyed independently: the roster by patient name and sample identifier,
//! the results table by a free-text sample name that the lab builds from one or both of them.
//! Both sides are reduced to a normalised key and linked by containment.

use serde::Serialize;

/// Title and initial prefixes removed before matching. Longer titles come first so `MRS.` is
/// not read as the initial `M.`.
const HONORIFIC_PREFIXES: [&str; 7] = ["MRS.", "MISS.", "PROF.", "SMT.", "MR.", "MS.", "DR."];

/// Letters the lab appends to disambiguate patients with the same name.
const SUFFIX_LETTERS: [char; 12] = ['C', 'D', 'R', 'S', 'G', 'K', 'M', 'N', 'P', 'T', 'V', 'W'];

/// Normalises a patient name, sample identifier or sample name for matching.
///
/// Upper-cases, strips leading titles and initials (`MRS.`, `SMT.`, `R.`), drops everything
/// that is not an ASCII letter or digit, and finally strips one trailing disambiguation letter
/// when at least three characters remain and the letter does not follow a digit.
///
/// ```
/// use pgta_core::linkage::normalise;
///
/// assert_eq!(normalise("Kavitha C"), "KAVITHA");
/// assert_eq!(normalise("SMT. SUJATA SHRIPAL"), "SUJATASHRIPAL");
/// assert_eq!(normalise("AND25150117498"), "AND25150117498");
/// ```
pub fn normalise(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    let mut rest = upper.as_str();

    loop {
        let stripped = strip_prefix(rest);
        if stripped.len() == rest.len() {
            break;
        }
        rest = stripped.trim_start();
    }

    let mut key: String = rest.chars().filter(char::is_ascii_alphanumeric).collect();

    let chars: Vec<char> = key.chars().collect();
    if let [.., before_last, last] = chars.as_slice() {
        if chars.len() >= 4 && SUFFIX_LETTERS.contains(last) && !before_last.is_ascii_digit() {
            key.pop();
        }
    }

    key
}

fn strip_prefix(text: &str) -> &str {
    if let Some(rest) = HONORIFIC_PREFIXES
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
    {
        return rest;
    }

    // Single-letter initial such as "R. ".
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), Some('.')) if letter.is_ascii_alphabetic() => &text[2..],
        _ => text,
    }
}

/// Text before the first underscore of a sample name, e.g. `KAVITHAC-KC1` for
/// `KAVITHAC-KC1_L01_R1`.
pub fn sample_base(sample_name: &str) -> &str {
    let trimmed = sample_name.trim();
    trimmed.split('_').next().unwrap_or(trimmed)
}

/// Embryo identifier: the sample base, or its last hyphen-separated token when it has one.
pub fn embryo_id(sample_name: &str) -> String {
    let base = sample_base(sample_name);
    match base.rsplit_once('-') {
        Some((_, token)) => token.to_string(),
        None => base.to_string(),
    }
}

/// Which roster key produced a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkBasis {
    SampleIdentifier,
    PatientName,
}

/// Normalised keys of one roster row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkKeys {
    pub sample_identifier: String,
    pub patient_name: String,
}

impl LinkKeys {
    pub fn new(sample_identifier: &str, patient_name: &str) -> Self {
        Self {
            sample_identifier: normalise(sample_identifier),
            patient_name: normalise(patient_name),
        }
    }

    fn key(&self, basis: LinkBasis) -> &str {
        match basis {
            LinkBasis::SampleIdentifier => &self.sample_identifier,
            LinkBasis::PatientName => &self.patient_name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Link {
    /// `roster_index` is the first candidate in roster order. `tied_with` lists the other
    /// roster rows that matched on the same basis.
    Matched {
        roster_index: usize,
        basis: LinkBasis,
        tied_with: Vec<usize>,
    },
    Unmatched,
}

/// Links result rows to roster rows.
#[derive(Clone, Debug, Default)]
pub struct Linker {
    roster: Vec<LinkKeys>,
}

impl Linker {
    pub fn new(roster: Vec<LinkKeys>) -> Self {
        Self { roster }
    }

    pub fn roster_len(&self) -> usize {
        self.roster.len()
    }

    /// Links one sample name.
    ///
    /// Identifier containment is tried first across the whole roster, then name containment.
    /// Empty keys never match. Within a basis the first roster row wins and any others are
    /// returned as ties.
    pub fn link(&self, sample_name: &str) -> Link {
        let sample_key = normalise(sample_name);
        if sample_key.is_empty() {
            return Link::Unmatched;
        }

        for basis in [LinkBasis::SampleIdentifier, LinkBasis::PatientName] {
            let mut candidates = self.roster.iter().enumerate().filter_map(|(index, keys)| {
                let key = keys.key(basis);
                (!key.is_empty() && sample_key.contains(key)).then_some(index)
            });

            if let Some(roster_index) = candidates.next() {
                return Link::Matched {
                    roster_index,
                    basis,
                    tied_with: candidates.collect(),
                };
            }
        }

        Link::Unmatched
    }
}

/// A result row that several roster rows matched on the same basis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AmbiguousMatch {
    pub row_number: usize,
    pub sample_name: String,
    pub basis: LinkBasis,
    /// Patient the row was assigned to.
    pub chosen: String,
    /// Other patients that also matched, in roster order.
    pub also_matched: Vec<String>,
}
