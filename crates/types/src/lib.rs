//! Validated value types shared across the PGT-A workspace.
//!
//! These types carry their invariants in the type system so that the pipeline crates never
//! have to re-check them:
//! - [`NonEmptyText`] is trimmed and never empty
//! - [`Chromosome`] is always one of 1–22, X or Y, and orders numerically before X before Y

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing a chromosome label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChromosomeError {
    /// The label is not 1–22, X or Y
    #[error("invalid chromosome label: {0:?}")]
    InvalidLabel(String),
}

/// An autosome number, always within 1..=22.
///
/// The field is private, so the only ways in are [`AutosomeNumber::new`],
/// [`Chromosome::autosome`] and parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AutosomeNumber(u8);

impl AutosomeNumber {
    /// Rejects numbers outside 1–22.
    pub fn new(number: u8) -> Result<Self, ChromosomeError> {
        if (1..=Chromosome::AUTOSOME_COUNT).contains(&number) {
            Ok(Self(number))
        } else {
            Err(ChromosomeError::InvalidLabel(number.to_string()))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for AutosomeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A human chromosome label: autosomes 1–22 plus the sex chromosomes X and Y.
///
/// The derived ordering places every autosome (numerically) before X, and X before Y,
/// which is the order reports list chromosomes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Chromosome {
    Autosome(AutosomeNumber),
    X,
    Y,
}

impl Chromosome {
    /// Number of autosomes.
    pub const AUTOSOME_COUNT: u8 = 22;

    /// Total number of chromosome labels (22 autosomes plus X and Y).
    pub const COUNT: usize = 24;

    /// Creates an autosome label, rejecting numbers outside 1–22.
    pub fn autosome(number: u8) -> Result<Self, ChromosomeError> {
        AutosomeNumber::new(number).map(Chromosome::Autosome)
    }

    /// All labels in report order: 1..22, X, Y.
    pub fn all() -> impl Iterator<Item = Chromosome> {
        Self::autosomes().chain([Chromosome::X, Chromosome::Y])
    }

    /// The autosomes 1..22 in order.
    pub fn autosomes() -> impl Iterator<Item = Chromosome> {
        (1..=Self::AUTOSOME_COUNT).map(|n| Chromosome::Autosome(AutosomeNumber(n)))
    }

    /// Position of this label in report order (0 for chromosome 1, 23 for Y).
    pub fn index(self) -> usize {
        match self {
            Chromosome::Autosome(n) => usize::from(n.get()) - 1,
            Chromosome::X => 22,
            Chromosome::Y => 23,
        }
    }

    pub fn is_autosome(self) -> bool {
        matches!(self, Chromosome::Autosome(_))
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chromosome::Autosome(n) => write!(f, "{n}"),
            Chromosome::X => f.write_str("X"),
            Chromosome::Y => f.write_str("Y"),
        }
    }
}

impl FromStr for Chromosome {
    type Err = ChromosomeError;

    /// Parses "1".."22", "X" or "Y" (case-insensitive, surrounding whitespace ignored).
    /// A leading "chr" prefix is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let label = trimmed
            .get(..3)
            .filter(|prefix| prefix.eq_ignore_ascii_case("chr"))
            .map_or(trimmed, |_| &trimmed[3..]);

        if label.eq_ignore_ascii_case("x") {
            return Ok(Chromosome::X);
        }
        if label.eq_ignore_ascii_case("y") {
            return Ok(Chromosome::Y);
        }
        if !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(number) = label.parse::<u8>() {
                return Chromosome::autosome(number)
                    .map_err(|_| ChromosomeError::InvalidLabel(s.to_owned()));
            }
        }
        Err(ChromosomeError::InvalidLabel(s.to_owned()))
    }
}

impl serde::Serialize for Chromosome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Chromosome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn autosome(number: u8) -> Chromosome {
        Chromosome::autosome(number).expect("autosome in range")
    }

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        let text = NonEmptyText::new("  KAVITHA C \n").expect("valid text");
        assert_eq!(text.as_str(), "KAVITHA C");

        let err = NonEmptyText::new(" \t ").expect_err("blank should be rejected");
        assert!(matches!(err, TextError::Empty));
    }

    #[test]
    fn chromosome_parses_labels_case_insensitively() {
        assert_eq!("5".parse::<Chromosome>().expect("5"), autosome(5));
        assert_eq!(" x ".parse::<Chromosome>().expect("x"), Chromosome::X);
        assert_eq!("chrY".parse::<Chromosome>().expect("chrY"), Chromosome::Y);
        assert_eq!("chr21".parse::<Chromosome>().expect("chr21"), autosome(21));
    }

    #[test]
    fn chromosome_rejects_out_of_range_labels() {
        for bad in ["0", "23", "", "Z", "1a", "300"] {
            let err = bad.parse::<Chromosome>().expect_err("should reject");
            assert!(matches!(err, ChromosomeError::InvalidLabel(_)), "{bad}");
        }
    }

    #[test]
    fn autosome_numbers_outside_one_to_twenty_two_cannot_be_built() {
        for bad in [0, 23, 30, 255] {
            assert!(Chromosome::autosome(bad).is_err(), "{bad}");
            assert!(AutosomeNumber::new(bad).is_err(), "{bad}");
        }
        let twenty_two = AutosomeNumber::new(22).expect("22");
        assert_eq!(Chromosome::Autosome(twenty_two).index(), 21);
        assert_eq!(twenty_two.to_string(), "22");
    }

    #[test]
    fn chromosome_orders_numerically_then_x_then_y() {
        let mut labels = vec![
            Chromosome::Y,
            autosome(11),
            Chromosome::X,
            autosome(2),
            autosome(1),
        ];
        labels.sort();
        let rendered: Vec<String> = labels.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["1", "2", "11", "X", "Y"]);
    }

    #[test]
    fn chromosome_index_matches_report_order() {
        for (position, chromosome) in Chromosome::all().enumerate() {
            assert_eq!(chromosome.index(), position);
        }
        assert_eq!(Chromosome::all().count(), Chromosome::COUNT);
    }

    #[test]
    fn chromosome_serialises_as_label_string() {
        let json = serde_json::to_string(&autosome(16)).expect("serialise");
        assert_eq!(json, "\"16\"");
        let parsed: Chromosome = serde_json::from_str("\"X\"").expect("deserialise");
        assert_eq!(parsed, Chromosome::X);
    }
}
