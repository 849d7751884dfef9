//! Chilean RUT validation and formatting.
//!
//! A RUT is a 7-8 digit body followed by a verification character computed
//! with the standard modulo-11 weighted sum. [`validate_rut`] and
//! [`format_rut`] are pure helpers; [`Rut`] wraps the canonical
//! `NN.NNN.NNN-D` rendering so that once a value reaches the domain layer it
//! can be treated as trusted.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::types::TypeConstraintError;

/// Strips grouping punctuation and upper-cases the verification character.
fn clean_rut(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '.' && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Structural grammar: 7-8 digits followed by a digit or `K`.
///
/// Body and check are byte-sliced by the callers, so non-ASCII input is
/// rejected before any length math.
fn is_well_formed(clean: &str) -> bool {
    if !clean.is_ascii() {
        return false;
    }
    let len = clean.len();
    if !(8..=9).contains(&len) {
        return false;
    }
    let body = &clean[..len - 1];
    let check = &clean[len - 1..];
    body.bytes().all(|b| b.is_ascii_digit())
        && (check == "K" || check.bytes().all(|b| b.is_ascii_digit()))
}

/// Computes the verification character for a digit body.
///
/// Digits are walked right-to-left with weights cycling 2,3,4,5,6,7. The
/// result of `11 - (sum % 11)` maps 11 to `'0'` and 10 to `'K'`.
fn check_char(body: &str) -> char {
    let mut sum: u32 = 0;
    let mut weight: u32 = 2;
    for b in body.bytes().rev() {
        sum += u32::from(b - b'0') * weight;
        weight = if weight == 7 { 2 } else { weight + 1 };
    }
    match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        d => char::from_digit(d, 10).unwrap_or('0'),
    }
}

/// Returns `true` when the input is a structurally valid RUT whose
/// verification character matches the modulo-11 checksum.
///
/// Never panics; malformed or empty input simply yields `false`.
pub fn validate_rut(raw: &str) -> bool {
    let clean = clean_rut(raw);
    if !is_well_formed(&clean) {
        return false;
    }
    let body = &clean[..clean.len() - 1];
    let supplied = clean.as_bytes()[clean.len() - 1] as char;
    check_char(body) == supplied
}

/// Re-inserts thousands separators and the check-character hyphen.
///
/// Idempotent for any already-valid input: cleaning strips exactly what
/// formatting adds. Inputs too short to carry a check character, or carrying
/// characters no RUT can contain, are returned cleaned but otherwise
/// untouched.
pub fn format_rut(raw: &str) -> String {
    let clean = clean_rut(raw);
    if !clean.is_ascii() || clean.len() < 2 {
        return clean;
    }
    let body = &clean[..clean.len() - 1];
    let check = &clean[clean.len() - 1..];

    let mut grouped = String::with_capacity(body.len() + body.len() / 3);
    for (i, c) in body.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    format!("{grouped}-{check}")
}

/// Canonically formatted, checksum-verified RUT.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rut(String);

impl Rut {
    /// Validates the checksum and stores the canonical formatted rendering.
    ///
    /// Structural failures and checksum failures are distinct error kinds so
    /// callers can surface different messages.
    pub fn new<S: AsRef<str>>(value: S) -> Result<Self, TypeConstraintError> {
        let clean = clean_rut(value.as_ref());
        if !is_well_formed(&clean) {
            return Err(TypeConstraintError::MalformedTaxId);
        }
        let body = &clean[..clean.len() - 1];
        let supplied = clean.as_bytes()[clean.len() - 1] as char;
        if check_char(body) != supplied {
            return Err(TypeConstraintError::TaxIdChecksum);
        }
        Ok(Self(format_rut(&clean)))
    }

    /// Borrow the canonical `NN.NNN.NNN-D` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper returning the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Rut {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Rut {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Rut {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Rut {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rut> for String {
    fn from(value: Rut) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Check characters verified by hand against the 2,3,4,5,6,7 weight cycle.
    const FIXTURES: &[(&str, char)] = &[
        ("12345678", '5'),
        ("1111111", '4'),
        ("11111111", '1'),
        ("1000013", '0'),
        ("1000053", 'K'),
    ];

    #[test]
    fn check_char_matches_manual_calculation() {
        for (body, expected) in FIXTURES {
            assert_eq!(check_char(body), *expected, "body {body}");
        }
    }

    #[test]
    fn validate_accepts_known_good_ruts() {
        for (body, check) in FIXTURES {
            assert!(validate_rut(&format!("{body}{check}")));
            assert!(validate_rut(&format!("{body}-{check}")));
        }
        assert!(validate_rut("12.345.678-5"));
    }

    #[test]
    fn validate_rejects_wrong_check_character() {
        for (body, check) in FIXTURES {
            let wrong = if *check == '1' { '2' } else { '1' };
            assert!(!validate_rut(&format!("{body}{wrong}")));
        }
    }

    #[test]
    fn validate_rejects_malformed_input() {
        assert!(!validate_rut(""));
        assert!(!validate_rut("123456"));
        assert!(!validate_rut("123456789012"));
        assert!(!validate_rut("12a45678-5"));
        assert!(!validate_rut("-5"));
    }

    #[test]
    fn lowercase_k_is_accepted() {
        assert!(validate_rut("1000053-k"));
    }

    #[test]
    fn multibyte_characters_are_rejected_without_panicking() {
        assert!(!validate_rut("1234567ñ"));
        assert!(!validate_rut("12.345.67ñ-5"));
        assert!(!validate_rut("ñ2345678-5"));
        assert_eq!(
            Rut::new("1234567ñ").unwrap_err(),
            TypeConstraintError::MalformedTaxId
        );
        // Formatting leaves input it cannot group untouched beyond cleaning.
        assert_eq!(format_rut("1234567ñ"), "1234567Ñ");
    }

    #[test]
    fn format_groups_digits_and_appends_check() {
        assert_eq!(format_rut("123456785"), "12.345.678-5");
        assert_eq!(format_rut("11111114"), "1.111.111-4");
        assert_eq!(format_rut("1000053k"), "1.000.053-K");
    }

    #[test]
    fn format_is_idempotent() {
        for raw in ["123456785", "12.345.678-5", "1000053K", "1.111.111-4"] {
            let once = format_rut(raw);
            assert_eq!(format_rut(&once), once);
        }
    }

    #[test]
    fn validate_accepts_formatted_output() {
        for (body, check) in FIXTURES {
            let formatted = format_rut(&format!("{body}{check}"));
            assert!(validate_rut(&formatted), "formatted {formatted}");
        }
    }

    #[test]
    fn rut_distinguishes_malformed_from_checksum_failure() {
        assert_eq!(
            Rut::new("not-a-rut").unwrap_err(),
            TypeConstraintError::MalformedTaxId
        );
        assert_eq!(
            Rut::new("12345678-4").unwrap_err(),
            TypeConstraintError::TaxIdChecksum
        );
    }

    #[test]
    fn rut_stores_canonical_rendering() {
        let rut = Rut::new("123456785").unwrap();
        assert_eq!(rut.as_str(), "12.345.678-5");
        let same = Rut::new("12.345.678-5").unwrap();
        assert_eq!(rut, same);
    }
}
