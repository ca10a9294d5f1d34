//! ISBN canonicalization and check-digit validation.
//!
//! The canonical textual form used by the normalizer is the bare identifier: no `ISBN` label,
//! no hyphens or whitespace, upper-case `X`. [`canonicalize`] produces that form and
//! [`IsbnForm::classify`] decides whether it is a well-formed ISBN-10 or ISBN-13.

/// Shape of a canonical ISBN string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsbnForm {
    /// Nine digits followed by a digit or `X`.
    Isbn10,
    /// Thirteen digits.
    Isbn13,
}

impl IsbnForm {
    /// Classify an already-canonical ISBN string by shape only (no check digit test).
    pub fn classify(canonical: &str) -> Option<Self> {
        let bytes = canonical.as_bytes();
        match bytes.len() {
            13 if bytes.iter().all(u8::is_ascii_digit) => Some(Self::Isbn13),
            10 if bytes[..9].iter().all(u8::is_ascii_digit)
                && (bytes[9].is_ascii_digit() || bytes[9] == b'X') =>
            {
                Some(Self::Isbn10)
            }
            _ => None,
        }
    }
}

/// Strip an `ISBN`/`ISBN-10`/`ISBN-13` label, hyphens and whitespace; upper-case `x`.
///
/// The result is not guaranteed to be a well-formed ISBN; see [`IsbnForm::classify`].
pub fn canonicalize(raw: &str) -> String {
    let mut out = canonicalize_once(raw);
    // Stripping can expose another label ("ISBN ISBN 123" -> "ISBN123"); repeat until stable.
    loop {
        let next = canonicalize_once(&out);
        if next == out {
            return out;
        }
        out = next;
    }
}

fn canonicalize_once(raw: &str) -> String {
    let mut rest = raw.trim();
    if rest.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("isbn")) {
        rest = &rest[4..];
        for label in ["-10", "-13", "10", "13"] {
            if let Some(stripped) = rest.strip_prefix(label) {
                // A bare "10"/"13" is only a label when a separator follows it.
                let separated = stripped.is_empty()
                    || stripped.starts_with(|c: char| c == ':' || c.is_whitespace());
                if label.starts_with('-') || separated {
                    rest = stripped;
                    break;
                }
            }
        }
        rest = rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
    }

    rest.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| if c == 'x' { 'X' } else { c })
        .collect()
}

/// True if `canonical` is a well-formed ISBN whose check digit is correct.
pub fn has_valid_check_digit(canonical: &str) -> bool {
    match IsbnForm::classify(canonical) {
        Some(IsbnForm::Isbn10) => isbn10_checksum_ok(canonical),
        Some(IsbnForm::Isbn13) => isbn13_checksum_ok(canonical),
        None => false,
    }
}

/// Convert a valid ISBN-10 to its ISBN-13 (`978` prefix) equivalent.
///
/// Returns `None` if `canonical` is not a valid ISBN-10.
pub fn isbn10_to_isbn13(canonical: &str) -> Option<String> {
    if IsbnForm::classify(canonical) != Some(IsbnForm::Isbn10) || !isbn10_checksum_ok(canonical) {
        return None;
    }
    let mut out = String::with_capacity(13);
    out.push_str("978");
    out.push_str(&canonical[..9]);
    let check = isbn13_check_digit(&out);
    out.push(char::from(b'0' + check));
    Some(out)
}

/// The ISBN-13 form used for identity comparison: ISBN-13s as-is, valid ISBN-10s converted.
///
/// Anything else is returned unchanged so that malformed identifiers still compare by text.
pub fn comparison_form(canonical: &str) -> String {
    isbn10_to_isbn13(canonical).unwrap_or_else(|| canonical.to_string())
}

fn digit(b: u8) -> u32 {
    u32::from(b - b'0')
}

fn isbn10_checksum_ok(s: &str) -> bool {
    let sum: u32 = s
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let value = if b == b'X' { 10 } else { digit(b) };
            (10 - i as u32) * value
        })
        .sum();
    sum % 11 == 0
}

fn isbn13_checksum_ok(s: &str) -> bool {
    let sum: u32 = s
        .bytes()
        .enumerate()
        .map(|(i, b)| if i % 2 == 0 { digit(b) } else { digit(b) * 3 })
        .sum();
    sum % 10 == 0
}

/// Check digit for the first twelve digits of an ISBN-13.
fn isbn13_check_digit(first12: &str) -> u8 {
    let sum: u32 = first12
        .bytes()
        .enumerate()
        .map(|(i, b)| if i % 2 == 0 { digit(b) } else { digit(b) * 3 })
        .sum();
    ((10 - (sum % 10)) % 10) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_hyphens_spaces_and_labels() {
        assert_eq!(canonicalize("978-0-13-468599-1"), "9780134685991");
        assert_eq!(canonicalize(" 978 0134 685991 "), "9780134685991");
        assert_eq!(canonicalize("ISBN-10: 0-306-40615-2"), "0306406152");
        assert_eq!(canonicalize("isbn 9780306406157"), "9780306406157");
        assert_eq!(canonicalize("007462542x"), "007462542X");
        assert_eq!(canonicalize("ISBN13: 9780306406157"), "9780306406157");
        assert_eq!(canonicalize("ISBN1306406152"), "1306406152");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let once = canonicalize("ISBN-13: 978-0-306-40615-7");
        assert_eq!(canonicalize(&once), once);
        assert_eq!(canonicalize("ISBN ISBN 0306406152"), "0306406152");
    }

    #[test]
    fn classify_by_shape() {
        assert_eq!(IsbnForm::classify("9780134685991"), Some(IsbnForm::Isbn13));
        assert_eq!(IsbnForm::classify("007462542X"), Some(IsbnForm::Isbn10));
        assert_eq!(IsbnForm::classify("97801346859"), None);
        assert_eq!(IsbnForm::classify("978013468599X"), None);
        assert_eq!(IsbnForm::classify("X074625420"), None);
    }

    #[test]
    fn check_digits() {
        assert!(has_valid_check_digit("9780134685991"));
        assert!(has_valid_check_digit("9780306406157"));
        assert!(has_valid_check_digit("0306406152"));
        assert!(has_valid_check_digit("007462542X"));
        assert!(!has_valid_check_digit("9780306406158"));
        assert!(!has_valid_check_digit("0306406153"));
    }

    #[test]
    fn isbn10_converts_to_isbn13() {
        assert_eq!(isbn10_to_isbn13("0306406152").as_deref(), Some("9780306406157"));
        assert_eq!(isbn10_to_isbn13("0306406153"), None);
        assert_eq!(isbn10_to_isbn13("9780306406157"), None);
        assert_eq!(comparison_form("0306406152"), "9780306406157");
        assert_eq!(comparison_form("9780306406157"), "9780306406157");
    }
}
