//! Reading the share code, expiry and holder name from the final page

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static SHARE_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Share code\s*([A-Z0-9]{3}\s+[A-Z0-9]{3}\s+[A-Z0-9]{3})")
        .expect("share code pattern")
});
static VALID_UNTIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)valid until\s+([0-9]{1,2}\s+\w+\s+\d{4})").expect("expiry pattern")
});
static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Name\s+([A-Z][A-Z\s'-]+)\s+Date of birth").expect("name pattern")
});

/// Share code in `XXX XXX XXX` form, whitespace collapsed.
pub fn parse_share_code(text: &str) -> Option<String> {
    let raw = SHARE_CODE.captures(text)?.get(1)?.as_str();
    Some(raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Expiry from "valid until 12 March 2025"; month names may be abbreviated.
pub fn parse_valid_until(text: &str) -> Option<NaiveDate> {
    let raw = VALID_UNTIL.captures(text)?.get(1)?.as_str();
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDate::parse_from_str(&normalized, "%d %B %Y")
        .or_else(|_| NaiveDate::parse_from_str(&normalized, "%d %b %Y"))
        .ok()
}

/// Holder name from the body text, between "Name" and "Date of birth".
pub fn parse_name(text: &str) -> Option<String> {
    let raw = NAME.captures(text)?.get(1)?.as_str().trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

/// ASCII-only filename segment: runs of anything else become `_`, edges
/// are trimmed, and an empty result becomes `UNKNOWN`.
pub fn sanitize_segment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_sep = false;
    for c in value.trim().chars().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        "UNKNOWN".to_string()
    } else {
        out
    }
}

/// `EVISA_<SURNAME>_<GIVEN>_<YYYY-MM-DD>.pdf`, where the given name is the
/// first word of `name` and the surname the last.
pub fn build_filename(name: Option<&str>, valid_until: Option<NaiveDate>) -> String {
    let parts: Vec<&str> = name.unwrap_or_default().split_whitespace().collect();
    let given = parts.first().copied().unwrap_or_default();
    let surname = parts.last().copied().unwrap_or_default();
    let expiry = valid_until
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    format!(
        "EVISA_{}_{}_{}.pdf",
        sanitize_segment(surname),
        sanitize_segment(given),
        expiry
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "Details you need to share\n\
        Share code\nWK7 P2X 9QR\n\
        This share code is valid until 14 March 2025.\n\
        Name\nJANE MARY DOE\nDate of birth\n01 02 1990";

    #[test]
    fn extracts_share_code_and_expiry() {
        assert_eq!(parse_share_code(BODY).as_deref(), Some("WK7 P2X 9QR"));
        assert_eq!(
            parse_valid_until(BODY),
            NaiveDate::from_ymd_opt(2025, 3, 14)
        );
        assert_eq!(parse_share_code("no code here"), None);
        assert_eq!(parse_valid_until("valid until someday"), None);
    }

    #[test]
    fn share_code_match_is_case_insensitive() {
        assert_eq!(
            parse_share_code("SHARE CODE   ab1  cd2 ef3").as_deref(),
            Some("ab1 cd2 ef3")
        );
    }

    #[test]
    fn extracts_name_from_body_text() {
        assert_eq!(parse_name(BODY).as_deref(), Some("JANE MARY DOE"));
        assert_eq!(parse_name("Date of birth only"), None);
    }

    #[test]
    fn segments_are_ascii_and_underscored() {
        assert_eq!(sanitize_segment("O'Brien"), "O_Brien");
        assert_eq!(sanitize_segment("  --Smith--  "), "Smith");
        assert_eq!(sanitize_segment("Zoë"), "Zo");
        assert_eq!(sanitize_segment(""), "UNKNOWN");
        assert_eq!(sanitize_segment("日本"), "UNKNOWN");
    }

    #[test]
    fn filename_uses_surname_given_and_expiry() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14);
        assert_eq!(
            build_filename(Some("JANE MARY DOE"), date),
            "EVISA_DOE_JANE_2025-03-14.pdf"
        );
        assert_eq!(build_filename(None, None), "EVISA_UNKNOWN_UNKNOWN_UNKNOWN.pdf");
        assert_eq!(build_filename(Some("CHER"), None), "EVISA_CHER_CHER_UNKNOWN.pdf");
    }
}
