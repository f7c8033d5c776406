//! Phone number normalization.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

static COUNTRY_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{0,3}$").expect("valid regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4,15}$").expect("valid regex"));

/// A validated `(phone_number, country_code)` pair in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber {
    pub phone_number: String,
    pub country_code: String,
}

/// Normalize and validate a phone number and its country code.
///
/// The country code gains a leading `+` if missing. Spaces, dashes, dots and
/// parentheses are stripped from the number.
pub fn normalize(phone_number: &str, country_code: &str) -> Result<PhoneNumber, CoreError> {
    let cc = country_code.trim();
    let cc = if cc.starts_with('+') {
        cc.to_string()
    } else {
        format!("+{cc}")
    };
    if !COUNTRY_CODE_RE.is_match(&cc) {
        return Err(CoreError::Validation(format!(
            "Invalid country code '{country_code}'"
        )));
    }

    let digits: String = phone_number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    if !PHONE_RE.is_match(&digits) {
        return Err(CoreError::Validation(
            "Phone number must contain 4 to 15 digits".to_string(),
        ));
    }

    Ok(PhoneNumber {
        phone_number: digits,
        country_code: cc,
    })
}

/// Mask all but the last two digits, for log output.
pub fn mask(phone_number: &str) -> String {
    let len = phone_number.chars().count();
    phone_number
        .chars()
        .enumerate()
        .map(|(i, c)| if i + 2 < len { '*' } else { c })
        .collect()
}
