use formguard_types::{ErrorKind, ErrorPayload, FieldValue};
use regex::Regex;
use std::sync::LazyLock;

use crate::Failure;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("email regex is valid")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+]?[(]?[0-9]{3}[)]?[-\s.]?[0-9]{3}[-\s.]?[0-9]{4,6}$")
        .expect("phone regex is valid")
});

/// Fails iff the value is absent or the empty string.
pub fn required(value: &FieldValue) -> Option<Failure> {
    value.is_empty().then(|| Failure::bare(ErrorKind::Required))
}

/// Consent-style check: only literal `true` passes.
pub fn required_true(value: &FieldValue) -> Option<Failure> {
    (value.as_bool() != Some(true)).then(|| Failure::bare(ErrorKind::Required))
}

/// Character-count bounds, checked min first.
pub fn length_bounds(value: &FieldValue, min: Option<usize>, max: Option<usize>) -> Option<Failure> {
    let text = value.as_text().filter(|s| !s.is_empty())?;
    let actual_length = text.chars().count();

    if let Some(min) = min.filter(|&min| actual_length < min) {
        return Some(Failure::with(
            ErrorKind::MinLength,
            ErrorPayload::Length {
                required_length: min,
                actual_length,
            },
        ));
    }
    if let Some(max) = max.filter(|&max| actual_length > max) {
        return Some(Failure::with(
            ErrorKind::MaxLength,
            ErrorPayload::Length {
                required_length: max,
                actual_length,
            },
        ));
    }
    None
}

/// Full-string match against an anchored regex.
///
/// `anchored` must already be wrapped as `^(?:...)$`; `source` is the
/// pattern as configured, reported back in the payload.
pub fn pattern(value: &FieldValue, anchored: &Regex, source: &str) -> Option<Failure> {
    let text = value.to_text().filter(|s| !s.is_empty())?;
    (!anchored.is_match(&text)).then(|| {
        Failure::with(
            ErrorKind::Pattern,
            ErrorPayload::Pattern {
                pattern: source.to_string(),
            },
        )
    })
}

pub fn email(value: &FieldValue) -> Option<Failure> {
    let text = value.as_text().filter(|s| !s.is_empty())?;
    (!EMAIL.is_match(text)).then(|| Failure::bare(ErrorKind::Email))
}

/// North-American style numbers: `(123) 456-7890`, `123-456-7890`, `+1234567890`.
pub fn phone_number(value: &FieldValue) -> Option<Failure> {
    let text = value.to_text().filter(|s| !s.is_empty())?;
    (!PHONE.is_match(&text)).then(|| Failure::bare(ErrorKind::PhoneNumber))
}

/// Fails unless the value parses as an absolute URL.
pub fn url_format(value: &FieldValue) -> Option<Failure> {
    let text = value.to_text().filter(|s| !s.is_empty())?;
    url::Url::parse(text.trim())
        .is_err()
        .then(|| Failure::bare(ErrorKind::Url))
}
