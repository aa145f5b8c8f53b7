//! Read-side queries over a snapshot: display gating and messages.

use formguard_types::{ErrorEntry, ErrorKind, ErrorPayload, FieldPath, ValidationSnapshot};

use crate::tree::FieldHost;

const FALLBACK: &str = "Invalid value";

/// Whether `path` should display its errors now: it is invalid and the user
/// has interacted with it (dirty or touched).
pub fn should_show_error(
    snapshot: &ValidationSnapshot,
    host: &dyn FieldHost,
    path: &FieldPath,
) -> bool {
    snapshot.is_field_invalid(path) && (host.is_dirty(path) || host.is_touched(path))
}

/// Every message for `path`, in rule registration order.
pub fn messages_for(snapshot: &ValidationSnapshot, path: &FieldPath) -> Vec<String> {
    snapshot.errors_for(path).iter().map(describe).collect()
}

/// The human-readable message for one entry.
pub fn describe(entry: &ErrorEntry) -> String {
    use ErrorPayload as P;

    match (&entry.kind, &entry.payload) {
        (ErrorKind::Required, _) => "This field is required".into(),
        (ErrorKind::Email, _) => "Invalid email address".into(),
        (ErrorKind::MinLength, P::Length { required_length, .. }) => {
            format!("Minimum {required_length} characters required")
        }
        (ErrorKind::MaxLength, P::Length { required_length, .. }) => {
            format!("Maximum {required_length} characters allowed")
        }
        (ErrorKind::Min, P::Bound { limit, .. }) => format!("Minimum value is {limit}"),
        (ErrorKind::Max, P::Bound { limit, .. }) => format!("Maximum value is {limit}"),
        (ErrorKind::Pattern, _) => "Invalid format".into(),
        (ErrorKind::PasswordMatch, _) => "Passwords must match".into(),
        (ErrorKind::PasswordStrength, P::Strength { feedback, .. }) if !feedback.is_empty() => {
            feedback.join(", ")
        }
        (ErrorKind::PasswordStrength, _) => "Password is too weak".into(),
        (ErrorKind::UsernameTaken, _) => "Username is already taken".into(),
        (ErrorKind::EmailTaken, _) => "Email is already registered".into(),
        (ErrorKind::InvalidDomain, P::Domain { domain }) => {
            format!("Email domain {domain} does not accept mail")
        }
        (ErrorKind::InvalidDomain, _) => "Email domain does not accept mail".into(),
        (ErrorKind::InvalidZipCode, _) => "Zip code could not be verified".into(),
        (ErrorKind::PhoneNumber, _) => "Invalid phone number".into(),
        (ErrorKind::AgeRange, P::AgeRange { min_age, max_age, .. }) => {
            format!("Age must be between {min_age} and {max_age}")
        }
        (ErrorKind::DateRange, _) => "End date must be after start date".into(),
        (ErrorKind::MinDate, P::DateBound { limit, .. }) => {
            format!("Date must be on or after {limit}")
        }
        (ErrorKind::MaxDate, P::DateBound { limit, .. }) => {
            format!("Date must be on or before {limit}")
        }
        (ErrorKind::ZipCode, _) => "Invalid zip code format".into(),
        (ErrorKind::Url, _) => "Invalid URL format".into(),
        (ErrorKind::FileSize, P::FileSize { max_size_mb, .. }) => {
            format!("File size must be under {max_size_mb}MB")
        }
        (ErrorKind::FileType, P::FileType { allowed, .. }) => {
            format!("Allowed types: {}", allowed.join(", "))
        }
        _ => FALLBACK.into(),
    }
}
