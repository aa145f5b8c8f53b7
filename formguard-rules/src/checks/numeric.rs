use formguard_types::{ErrorKind, ErrorPayload, FieldValue};

use crate::Failure;

/// Inclusive numeric bounds, checked min first. Non-numeric values pass;
/// a pattern rule is the place to reject them.
pub fn numeric_bounds(value: &FieldValue, min: Option<f64>, max: Option<f64>) -> Option<Failure> {
    if value.is_empty() {
        return None;
    }
    let actual = value.as_number()?;

    if let Some(limit) = min.filter(|&min| actual < min) {
        return Some(Failure::with(ErrorKind::Min, ErrorPayload::Bound { limit, actual }));
    }
    if let Some(limit) = max.filter(|&max| actual > max) {
        return Some(Failure::with(ErrorKind::Max, ErrorPayload::Bound { limit, actual }));
    }
    None
}
