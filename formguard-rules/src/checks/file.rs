use formguard_types::{ErrorKind, ErrorPayload, FieldValue};

use crate::Failure;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Size limit first, then extension allow-list. `allowed` must already be
/// lowercased.
pub fn file_constraint(
    value: &FieldValue,
    max_size_mb: Option<f64>,
    allowed: Option<&[String]>,
) -> Option<Failure> {
    let file = value.as_file()?;

    if let Some(max_size_mb) = max_size_mb {
        if file.size_bytes as f64 > max_size_mb * BYTES_PER_MB {
            return Some(Failure::with(
                ErrorKind::FileSize,
                ErrorPayload::FileSize {
                    max_size_mb,
                    actual_size_mb: round2(file.size_bytes as f64 / BYTES_PER_MB),
                },
            ));
        }
    }

    if let Some(allowed) = allowed {
        let actual = file.extension();
        let permitted = actual
            .as_deref()
            .is_some_and(|ext| allowed.iter().any(|a| a == ext));
        if !permitted {
            return Some(Failure::with(
                ErrorKind::FileType,
                ErrorPayload::FileType {
                    allowed: allowed.to_vec(),
                    actual,
                },
            ));
        }
    }
    None
}
