//! Individual rule primitives.
//!
//! Each function takes the value under test plus its configuration and
//! returns `Some(Failure)` when the check fails. Apart from the required
//! family, every check passes on an empty value.

mod date;
mod file;
mod numeric;
mod text;

pub use date::{age_on, age_range, date_order, max_date, min_date};
pub use file::file_constraint;
pub use numeric::numeric_bounds;
pub use text::{
    email, length_bounds, pattern, phone_number, required, required_true, url_format,
};
