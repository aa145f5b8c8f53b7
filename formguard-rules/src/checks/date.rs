use chrono::{Datelike, NaiveDate};
use formguard_types::{ErrorKind, ErrorPayload, FieldValue};

use crate::Failure;

/// Whole years between `birth` and `today`: the calendar-year difference,
/// minus one while this year's birthday has not been reached.
#[must_use]
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Fails when the age computed from a birth date lies outside `[min_age, max_age]`.
pub fn age_range(value: &FieldValue, min_age: u32, max_age: u32, today: NaiveDate) -> Option<Failure> {
    let birth = value.as_date()?;
    let actual_age = age_on(birth, today);

    let too_young = i64::from(actual_age) < i64::from(min_age);
    let too_old = i64::from(actual_age) > i64::from(max_age);
    (too_young || too_old).then(|| {
        Failure::with(
            ErrorKind::AgeRange,
            ErrorPayload::AgeRange {
                min_age,
                max_age,
                actual_age,
            },
        )
    })
}

/// Fails on the end value when the start lies after it. Plain dates are
/// compared by calendar day; a time of day only counts when both values
/// carry one explicitly.
pub fn date_order(start: &FieldValue, end: &FieldValue) -> Option<Failure> {
    let after = if start.has_time_of_day() && end.has_time_of_day() {
        start.as_date_time()? > end.as_date_time()?
    } else {
        start.as_date()? > end.as_date()?
    };
    after.then(|| Failure::bare(ErrorKind::DateRange))
}

pub fn min_date(value: &FieldValue, limit: NaiveDate) -> Option<Failure> {
    let actual = value.as_date()?;
    (actual < limit)
        .then(|| Failure::with(ErrorKind::MinDate, ErrorPayload::DateBound { limit, actual }))
}

pub fn max_date(value: &FieldValue, limit: NaiveDate) -> Option<Failure> {
    let actual = value.as_date()?;
    (actual > limit)
        .then(|| Failure::with(ErrorKind::MaxDate, ErrorPayload::DateBound { limit, actual }))
}
