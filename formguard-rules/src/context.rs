use chrono::NaiveDate;
use formguard_types::{FieldPath, FieldValue};
use std::collections::{BTreeMap, HashMap};

static EMPTY: FieldValue = FieldValue::Empty;

/// Read access to current field values.
///
/// The field-tree host implements this; rules use it to read the siblings
/// they declared as dependencies.
pub trait ValueSource {
    /// The value at `path`, or `None` if no such field exists.
    fn value(&self, path: &FieldPath) -> Option<&FieldValue>;
}

impl ValueSource for HashMap<FieldPath, FieldValue> {
    fn value(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.get(path)
    }
}

impl ValueSource for BTreeMap<FieldPath, FieldValue> {
    fn value(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.get(path)
    }
}

/// Everything a rule may read besides its own value.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    values: &'a dyn ValueSource,
    today: NaiveDate,
}

impl<'a> RuleContext<'a> {
    pub fn new(values: &'a dyn ValueSource, today: NaiveDate) -> Self {
        Self { values, today }
    }

    /// A sibling's value; missing fields read as empty.
    #[must_use]
    pub fn sibling(&self, path: &FieldPath) -> &'a FieldValue {
        self.values.value(path).unwrap_or(&EMPTY)
    }

    /// The underlying value source, for predicates.
    #[must_use]
    pub fn values(&self) -> &'a dyn ValueSource {
        self.values
    }

    /// The date age and date-bound rules measure against.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.today
    }
}
