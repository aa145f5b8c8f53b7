//! The registration form: its fields and the rules bound to them.

use formguard_engine::{AsyncRule, FieldTree, RegistryError, RegistryResult, RuleRegistry};
use formguard_rules::{Predicate, SyncRule};
use formguard_types::{FieldPath, FieldValue, Result as TypesResult};
use serde_json::Value as JsonValue;

/// Every field the registration rules read.
pub const FIELDS: &[&str] = &[
    "username",
    "email",
    "password",
    "confirmPassword",
    "firstName",
    "lastName",
    "phoneNumber",
    "dateOfBirth",
    "website",
    "startDate",
    "endDate",
    "address.type",
    "address.otherType",
    "address.street",
    "address.city",
    "address.country",
    "address.zipCode",
    "agreeToTerms",
];

fn path(s: &str) -> RegistryResult<FieldPath> {
    FieldPath::parse(s).map_err(|_| RegistryError::InvalidPath(s.to_string()))
}

/// The rule set of the registration form.
pub fn registration_rules() -> RegistryResult<RuleRegistry> {
    let country = path("address.country")?;
    let other_type = Predicate::field_equals(path("address.type")?, "other");

    RuleRegistry::builder()
        .sync("username", SyncRule::Required)
        .sync("username", SyncRule::length(Some(3), Some(20))?)
        .sync("username", SyncRule::pattern("[a-zA-Z0-9_]+")?)
        .remote("username", AsyncRule::UsernameAvailable)
        .sync("email", SyncRule::Required)
        .sync("email", SyncRule::Email)
        .remote("email", AsyncRule::EmailAvailable)
        .remote("email", AsyncRule::EmailDomain)
        .sync("password", SyncRule::Required)
        .sync("password", SyncRule::length(Some(8), None)?)
        .sync("password", SyncRule::PasswordStrength { min_score: 3 })
        .sync("confirmPassword", SyncRule::Required)
        .sync("confirmPassword", SyncRule::PasswordMatch { password: path("password")? })
        .sync("firstName", SyncRule::Required)
        .sync("firstName", SyncRule::length(Some(2), Some(50))?)
        .sync("lastName", SyncRule::Required)
        .sync("lastName", SyncRule::length(Some(2), Some(50))?)
        .sync("phoneNumber", SyncRule::PhoneNumber)
        .sync("dateOfBirth", SyncRule::Required)
        .sync("dateOfBirth", SyncRule::age_range(18, 120)?)
        .sync("website", SyncRule::UrlFormat)
        .sync("endDate", SyncRule::DateOrder { start: path("startDate")? })
        .sync("address.type", SyncRule::Required)
        .sync(
            "address.otherType",
            SyncRule::conditional_required(other_type, vec![path("address.type")?]),
        )
        .sync("address.street", SyncRule::Required)
        .sync("address.city", SyncRule::Required)
        .sync("address.country", SyncRule::Required)
        .sync("address.zipCode", SyncRule::Required)
        .sync("address.zipCode", SyncRule::zip_format(country.clone()))
        .remote("address.zipCode", AsyncRule::ZipCode { country })
        .sync("agreeToTerms", SyncRule::RequiredTrue)
        .build()
}

/// Builds the field tree for a form document. Fields the rules read but the
/// document leaves out are added empty.
pub fn load_form(doc: &JsonValue) -> TypesResult<FieldTree> {
    let mut tree = FieldTree::from_json(doc)?;
    for field in FIELDS {
        let field = FieldPath::parse(field)?;
        if tree.get(&field).is_none() {
            tree.insert(&field, FieldValue::Empty)?;
        }
    }
    Ok(tree)
}
