//! Typed records for the five collections
//!
//! Rust field names are English; the serde names are the persisted (Spanish)
//! field names, which are also the names the JSON API exposes and the keys of
//! every [`FieldErrors`] map.

pub mod catechumen;
pub mod cycle;
pub mod embedded;
pub mod enrollment;
pub mod group;
pub mod level;

pub use catechumen::*;
pub use cycle::*;
pub use embedded::*;
pub use enrollment::*;
pub use group::*;
pub use level::*;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::Collection;
use crate::FieldErrors;

/// A record persisted as one document of a collection
pub trait Record: Serialize + DeserializeOwned {
    /// Collection holding this record type
    const COLLECTION: Collection;

    /// `_id` of the record
    fn id(&self) -> &str;

    /// Field-level checks beyond what the types already guarantee
    fn validate(&self) -> FieldErrors;
}

/// Record an error when a required text field is blank
pub(crate) fn require_text(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
    }
}

/// Record an error when a text field is longer than `max` characters
pub(crate) fn check_max_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {} characters (it has {}).", max, len),
        );
    }
}

/// Exactly ten ASCII digits (national id and phone numbers)
pub(crate) fn is_ten_digits(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Loose e-mail shape check: `local@domain.tld`
pub(crate) fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
                    .unwrap_or(false)
        }
        None => false,
    }
}
