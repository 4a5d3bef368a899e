//! Coercion of loosely-typed legacy values.
//!
//! Legacy rows are loosely typed: integers sometimes arrive as `4.0`,
//! booleans as `1`, `"true"` or `"false"`. Rules:
//!
//! - NULL and blank text are "no value"; the key is left unmigrated.
//! - bool: numbers are true when non-zero; text is false for `0` and
//!   `false` (any case, surrounding whitespace ignored), true otherwise.
//! - int: parsed as an integer, else as a float rounded half away from
//!   zero. Values outside the `i32` range fail.
//! - text: the value's plain string form.

use crate::storage::StoredValue;

/// Returns true if the value carries nothing to migrate.
#[must_use]
pub fn is_blank(value: &StoredValue) -> bool {
    match value {
        StoredValue::Null => true,
        StoredValue::Text(s) => s.trim().is_empty(),
        StoredValue::Blob(b) => String::from_utf8_lossy(b).trim().is_empty(),
        StoredValue::Integer(_) | StoredValue::Real(_) => false,
    }
}

/// Converts a value to a boolean.
#[must_use]
pub fn to_bool(value: &StoredValue) -> Option<bool> {
    match value {
        StoredValue::Null => None,
        StoredValue::Integer(i) => Some(*i != 0),
        StoredValue::Real(r) => Some(*r != 0.0),
        StoredValue::Text(s) => text_to_bool(s),
        StoredValue::Blob(b) => text_to_bool(&String::from_utf8_lossy(b)),
    }
}

fn text_to_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(!(text == "0" || text.eq_ignore_ascii_case("false")))
    }
}

/// Converts a value to an integer, falling back to rounding a float.
#[must_use]
pub fn to_int(value: &StoredValue) -> Option<i32> {
    match value {
        StoredValue::Null => None,
        StoredValue::Integer(i) => i32::try_from(*i).ok(),
        StoredValue::Real(r) => round_to_int(*r),
        StoredValue::Text(s) => text_to_int(s),
        StoredValue::Blob(b) => text_to_int(&String::from_utf8_lossy(b)),
    }
}

fn text_to_int(text: &str) -> Option<i32> {
    let text = text.trim();
    text.parse::<i32>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().and_then(round_to_int))
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_int(value: f64) -> Option<i32> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round();
    if rounded < f64::from(i32::MIN) || rounded > f64::from(i32::MAX) {
        None
    } else {
        Some(rounded as i32)
    }
}

/// Converts a value to text.
#[must_use]
pub fn to_text(value: &StoredValue) -> Option<String> {
    if value.is_null() {
        None
    } else {
        Some(value.to_string())
    }
}
