//! Input coercion for edit forms.
//!
//! Numeric inputs never hold an undefined value: blank or unparseable input
//! becomes the field default, non-finite numbers become the default, and the
//! result is clamped to the declared bounds. This keeps dirtiness comparison
//! total over every field type.

use crate::types::FieldValue;

use super::node::{FieldDef, FieldKind};

/// Coerce one input value for `def`.
pub fn coerce_value(def: &FieldDef, value: FieldValue) -> FieldValue {
    match &def.kind {
        FieldKind::Number {
            min,
            max,
            integer,
            default,
        } => {
            let parsed = match value {
                FieldValue::Number(n) => Some(n),
                FieldValue::Text(s) => parse_number(&s, *integer),
            };
            let n = match parsed {
                Some(n) if n.is_finite() => n,
                _ => return FieldValue::Number(*default),
            };
            let n = if *integer { n.trunc() } else { n };
            FieldValue::Number(clamp(n, *min, *max))
        }
        FieldKind::Text | FieldKind::Date | FieldKind::Status { .. } => match value {
            FieldValue::Text(s) => FieldValue::Text(s),
            FieldValue::Number(n) => FieldValue::Text(FieldValue::Number(n).display()),
        },
    }
}

fn clamp(n: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut n = n;
    if let Some(lo) = min {
        if n < lo {
            n = lo;
        }
    }
    if let Some(hi) = max {
        if n > hi {
            n = hi;
        }
    }
    n
}

/// Parse text input. Integer fields accept a leading signed digit run
/// (`"42kg"` → 42, `"3.9"` → 3); other fields need a full decimal number.
fn parse_number(input: &str, integer: bool) -> Option<f64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if !integer {
        return s.parse::<f64>().ok();
    }
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse::<f64>().ok()
}
