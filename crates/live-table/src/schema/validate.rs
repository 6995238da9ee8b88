use std::sync::OnceLock;

use regex::Regex;

use crate::{
    error::{ValidationError, ValidationErrors},
    types::{format_number, FieldValue, Record},
};

use super::{
    entity::EntitySchema,
    node::{FieldDef, FieldKind},
};

// ============================================================================
// Date Regex
// ============================================================================

/// Compiled once at first use.
fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex is valid"))
}

/// `YYYY-MM-DD` that names a real calendar day.
pub fn is_valid_date(s: &str) -> bool {
    date_regex().is_match(s) && chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

// ============================================================================
// Validation Context
// ============================================================================

struct ValidationContext {
    errors: Vec<ValidationError>,
}

impl ValidationContext {
    fn new() -> Self {
        Self { errors: vec![] }
    }

    fn add_error(
        &mut self,
        field: &str,
        expected: impl Into<String>,
        received: impl Into<String>,
    ) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            expected: expected.into(),
            received: received.into(),
        });
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

fn describe(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) if s.trim().is_empty() => "empty text".to_string(),
        FieldValue::Text(s) => format!("\"{s}\""),
        FieldValue::Number(n) => format_number(*n),
    }
}

// ============================================================================
// Record Validation
// ============================================================================

/// Validate a full record against `schema`, collecting every failure.
///
/// Fields are checked in declaration order; fields the schema does not
/// declare are reported after them.
pub fn validate_record(schema: &EntitySchema, record: &Record) -> Result<(), ValidationErrors> {
    let mut ctx = check_declared(schema, record);

    for field in record.fields() {
        if schema.field(field).is_none() {
            ctx.add_error(field, "no such field", "unknown field");
        }
    }

    ctx.finish()
}

/// Validate only the fields `schema` declares. Anything else on the record
/// (such as a mirrored `id` written by another client) is left alone.
pub fn validate_declared(schema: &EntitySchema, record: &Record) -> Result<(), ValidationErrors> {
    check_declared(schema, record).finish()
}

fn check_declared(schema: &EntitySchema, record: &Record) -> ValidationContext {
    let mut ctx = ValidationContext::new();

    for (name, def) in &schema.fields {
        match record.get(name) {
            None => {
                if def.required {
                    ctx.add_error(name, expected_for(def), "missing");
                }
            }
            Some(value) => check_field(name, def, value, &mut ctx),
        }
    }
    ctx
}

fn expected_for(def: &FieldDef) -> String {
    match &def.kind {
        FieldKind::Text => "non-empty text".to_string(),
        FieldKind::Date => "date (YYYY-MM-DD)".to_string(),
        FieldKind::Number { .. } => "number".to_string(),
        FieldKind::Status { options, .. } => format!("one of [{}]", options.join(", ")),
    }
}

fn check_field(name: &str, def: &FieldDef, value: &FieldValue, ctx: &mut ValidationContext) {
    match &def.kind {
        FieldKind::Text => match value {
            FieldValue::Text(s) => {
                if def.required && s.trim().is_empty() {
                    ctx.add_error(name, "non-empty text", describe(value));
                }
            }
            other => ctx.add_error(name, "text", other.type_name()),
        },

        FieldKind::Date => match value {
            FieldValue::Text(s) => {
                let blank = s.trim().is_empty();
                if blank {
                    if def.required {
                        ctx.add_error(name, "date (YYYY-MM-DD)", describe(value));
                    }
                } else if !is_valid_date(s) {
                    ctx.add_error(name, "date (YYYY-MM-DD)", describe(value));
                }
            }
            other => ctx.add_error(name, "date (YYYY-MM-DD)", other.type_name()),
        },

        FieldKind::Number {
            min, max, integer, ..
        } => match value {
            FieldValue::Number(n) => {
                let n = *n;
                if !n.is_finite() {
                    ctx.add_error(name, "finite number", describe(value));
                    return;
                }
                if let Some(lo) = min {
                    if n < *lo {
                        ctx.add_error(name, format!("number >= {}", format_number(*lo)), describe(value));
                    }
                }
                if let Some(hi) = max {
                    if n > *hi {
                        ctx.add_error(name, format!("number <= {}", format_number(*hi)), describe(value));
                    }
                }
                if *integer && n.fract() != 0.0 {
                    ctx.add_error(name, "whole number", describe(value));
                }
            }
            other => ctx.add_error(name, "number", other.type_name()),
        },

        FieldKind::Status { options, .. } => match value {
            FieldValue::Text(s) => {
                if !options.iter().any(|o| o == s) {
                    ctx.add_error(name, expected_for(def), describe(value));
                }
            }
            other => ctx.add_error(name, expected_for(def), other.type_name()),
        },
    }
}
