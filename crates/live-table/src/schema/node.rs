// ============================================================================
// Field Kinds
// ============================================================================

/// The type and constraints of a single entity field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Calendar date as `YYYY-MM-DD` text.
    Date,
    /// Numeric field. `default` is what missing or unparseable input coerces to.
    Number {
        min: Option<f64>,
        max: Option<f64>,
        integer: bool,
        default: f64,
    },
    /// Text restricted to an enumerated set of options.
    Status {
        options: Vec<String>,
        default: String,
    },
}

/// A field definition: kind plus schema-level modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub kind: FieldKind,
    /// Must be present (and, for text-like fields, non-blank) on create and save.
    pub required: bool,
    /// Participates in the search-box substring match.
    pub searchable: bool,
}

impl FieldDef {
    fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            searchable: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Lower bound for number fields. Panics on other kinds.
    pub fn min(mut self, value: f64) -> Self {
        match &mut self.kind {
            FieldKind::Number { min, .. } => *min = Some(value),
            other => panic!("min() only applies to number fields, got {other:?}"),
        }
        self
    }

    /// Upper bound for number fields. Panics on other kinds.
    pub fn max(mut self, value: f64) -> Self {
        match &mut self.kind {
            FieldKind::Number { max, .. } => *max = Some(value),
            other => panic!("max() only applies to number fields, got {other:?}"),
        }
        self
    }

    /// Truncate number input toward zero. Panics on other kinds.
    pub fn integer(mut self) -> Self {
        match &mut self.kind {
            FieldKind::Number { integer, .. } => *integer = true,
            other => panic!("integer() only applies to number fields, got {other:?}"),
        }
        self
    }

    /// Default used for blank drafts and for missing or invalid numeric input.
    /// Panics on non-number fields.
    pub fn default_number(mut self, value: f64) -> Self {
        match &mut self.kind {
            FieldKind::Number { default, .. } => *default = value,
            other => panic!("default_number() only applies to number fields, got {other:?}"),
        }
        self
    }

    /// Default option for status fields. Panics if `value` is not an option.
    pub fn default_status(mut self, value: &str) -> Self {
        match &mut self.kind {
            FieldKind::Status { options, default } => {
                assert!(
                    options.iter().any(|o| o == value),
                    "default status \"{value}\" is not one of {options:?}"
                );
                *default = value.to_string();
            }
            other => panic!("default_status() only applies to status fields, got {other:?}"),
        }
        self
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, FieldKind::Number { .. })
    }

    pub fn is_status(&self) -> bool {
        matches!(self.kind, FieldKind::Status { .. })
    }
}

// ============================================================================
// Field Builder API (`t` module)
// ============================================================================

/// Field builder helpers. Usage: `t::text().required()`, `t::percentage()`,
/// `t::status(&["Active", "Retired"])`.
pub mod t {
    use super::{FieldDef, FieldKind};

    pub fn text() -> FieldDef {
        FieldDef::new(FieldKind::Text)
    }

    pub fn date() -> FieldDef {
        FieldDef::new(FieldKind::Date)
    }

    pub fn number() -> FieldDef {
        FieldDef::new(FieldKind::Number {
            min: None,
            max: None,
            integer: false,
            default: 0.0,
        })
    }

    /// Whole-number percentage in `[0, 100]`, defaulting to `0`.
    pub fn percentage() -> FieldDef {
        number().min(0.0).max(100.0).integer()
    }

    /// Enumerated status. The first option is the default.
    /// Panics when `options` is empty.
    pub fn status(options: &[&str]) -> FieldDef {
        assert!(!options.is_empty(), "status field needs at least one option");
        FieldDef::new(FieldKind::Status {
            options: options.iter().map(|o| o.to_string()).collect(),
            default: options[0].to_string(),
        })
    }
}
