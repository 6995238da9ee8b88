//! Entity schema with a fluent builder.
//!
//! One schema per collection describes which fields exist, which are required,
//! which participate in search, numeric bounds, and the display order. The
//! engine itself is generic; everything entity-specific lives here.

use std::sync::OnceLock;

use crate::{
    error::{EditError, ValidationErrors},
    types::{FieldValue, Record},
};

use super::{
    coerce::coerce_value,
    node::{FieldDef, FieldKind},
    validate::{validate_declared, validate_record},
};

// ============================================================================
// Regex
// ============================================================================

static NAME_REGEX: OnceLock<regex::Regex> = OnceLock::new();

fn name_regex() -> &'static regex::Regex {
    NAME_REGEX.get_or_init(|| {
        regex::Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("name regex is valid")
    })
}

// ============================================================================
// EntitySchema
// ============================================================================

/// Complete entity definition produced by [`EntityBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    /// Collection name on the remote store.
    pub name: String,
    /// Singular human label used in notifications ("Batch created").
    pub label: String,
    /// Fields in declaration order.
    pub fields: Vec<(String, FieldDef)>,
    /// Explicit display-order field. `None` orders by key.
    pub order_by: Option<String>,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, def)| def)
    }

    pub fn searchable_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, def)| def.searchable)
            .map(|(n, _)| n.as_str())
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, def)| def.required)
            .map(|(n, _)| n.as_str())
    }

    /// The first status field, used for per-status summary counts.
    pub fn status_field(&self) -> Option<(&str, &FieldDef)> {
        self.fields
            .iter()
            .find(|(_, def)| def.is_status())
            .map(|(n, def)| (n.as_str(), def))
    }

    /// The "reset form" record: blank text and dates, numeric defaults, the
    /// default status.
    pub fn blank_draft(&self) -> Record {
        self.fields
            .iter()
            .map(|(name, def)| (name.clone(), default_value(def)))
            .collect()
    }

    /// Fill defaults for absent fields that are not required.
    ///
    /// Required fields are left absent so validation can report them.
    pub fn normalize(&self, draft: &Record) -> Record {
        let mut out = draft.clone();
        for (name, def) in &self.fields {
            if !out.contains(name) && !def.required {
                out.set(name.clone(), default_value(def));
            }
        }
        out
    }

    /// Coerce raw input for `field` the way an edit form does.
    pub fn coerce(&self, field: &str, value: FieldValue) -> Result<FieldValue, EditError> {
        let def = self
            .field(field)
            .ok_or_else(|| EditError::UnknownField(field.to_string()))?;
        Ok(coerce_value(def, value))
    }

    /// Validate a new record. Undeclared fields are rejected.
    pub fn validate(&self, record: &Record) -> Result<(), ValidationErrors> {
        validate_record(self, record)
    }

    /// Validate an edited copy of a stored record. Fields the schema does
    /// not declare came from the store and pass through unchecked.
    pub fn validate_edit(&self, record: &Record) -> Result<(), ValidationErrors> {
        validate_declared(self, record)
    }
}

fn default_value(def: &FieldDef) -> FieldValue {
    match &def.kind {
        FieldKind::Text | FieldKind::Date => FieldValue::Text(String::new()),
        FieldKind::Number { default, .. } => FieldValue::Number(*default),
        FieldKind::Status { default, .. } => FieldValue::Text(default.clone()),
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Start an entity schema for the collection `name`.
pub fn entity(name: &str) -> EntityBuilder {
    EntityBuilder {
        name: name.to_string(),
        label: None,
        fields: Vec::new(),
        order_by: None,
    }
}

pub struct EntityBuilder {
    name: String,
    label: Option<String>,
    fields: Vec<(String, FieldDef)>,
    order_by: Option<String>,
}

impl EntityBuilder {
    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Add a field. Panics on an invalid or duplicate name.
    pub fn field(mut self, name: &str, def: FieldDef) -> Self {
        if !name_regex().is_match(name) {
            panic!(
                "Field name \"{name}\" in entity \"{}\" contains invalid characters. \
                 Field names must start with a letter or underscore and contain only \
                 alphanumeric characters and underscores.",
                self.name
            );
        }
        if self.fields.iter().any(|(n, _)| n == name) {
            panic!("Field \"{name}\" is declared twice in entity \"{}\"", self.name);
        }
        self.fields.push((name.to_string(), def));
        self
    }

    pub fn order_by(mut self, field: &str) -> Self {
        self.order_by = Some(field.to_string());
        self
    }

    /// Finish the schema. Panics if the collection name is invalid or
    /// `order_by` names an undeclared field.
    pub fn build(self) -> EntitySchema {
        if !name_regex().is_match(&self.name) {
            panic!(
                "Entity name \"{}\" contains invalid characters. Entity names must start \
                 with a letter or underscore and contain only alphanumeric characters \
                 and underscores.",
                self.name
            );
        }
        if let Some(ref order) = self.order_by {
            if !self.fields.iter().any(|(n, _)| n == order) {
                panic!(
                    "order_by field \"{order}\" is not declared in entity \"{}\"",
                    self.name
                );
            }
        }
        let label = self.label.unwrap_or_else(|| self.name.clone());
        EntitySchema {
            name: self.name,
            label,
            fields: self.fields,
            order_by: self.order_by,
        }
    }
}
