//! Entity schemas: field kinds, the builder, input coercion and validation.
//!
//! - [`node`]: [`FieldKind`], [`FieldDef`] and the `t` field helpers.
//! - [`entity`]: [`EntitySchema`] and its fluent [`entity`] builder.
//! - [`coerce`]: edit-form input coercion.
//! - [`validate`]: pre-write record validation.

pub mod coerce;
pub mod entity;
pub mod node;
pub mod validate;

pub use coerce::coerce_value;
pub use entity::{entity, EntityBuilder, EntitySchema};
pub use node::{t, FieldDef, FieldKind};
pub use validate::{is_valid_date, validate_declared, validate_record};
