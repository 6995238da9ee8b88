//! Entity schemas for the dashboard collections.
//!
//! Batches, formulas and inventory are live, editable collections. Compliance
//! and budget records ship as fixture data that can be seeded into a channel.

use crate::{
    schema::{entity, t, EntitySchema},
    types::{Collection, Key, Record},
};

// ============================================================================
// Status option sets
// ============================================================================

pub const BATCH_STATUSES: &[&str] = &["In Progress", "Completed", "QA Pending", "On Hold"];

pub const FORMULA_STATUSES: &[&str] = &["Active", "In Development", "Superseded", "Retired"];

pub const INVENTORY_STATUSES: &[&str] = &["In Stock", "Low Stock", "Out of Stock"];

pub const COMPLIANCE_STATUSES: &[&str] = &["Compliant", "Pending", "Non-Compliant"];

// ============================================================================
// Schemas
// ============================================================================

/// Production batches, ordered by batch id.
pub fn batches() -> EntitySchema {
    entity("batches")
        .label("Batch")
        .field("batchId", t::text().required().searchable())
        .field("product", t::text().required().searchable())
        .field("startDate", t::date().required())
        .field("completion", t::percentage())
        .field("status", t::status(BATCH_STATUSES).searchable())
        .order_by("batchId")
        .build()
}

/// Product formulas. `version` falls back to 1.0 on blank or invalid input.
pub fn formulas() -> EntitySchema {
    entity("formulas")
        .label("Formula")
        .field("formulaId", t::text().required().searchable())
        .field("productName", t::text().required().searchable())
        .field("version", t::number().min(0.0).default_number(1.0))
        .field("status", t::status(FORMULA_STATUSES).searchable())
        .field("createdDate", t::date().required())
        .order_by("formulaId")
        .build()
}

pub fn inventory() -> EntitySchema {
    entity("inventory")
        .label("Item")
        .field("name", t::text().required().searchable())
        .field("category", t::text().required().searchable())
        .field("quantity", t::number().required().min(0.0).integer())
        .field("unit", t::text().required())
        .field("status", t::status(INVENTORY_STATUSES).searchable())
        .order_by("name")
        .build()
}

pub fn compliance() -> EntitySchema {
    entity("compliance")
        .label("Compliance record")
        .field("type", t::text().required().searchable())
        .field("status", t::status(COMPLIANCE_STATUSES).searchable())
        .field("lastAudit", t::date().required())
        .field("nextAudit", t::date().required())
        .field("auditor", t::text().searchable())
        .build()
}

/// Departmental budgets. Amounts are whole currency units.
pub fn budget() -> EntitySchema {
    entity("budget")
        .label("Budget")
        .field("department", t::text().required().searchable())
        .field("allocated", t::number().min(0.0).integer())
        .field("spent", t::number().min(0.0).integer())
        .order_by("department")
        .build()
}

/// Every dashboard schema, in navigation order.
pub fn all() -> Vec<EntitySchema> {
    vec![inventory(), batches(), budget(), compliance(), formulas()]
}

// ============================================================================
// Fixture data
// ============================================================================

/// Audit records keyed by audit id.
pub fn compliance_seed() -> Collection {
    [
        ("C-001", "GMP", "Compliant", "2023-11-15", "2024-11-15", "Jane Doe"),
        ("C-002", "FDA 21 CFR Part 11", "Compliant", "2024-01-20", "2025-01-20", "John Smith"),
        ("C-003", "ISO 13485", "Pending", "2023-09-01", "2024-09-01", "Emily White"),
        ("C-004", "GMP", "Non-Compliant", "2024-02-10", "2024-05-10", "Michael Brown"),
        ("C-005", "ISO 9001", "Compliant", "2023-12-05", "2024-12-05", "Sarah Green"),
        ("C-006", "FDA 21 CFR Part 211", "Compliant", "2024-03-01", "2025-03-01", "David Clark"),
        ("C-007", "GMP", "Pending", "2024-04-18", "2025-04-18", "Laura Taylor"),
        ("C-008", "ISO 14001", "Compliant", "2023-10-25", "2024-10-25", "Robert Wilson"),
    ]
    .into_iter()
    .map(|(id, kind, status, last, next, auditor)| {
        (
            Key::new(id),
            Record::new()
                .with("type", kind)
                .with("status", status)
                .with("lastAudit", last)
                .with("nextAudit", next)
                .with("auditor", auditor),
        )
    })
    .collect()
}

/// Department budgets keyed by department name.
pub fn budget_seed() -> Collection {
    [
        ("R&D", 500_000, 450_000),
        ("Marketing", 300_000, 250_000),
        ("Production", 750_000, 700_000),
        ("Logistics", 200_000, 210_000),
        ("Admin", 150_000, 150_000),
    ]
    .into_iter()
    .map(|(department, allocated, spent)| {
        (
            Key::new(department),
            Record::new()
                .with("department", department)
                .with("allocated", allocated)
                .with("spent", spent),
        )
    })
    .collect()
}

/// Share of `allocated` that has been spent, in percent. Zero when nothing
/// was allocated; may exceed 100 for overspent budgets.
pub fn usage_percentage(spent: f64, allocated: f64) -> f64 {
    if allocated == 0.0 {
        return 0.0;
    }
    spent / allocated * 100.0
}
