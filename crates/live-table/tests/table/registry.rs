//! TableRegistry tests.

use std::sync::Arc;

use live_table::channel::InMemoryChannel;
use live_table::entities;
use live_table::table::{DeletePolicy, LiveTableOptions, PumpStep, TableRegistry};

fn registry() -> (Arc<InMemoryChannel>, TableRegistry) {
    let channel = Arc::new(InMemoryChannel::new());
    channel.seed("compliance", entities::compliance_seed());
    channel.seed("budget", entities::budget_seed());
    let registry = TableRegistry::new(channel.clone(), LiveTableOptions::default());
    (channel, registry)
}

#[test]
fn register_and_get() {
    let (_, registry) = registry();
    assert!(registry.is_empty());
    for schema in entities::all() {
        registry.register(schema);
    }

    assert_eq!(registry.len(), 5);
    assert_eq!(
        registry.collections(),
        vec!["batches", "budget", "compliance", "formulas", "inventory"]
    );
    assert_eq!(registry.get("formulas").unwrap().schema().label, "Formula");
    assert!(registry.get("orders").is_none());
}

#[test]
fn per_table_options_override_defaults() {
    let (_, registry) = registry();
    let table = registry.register_with(
        entities::inventory(),
        LiveTableOptions {
            delete_policy: Some(DeletePolicy::Optimistic),
            ..Default::default()
        },
    );
    assert_eq!(table.delete_policy(), DeletePolicy::Optimistic);
    assert_eq!(
        registry.register(entities::batches()).delete_policy(),
        DeletePolicy::Pessimistic
    );
}

#[tokio::test]
async fn attach_all_loads_every_table() {
    let (channel, registry) = registry();
    registry.register(entities::compliance());
    registry.register(entities::budget());

    let pumps = registry.attach_all().unwrap();
    assert_eq!(pumps.len(), 2);
    for mut pump in pumps {
        assert_eq!(pump.step().await, PumpStep::Applied);
    }

    let compliance = registry.get("compliance").unwrap().view();
    assert_eq!(compliance.total, 8);
    assert_eq!(compliance.summary.status_count("Compliant"), 5);
    assert_eq!(compliance.summary.status_count("Pending"), 2);
    assert_eq!(compliance.summary.status_count("Non-Compliant"), 1);

    let budget = registry.get("budget").unwrap().view();
    let order: Vec<&str> = budget.rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(order, vec!["Admin", "Logistics", "Marketing", "Production", "R&D"]);

    // Pumps were dropped above, which releases their subscriptions.
    assert_eq!(channel.subscriber_count("budget"), 0);
}

#[tokio::test]
async fn detach_all_stops_every_pump() {
    let (_, registry) = registry();
    registry.register(entities::compliance());
    registry.register(entities::budget());
    let mut pumps = registry.attach_all().unwrap();

    registry.detach_all();

    for pump in pumps.iter_mut() {
        assert_eq!(pump.step().await, PumpStep::Detached);
    }
    assert!(!registry.get("budget").unwrap().is_attached());
}

#[tokio::test]
async fn re_registering_replaces_and_detaches() {
    let (_, registry) = registry();
    let first = registry.register(entities::budget());
    let mut pump = first.attach().unwrap();

    let second = registry.register(entities::budget());

    assert!(!first.is_attached());
    assert_eq!(pump.step().await, PumpStep::Detached);
    assert!(!second.is_attached());
    assert_eq!(registry.len(), 1);
}
