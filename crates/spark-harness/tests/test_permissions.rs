//! Permission synchronization against the host-side gather event,
//! including the duplicate-delivery quirk and sender-side checks.

use std::sync::Arc;

use spark_bridge::host::CommandSource;
use spark_bridge::permission::PermissionRegistry;
use spark_bridge::provider::CapabilityProvider;
use spark_harness::{GatherEvent, StubProvider};
use uuid::Uuid;

fn player(singleplayer_owner: bool, privilege_level: u8) -> CommandSource {
    CommandSource {
        name: "Steve".into(),
        unique_id: Some(Uuid::new_v4()),
        singleplayer_owner,
        privilege_level,
    }
}

#[test]
fn synchronizing_one_command_registers_command_and_catch_all() {
    let mut event = GatherEvent::new();
    let registry = PermissionRegistry::synchronize("spark", &["spark".into()], &mut event);

    assert_eq!(event.registered_names(), vec!["spark.all", "spark.spark"]);
    assert_eq!(registry.qualified_names(), vec!["spark.all", "spark.spark"]);
}

#[test]
fn double_gather_reuses_host_nodes() {
    let mut event = GatherEvent::new();
    let first = PermissionRegistry::synchronize("spark", &["spark".into()], &mut event);
    let first_all = first.resolve("spark.all").unwrap().handle;

    // The host delivers the same logical event again. GatherEvent panics on
    // a duplicate add_node, so reaching the assertions proves reuse.
    let second = PermissionRegistry::synchronize("spark", &["spark".into()], &mut event);

    assert_eq!(event.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(second.resolve("spark.all").unwrap().handle, first_all);
    assert_eq!(event.handle_of("spark.all"), Some(first_all));
}

#[test]
fn host_side_resolver_matches_bridge_rules() {
    let mut event = GatherEvent::new();
    PermissionRegistry::synchronize("spark", &["spark".into()], &mut event);

    assert_eq!(event.evaluate("spark.all", None), Some(false));
    assert_eq!(event.evaluate("spark.all", Some(&player(false, 0))), Some(false));
    assert_eq!(event.evaluate("spark.all", Some(&player(true, 0))), Some(true));
    assert_eq!(event.evaluate("spark.all", Some(&player(false, 4))), Some(true));
    assert_eq!(event.evaluate("spark.missing", None), None);
}

#[test]
fn command_sender_checks_against_registry_nodes() {
    let mut event = GatherEvent::new();
    let registry = PermissionRegistry::synchronize("spark", &["spark".into()], &mut event);
    let node = registry.resolve("spark").unwrap();

    let provider = Arc::new(StubProvider::new());
    let owner = provider.create_command_sender(player(true, 0));
    let pedestrian = provider.create_command_sender(player(false, 1));

    assert!(owner.has_permission(node));
    assert!(!pedestrian.has_permission(node));
}
