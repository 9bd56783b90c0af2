//! Capability provider surface: factories, diagnostics, and the
//! command-feedback channel.

use std::sync::Arc;

use spark_bridge::host::CommandSource;
use spark_bridge::provider::CapabilityProvider;
use spark_types::{SourceMetadata, WorldSnapshot};

use spark_harness::StubProvider;

fn console() -> CommandSource {
    CommandSource {
        name: "Server".into(),
        unique_id: None,
        singleplayer_owner: false,
        privilege_level: 4,
    }
}

#[test]
fn known_sources_report_configured_extensions() {
    let provider = StubProvider::new().with_sources(vec![SourceMetadata {
        id: "spark".into(),
        version: "1.10.0".into(),
        author: None,
        description: "profiler".into(),
    }]);

    let sources = provider.known_sources();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id, "spark");
}

#[test]
fn world_info_provider_reports_the_configured_snapshot() {
    let snapshot = WorldSnapshot {
        players: 3,
        entities: 120,
        chunks: 900,
    };
    let provider = StubProvider::new().with_world(snapshot);

    assert_eq!(provider.create_world_info_provider().poll(), snapshot);
}

#[test]
fn sender_messages_land_in_the_shared_log() {
    let provider = Arc::new(StubProvider::new());

    let sender = provider.create_command_sender(console());
    sender.send_message("profiler started");
    sender.send_message("profiler stopped");

    assert_eq!(
        provider.messages(),
        vec![
            ("Server".to_string(), "profiler started".to_string()),
            ("Server".to_string(), "profiler stopped".to_string()),
        ]
    );
}

#[test]
fn tick_collaborators_and_class_lookup_are_inert() {
    let provider = StubProvider::new();

    let mut hook = provider.create_tick_hook();
    hook.start();
    hook.stop();

    let mut reporter = provider.create_tick_reporter();
    reporter.start();
    reporter.stop();

    let lookup = provider.create_class_source_lookup();
    assert_eq!(lookup.identify("net.minecraft.server.MinecraftServer"), None);
}
