//! Stub capability provider with observable command senders.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use spark_types::{PlatformInfo, PlatformKind, SourceMetadata, WorldSnapshot};

use spark_bridge::host::CommandSource;
use spark_bridge::permission::PermissionNode;
use spark_bridge::provider::{
    CapabilityProvider, ClassSourceLookup, CommandSender, TickHook, TickReporter,
    WorldInfoProvider,
};

/// Capability provider double.
///
/// Factories hand out no-op collaborators; `create_command_sender` returns
/// senders that append every delivered message to a shared log the test can
/// inspect after the fact.
pub struct StubProvider {
    sources: Vec<SourceMetadata>,
    world: WorldSnapshot,
    message_log: Arc<Mutex<Vec<(String, String)>>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            world: WorldSnapshot::default(),
            message_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_sources(mut self, sources: Vec<SourceMetadata>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_world(mut self, world: WorldSnapshot) -> Self {
        self.world = world;
        self
    }

    /// All `(sender name, message)` pairs delivered so far.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.message_log.lock().expect("message log poisoned").clone()
    }
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityProvider for StubProvider {
    fn create_tick_hook(&self) -> Box<dyn TickHook> {
        Box::new(NoopTicker::default())
    }

    fn create_tick_reporter(&self) -> Box<dyn TickReporter> {
        Box::new(NoopTicker::default())
    }

    fn create_class_source_lookup(&self) -> Box<dyn ClassSourceLookup> {
        Box::new(NoSourceLookup)
    }

    fn create_world_info_provider(&self) -> Box<dyn WorldInfoProvider> {
        Box::new(FixedWorldInfo(self.world))
    }

    fn platform_info(&self) -> PlatformInfo {
        PlatformInfo {
            kind: PlatformKind::Server,
            name: "InMemory".into(),
            brand: "in-memory".into(),
            version: "0.0.0".into(),
        }
    }

    fn create_command_sender(&self, source: CommandSource) -> Box<dyn CommandSender> {
        Box::new(LoggingSender {
            source,
            log: Arc::clone(&self.message_log),
        })
    }

    fn known_sources(&self) -> Vec<SourceMetadata> {
        self.sources.clone()
    }
}

#[derive(Default)]
struct NoopTicker {
    running: bool,
}

impl TickHook for NoopTicker {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

impl TickReporter for NoopTicker {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

struct NoSourceLookup;

impl ClassSourceLookup for NoSourceLookup {
    fn identify(&self, _class_name: &str) -> Option<String> {
        None
    }
}

struct FixedWorldInfo(WorldSnapshot);

impl WorldInfoProvider for FixedWorldInfo {
    fn poll(&self) -> WorldSnapshot {
        self.0
    }
}

struct LoggingSender {
    source: CommandSource,
    log: Arc<Mutex<Vec<(String, String)>>>,
}

impl CommandSender for LoggingSender {
    fn name(&self) -> String {
        self.source.name.clone()
    }

    fn unique_id(&self) -> Option<Uuid> {
        self.source.unique_id
    }

    fn send_message(&self, message: &str) {
        self.log
            .lock()
            .expect("message log poisoned")
            .push((self.source.name.clone(), message.to_string()));
    }

    fn has_permission(&self, node: &PermissionNode) -> bool {
        node.check(Some(&self.source))
    }
}
