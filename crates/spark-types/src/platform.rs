//! Host platform descriptors.

use serde::{Deserialize, Serialize};

/// Whether the host runtime is a dedicated server or an embedded client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    Server,
    Client,
}

/// Identity of the host runtime, reported alongside profiling output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// Server or client.
    pub kind: PlatformKind,
    /// Host framework name (e.g. "Forge", "Fabric").
    pub name: String,
    /// Host brand string as the runtime reports it.
    pub brand: String,
    /// Host framework version.
    pub version: String,
}

/// Point-in-time counts from the host's loaded worlds.
///
/// Produced by a world-info provider; consumed by the profiling core for
/// report context. All counts are totals across loaded worlds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub players: usize,
    pub entities: usize,
    pub chunks: usize,
}
