//! Error types shared across the spark bridge crates.

/// Errors raised by the host integration bridge.
///
/// `PermissionNotSynchronized` is an invariant violation: it means a lookup
/// ran before the host's permission-gather event populated the registry, or
/// against a stale registry. It is fatal to the calling operation and never
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("permission not synchronized: {0}")]
    PermissionNotSynchronized(String),

    #[error("async scheduler has shut down; task rejected")]
    SchedulerStopped,

    #[error("lifecycle error: {0}")]
    Lifecycle(String),
}
