//! Host integration bridge for the spark profiler.
//!
//! This crate adapts a game-server host runtime (command dispatcher,
//! permission registry, lifecycle event bus) to the single stable contract
//! the profiling core consumes. The host side is expressed as traits in
//! [`host`]; a concrete adapter implements them once per host runtime.
//!
//! - [`command`]: builds the host-native command tree with alias redirects
//! - [`permission`]: idempotent permission synchronization and lookup
//! - [`scheduler`]: a dedicated worker thread for off-main-thread tasks
//! - [`lifecycle`]: the enable/disable state machine bound to host events
//! - [`provider`]: the capability factory contract and outbound plugin API

pub mod command;
pub mod host;
pub mod lifecycle;
pub mod permission;
pub mod provider;
pub mod scheduler;

pub use command::{build_tree, CommandContext, CommandExecutor, CommandSpec};
pub use host::{
    CommandDispatcher, CommandNode, CommandNodeKind, CommandSource, EventBus, InstanceId,
    ListenerHandle, NodeId, PermissionHandle, PermissionSink,
};
pub use lifecycle::{check_permission, BridgeConfig, LifecycleState, ServerBridge, NAMESPACE};
pub use permission::{
    default_resolver, PermissionNode, PermissionRegistry, PermissionResolver, CATCH_ALL,
    HIGHEST_PRIVILEGE_LEVEL,
};
pub use provider::{
    CapabilityProvider, ClassSourceLookup, CommandSender, CoreFactory, ProfilerCore,
    ProfilerPlugin, ThreadDumper, TickHook, TickReporter, WorldInfoProvider,
};
pub use scheduler::{AsyncScheduler, Task};
