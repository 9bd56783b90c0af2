//! Traits and handle types a concrete host adapter implements.
//!
//! The bridge never talks to a host runtime directly; everything it needs
//! from the host is expressed here as a trait with opaque handles. Event
//! subscriptions are explicit, enumerated calls (one per event kind) rather
//! than any annotation- or reflection-driven registration, so the lifecycle
//! controller can collect and batch-remove the resulting handles.

use std::fmt;

use uuid::Uuid;

use crate::command::CommandExecutor;
use crate::permission::PermissionResolver;

/// Identity of one host instance within the process.
///
/// The host event bus is process-wide and may deliver events for other
/// concurrently-running instances (hot reload, multi-instance test
/// harnesses). The lifecycle controller captures this at construction and
/// compares it against the identity carried by stop events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Mint a fresh instance identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque handle for one event-bus subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(Uuid);

impl ListenerHandle {
    /// Mint a fresh subscription handle. Called by the host-side bus.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque handle the host assigns to a registered permission node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermissionHandle(u64);

impl PermissionHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Opaque handle the host dispatcher assigns to a registered command node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Facts about the principal behind a command invocation or permission
/// check, as the host reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSource {
    /// Display name of the principal.
    pub name: String,
    /// Stable unique id, where the host assigns one (console sources don't).
    pub unique_id: Option<Uuid>,
    /// Whether this principal owns the singleplayer host instance.
    pub singleplayer_owner: bool,
    /// The host's numeric privilege level for this principal.
    pub privilege_level: u8,
}

/// What a registered command-tree node does when reached.
#[derive(Clone)]
pub enum CommandNodeKind {
    /// Runs an executor, optionally accepting one greedy trailing-argument
    /// form in addition to the bare zero-argument invocation.
    Executable {
        executor: CommandExecutor,
        greedy_args: bool,
    },
    /// Forwards execution to another node, argument grammar included.
    Redirect(NodeId),
}

/// One entry to register in the host's command tree.
#[derive(Clone)]
pub struct CommandNode {
    /// The literal token this node matches.
    pub literal: String,
    pub kind: CommandNodeKind,
}

impl CommandNode {
    /// An executable literal node that also accepts a greedy argument line.
    pub fn executable(literal: impl Into<String>, executor: CommandExecutor) -> Self {
        Self {
            literal: literal.into(),
            kind: CommandNodeKind::Executable {
                executor,
                greedy_args: true,
            },
        }
    }

    /// A literal node that redirects to `target`.
    pub fn redirect(literal: impl Into<String>, target: NodeId) -> Self {
        Self {
            literal: literal.into(),
            kind: CommandNodeKind::Redirect(target),
        }
    }
}

/// The host's native command dispatcher.
///
/// Registration is append-only and idempotent per literal name; the bridge
/// never removes nodes and does not roll back a partially-registered pass.
pub trait CommandDispatcher {
    fn register(&mut self, node: CommandNode) -> NodeId;
}

/// The mutable collection carried by the host's permission-gather event.
///
/// `add_node` is fatal host-side if the qualified name is already present,
/// so callers must check `already_registered` first. The same logical event
/// may be delivered more than once per session.
pub trait PermissionSink {
    /// Handle of an already-registered node with this qualified name, if any.
    fn already_registered(&self, qualified_name: &str) -> Option<PermissionHandle>;

    /// Register a new boolean permission node and return its host handle.
    fn add_node(&mut self, qualified_name: &str, resolver: PermissionResolver) -> PermissionHandle;
}

/// Handler invoked when the host begins stopping, carrying the identity of
/// the instance that is stopping.
pub type StoppingHandler = Box<dyn Fn(InstanceId) + Send + Sync>;

/// Handler invoked on the host's permission-gather event.
pub type GatherHandler = Box<dyn Fn(&mut dyn PermissionSink) + Send + Sync>;

/// Handler invoked when the host asks for commands to be registered.
pub type RegisterHandler = Box<dyn Fn(&mut dyn CommandDispatcher) + Send + Sync>;

/// The host's lifecycle event bus.
///
/// Callbacks are delivered on threads the bridge does not control, at most
/// once per physical event but potentially duplicated at the logical level.
pub trait EventBus: Send + Sync {
    fn subscribe_server_stopping(&self, handler: StoppingHandler) -> ListenerHandle;

    fn subscribe_permission_gather(&self, handler: GatherHandler) -> ListenerHandle;

    fn subscribe_command_register(&self, handler: RegisterHandler) -> ListenerHandle;

    /// Remove the given subscriptions as one batch.
    fn unsubscribe_all(&self, handles: &[ListenerHandle]);
}
