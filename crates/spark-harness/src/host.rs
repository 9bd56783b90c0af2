//! Recording doubles for the host command tree, event bus, and
//! permission-gather event.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};

use spark_bridge::command::CommandContext;
use spark_bridge::host::{
    CommandDispatcher, CommandNode, CommandNodeKind, CommandSource, EventBus, GatherHandler,
    InstanceId, ListenerHandle, NodeId, PermissionHandle, PermissionSink, RegisterHandler,
    StoppingHandler,
};
use spark_bridge::permission::PermissionResolver;

/// Cap on redirect hops during `invoke`, to catch accidental cycles.
const MAX_REDIRECT_HOPS: usize = 8;

/// In-memory command tree. Registration is append-only and idempotent per
/// literal, matching the host assumption the bridge is written against.
#[derive(Default)]
pub struct InMemoryDispatcher {
    nodes: Vec<(NodeId, CommandNode)>,
}

impl CommandDispatcher for InMemoryDispatcher {
    fn register(&mut self, node: CommandNode) -> NodeId {
        if let Some((id, _)) = self.nodes.iter().find(|(_, n)| n.literal == node.literal) {
            return *id;
        }
        let id = NodeId::new(self.nodes.len() as u64);
        self.nodes.push((id, node));
        id
    }
}

impl InMemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a command line the way the host would: resolve the leading
    /// literal, follow redirects, then run the target's executor with the
    /// trailing input.
    pub fn invoke(&self, line: &str, source: CommandSource) -> Result<()> {
        let line = line.trim();
        let (literal, input) = match line.split_once(char::is_whitespace) {
            Some((literal, rest)) => (literal, rest.trim_start()),
            None => (line, ""),
        };

        let mut node = self
            .nodes
            .iter()
            .find(|(_, n)| n.literal == literal)
            .map(|(_, node)| node)
            .ok_or_else(|| anyhow!("unknown command: {literal}"))?;

        for _ in 0..MAX_REDIRECT_HOPS {
            match &node.kind {
                CommandNodeKind::Executable {
                    executor,
                    greedy_args,
                } => {
                    if !input.is_empty() && !*greedy_args {
                        bail!("command {:?} takes no arguments", node.literal);
                    }
                    let ctx = CommandContext {
                        source,
                        input: input.to_string(),
                    };
                    return executor(&ctx);
                }
                CommandNodeKind::Redirect(target) => {
                    node = &self
                        .nodes
                        .iter()
                        .find(|(id, _)| id == target)
                        .ok_or_else(|| anyhow!("dangling redirect from {:?}", node.literal))?
                        .1;
                }
            }
        }
        bail!("redirect cycle at {:?}", node.literal)
    }

    pub fn executable_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|(_, n)| matches!(n.kind, CommandNodeKind::Executable { .. }))
            .count()
    }

    pub fn redirect_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|(_, n)| matches!(n.kind, CommandNodeKind::Redirect(_)))
            .count()
    }

    /// Registered literals in registration order.
    pub fn literals(&self) -> Vec<&str> {
        self.nodes.iter().map(|(_, n)| n.literal.as_str()).collect()
    }
}

enum Subscription {
    Stopping(Arc<dyn Fn(InstanceId) + Send + Sync>),
    Gather(Arc<dyn Fn(&mut dyn PermissionSink) + Send + Sync>),
    Register(Arc<dyn Fn(&mut dyn CommandDispatcher) + Send + Sync>),
}

/// Process-wide host event bus double.
///
/// Handlers are cloned out of the subscription table before being invoked,
/// so a stopping handler that calls back into `unsubscribe_all` (the
/// bridge's disable path does) cannot deadlock the bus.
#[derive(Default)]
pub struct InMemoryEventBus {
    subs: Mutex<Vec<(ListenerHandle, Subscription)>>,
    unsubscribe_batches: AtomicUsize,
}

impl EventBus for InMemoryEventBus {
    fn subscribe_server_stopping(&self, handler: StoppingHandler) -> ListenerHandle {
        self.push(Subscription::Stopping(Arc::from(handler)))
    }

    fn subscribe_permission_gather(&self, handler: GatherHandler) -> ListenerHandle {
        self.push(Subscription::Gather(Arc::from(handler)))
    }

    fn subscribe_command_register(&self, handler: RegisterHandler) -> ListenerHandle {
        self.push(Subscription::Register(Arc::from(handler)))
    }

    fn unsubscribe_all(&self, handles: &[ListenerHandle]) {
        self.unsubscribe_batches.fetch_add(1, Ordering::SeqCst);
        self.subs
            .lock()
            .expect("bus poisoned")
            .retain(|(handle, _)| !handles.contains(handle));
    }
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, sub: Subscription) -> ListenerHandle {
        let handle = ListenerHandle::new();
        self.subs.lock().expect("bus poisoned").push((handle, sub));
        handle
    }

    /// Deliver a server-stopping event for the given instance.
    pub fn fire_server_stopping(&self, instance: InstanceId) {
        let handlers: Vec<_> = self
            .subs
            .lock()
            .expect("bus poisoned")
            .iter()
            .filter_map(|(_, sub)| match sub {
                Subscription::Stopping(f) => Some(Arc::clone(f)),
                _ => None,
            })
            .collect();
        for handler in handlers {
            handler(instance);
        }
    }

    /// Deliver a permission-gather event carrying `sink`.
    pub fn fire_permission_gather(&self, sink: &mut dyn PermissionSink) {
        let handlers: Vec<_> = self
            .subs
            .lock()
            .expect("bus poisoned")
            .iter()
            .filter_map(|(_, sub)| match sub {
                Subscription::Gather(f) => Some(Arc::clone(f)),
                _ => None,
            })
            .collect();
        for handler in handlers {
            handler(sink);
        }
    }

    /// Deliver a command-register event carrying the host dispatcher.
    pub fn fire_command_register(&self, dispatcher: &mut dyn CommandDispatcher) {
        let handlers: Vec<_> = self
            .subs
            .lock()
            .expect("bus poisoned")
            .iter()
            .filter_map(|(_, sub)| match sub {
                Subscription::Register(f) => Some(Arc::clone(f)),
                _ => None,
            })
            .collect();
        for handler in handlers {
            handler(dispatcher);
        }
    }

    /// How many `unsubscribe_all` batches the host has seen.
    pub fn unsubscribe_batches(&self) -> usize {
        self.unsubscribe_batches.load(Ordering::SeqCst)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subs.lock().expect("bus poisoned").len()
    }
}

struct RegisteredPermission {
    handle: PermissionHandle,
    resolver: PermissionResolver,
}

/// Host-side permission node collection carried by the gather event.
///
/// Host permission registries reject duplicate names fatally; `add_node`
/// panics to simulate that, so any bridge bug that re-registers a name
/// fails the test loudly. Keep one `GatherEvent` per host session and fire
/// it through the bus as many times as the host would.
#[derive(Default)]
pub struct GatherEvent {
    nodes: HashMap<String, RegisteredPermission>,
    next_handle: u64,
}

impl PermissionSink for GatherEvent {
    fn already_registered(&self, qualified_name: &str) -> Option<PermissionHandle> {
        self.nodes.get(qualified_name).map(|node| node.handle)
    }

    fn add_node(&mut self, qualified_name: &str, resolver: PermissionResolver) -> PermissionHandle {
        assert!(
            !self.nodes.contains_key(qualified_name),
            "host rejected duplicate permission node: {qualified_name}"
        );
        let handle = PermissionHandle::new(self.next_handle);
        self.next_handle += 1;
        self.nodes
            .insert(qualified_name.to_string(), RegisteredPermission { handle, resolver });
        handle
    }
}

impl GatherEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn handle_of(&self, qualified_name: &str) -> Option<PermissionHandle> {
        self.already_registered(qualified_name)
    }

    /// Registered qualified names, sorted.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Evaluate the host-side resolver for a registered node.
    pub fn evaluate(&self, qualified_name: &str, source: Option<&CommandSource>) -> Option<bool> {
        self.nodes
            .get(qualified_name)
            .map(|node| (node.resolver)(source))
    }
}
