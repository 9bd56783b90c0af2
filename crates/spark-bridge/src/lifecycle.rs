//! Enable/disable lifecycle bound to host events.
//!
//! [`ServerBridge`] composes the whole bridge for one host instance:
//!
//! 1. `enable()` constructs the profiling core (once) through the outbound
//!    plugin contract, then subscribes to the three host events it cares
//!    about: server-stopping, permission-gather, command-register.
//! 2. The gather handler rebuilds the permission registry in place; the
//!    register handler populates the host command tree.
//! 3. `disable()` removes the subscriptions as one batch, tears down the
//!    core and the async worker, and is safe to call any number of times.
//!
//! The stopping handler only reacts to events carrying this bridge's own
//! [`InstanceId`]; the process-wide bus may deliver events for other
//! concurrently-running instances, which are ignored.

use std::mem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde::Deserialize;
use tracing::{debug, info, warn};

use spark_types::BridgeError;

use crate::command::build_tree;
use crate::host::{
    CommandDispatcher, CommandSource, EventBus, InstanceId, ListenerHandle, PermissionSink,
};
use crate::permission::{PermissionNode, PermissionRegistry};
use crate::provider::{CapabilityProvider, CoreFactory, ProfilerCore, ProfilerPlugin, ThreadDumper};
use crate::scheduler::{AsyncScheduler, Task};

/// Permission namespace and primary command name for the profiler.
pub const NAMESPACE: &str = "spark";

/// Name given to the dedicated async worker thread.
const WORKER_THREAD_NAME: &str = "spark-async-worker";

/// Lifecycle state of one bridge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Disabled,
    Enabled,
}

/// Static configuration for one bridge instance.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Adapter version string reported to the profiling core.
    pub version: String,
    /// Directory the profiler may use for its own files.
    pub plugin_directory: PathBuf,
}

/// The lifecycle controller for one host instance.
///
/// Owns the listener set and lifecycle state exclusively; owns the
/// permission registry through single-writer discipline (only the
/// gather-event thread replaces it, readers tolerate a stale/absent
/// registry between `enable()` and the first gather pass).
pub struct ServerBridge {
    shared: Arc<BridgeShared>,
}

struct BridgeShared {
    config: BridgeConfig,
    instance: InstanceId,
    bus: Arc<dyn EventBus>,
    provider: Arc<dyn CapabilityProvider>,
    scheduler: AsyncScheduler,
    state: Mutex<LifecycleState>,
    /// Latches on the first successful `enable()`. The worker and core
    /// teardown in `disable()` are permanent, so a spent bridge must not
    /// come back as half-alive.
    enabled_once: AtomicBool,
    listeners: Mutex<Vec<ListenerHandle>>,
    /// `None` until the first permission-gather event of the session.
    permissions: RwLock<Option<PermissionRegistry>>,
    core: Mutex<Option<Arc<dyn ProfilerCore>>>,
}

impl ServerBridge {
    /// Construct a disabled bridge bound to one host instance.
    ///
    /// The async worker starts immediately; everything else waits for
    /// `enable()`.
    pub fn new(
        config: BridgeConfig,
        instance: InstanceId,
        bus: Arc<dyn EventBus>,
        provider: Arc<dyn CapabilityProvider>,
    ) -> Self {
        Self {
            shared: Arc::new(BridgeShared {
                config,
                instance,
                bus,
                provider,
                scheduler: AsyncScheduler::new(WORKER_THREAD_NAME),
                state: Mutex::new(LifecycleState::Disabled),
                enabled_once: AtomicBool::new(false),
                listeners: Mutex::new(Vec::new()),
                permissions: RwLock::new(None),
                core: Mutex::new(None),
            }),
        }
    }

    pub fn instance(&self) -> InstanceId {
        self.shared.instance
    }

    pub fn state(&self) -> LifecycleState {
        *self.shared.state.lock().expect("lifecycle state poisoned")
    }

    /// Number of live event-bus subscriptions.
    pub fn active_listeners(&self) -> usize {
        self.shared.listeners.lock().expect("listener set poisoned").len()
    }

    /// The outbound contract handed to the profiling core.
    pub fn plugin(&self) -> Arc<dyn ProfilerPlugin> {
        self.shared.clone()
    }

    /// Construct the profiling core and bind to the host event bus.
    ///
    /// The concrete adapter calls this from the host's
    /// server-about-to-start event, once per instance.
    ///
    /// Single-shot per instance: a second call is reported as a lifecycle
    /// error rather than silently re-subscribing, even after `disable()` —
    /// teardown shuts the async worker for good, so each host session gets
    /// a fresh bridge.
    ///
    /// # Errors
    ///
    /// Propagates any error from the core factory (the bridge stays
    /// disabled and may be enabled again), and fails if this bridge was
    /// already enabled once.
    pub fn enable(&self, build_core: CoreFactory) -> anyhow::Result<()> {
        if self.shared.enabled_once.swap(true, Ordering::SeqCst) {
            return Err(BridgeError::Lifecycle("bridge already enabled".into()).into());
        }

        let core = match build_core(self.plugin()) {
            Ok(core) => core,
            Err(error) => {
                self.shared.enabled_once.store(false, Ordering::SeqCst);
                return Err(error);
            }
        };
        *self.shared.core.lock().expect("core slot poisoned") = Some(core);

        let handles = [
            {
                let shared = Arc::clone(&self.shared);
                self.shared
                    .bus
                    .subscribe_server_stopping(Box::new(move |instance| {
                        shared.on_server_stopping(instance);
                    }))
            },
            {
                let shared = Arc::clone(&self.shared);
                self.shared
                    .bus
                    .subscribe_permission_gather(Box::new(move |sink| {
                        shared.on_permission_gather(sink);
                    }))
            },
            {
                let shared = Arc::clone(&self.shared);
                self.shared
                    .bus
                    .subscribe_command_register(Box::new(move |dispatcher| {
                        shared.on_command_register(dispatcher);
                    }))
            },
        ];

        self.shared
            .listeners
            .lock()
            .expect("listener set poisoned")
            .extend(handles);
        *self.shared.state.lock().expect("lifecycle state poisoned") = LifecycleState::Enabled;

        info!(
            instance = %self.shared.instance,
            version = %self.shared.config.version,
            "profiler bridge enabled"
        );
        Ok(())
    }

    /// Unbind from the host and tear everything down.
    ///
    /// Safe to call even when already disabled: with an empty listener set
    /// this performs no host interaction at all.
    pub fn disable(&self) {
        self.shared.disable();
    }

    /// Look up a permission node registered for this session.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::PermissionNotSynchronized`] if the gather
    /// event has not fired yet or the name was never synchronized.
    pub fn resolve_permission(&self, name: &str) -> Result<PermissionNode, BridgeError> {
        let registry = self.shared.permissions.read().expect("permission registry poisoned");
        match registry.as_ref() {
            Some(registry) => registry.resolve(name).map(|node| node.clone()),
            None => Err(BridgeError::PermissionNotSynchronized(name.to_string())),
        }
    }
}

impl BridgeShared {
    fn disable(&self) {
        let handles = mem::take(&mut *self.listeners.lock().expect("listener set poisoned"));
        if !handles.is_empty() {
            self.bus.unsubscribe_all(&handles);
        }

        if let Some(core) = self.core.lock().expect("core slot poisoned").take() {
            core.disable();
        }
        self.scheduler.shutdown();

        let mut state = self.state.lock().expect("lifecycle state poisoned");
        if *state == LifecycleState::Enabled {
            info!(instance = %self.instance, "profiler bridge disabled");
        }
        *state = LifecycleState::Disabled;
    }

    fn on_server_stopping(&self, stopping: InstanceId) {
        if stopping != self.instance {
            debug!(
                stopping = %stopping,
                own = %self.instance,
                "ignoring stop event for another host instance"
            );
            return;
        }
        self.disable();
    }

    fn on_permission_gather(&self, sink: &mut dyn PermissionSink) {
        let Some(core) = self.core.lock().expect("core slot poisoned").clone() else {
            warn!("permission gather fired with no profiling core; skipping");
            return;
        };

        let primary_aliases: Vec<String> = core
            .commands()
            .iter()
            .filter_map(|spec| spec.primary_alias().map(str::to_string))
            .collect();

        let registry = PermissionRegistry::synchronize(NAMESPACE, &primary_aliases, sink);
        debug!(nodes = registry.len(), "permission registry synchronized");

        // Replace, never merge: the new pass owns the whole mapping.
        *self.permissions.write().expect("permission registry poisoned") = Some(registry);
    }

    fn on_command_register(&self, dispatcher: &mut dyn CommandDispatcher) {
        let Some(core) = self.core.lock().expect("core slot poisoned").clone() else {
            warn!("command register fired with no profiling core; skipping");
            return;
        };

        let specs = core.commands();
        build_tree(dispatcher, &specs);
        debug!(commands = specs.len(), "command tree registered");
    }
}

impl ProfilerPlugin for BridgeShared {
    fn version(&self) -> &str {
        &self.config.version
    }

    fn plugin_directory(&self) -> &Path {
        &self.config.plugin_directory
    }

    fn execute_async(&self, task: Task) {
        if let Err(error) = self.scheduler.submit(task) {
            warn!(%error, "dropping async task submitted after shutdown");
        }
    }

    fn default_thread_dumper(&self) -> ThreadDumper {
        ThreadDumper::of_current_thread()
    }

    fn capabilities(&self) -> &dyn CapabilityProvider {
        self.provider.as_ref()
    }
}

/// Convenience permission check combining lookup and resolver evaluation.
///
/// Fails (rather than defaulting to deny) when the name was never
/// synchronized, surfacing the ordering defect immediately.
pub fn check_permission(
    bridge: &ServerBridge,
    name: &str,
    source: Option<&CommandSource>,
) -> Result<bool, BridgeError> {
    Ok(bridge.resolve_permission(name)?.check(source))
}
