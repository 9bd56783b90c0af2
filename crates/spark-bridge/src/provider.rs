//! Capability provider contract and the outbound plugin interface.
//!
//! A concrete host adapter implements [`CapabilityProvider`] once per host
//! runtime; the lifecycle controller is written against the trait. The
//! profiling core (external to this crate) consumes [`ProfilerPlugin`] and
//! drives the collaborator traits created by the provider. None of the
//! factory methods carry behavior here; failures propagate as whatever the
//! concrete provider raises.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use spark_types::{PlatformInfo, SourceMetadata, WorldSnapshot};

use crate::command::CommandSpec;
use crate::host::CommandSource;
use crate::permission::PermissionNode;
use crate::scheduler::Task;

/// Hook into the host's tick loop, driven by the sampler.
pub trait TickHook: Send {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Reports per-tick durations to the profiling core.
pub trait TickReporter: Send {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Maps a class name to the host extension it was loaded from.
pub trait ClassSourceLookup: Send + Sync {
    fn identify(&self, class_name: &str) -> Option<String>;
}

/// Supplies world statistics for report context.
pub trait WorldInfoProvider: Send + Sync {
    fn poll(&self) -> WorldSnapshot;
}

/// Host-side wrapper around the principal behind a command invocation,
/// used for feedback messages and permission checks.
pub trait CommandSender: Send + Sync {
    fn name(&self) -> String;

    fn unique_id(&self) -> Option<uuid::Uuid>;

    /// Deliver a message on the host's command-feedback channel.
    fn send_message(&self, message: &str);

    fn has_permission(&self, node: &PermissionNode) -> bool;
}

/// Factory operations a concrete host adapter must implement. Pure
/// delegation; no logic lives at this seam.
pub trait CapabilityProvider: Send + Sync {
    fn create_tick_hook(&self) -> Box<dyn TickHook>;

    fn create_tick_reporter(&self) -> Box<dyn TickReporter>;

    fn create_class_source_lookup(&self) -> Box<dyn ClassSourceLookup>;

    fn create_world_info_provider(&self) -> Box<dyn WorldInfoProvider>;

    fn platform_info(&self) -> PlatformInfo;

    fn create_command_sender(&self, source: CommandSource) -> Box<dyn CommandSender>;

    /// Installed host extensions, for diagnostic reporting.
    fn known_sources(&self) -> Vec<SourceMetadata>;
}

/// Descriptor identifying which threads the sampler should dump by default.
#[derive(Debug, Clone)]
pub struct ThreadDumper {
    threads: Vec<thread::Thread>,
}

impl ThreadDumper {
    /// A dumper targeting the calling thread.
    pub fn of_current_thread() -> Self {
        Self {
            threads: vec![thread::current()],
        }
    }

    pub fn threads(&self) -> &[thread::Thread] {
        &self.threads
    }
}

/// The stable contract the bridge presents to the profiling core.
pub trait ProfilerPlugin: Send + Sync {
    /// Bridge/adapter version string.
    fn version(&self) -> &str;

    /// Directory the profiler may use for its own files.
    fn plugin_directory(&self) -> &Path;

    /// Run a task off the host's primary thread, FIFO on a dedicated worker.
    fn execute_async(&self, task: Task);

    /// Default sampling target: the thread calling this method.
    fn default_thread_dumper(&self) -> ThreadDumper;

    /// The host capability factories.
    fn capabilities(&self) -> &dyn CapabilityProvider;
}

/// Handle to the external profiling core. Interface only; the sampling
/// engine and report builder live outside this crate.
pub trait ProfilerCore: Send + Sync {
    /// The flat command list to expose through the host command tree and
    /// permission registry.
    fn commands(&self) -> Vec<CommandSpec>;

    /// Tear down the core at the end of a session.
    fn disable(&self);
}

/// One-shot constructor for the profiling core, invoked during `enable()`
/// with the bridge's own [`ProfilerPlugin`] implementation.
pub type CoreFactory =
    Box<dyn FnOnce(Arc<dyn ProfilerPlugin>) -> anyhow::Result<Arc<dyn ProfilerCore>> + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_dumper_targets_the_calling_thread() {
        let dumper = ThreadDumper::of_current_thread();
        assert_eq!(dumper.threads().len(), 1);
        assert_eq!(dumper.threads()[0].id(), thread::current().id());
    }
}
