//! Profiling-core double.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use spark_bridge::command::CommandSpec;
use spark_bridge::provider::{CoreFactory, ProfilerCore};

/// Stand-in for the external profiling core: serves a fixed command list
/// and counts how many times the bridge tears it down.
pub struct RecordingCore {
    specs: Vec<CommandSpec>,
    disable_calls: AtomicUsize,
}

impl RecordingCore {
    pub fn new(specs: Vec<CommandSpec>) -> Arc<Self> {
        Arc::new(Self {
            specs,
            disable_calls: AtomicUsize::new(0),
        })
    }

    pub fn disable_calls(&self) -> usize {
        self.disable_calls.load(Ordering::SeqCst)
    }
}

impl ProfilerCore for RecordingCore {
    fn commands(&self) -> Vec<CommandSpec> {
        self.specs.clone()
    }

    fn disable(&self) {
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// A [`CoreFactory`] that hands the bridge an existing [`RecordingCore`].
pub fn core_factory(core: Arc<RecordingCore>) -> CoreFactory {
    Box::new(move |_plugin| {
        let core: Arc<dyn ProfilerCore> = core;
        Ok(core)
    })
}
