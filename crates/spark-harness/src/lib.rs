//! In-memory host runtime for exercising the spark bridge.
//!
//! This crate stands in for a real game-server host in tests: it implements
//! the bridge's host contract with recording doubles so tests can observe
//! exactly what the bridge did to the "host".
//!
//! - [`InMemoryDispatcher`]: command tree with redirect-following `invoke`
//! - [`InMemoryEventBus`]: subscription registry that counts unsubscribe
//!   batches and fires callbacks outside its own lock (so a stop handler
//!   may re-enter `unsubscribe_all`)
//! - [`GatherEvent`]: permission sink that panics on duplicate
//!   registration, the way real hosts fail fatally
//! - [`StubProvider`]: no-op capability provider with a shared message log
//! - [`RecordingCore`]: profiling-core double that counts teardowns

pub mod core;
pub mod host;
pub mod provider;

pub use crate::core::{core_factory, RecordingCore};
pub use host::{GatherEvent, InMemoryDispatcher, InMemoryEventBus};
pub use provider::StubProvider;
