//! Core types shared across the spark bridge crates.
//!
//! Defines the bridge error taxonomy, host platform descriptors, and the
//! diagnostic metadata types used for source reporting.

pub mod error;
pub mod platform;
pub mod source;

pub use error::BridgeError;
pub use platform::{PlatformInfo, PlatformKind, WorldSnapshot};
pub use source::SourceMetadata;
