//! Metadata about installed host extensions (mods, plugins).
//!
//! The profiling core tags sampled call frames with the extension they came
//! from; `SourceMetadata` is the per-extension record the bridge hands over
//! for that mapping.

use serde::{Deserialize, Serialize};

/// One installed host extension, for diagnostic reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Stable extension identifier.
    pub id: String,
    /// Version string as the host reports it.
    pub version: String,
    /// Author, where the host metadata carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Human-readable description.
    pub description: String,
}

impl SourceMetadata {
    /// Project an arbitrary host extension list into `SourceMetadata` records.
    ///
    /// Each accessor pulls one field out of the host's native extension type,
    /// so concrete adapters only supply four closures instead of building the
    /// records by hand.
    pub fn gather<T, I>(
        items: I,
        id: impl Fn(&T) -> String,
        version: impl Fn(&T) -> String,
        author: impl Fn(&T) -> Option<String>,
        description: impl Fn(&T) -> String,
    ) -> Vec<SourceMetadata>
    where
        I: IntoIterator<Item = T>,
    {
        items
            .into_iter()
            .map(|item| SourceMetadata {
                id: id(&item),
                version: version(&item),
                author: author(&item),
                description: description(&item),
            })
            .collect()
    }
}
