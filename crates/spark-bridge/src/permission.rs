//! Permission synchronization against the host permission registry.
//!
//! The host fires a permission-gather event carrying a mutable node
//! collection; [`PermissionRegistry::synchronize`] maps the profiling core's
//! command list onto qualified permission names and registers each exactly
//! once, reusing the host's existing handle when the event is delivered more
//! than once in a session (a known host quirk, tolerated as contract). The
//! registry is rebuilt whole on every pass and replaces the previous one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use spark_types::BridgeError;

use crate::host::{CommandSource, PermissionHandle, PermissionSink};

/// Reserved catch-all candidate registered alongside the per-command names.
pub const CATCH_ALL: &str = "all";

/// The host's highest built-in privilege level (the operator ceiling).
pub const HIGHEST_PRIVILEGE_LEVEL: u8 = 4;

/// Boolean-valued resolver attached to a permission node.
pub type PermissionResolver = Arc<dyn Fn(Option<&CommandSource>) -> bool + Send + Sync>;

/// The default resolver for newly-registered nodes: true when the principal
/// is the recognized singleplayer owner of the instance or holds the host's
/// highest privilege level; false otherwise, including for absent principals
/// (no console fallback is defined at this layer).
pub fn default_resolver() -> PermissionResolver {
    Arc::new(|source| match source {
        None => false,
        Some(source) => {
            source.singleplayer_owner || source.privilege_level >= HIGHEST_PRIVILEGE_LEVEL
        }
    })
}

/// One registered permission node.
#[derive(Clone)]
pub struct PermissionNode {
    /// Namespace-qualified name, e.g. `spark.all`.
    pub qualified_name: String,
    /// The host's handle for this node.
    pub handle: PermissionHandle,
    resolver: PermissionResolver,
}

impl PermissionNode {
    /// Evaluate the node's resolver for a (possibly absent) principal.
    pub fn check(&self, source: Option<&CommandSource>) -> bool {
        (self.resolver)(source)
    }
}

impl fmt::Debug for PermissionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionNode")
            .field("qualified_name", &self.qualified_name)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// Mapping from qualified permission name to registered node for one
/// enabled session. Mutated only by the synchronizer on the gather-event
/// thread; shared-read by command dispatch.
pub struct PermissionRegistry {
    namespace: String,
    nodes: HashMap<String, PermissionNode>,
}

impl PermissionRegistry {
    /// Run one synchronization pass against the host's gather event.
    ///
    /// Candidates are the given primary command aliases plus [`CATCH_ALL`],
    /// each qualified as `"<namespace>.<candidate>"`. Names the host already
    /// holds reuse the existing handle instead of registering a second node,
    /// since the host rejects duplicate names with a fatal error.
    pub fn synchronize(
        namespace: &str,
        primary_aliases: &[String],
        sink: &mut dyn PermissionSink,
    ) -> Self {
        let mut candidates: Vec<&str> = primary_aliases.iter().map(String::as_str).collect();
        candidates.push(CATCH_ALL);

        let mut nodes = HashMap::new();
        for candidate in candidates {
            let qualified = format!("{namespace}.{candidate}");
            if nodes.contains_key(&qualified) {
                continue;
            }

            let handle = match sink.already_registered(&qualified) {
                Some(existing) => {
                    debug!(
                        permission = %qualified,
                        "reusing node registered by an earlier gather pass"
                    );
                    existing
                }
                None => sink.add_node(&qualified, default_resolver()),
            };

            nodes.insert(
                qualified.clone(),
                PermissionNode {
                    qualified_name: qualified,
                    handle,
                    resolver: default_resolver(),
                },
            );
        }

        Self {
            namespace: namespace.to_string(),
            nodes,
        }
    }

    /// Look up a node by qualified name.
    ///
    /// The bare namespace name is rewritten to the catch-all entry (so
    /// `"spark"` resolves as `"spark.all"`).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::PermissionNotSynchronized`] if the resolved
    /// name is absent. That is an invariant violation (the gather pass has
    /// not run, or the registry is stale), not a transient host condition.
    pub fn resolve(&self, name: &str) -> Result<&PermissionNode, BridgeError> {
        let qualified = if name == self.namespace {
            format!("{}.{CATCH_ALL}", self.namespace)
        } else {
            name.to_string()
        };

        self.nodes
            .get(&qualified)
            .ok_or(BridgeError::PermissionNotSynchronized(qualified))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.nodes.contains_key(qualified_name)
    }

    /// All qualified names in the registry, sorted.
    pub fn qualified_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Sink that mimics the host: fatal on duplicate registration.
    #[derive(Default)]
    struct FakeSink {
        registered: HashMap<String, PermissionHandle>,
        next: u64,
    }

    impl PermissionSink for FakeSink {
        fn already_registered(&self, qualified_name: &str) -> Option<PermissionHandle> {
            self.registered.get(qualified_name).copied()
        }

        fn add_node(
            &mut self,
            qualified_name: &str,
            _resolver: PermissionResolver,
        ) -> PermissionHandle {
            assert!(
                !self.registered.contains_key(qualified_name),
                "duplicate permission node: {qualified_name}"
            );
            let handle = PermissionHandle::new(self.next);
            self.next += 1;
            self.registered.insert(qualified_name.to_string(), handle);
            handle
        }
    }

    fn player(singleplayer_owner: bool, privilege_level: u8) -> CommandSource {
        CommandSource {
            name: "Steve".into(),
            unique_id: Some(Uuid::new_v4()),
            singleplayer_owner,
            privilege_level,
        }
    }

    #[test]
    fn single_command_yields_command_and_catch_all_entries() {
        let mut sink = FakeSink::default();
        let registry = PermissionRegistry::synchronize("spark", &["spark".into()], &mut sink);

        assert_eq!(registry.qualified_names(), vec!["spark.all", "spark.spark"]);
    }

    #[test]
    fn second_gather_pass_reuses_existing_handles() {
        let mut sink = FakeSink::default();
        let first = PermissionRegistry::synchronize("spark", &["spark".into()], &mut sink);
        let first_all = first.resolve("spark.all").unwrap().handle;

        // Same sink again: everything is already registered host-side. The
        // FakeSink asserts no duplicate add_node call reaches the host.
        let second = PermissionRegistry::synchronize("spark", &["spark".into()], &mut sink);

        assert_eq!(second.len(), first.len());
        assert_eq!(second.resolve("spark.all").unwrap().handle, first_all);
    }

    #[test]
    fn bare_namespace_resolves_to_catch_all() {
        let mut sink = FakeSink::default();
        let registry = PermissionRegistry::synchronize("spark", &["spark".into()], &mut sink);

        let bare = registry.resolve("spark").unwrap();
        let qualified = registry.resolve("spark.all").unwrap();
        assert_eq!(bare.handle, qualified.handle);
        assert_eq!(bare.qualified_name, "spark.all");
    }

    #[test]
    fn unsynchronized_name_is_an_invariant_violation() {
        let mut sink = FakeSink::default();
        let registry = PermissionRegistry::synchronize("spark", &[], &mut sink);

        let err = registry.resolve("spark.profiler").unwrap_err();
        assert!(matches!(err, BridgeError::PermissionNotSynchronized(name) if name == "spark.profiler"));
    }

    #[test]
    fn default_resolver_requires_owner_or_operator() {
        let resolver = default_resolver();

        assert!(!resolver(None));
        assert!(!resolver(Some(&player(false, 0))));
        assert!(resolver(Some(&player(true, 0))));
        assert!(resolver(Some(&player(false, HIGHEST_PRIVILEGE_LEVEL))));
    }

    #[test]
    fn duplicate_primary_aliases_collapse_to_one_node() {
        let mut sink = FakeSink::default();
        let registry = PermissionRegistry::synchronize(
            "spark",
            &["tps".into(), "tps".into()],
            &mut sink,
        );

        assert_eq!(registry.qualified_names(), vec!["spark.all", "spark.tps"]);
    }
}
