//! Command-tree construction with alias redirection.
//!
//! The profiling core supplies a flat list of [`CommandSpec`]s; the bridge
//! turns them into host-native command nodes. The first alias becomes an
//! executable literal node that also accepts one greedy trailing-argument
//! form; every further alias becomes a redirect to that node, so host-side
//! alias resolution behaves identically to the primary name, argument
//! parsing included.

use std::sync::Arc;

use crate::host::{CommandDispatcher, CommandNode, CommandSource};

/// Opaque executor the profiling core attaches to a command.
///
/// Errors propagate unchanged through the dispatcher to the host's command
/// feedback channel; the bridge adds no translation.
pub type CommandExecutor = Arc<dyn Fn(&CommandContext) -> anyhow::Result<()> + Send + Sync>;

/// Context handed to a command executor.
#[derive(Clone)]
pub struct CommandContext {
    /// The principal that invoked the command.
    pub source: CommandSource,
    /// Raw trailing argument line after the command name. Empty for the
    /// zero-argument form. The bridge does not interpret it.
    pub input: String,
}

/// One command the profiling core wants registered.
///
/// Aliases are ordered; the first is the primary name. Aliases must be
/// unique within one registration pass.
#[derive(Clone)]
pub struct CommandSpec {
    pub aliases: Vec<String>,
    pub executor: CommandExecutor,
}

impl CommandSpec {
    pub fn new<I, S, F>(aliases: I, executor: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&CommandContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            executor: Arc::new(executor),
        }
    }

    /// The primary name, or `None` for an (ignored) zero-alias spec.
    pub fn primary_alias(&self) -> Option<&str> {
        self.aliases.first().map(String::as_str)
    }
}

/// Register all specs with the host dispatcher in a single pass.
///
/// Specs with zero aliases are skipped. Registration is append-only; a
/// failure part-way leaves earlier nodes in place (the host tree is
/// idempotent per name, so a repeat pass converges).
pub fn build_tree(dispatcher: &mut dyn CommandDispatcher, specs: &[CommandSpec]) {
    for spec in specs {
        let Some((primary, aliases)) = spec.aliases.split_first() else {
            continue;
        };

        let node = dispatcher.register(CommandNode::executable(primary, spec.executor.clone()));
        for alias in aliases {
            dispatcher.register(CommandNode::redirect(alias, node));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CommandNodeKind, NodeId};

    /// Minimal dispatcher that records what was registered.
    #[derive(Default)]
    struct RecordingDispatcher {
        nodes: Vec<CommandNode>,
    }

    impl CommandDispatcher for RecordingDispatcher {
        fn register(&mut self, node: CommandNode) -> NodeId {
            let id = NodeId::new(self.nodes.len() as u64);
            self.nodes.push(node);
            id
        }
    }

    fn noop_spec(aliases: &[&str]) -> CommandSpec {
        CommandSpec::new(aliases.iter().copied(), |_ctx| Ok(()))
    }

    #[test]
    fn primary_is_executable_and_aliases_redirect() {
        let mut dispatcher = RecordingDispatcher::default();
        build_tree(&mut dispatcher, &[noop_spec(&["spark", "sp", "profiler"])]);

        assert_eq!(dispatcher.nodes.len(), 3);
        assert_eq!(dispatcher.nodes[0].literal, "spark");
        assert!(matches!(
            dispatcher.nodes[0].kind,
            CommandNodeKind::Executable { greedy_args: true, .. }
        ));
        for (node, literal) in dispatcher.nodes[1..].iter().zip(["sp", "profiler"]) {
            assert_eq!(node.literal, literal);
            assert!(matches!(node.kind, CommandNodeKind::Redirect(target) if target.raw() == 0));
        }
    }

    #[test]
    fn zero_alias_spec_is_skipped() {
        let mut dispatcher = RecordingDispatcher::default();
        build_tree(
            &mut dispatcher,
            &[noop_spec(&[]), noop_spec(&["health"])],
        );

        assert_eq!(dispatcher.nodes.len(), 1);
        assert_eq!(dispatcher.nodes[0].literal, "health");
    }

    #[test]
    fn one_executable_node_per_primary_alias() {
        let mut dispatcher = RecordingDispatcher::default();
        build_tree(
            &mut dispatcher,
            &[noop_spec(&["spark", "sp"]), noop_spec(&["tps"])],
        );

        let executable: Vec<&str> = dispatcher
            .nodes
            .iter()
            .filter(|n| matches!(n.kind, CommandNodeKind::Executable { .. }))
            .map(|n| n.literal.as_str())
            .collect();
        assert_eq!(executable, vec!["spark", "tps"]);
    }
}
