//! In-memory host implementation.
//!
//! [`MemoryHost`] is a small, fully observable [`GraphHost`] used by the test
//! suite and by headless embeddings that want to drive a callback node
//! without a real graph engine. It stores attribute values in plain maps,
//! records warnings, counts undo suspension depth, and queues deferred tasks
//! for the caller to drain.
//!
//! Boolean plugs default to `true` when unset, mirroring the host-side
//! default of the enable attributes.

use super::{DeferredTask, GraphHost, NodeHandle, PlugPath, SubscriptionId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::warn;

/// What a subscription watches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    /// Attribute-change notifications
    AttrChanges,
    /// The pre-removal notification
    PreRemoval,
}

/// A registered subscription
#[derive(Debug, Clone, Copy)]
pub struct Watch {
    /// Watched node
    pub node: NodeHandle,
    /// Notification kind
    pub kind: WatchKind,
}

/// In-memory [`GraphHost`] for tests and headless use
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: HashMap<NodeHandle, String>,
    next_node: u32,
    bools: HashMap<String, bool>,
    strings: HashMap<String, String>,
    warnings: Vec<String>,
    undo_depth: u32,
    undo_suspensions: u32,
    deferred: VecDeque<DeferredTask>,
    watches: BTreeMap<SubscriptionId, Watch>,
    next_subscription: u64,
}

impl MemoryHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph and return its handle
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeHandle {
        let handle = NodeHandle(self.next_node);
        self.next_node += 1;
        self.nodes.insert(handle, name.into());
        handle
    }

    /// Remove a node from the graph.
    ///
    /// The caller is responsible for delivering the pre-removal notification
    /// to the node object first, as a real host would.
    pub fn remove_node(&mut self, node: NodeHandle) {
        self.nodes.remove(&node);
    }

    /// Write a boolean attribute value (scene edit)
    pub fn set_bool(&mut self, plug: &PlugPath, value: bool) {
        self.bools.insert(Self::key(plug), value);
    }

    /// Write a string attribute value (scene edit)
    pub fn set_string(&mut self, plug: &PlugPath, value: impl Into<String>) {
        self.strings.insert(Self::key(plug), value.into());
    }

    /// Warnings surfaced so far
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Discard recorded warnings
    pub fn clear_warnings(&mut self) {
        self.warnings.clear();
    }

    /// Drain the idle queue
    pub fn take_deferred(&mut self) -> Vec<DeferredTask> {
        self.deferred.drain(..).collect()
    }

    /// Number of tasks currently queued
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Number of live subscriptions
    pub fn active_watches(&self) -> usize {
        self.watches.len()
    }

    /// Number of live subscriptions targeting a node
    pub fn watches_on(&self, node: NodeHandle) -> usize {
        self.watches.values().filter(|w| w.node == node).count()
    }

    /// Whether a subscription id is still registered
    pub fn is_watched(&self, id: SubscriptionId) -> bool {
        self.watches.contains_key(&id)
    }

    /// Ids of the attribute-change subscriptions targeting a node.
    ///
    /// A driving embedding uses these to fan an attribute change out to every
    /// subscriber, the way a real host's message system would.
    pub fn attr_watch_ids(&self, node: NodeHandle) -> Vec<SubscriptionId> {
        self.watches
            .iter()
            .filter(|(_, w)| w.node == node && w.kind == WatchKind::AttrChanges)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Whether every undo suspension has been matched by a resume
    pub fn undo_balanced(&self) -> bool {
        self.undo_depth == 0
    }

    /// Total number of undo suspensions performed
    pub fn undo_suspensions(&self) -> u32 {
        self.undo_suspensions
    }

    // Keys are node-index qualified so renames cannot alias values.
    fn key(plug: &PlugPath) -> String {
        format!("{}#{}", plug.node.0, plug.attr_path())
    }
}

impl GraphHost for MemoryHost {
    fn node_name(&self, node: NodeHandle) -> String {
        self.nodes
            .get(&node)
            .cloned()
            .unwrap_or_else(|| format!("<deleted:{}>", node.0))
    }

    fn plug_exists(&self, plug: &PlugPath) -> bool {
        self.nodes.contains_key(&plug.node)
    }

    fn bool_value(&self, plug: &PlugPath) -> bool {
        self.bools.get(&Self::key(plug)).copied().unwrap_or(true)
    }

    fn string_value(&self, plug: &PlugPath) -> Option<String> {
        self.strings.get(&Self::key(plug)).cloned()
    }

    fn set_string_value(&mut self, plug: &PlugPath, value: &str) {
        self.strings.insert(Self::key(plug), value.to_string());
    }

    fn warn(&mut self, message: &str) {
        warn!(target: "callback_node", "{}", message);
        self.warnings.push(message.to_string());
    }

    fn suspend_undo(&mut self) {
        self.undo_depth += 1;
        self.undo_suspensions += 1;
    }

    fn resume_undo(&mut self) {
        self.undo_depth = self.undo_depth.saturating_sub(1);
    }

    fn defer(&mut self, task: DeferredTask) {
        self.deferred.push_back(task);
    }

    fn watch_attr_changes(&mut self, node: NodeHandle) -> SubscriptionId {
        self.register(node, WatchKind::AttrChanges)
    }

    fn watch_pre_removal(&mut self, node: NodeHandle) -> SubscriptionId {
        self.register(node, WatchKind::PreRemoval)
    }

    fn unwatch(&mut self, id: SubscriptionId) {
        self.watches.remove(&id);
    }
}

impl MemoryHost {
    fn register(&mut self, node: NodeHandle, kind: WatchKind) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.watches.insert(id, Watch { node, kind });
        id
    }
}
