//! The callback node.
//!
//! [`CallbackNode`] is one live object per graph node of this type. It
//! composes three capabilities instead of inheriting them: the script
//! resolver ([`ScriptHost`]), sync dispatch state and listen dispatch state,
//! with the event router as the single dispatch surface.
//!
//! # Lifecycle
//!
//! The node registers its own attribute-change and pre-removal subscriptions
//! immediately after construction and releases every owned subscription
//! (including listen-slot peer subscriptions) exactly once when
//! [`CallbackNode::on_pre_removal`] fires. A host delivering events after
//! removal finds no live subscription, so no callback can reach a
//! half-destroyed node.

mod listen;
mod router;
mod slots;
mod sync;

pub use slots::{ListenSlot, SyncSlot};

use crate::config::CallbackConfig;
use crate::host::{DeferredTask, GraphHost, NodeHandle, SubscriptionId};
use crate::scripting::ScriptHost;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A scripted callback node bound to one host graph node
#[derive(Debug)]
pub struct CallbackNode {
    /// Handle of the owning graph node
    handle: NodeHandle,
    /// Script resolver and invoker
    scripts: ScriptHost,
    /// Subscriptions registered on the node itself, released on removal
    subscriptions: Vec<SubscriptionId>,
    /// Transient flag: a connection was made during the current event.
    /// Consumed one-shot by the paired dirty-propagation call.
    connection_made: bool,
    /// Transient flag: a connection was broken during the current event
    connection_broken: bool,
    /// Sync-group slots by logical index
    sync_slots: BTreeMap<u32, SyncSlot>,
    /// Listen-group slots by logical index
    listen_slots: BTreeMap<u32, ListenSlot>,
    /// Sync slots with a deferred re-run already queued. Per-slot gating so
    /// one slot's trigger cannot suppress another slot's convergence pass.
    pending_resync: BTreeSet<u32>,
}

impl CallbackNode {
    /// Create the node object and register its own subscriptions
    pub fn new(handle: NodeHandle, config: CallbackConfig, host: &mut dyn GraphHost) -> Self {
        let mut node = Self {
            handle,
            scripts: ScriptHost::new(&config),
            subscriptions: Vec::new(),
            connection_made: false,
            connection_broken: false,
            sync_slots: BTreeMap::new(),
            listen_slots: BTreeMap::new(),
            pending_resync: BTreeSet::new(),
        };
        node.subscriptions.push(host.watch_attr_changes(handle));
        node.subscriptions.push(host.watch_pre_removal(handle));
        debug!(target: "callback_node", node = %host.node_name(handle), "callback node constructed");
        node
    }

    /// Handle of the owning graph node
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Sync slot state, if the slot has any derived state yet
    pub fn sync_slot(&self, slot: u32) -> Option<&SyncSlot> {
        self.sync_slots.get(&slot)
    }

    /// Listen slot state, if the slot has any derived state yet
    pub fn listen_slot(&self, slot: u32) -> Option<&ListenSlot> {
        self.listen_slots.get(&slot)
    }

    /// Number of sync slots holding derived state
    pub fn sync_slot_count(&self) -> usize {
        self.sync_slots.len()
    }

    /// Number of listen slots holding derived state
    pub fn listen_slot_count(&self) -> usize {
        self.listen_slots.len()
    }

    /// Whether a deferred re-run is queued for the slot
    pub fn resync_pending(&self, slot: u32) -> bool {
        self.pending_resync.contains(&slot)
    }

    /// Take all messages callback scripts emitted through `log()`
    pub fn drain_script_log(&self) -> Vec<String> {
        self.scripts.drain_log()
    }

    /// Pre-removal notification: release every owned subscription.
    ///
    /// Idempotent; ids are drained so a second delivery releases nothing.
    pub fn on_pre_removal(&mut self, host: &mut dyn GraphHost) {
        for id in self.subscriptions.drain(..) {
            host.unwatch(id);
        }
        for slot in self.listen_slots.values_mut() {
            for (_, id) in std::mem::take(&mut slot.subscriptions) {
                host.unwatch(id);
            }
        }
        debug!(target: "callback_node", node = %self.handle, "subscriptions released");
    }

    /// Run one task the host dequeued from its idle queue
    pub fn run_deferred(&mut self, host: &mut dyn GraphHost, task: DeferredTask) {
        match task {
            DeferredTask::Resync {
                slot,
                plug,
                payload,
                ..
            } => self.run_deferred_resync(host, slot, &plug, &payload),
        }
    }
}
