//! Per-slot derived state.
//!
//! One slot is one element of a repeated attribute group. Slot structs hold
//! only derived, in-memory state (resolved modules, connected peer names,
//! peer subscriptions); enable flags and script text live in the host's
//! attribute storage and are read on demand. After scene load the host
//! replays connection and set events, which rebuilds these structs.

use crate::host::{NodeHandle, SubscriptionId};
use crate::scripting::CompiledModule;
use std::collections::BTreeMap;

/// Derived state of one sync-group element.
///
/// Peer maps are keyed by the logical element index of the owning array
/// plug; iteration order therefore matches the ascending-index ordering the
/// callback payload promises.
#[derive(Debug, Default)]
pub struct SyncSlot {
    /// Resolved script module, if any
    pub(crate) module: Option<CompiledModule>,
    /// Connected input peers, element index to peer plug name
    pub(crate) inputs: BTreeMap<u32, String>,
    /// Connected output peers, element index to peer plug name
    pub(crate) outputs: BTreeMap<u32, String>,
}

impl SyncSlot {
    /// The resolved module, if resolution has succeeded at least once
    pub fn module(&self) -> Option<&CompiledModule> {
        self.module.as_ref()
    }

    /// Connected input peer names in ascending element-index order
    pub fn input_names(&self) -> Vec<String> {
        self.inputs.values().cloned().collect()
    }

    /// Connected output peer names in ascending element-index order
    pub fn output_names(&self) -> Vec<String> {
        self.outputs.values().cloned().collect()
    }
}

/// Derived state of one listen-group element.
#[derive(Debug, Default)]
pub struct ListenSlot {
    /// Resolved script module, if any
    pub(crate) module: Option<CompiledModule>,
    /// Connected input peers, element index to peer plug name
    pub(crate) peers: BTreeMap<u32, String>,
    /// One attribute-change subscription per listened peer node.
    ///
    /// The key set doubles as the listened-peer set used to reject duplicate
    /// connections of the same peer.
    pub(crate) subscriptions: BTreeMap<NodeHandle, SubscriptionId>,
}

impl ListenSlot {
    /// The resolved module, if resolution has succeeded at least once
    pub fn module(&self) -> Option<&CompiledModule> {
        self.module.as_ref()
    }

    /// Whether a subscription is registered for this peer node
    pub fn is_listening_to(&self, peer: NodeHandle) -> bool {
        self.subscriptions.contains_key(&peer)
    }

    /// Number of active peer subscriptions
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}
