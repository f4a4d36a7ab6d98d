//! Listen dispatcher.
//!
//! Listen slots react to attribute changes on *other* nodes: connecting a
//! peer to a listen slot's input port registers a peer-scoped
//! attribute-change subscription with the host, so changes on the externally
//! owned node re-trigger this node's listen callback.
//!
//! Each slot keeps one subscription per listened peer node. Connecting the
//! same peer twice without disconnecting is rejected with a warning and no
//! state change, so subscriptions can never silently stack.

use super::CallbackNode;
use crate::host::{Attr, GraphHost, PeerAttrEvent, PeerPlug, PlugPath};
use tracing::{debug, trace};

impl CallbackNode {
    /// Connection made on a listen slot's input port
    pub(super) fn listen_connect(
        &mut self,
        host: &mut dyn GraphHost,
        plug: &PlugPath,
        peer: &PeerPlug,
    ) {
        let (Some(slot), Some(element)) = (plug.slot, plug.element) else {
            return;
        };
        let state = self.listen_slots.entry(slot).or_default();
        if state.subscriptions.contains_key(&peer.node) {
            let plug_name = host.plug_name(plug);
            host.warn(&format!(
                "`{}` already listening to `{}`",
                plug_name,
                host.node_name(peer.node)
            ));
            return;
        }

        let id = host.watch_attr_changes(peer.node);
        state.subscriptions.insert(peer.node, id);
        state.peers.insert(element, peer.name.clone());
        debug!(
            target: "callback_node",
            slot,
            peer = %peer.name,
            subscription = id.0,
            "listen subscription registered"
        );
    }

    /// Connection broken on a listen slot's input port
    pub(super) fn listen_disconnect(
        &mut self,
        host: &mut dyn GraphHost,
        plug: &PlugPath,
        peer: &PeerPlug,
    ) {
        let (Some(slot), Some(element)) = (plug.slot, plug.element) else {
            return;
        };
        let Some(state) = self.listen_slots.get_mut(&slot) else {
            return;
        };
        // Only the element that was accepted at connect time has a registry
        // entry; a rejected duplicate element never owned the subscription,
        // so its wire breaking must not release it.
        if state.peers.remove(&element).is_none() {
            return;
        }
        if let Some(id) = state.subscriptions.remove(&peer.node) {
            host.unwatch(id);
            debug!(
                target: "callback_node",
                slot,
                peer = %peer.name,
                subscription = id.0,
                "listen subscription released"
            );
        }
    }

    /// Attribute change delivered for a watched peer node.
    ///
    /// Readiness failures here always warn; there is no call-type gating on
    /// the listen path.
    pub fn on_peer_attr_changed(&mut self, host: &mut dyn GraphHost, event: &PeerAttrEvent) {
        let Some(slot) = self.listen_slots.iter().find_map(|(slot, state)| {
            state
                .subscriptions
                .values()
                .any(|id| *id == event.subscription)
                .then_some(*slot)
        }) else {
            trace!(
                target: "callback_node",
                subscription = event.subscription.0,
                "peer event for unknown subscription ignored"
            );
            return;
        };

        let node = self.handle();
        let enable = PlugPath::child(node, Attr::ListenEnable, slot);
        let script_name = host.plug_name(&PlugPath::child(node, Attr::ListenScript, slot));
        if !host.bool_value(&enable) {
            let name = host.plug_name(&enable);
            host.warn(&format!("`{}` is off", name));
            return;
        }
        let Some(module) = self
            .listen_slots
            .get(&slot)
            .and_then(|s| s.module.as_ref())
        else {
            host.warn(&format!("`{}` not valid", script_name));
            return;
        };
        if !module.has_function(self.scripts.entry_point()) {
            host.warn(&format!(
                "`{}` -> `{}` method not exists",
                script_name,
                self.scripts.entry_point()
            ));
            return;
        }

        let node_name = host.node_name(node);
        host.suspend_undo();
        let result = self.scripts.invoke_listen(
            module,
            &node_name,
            event.message.bits(),
            &event.plug_name,
            event.other_plug_name.as_deref(),
        );
        host.resume_undo();
        match result {
            Ok(()) => debug!(target: "callback_node", slot, "listen callback invoked"),
            Err(err) => host.warn(&format!("`{}` callback failed: {}", node_name, err)),
        }
    }
}
