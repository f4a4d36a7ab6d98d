//! Event router.
//!
//! The single entry point for host-delivered notifications. Per-event state
//! is implicit: the router classifies each event by attribute role and
//! delegates to the script resolver, slot registry, sync dispatcher or listen
//! dispatcher.
//!
//! The transient connection flags set in [`CallbackNode::on_attr_changed`]
//! are consumed by the dirty-propagation call the host issues as a paired
//! step, then cleared one-shot. That coupling across two separate host
//! callbacks is load-bearing: the dirty handler cannot otherwise tell a plain
//! value change from connection churn.

use super::CallbackNode;
use crate::host::{Attr, AttrChangedEvent, AttrMessage, GraphHost, PeerPlug, PlugPath};
use crate::scripting::{CallType, ScriptRole};
use tracing::{debug, trace, warn};

impl CallbackNode {
    /// Attribute-change notification for one of the node's own plugs
    pub fn on_attr_changed(&mut self, host: &mut dyn GraphHost, event: &AttrChangedEvent) {
        self.connection_made = event.message.contains(AttrMessage::CONNECTION_MADE);
        self.connection_broken = event.message.contains(AttrMessage::CONNECTION_BROKEN);

        let plug = &event.plug;
        trace!(
            target: "callback_node",
            plug = %host.plug_name(plug),
            message = event.message.bits(),
            "attr changed"
        );

        if event.message.contains(AttrMessage::SET) {
            match plug.attr {
                Attr::Script => self.on_script_changed(host, plug, ScriptRole::Sync),
                Attr::ListenScript => self.on_script_changed(host, plug, ScriptRole::Listen),
                _ => {}
            }
        } else if self.connection_made || self.connection_broken {
            match plug.attr {
                Attr::Inputs | Attr::Outputs => {
                    self.on_sync_port_changed(plug, event.other_plug.as_ref())
                }
                Attr::ListenInputs => {
                    if let Some(peer) = event.other_plug.as_ref() {
                        if self.connection_made {
                            self.listen_connect(host, plug, peer);
                        } else {
                            self.listen_disconnect(host, plug, peer);
                        }
                    }
                }
                _ => {}
            }
        } else if event.message.contains(AttrMessage::ARRAY_ADDED)
            && plug.attr == Attr::ListenGroup
        {
            // New listen slots get a human-readable default label.
            if let Some(index) = plug.slot {
                let title = PlugPath::child(plug.node, Attr::ListenTitle, index);
                host.set_string_value(&title, &format!("Listen Group {}", index));
            }
        }
    }

    /// Dirty-propagation notification for a downstream plug.
    ///
    /// Structural attributes never trigger a sync evaluation; outputs are
    /// exempted from the filter only while a connection was just made, so a
    /// fresh output connection still produces a `make_connection` pass.
    pub fn on_dependents_dirty(&mut self, host: &mut dyn GraphHost, plug: &PlugPath) {
        let mut filter_outputs = true;
        let mut call_type = CallType::Eval;
        if self.connection_made {
            call_type = CallType::MakeConnection;
            self.connection_made = false;
            filter_outputs = false;
        }
        if self.connection_broken {
            call_type = CallType::BrokeConnection;
            self.connection_broken = false;
        }

        match plug.attr {
            Attr::Enable
            | Attr::Script
            | Attr::ListenEnable
            | Attr::ListenScript
            | Attr::ListenTitle
            | Attr::ListenInputs => return,
            Attr::Outputs if filter_outputs => return,
            _ => {}
        }

        if matches!(plug.attr, Attr::Inputs | Attr::Outputs) {
            if let (Some(slot), Some(_)) = (plug.slot, plug.element) {
                self.eval_sync_slot(host, slot, call_type, plug);
            }
        }
    }

    /// Resolve a changed script attribute into its slot's module cache.
    ///
    /// Empty text is a no-op and resolution failure keeps the previous
    /// module: scripts degrade to last known good.
    fn on_script_changed(&mut self, host: &mut dyn GraphHost, plug: &PlugPath, role: ScriptRole) {
        let Some(slot) = plug.slot else { return };
        let Some(script) = host.string_value(plug) else {
            return;
        };
        if script.is_empty() {
            return;
        }

        let module_name = format!("__CallbackCache[{}]__", slot);
        match self.scripts.resolve(&module_name, &script) {
            Ok(module) => {
                debug!(
                    target: "callback_node",
                    plug = %host.plug_name(plug),
                    module = module.name(),
                    "script resolved"
                );
                match role {
                    ScriptRole::Sync => {
                        self.sync_slots.entry(slot).or_default().module = Some(module)
                    }
                    ScriptRole::Listen => {
                        self.listen_slots.entry(slot).or_default().module = Some(module)
                    }
                }
            }
            Err(err) => {
                warn!(target: "callback_node", plug = %host.plug_name(plug), %err, "script resolution failed");
                host.warn(&format!("`{}` not valid: {}", host.plug_name(plug), err));
            }
        }
    }

    /// Registry update for sync input/output port connections
    fn on_sync_port_changed(&mut self, plug: &PlugPath, other: Option<&PeerPlug>) {
        let (Some(slot), Some(element)) = (plug.slot, plug.element) else {
            return;
        };
        let state = self.sync_slots.entry(slot).or_default();
        let ports = match plug.attr {
            Attr::Inputs => &mut state.inputs,
            Attr::Outputs => &mut state.outputs,
            _ => return,
        };
        if self.connection_made {
            if let Some(peer) = other {
                ports.insert(element, peer.name.clone());
            }
        } else if self.connection_broken {
            ports.remove(&element);
        }
    }
}
