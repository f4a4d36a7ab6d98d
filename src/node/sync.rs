//! Sync dispatcher.
//!
//! Evaluates one sync slot: checks the readiness gates in order, builds the
//! callback payload from the connected peers, invokes the entry point with
//! undo recording suspended, and schedules a single deferred re-run.
//!
//! The deferred pass exists because the host's own propagation of a
//! just-written value to dependent plugs may lag one evaluation pass behind
//! the callback's effect; re-invoking once on the next idle tick guarantees
//! convergence. The per-slot pending flag bounds that to one outstanding
//! re-run even when the callback itself dirties further plugs.

use super::CallbackNode;
use crate::host::{Attr, DeferredTask, GraphHost, PlugPath};
use crate::scripting::{CallType, CompiledModule, SyncPayload};
use tracing::{debug, trace};

impl CallbackNode {
    /// Evaluate one sync slot for the given call type.
    ///
    /// Readiness failures skip execution; they are warned about only for
    /// plain `eval` passes so bulk connection rebuilding stays quiet.
    pub(super) fn eval_sync_slot(
        &mut self,
        host: &mut dyn GraphHost,
        slot: u32,
        call_type: CallType,
        trigger: &PlugPath,
    ) {
        let is_eval = call_type == CallType::Eval;
        let node = self.handle();

        let enable = PlugPath::child(node, Attr::Enable, slot);
        if !host.bool_value(&enable) {
            if is_eval {
                let name = host.plug_name(&enable);
                host.warn(&format!("`{}` is off", name));
            }
            return;
        }

        let script_name = host.plug_name(&PlugPath::child(node, Attr::Script, slot));
        let Some(state) = self.sync_slots.get(&slot) else {
            if is_eval {
                host.warn(&format!("`{}` not valid", script_name));
            }
            return;
        };
        let Some(module) = state.module.as_ref() else {
            if is_eval {
                host.warn(&format!("`{}` not valid", script_name));
            }
            return;
        };
        if !module.has_function(self.scripts.entry_point()) {
            if is_eval {
                host.warn(&format!(
                    "`{}` -> `{}` method not exists",
                    script_name,
                    self.scripts.entry_point()
                ));
            }
            return;
        }
        if state.inputs.is_empty() {
            if is_eval {
                let name = host.plug_name(&PlugPath::child(node, Attr::Inputs, slot));
                host.warn(&format!("`{}` is empty", name));
            }
            return;
        }
        if state.outputs.is_empty() {
            if is_eval {
                let name = host.plug_name(&PlugPath::child(node, Attr::Outputs, slot));
                host.warn(&format!("`{}` is empty", name));
            }
            return;
        }
        let payload = SyncPayload {
            inputs: state.input_names(),
            outputs: state.output_names(),
            call_type,
        };

        trace!(target: "callback_node", slot, %call_type, "sync slot evaluating");
        self.call_entry_point(host, module, slot, &payload);

        // At most one outstanding re-run per slot.
        if self.pending_resync.insert(slot) {
            host.defer(DeferredTask::Resync {
                node,
                slot,
                plug: trigger.clone(),
                payload,
            });
        }
    }

    /// Deferred convergence pass scheduled by `eval_sync_slot`
    pub(super) fn run_deferred_resync(
        &mut self,
        host: &mut dyn GraphHost,
        slot: u32,
        plug: &PlugPath,
        payload: &SyncPayload,
    ) {
        // The node (or plug) may have been deleted before the idle tick.
        if host.plug_exists(plug) {
            if let Some(module) = self.sync_slots.get(&slot).and_then(|s| s.module.as_ref()) {
                trace!(target: "callback_node", slot, "deferred resync running");
                self.call_entry_point(host, module, slot, payload);
            }
        }
        self.pending_resync.remove(&slot);
    }

    /// Invoke the slot's entry point with undo recording suspended.
    ///
    /// Script runtime errors degrade to a warning; the callback simply did
    /// not run this pass.
    fn call_entry_point(
        &self,
        host: &mut dyn GraphHost,
        module: &CompiledModule,
        slot: u32,
        payload: &SyncPayload,
    ) {
        let node_name = host.node_name(self.handle());
        host.suspend_undo();
        let result = self.scripts.invoke_sync(module, &node_name, payload);
        host.resume_undo();
        match result {
            Ok(()) => debug!(target: "callback_node", slot, "sync callback invoked"),
            Err(err) => host.warn(&format!("`{}` callback failed: {}", node_name, err)),
        }
    }
}
