//! Scenario builder driving a [`CallbackNode`] the way a host graph would.
//!
//! Every mutation helper delivers the same notification sequence a real host
//! produces: connection edits raise an attribute-change event on the node's
//! plug followed by a dirty-propagation call on that plug; upstream value
//! changes raise the dirty-propagation call alone.

use callback_node_rs::{
    Attr, AttrChangedEvent, AttrMessage, CallbackConfig, CallbackNode, MemoryHost, NodeHandle,
    PeerAttrEvent, PeerPlug, PlugPath,
};

/// One callback node wired to an in-memory host
pub struct Scenario {
    pub host: MemoryHost,
    pub node: CallbackNode,
}

impl Scenario {
    /// A host with a single callback node named `cbnode1`
    pub fn new() -> Self {
        super::init_tracing();
        let mut host = MemoryHost::new();
        let handle = host.add_node("cbnode1");
        let node = CallbackNode::new(handle, CallbackConfig::default(), &mut host);
        Scenario { host, node }
    }

    pub fn handle(&self) -> NodeHandle {
        self.node.handle()
    }

    /// Add an unrelated node to the graph
    pub fn add_peer(&mut self, name: &str) -> NodeHandle {
        self.host.add_node(name)
    }

    /// Set a sync slot's script attribute and deliver the change event
    pub fn set_sync_script(&mut self, slot: u32, script: &str) {
        self.set_script_attr(PlugPath::child(self.handle(), Attr::Script, slot), script);
    }

    /// Set a listen slot's script attribute and deliver the change event
    pub fn set_listen_script(&mut self, slot: u32, script: &str) {
        self.set_script_attr(
            PlugPath::child(self.handle(), Attr::ListenScript, slot),
            script,
        );
    }

    fn set_script_attr(&mut self, plug: PlugPath, script: &str) {
        self.host.set_string(&plug, script);
        self.node.on_attr_changed(
            &mut self.host,
            &AttrChangedEvent {
                message: AttrMessage::SET,
                plug,
                other_plug: None,
            },
        );
    }

    /// Connect a peer plug to a sync input port
    pub fn connect_sync_input(&mut self, slot: u32, element: u32, peer: NodeHandle, name: &str) {
        let plug = PlugPath::array_element(self.handle(), Attr::Inputs, slot, element);
        self.connect(plug, peer, name);
    }

    /// Connect a peer plug to a sync output port
    pub fn connect_sync_output(&mut self, slot: u32, element: u32, peer: NodeHandle, name: &str) {
        let plug = PlugPath::array_element(self.handle(), Attr::Outputs, slot, element);
        self.connect(plug, peer, name);
    }

    /// Connect a peer plug to a listen input port
    pub fn connect_listen_input(&mut self, slot: u32, element: u32, peer: NodeHandle, name: &str) {
        let plug = PlugPath::array_element(self.handle(), Attr::ListenInputs, slot, element);
        self.connect(plug, peer, name);
    }

    /// Break the connection on a sync input port
    pub fn disconnect_sync_input(&mut self, slot: u32, element: u32, peer: NodeHandle, name: &str) {
        let plug = PlugPath::array_element(self.handle(), Attr::Inputs, slot, element);
        self.disconnect(plug, peer, name);
    }

    /// Break the connection on a listen input port
    pub fn disconnect_listen_input(
        &mut self,
        slot: u32,
        element: u32,
        peer: NodeHandle,
        name: &str,
    ) {
        let plug = PlugPath::array_element(self.handle(), Attr::ListenInputs, slot, element);
        self.disconnect(plug, peer, name);
    }

    fn connect(&mut self, plug: PlugPath, peer: NodeHandle, name: &str) {
        self.node.on_attr_changed(
            &mut self.host,
            &AttrChangedEvent {
                message: AttrMessage::CONNECTION_MADE,
                plug: plug.clone(),
                other_plug: Some(PeerPlug::new(peer, name)),
            },
        );
        self.node.on_dependents_dirty(&mut self.host, &plug);
    }

    fn disconnect(&mut self, plug: PlugPath, peer: NodeHandle, name: &str) {
        self.node.on_attr_changed(
            &mut self.host,
            &AttrChangedEvent {
                message: AttrMessage::CONNECTION_BROKEN,
                plug: plug.clone(),
                other_plug: Some(PeerPlug::new(peer, name)),
            },
        );
        self.node.on_dependents_dirty(&mut self.host, &plug);
    }

    /// Upstream value change propagating into a sync input port
    pub fn touch_sync_input(&mut self, slot: u32, element: u32) {
        let plug = PlugPath::array_element(self.handle(), Attr::Inputs, slot, element);
        self.node.on_dependents_dirty(&mut self.host, &plug);
    }

    /// Attribute change on a watched peer node, fanned out to every
    /// attribute-change subscription targeting it
    pub fn peer_attr_set(&mut self, peer: NodeHandle, plug_name: &str) {
        for subscription in self.host.attr_watch_ids(peer) {
            self.node.on_peer_attr_changed(
                &mut self.host,
                &PeerAttrEvent {
                    subscription,
                    message: AttrMessage::SET,
                    plug_name: plug_name.to_string(),
                    other_plug_name: None,
                },
            );
        }
    }

    /// Drain the host's idle queue and run each task
    pub fn run_idle(&mut self) -> usize {
        let tasks = self.host.take_deferred();
        let count = tasks.len();
        for task in tasks {
            self.node.run_deferred(&mut self.host, task);
        }
        count
    }

    /// Messages the callback scripts emitted through `log()`
    pub fn script_log(&mut self) -> Vec<String> {
        self.node.drain_script_log()
    }

    /// Warnings the host surfaced so far
    pub fn warnings(&self) -> Vec<String> {
        self.host.warnings().to_vec()
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}
