//! # callback-node-rs: Scripted Graph Callback Node
//!
//! A dependency-graph node that runs user scripts in response to attribute
//! changes and connection edits. The architecture separates the host graph
//! (attribute storage, notifications, undo, idle queue) from the dispatch
//! core, so the same node logic runs against any [`GraphHost`] implementation.
//!
//! ## Architecture
//!
//! - **Host**: The [`host::GraphHost`] trait abstracts the surrounding graph;
//!   [`host::MemoryHost`] is a self-contained in-memory implementation
//! - **Scripting**: Rhai-based script resolution and invocation with engine
//!   safety limits and `${name}` template substitution
//! - **Node**: [`CallbackNode`] routes host notifications to the sync and
//!   listen dispatchers and owns all per-slot derived state
//!
//! ## Attribute model
//!
//! Each node carries two repeated attribute groups. A *sync group* element
//! (`sg[n]`) binds a script to input ports and output ports on the node
//! itself; whenever a connected port is dirtied, the script's entry point
//! runs with the connected peer names as payload, once immediately and once
//! more on the host's next idle tick. A *listen group* element (`lg[n]`)
//! watches attribute changes on *other* nodes connected to its input ports
//! and forwards each change to its script.
//!
//! The entry point defaults to `__callback__` and can be overridden through
//! [`config::CallbackConfig`] or the `CALLBACK_NODE_FUNC` environment
//! variable.
//!
//! ## Example
//!
//! ```
//! use callback_node_rs::{
//!     config::CallbackConfig,
//!     host::{Attr, AttrChangedEvent, AttrMessage, MemoryHost, PlugPath},
//!     node::CallbackNode,
//! };
//!
//! let mut host = MemoryHost::new();
//! let handle = host.add_node("cbnode1");
//! let mut node = CallbackNode::new(handle, CallbackConfig::default(), &mut host);
//!
//! // Setting the slot's script attribute resolves it into the module cache.
//! let script = PlugPath::child(handle, Attr::Script, 0);
//! host.set_string(&script, "fn __callback__(node, data) { log(node); }");
//! node.on_attr_changed(
//!     &mut host,
//!     &AttrChangedEvent {
//!         message: AttrMessage::SET,
//!         plug: script,
//!         other_plug: None,
//!     },
//! );
//! assert!(node.sync_slot(0).unwrap().module().is_some());
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod node;
pub mod scripting;

// Re-export commonly used types
pub use config::CallbackConfig;
pub use error::{CallbackError, Result};
pub use host::{
    Attr, AttrChangedEvent, AttrMessage, DeferredTask, GraphHost, MemoryHost, NodeHandle,
    PeerAttrEvent, PeerPlug, PlugPath, SubscriptionId,
};
pub use node::{CallbackNode, ListenSlot, SyncSlot};
pub use scripting::{CallType, CompiledModule, ScriptHost, SyncPayload};
