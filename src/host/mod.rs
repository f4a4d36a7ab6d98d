//! Host graph engine interface.
//!
//! The callback node never owns the dependency graph; it reacts to events the
//! host delivers and queries the host for attribute values. [`GraphHost`] is
//! the unified interface to that engine, enabling both a real host binding
//! and the in-memory [`MemoryHost`] for tests and headless embedding.
//!
//! The host is expected to deliver, on one logical thread:
//!
//! - attribute-change notifications ([`AttrChangedEvent`]) for the node's own
//!   plugs, with message bits decoded into [`AttrMessage`];
//! - dirty-propagation notifications for downstream plugs, paired with the
//!   preceding attribute-change event;
//! - peer attribute-change notifications ([`PeerAttrEvent`]) for nodes the
//!   callback node subscribed to;
//! - a pre-removal notification before the node is discarded.
//!
//! Work enqueued through [`GraphHost::defer`] runs later on the same thread
//! once the host's event loop is idle.

pub mod memory;
mod plug;

pub use memory::MemoryHost;
pub use plug::{Attr, PlugPath};

use crate::scripting::SyncPayload;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Handle to a node in the host graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeHandle(pub u32);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeHandle({})", self.0)
    }
}

/// Identifier of a registered event subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Decoded message bits of a host attribute-change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttrMessage(pub u32);

impl AttrMessage {
    /// No bits set
    pub const NONE: AttrMessage = AttrMessage(0);
    /// An attribute value was written
    pub const SET: AttrMessage = AttrMessage(1);
    /// A connection to the plug was just made
    pub const CONNECTION_MADE: AttrMessage = AttrMessage(1 << 1);
    /// A connection to the plug was just broken
    pub const CONNECTION_BROKEN: AttrMessage = AttrMessage(1 << 2);
    /// An element was just added to an array attribute
    pub const ARRAY_ADDED: AttrMessage = AttrMessage(1 << 3);

    /// Whether all bits of `other` are set in `self`
    #[inline]
    pub fn contains(self, other: AttrMessage) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit representation, as handed to listen callbacks
    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for AttrMessage {
    type Output = AttrMessage;

    fn bitor(self, rhs: AttrMessage) -> AttrMessage {
        AttrMessage(self.0 | rhs.0)
    }
}

impl BitOrAssign for AttrMessage {
    fn bitor_assign(&mut self, rhs: AttrMessage) {
        self.0 |= rhs.0;
    }
}

/// Reference to another node's attribute port.
///
/// Peers are never owned; only the peer's node handle (for subscriptions) and
/// its plug name (for callback payloads) are retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerPlug {
    /// The node owning the peer plug
    pub node: NodeHandle,
    /// Fully qualified plug name, e.g. `"A.out"`
    pub name: String,
}

impl PeerPlug {
    pub fn new(node: NodeHandle, name: impl Into<String>) -> Self {
        Self {
            node,
            name: name.into(),
        }
    }
}

/// An attribute-change notification for one of the node's own plugs
#[derive(Debug, Clone)]
pub struct AttrChangedEvent {
    /// Decoded message bits
    pub message: AttrMessage,
    /// The plug the event targets
    pub plug: PlugPath,
    /// The peer endpoint for connection events
    pub other_plug: Option<PeerPlug>,
}

/// An attribute-change notification delivered for a watched peer node
#[derive(Debug, Clone)]
pub struct PeerAttrEvent {
    /// The subscription this event was delivered through
    pub subscription: SubscriptionId,
    /// Decoded message bits
    pub message: AttrMessage,
    /// Name of the changed plug on the peer node
    pub plug_name: String,
    /// Name of the other plug involved, for connection events
    pub other_plug_name: Option<String>,
}

/// Work enqueued on the host's idle queue.
///
/// The host stores these opaquely and hands each one back to
/// [`CallbackNode::run_deferred`](crate::node::CallbackNode::run_deferred)
/// once its event loop is idle.
#[derive(Debug, Clone)]
pub enum DeferredTask {
    /// Re-invoke a sync slot's callback with the payload of the synchronous
    /// pass that scheduled it
    Resync {
        /// Node the task belongs to
        node: NodeHandle,
        /// Sync slot index
        slot: u32,
        /// The plug whose dirtying triggered the evaluation; checked for
        /// existence before the re-run
        plug: PlugPath,
        /// Payload of the original invocation
        payload: SyncPayload,
    },
}

/// Unified interface to the host graph engine.
///
/// All methods are invoked on the host's event thread; implementations need
/// no internal synchronization.
pub trait GraphHost {
    /// Display name of a node
    fn node_name(&self, node: NodeHandle) -> String;

    /// Fully qualified plug name, host style (`node.sg[0].i[2]`)
    fn plug_name(&self, plug: &PlugPath) -> String {
        format!("{}.{}", self.node_name(plug.node), plug.attr_path())
    }

    /// Whether the plug still exists in the live graph
    fn plug_exists(&self, plug: &PlugPath) -> bool;

    /// Read a boolean attribute value (enable flags)
    fn bool_value(&self, plug: &PlugPath) -> bool;

    /// Read a string attribute value (script text, labels)
    fn string_value(&self, plug: &PlugPath) -> Option<String>;

    /// Write a string attribute value (auto-populated labels)
    fn set_string_value(&mut self, plug: &PlugPath, value: &str);

    /// Surface a non-fatal warning to the user
    fn warn(&mut self, message: &str);

    /// Suspend undo recording; calls nest
    fn suspend_undo(&mut self);

    /// Resume undo recording after a matching suspend
    fn resume_undo(&mut self);

    /// Enqueue work to run once the event loop is idle
    fn defer(&mut self, task: DeferredTask);

    /// Subscribe to attribute-change notifications on a node
    fn watch_attr_changes(&mut self, node: NodeHandle) -> SubscriptionId;

    /// Subscribe to the pre-removal notification of a node
    fn watch_pre_removal(&mut self, node: NodeHandle) -> SubscriptionId;

    /// Release a subscription
    fn unwatch(&mut self, id: SubscriptionId);
}
