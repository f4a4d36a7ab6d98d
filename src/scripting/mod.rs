//! Rhai scripting host for callback modules.
//!
//! Script attributes hold either a file-path template (with `${name}`
//! substitution) or literal Rhai source. Resolution produces a
//! [`CompiledModule`] bound to a synthetic name embedding the slot index, so
//! distinct slots never collide. Modules are held by their owning slot and
//! replaced wholesale when the script text changes again; a failed
//! re-resolution keeps the last known good module in effect.
//!
//! ## Callback contract
//!
//! The entry point (default `__callback__`, configurable) is looked up on the
//! resolved module and invoked with:
//!
//! - sync slots: `(node_name, #{ inputs: [...], outputs: [...], type: "eval" })`
//!   where `type` is one of `"eval"`, `"make_connection"`, `"broke_connection"`;
//! - listen slots: `(node_name, message_bits, changed_plug, other_plug_or_unit)`.
//!
//! Scripts may call the registered `log(message)` builtin for diagnostics.

mod engine;

pub use engine::ScriptHost;

use rhai::{Dynamic, AST};
use std::fmt;

/// Which cache a resolved module belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptRole {
    /// Sync-group script attribute
    Sync,
    /// Listen-group script attribute
    Listen,
}

/// Tag describing why a sync callback is being invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    /// Plain dirty-propagation evaluation
    Eval,
    /// A connection to the slot was just made
    MakeConnection,
    /// A connection to the slot was just broken
    BrokeConnection,
}

impl CallType {
    /// Wire string handed to callbacks in the payload's `type` field
    pub fn as_str(self) -> &'static str {
        match self {
            CallType::Eval => "eval",
            CallType::MakeConnection => "make_connection",
            CallType::BrokeConnection => "broke_connection",
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload handed to sync callbacks.
///
/// Peer name lists are ordered ascending by logical element index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPayload {
    /// Names of connected input peer plugs
    pub inputs: Vec<String>,
    /// Names of connected output peer plugs
    pub outputs: Vec<String>,
    /// Why the callback fires
    pub call_type: CallType,
}

impl SyncPayload {
    /// Convert to the Rhai map passed as the callback's second argument
    pub fn to_map(&self) -> rhai::Map {
        let inputs: rhai::Array = self.inputs.iter().cloned().map(Dynamic::from).collect();
        let outputs: rhai::Array = self.outputs.iter().cloned().map(Dynamic::from).collect();

        let mut map = rhai::Map::new();
        map.insert("inputs".into(), Dynamic::from(inputs));
        map.insert("outputs".into(), Dynamic::from(outputs));
        map.insert("type".into(), self.call_type.as_str().into());
        map
    }
}

/// A compiled callback module bound to one slot
#[derive(Clone)]
pub struct CompiledModule {
    /// The compiled AST
    ast: AST,
    /// Synthetic module name embedding the slot index
    name: String,
    /// The source the module was compiled from
    source: String,
}

impl CompiledModule {
    pub(crate) fn new(name: impl Into<String>, source: impl Into<String>, ast: AST) -> Self {
        Self {
            ast,
            name: name.into(),
            source: source.into(),
        }
    }

    /// Synthetic module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source code the module was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the module defines a function with the given name
    pub fn has_function(&self, name: &str) -> bool {
        self.ast.iter_functions().any(|f| f.name == name)
    }

    pub(crate) fn ast(&self) -> &AST {
        &self.ast
    }
}

impl fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledModule")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_type_wire_strings() {
        assert_eq!(CallType::Eval.as_str(), "eval");
        assert_eq!(CallType::MakeConnection.as_str(), "make_connection");
        assert_eq!(CallType::BrokeConnection.as_str(), "broke_connection");
    }

    #[test]
    fn test_payload_map_shape() {
        let payload = SyncPayload {
            inputs: vec!["A.out".to_string()],
            outputs: vec!["B.in".to_string()],
            call_type: CallType::Eval,
        };
        let map = payload.to_map();
        assert_eq!(map.len(), 3);
        assert_eq!(
            map.get("type").and_then(|v| v.clone().into_string().ok()),
            Some("eval".to_string())
        );
        let inputs = map
            .get("inputs")
            .cloned()
            .unwrap()
            .into_typed_array::<String>()
            .unwrap();
        assert_eq!(inputs, vec!["A.out".to_string()]);
    }
}
