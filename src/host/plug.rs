//! Plug identity and attribute classification.
//!
//! The host graph exposes attributes as opaque handles; comparing those
//! handles across the FFI boundary is fragile, so every recognized attribute
//! is mapped to a symbolic [`Attr`] role before any dispatch decision is made.
//! A [`PlugPath`] pins down one plug on the callback node itself: the
//! attribute role plus its position inside the repeated group hierarchy
//! (group element index, array element index).

use super::NodeHandle;

/// Symbolic role of an attribute on the callback node.
///
/// Short names follow the host-side attribute short names, so rendered plug
/// paths look like `node.sg[0].i[2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    /// Per-slot enable flag of the sync group (`e`)
    Enable,
    /// Per-slot script text of the sync group (`s`)
    Script,
    /// Array of input message ports of a sync slot (`i`)
    Inputs,
    /// Array of output message ports of a sync slot (`o`)
    Outputs,
    /// The repeated sync group compound itself (`sg`)
    SyncGroup,
    /// Auto-populated display label of a listen slot (`lt`)
    ListenTitle,
    /// Per-slot enable flag of the listen group (`le`)
    ListenEnable,
    /// Per-slot script text of the listen group (`ls`)
    ListenScript,
    /// Array of input message ports of a listen slot (`li`)
    ListenInputs,
    /// The repeated listen group compound itself (`lg`)
    ListenGroup,
}

impl Attr {
    /// Host-side short name of the attribute
    pub fn short_name(self) -> &'static str {
        match self {
            Attr::Enable => "e",
            Attr::Script => "s",
            Attr::Inputs => "i",
            Attr::Outputs => "o",
            Attr::SyncGroup => "sg",
            Attr::ListenTitle => "lt",
            Attr::ListenEnable => "le",
            Attr::ListenScript => "ls",
            Attr::ListenInputs => "li",
            Attr::ListenGroup => "lg",
        }
    }

    /// The repeated group compound this attribute is a child of, if any
    pub fn group(self) -> Option<Attr> {
        match self {
            Attr::Enable | Attr::Script | Attr::Inputs | Attr::Outputs => Some(Attr::SyncGroup),
            Attr::ListenTitle | Attr::ListenEnable | Attr::ListenScript | Attr::ListenInputs => {
                Some(Attr::ListenGroup)
            }
            Attr::SyncGroup | Attr::ListenGroup => None,
        }
    }

    /// Whether this is one of the script-text attributes
    pub fn is_script(self) -> bool {
        matches!(self, Attr::Script | Attr::ListenScript)
    }

    /// Whether this is an array-typed port attribute tracked by the registry
    pub fn is_tracked_port(self) -> bool {
        matches!(self, Attr::Inputs | Attr::Outputs | Attr::ListenInputs)
    }
}

/// Identity of one plug on the callback node.
///
/// `slot` is the logical index of the owning group element; `element` is the
/// logical index inside an array-typed child attribute. Top-level plugs carry
/// neither, group elements carry only `slot`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlugPath {
    /// The node owning this plug
    pub node: NodeHandle,
    /// Symbolic attribute role
    pub attr: Attr,
    /// Logical index of the group element, if any
    pub slot: Option<u32>,
    /// Logical index within an array child attribute, if any
    pub element: Option<u32>,
}

impl PlugPath {
    /// A top-level plug (the group arrays themselves)
    pub fn new(node: NodeHandle, attr: Attr) -> Self {
        Self {
            node,
            attr,
            slot: None,
            element: None,
        }
    }

    /// A per-slot child plug, e.g. `sg[slot].s`
    pub fn child(node: NodeHandle, attr: Attr, slot: u32) -> Self {
        Self {
            node,
            attr,
            slot: Some(slot),
            element: None,
        }
    }

    /// An element of a per-slot array child, e.g. `sg[slot].i[element]`
    pub fn array_element(node: NodeHandle, attr: Attr, slot: u32, element: u32) -> Self {
        Self {
            node,
            attr,
            slot: Some(slot),
            element: Some(element),
        }
    }

    /// Whether this plug is an element of an array attribute
    pub fn is_element(&self) -> bool {
        self.element.is_some()
    }

    /// Render the attribute portion of the plug path, host style
    /// (e.g. `sg[0].i[2]`, `lg[1].lt`, `sg[3]`)
    pub fn attr_path(&self) -> String {
        match (self.attr.group(), self.slot) {
            (Some(group), Some(slot)) => {
                let mut path = format!("{}[{}].{}", group.short_name(), slot, self.attr.short_name());
                if let Some(element) = self.element {
                    path.push_str(&format!("[{}]", element));
                }
                path
            }
            _ => {
                let mut path = self.attr.short_name().to_string();
                if let Some(slot) = self.slot {
                    path.push_str(&format!("[{}]", slot));
                }
                path
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_groups() {
        assert_eq!(Attr::Script.group(), Some(Attr::SyncGroup));
        assert_eq!(Attr::ListenInputs.group(), Some(Attr::ListenGroup));
        assert_eq!(Attr::SyncGroup.group(), None);
    }

    #[test]
    fn test_attr_predicates() {
        assert!(Attr::Script.is_script());
        assert!(Attr::ListenScript.is_script());
        assert!(!Attr::Enable.is_script());
        assert!(Attr::Inputs.is_tracked_port());
        assert!(!Attr::SyncGroup.is_tracked_port());
    }

    #[test]
    fn test_attr_path_rendering() {
        let node = NodeHandle(0);
        assert_eq!(
            PlugPath::array_element(node, Attr::Inputs, 0, 2).attr_path(),
            "sg[0].i[2]"
        );
        assert_eq!(PlugPath::child(node, Attr::Script, 1).attr_path(), "sg[1].s");
        assert_eq!(
            PlugPath::child(node, Attr::ListenTitle, 3).attr_path(),
            "lg[3].lt"
        );
        assert_eq!(
            PlugPath::child(node, Attr::ListenGroup, 4).attr_path(),
            "lg[4]"
        );
        assert_eq!(PlugPath::new(node, Attr::SyncGroup).attr_path(), "sg");
    }

    #[test]
    fn test_is_element() {
        let node = NodeHandle(7);
        assert!(PlugPath::array_element(node, Attr::Outputs, 0, 0).is_element());
        assert!(!PlugPath::child(node, Attr::Enable, 0).is_element());
    }
}
