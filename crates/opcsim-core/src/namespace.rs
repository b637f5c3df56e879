//! The container API variables are registered into, and its in-memory host.
//!
//! [`Namespace`] is the registration surface the binder and builder work
//! against: create folders, register variables with their accessors.
//! [`AddressSpace`] implements it and also serves client requests:
//! browsing folders, and dispatching reads and writes to the accessor a
//! variable was registered with.
//!
//! Registration happens once at startup through `&mut self`; request
//! dispatch only needs `&self`, so a built address space can be shared
//! behind an [`Arc`](std::sync::Arc).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use opcsim_types::{
    AccessLevel, Category, DataType, NodeId, StatusCode, Variant, VariableDescriptor,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::accessor::VariableAccessor;
use crate::classify::classify;

/// First numeric id handed out by [`AddressSpace::allocate_numeric_id`].
const FIRST_NUMERIC_ID: u32 = 1000;

/// Errors raised while registering or browsing nodes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespaceError {
    /// No node with this id exists.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The node exists but cannot hold children.
    #[error("node {0} is not a folder")]
    NotAFolder(NodeId),

    /// A node with this id is already registered.
    #[error("node {0} is already registered")]
    DuplicateNodeId(NodeId),
}

/// Registration surface for folders and variables.
pub trait Namespace {
    /// Create a folder under `parent` and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError`] if `parent` is missing or not a folder.
    fn add_folder(&mut self, parent: &NodeId, browse_name: &str) -> Result<NodeId, NamespaceError>;

    /// Register a variable node under `parent`, wired to `accessor`.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError`] if `parent` is missing or not a folder,
    /// or the descriptor's node id is already registered.
    fn add_variable(
        &mut self,
        parent: &NodeId,
        descriptor: VariableDescriptor,
        accessor: Box<dyn VariableAccessor>,
    ) -> Result<NodeId, NamespaceError>;

    /// Return `true` if a node with this id is registered.
    fn contains(&self, node_id: &NodeId) -> bool;

    /// Reserve a fresh numeric node id.
    fn allocate_numeric_id(&mut self) -> NodeId;
}

/// Kind of node a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeClass {
    /// Organizes other nodes.
    Folder,
    /// Holds a value.
    Variable,
}

/// A child entry returned when browsing a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Target node.
    pub node_id: NodeId,
    /// Target browse name.
    pub browse_name: String,
    /// Target node class.
    pub node_class: NodeClass,
}

/// Variable metadata as advertised to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableMetadata {
    /// Node identity.
    pub node_id: NodeId,
    /// Browse name.
    pub browse_name: String,
    /// Folder the variable is a component of.
    pub parent: NodeId,
    /// Declared type label, as derived by [`classify`].
    pub data_type: Category,
    /// Detailed primitive kind the variable was declared with.
    pub declared_type: DataType,
    /// `-1` for scalars, `1` for arrays.
    pub value_rank: i32,
    /// Array dimensions, when declared.
    pub array_dimensions: Option<Vec<u32>>,
    /// Permitted client operations.
    pub access_level: AccessLevel,
    /// Sampling interval hint in milliseconds.
    pub minimum_sampling_interval_ms: u32,
}

/// Result of a read: the value (when good), its status, and when it was
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    /// The value, present only when `status` is good.
    pub value: Option<Variant>,
    /// Outcome of the read.
    pub status: StatusCode,
    /// When the value was produced.
    pub source_timestamp: DateTime<Utc>,
}

impl DataValue {
    fn good(value: Variant) -> Self {
        Self {
            value: Some(value),
            status: StatusCode::Good,
            source_timestamp: Utc::now(),
        }
    }

    fn bad(status: StatusCode) -> Self {
        Self {
            value: None,
            status,
            source_timestamp: Utc::now(),
        }
    }
}

struct FolderNode {
    browse_name: String,
    children: Vec<NodeId>,
}

struct VariableNode {
    metadata: VariableMetadata,
    accessor: Box<dyn VariableAccessor>,
}

enum Node {
    Folder(FolderNode),
    Variable(VariableNode),
}

impl Node {
    fn browse_name(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.browse_name,
            Self::Variable(variable) => &variable.metadata.browse_name,
        }
    }

    const fn node_class(&self) -> NodeClass {
        match self {
            Self::Folder(_) => NodeClass::Folder,
            Self::Variable(_) => NodeClass::Variable,
        }
    }
}

/// In-memory address space rooted at the `Objects` folder.
pub struct AddressSpace {
    nodes: BTreeMap<NodeId, Node>,
    next_numeric: u32,
}

impl AddressSpace {
    /// Create an address space containing only the `Objects` folder.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            NodeId::OBJECTS_FOLDER,
            Node::Folder(FolderNode {
                browse_name: String::from("Objects"),
                children: Vec::new(),
            }),
        );
        Self {
            nodes,
            next_numeric: FIRST_NUMERIC_ID,
        }
    }

    /// Number of registered variable nodes.
    pub fn variable_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|node| matches!(node, Node::Variable(_)))
            .count()
    }

    /// List the children of a folder, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::NodeNotFound`] or
    /// [`NamespaceError::NotAFolder`].
    pub fn browse(&self, node_id: &NodeId) -> Result<Vec<Reference>, NamespaceError> {
        let folder = self.folder(node_id)?;
        Ok(folder
            .children
            .iter()
            .filter_map(|child| {
                self.nodes.get(child).map(|node| Reference {
                    node_id: child.clone(),
                    browse_name: node.browse_name().to_owned(),
                    node_class: node.node_class(),
                })
            })
            .collect())
    }

    /// Find a direct child of `parent` by browse name.
    pub fn find_child(&self, parent: &NodeId, browse_name: &str) -> Option<NodeId> {
        let folder = self.folder(parent).ok()?;
        folder
            .children
            .iter()
            .find(|child| {
                self.nodes
                    .get(*child)
                    .is_some_and(|node| node.browse_name() == browse_name)
            })
            .cloned()
    }

    /// Return the advertised metadata of a variable node.
    pub fn variable(&self, node_id: &NodeId) -> Option<&VariableMetadata> {
        match self.nodes.get(node_id) {
            Some(Node::Variable(variable)) => Some(&variable.metadata),
            _ => None,
        }
    }

    /// Read the current value of a variable.
    ///
    /// Accessor failures are reported in the returned status; they never
    /// affect other nodes.
    pub fn read(&self, node_id: &NodeId) -> DataValue {
        let variable = match self.nodes.get(node_id) {
            Some(Node::Variable(variable)) => variable,
            Some(Node::Folder(_)) => return DataValue::bad(StatusCode::BadNotReadable),
            None => return DataValue::bad(StatusCode::BadNodeIdUnknown),
        };

        if !variable.metadata.access_level.readable {
            return DataValue::bad(StatusCode::BadNotReadable);
        }

        match variable.accessor.read() {
            Ok(value) => DataValue::good(value),
            Err(e) => {
                warn!(node_id = %node_id, error = %e, "read failed");
                DataValue::bad(e.status_code())
            }
        }
    }

    /// Write a new value to a variable and return the outcome.
    pub fn write(&self, node_id: &NodeId, value: Variant) -> StatusCode {
        let variable = match self.nodes.get(node_id) {
            Some(Node::Variable(variable)) => variable,
            Some(Node::Folder(_)) => return StatusCode::BadNotWritable,
            None => return StatusCode::BadNodeIdUnknown,
        };

        if !variable.metadata.access_level.writable {
            warn!(node_id = %node_id, "write refused: variable is read-only");
            return StatusCode::BadNotWritable;
        }

        match variable.accessor.write(value) {
            Ok(()) => StatusCode::Good,
            Err(e) => {
                warn!(node_id = %node_id, error = %e, "write refused");
                e.status_code()
            }
        }
    }

    fn folder(&self, node_id: &NodeId) -> Result<&FolderNode, NamespaceError> {
        match self.nodes.get(node_id) {
            Some(Node::Folder(folder)) => Ok(folder),
            Some(Node::Variable(_)) => Err(NamespaceError::NotAFolder(node_id.clone())),
            None => Err(NamespaceError::NodeNotFound(node_id.clone())),
        }
    }

    fn attach(&mut self, parent: &NodeId, node_id: NodeId, node: Node) -> Result<NodeId, NamespaceError> {
        if self.nodes.contains_key(&node_id) {
            return Err(NamespaceError::DuplicateNodeId(node_id));
        }
        match self.nodes.get_mut(parent) {
            Some(Node::Folder(folder)) => folder.children.push(node_id.clone()),
            Some(Node::Variable(_)) => return Err(NamespaceError::NotAFolder(parent.clone())),
            None => return Err(NamespaceError::NodeNotFound(parent.clone())),
        }
        self.nodes.insert(node_id.clone(), node);
        Ok(node_id)
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressSpace")
            .field("nodes", &self.nodes.len())
            .field("next_numeric", &self.next_numeric)
            .finish()
    }
}

impl Namespace for AddressSpace {
    fn add_folder(&mut self, parent: &NodeId, browse_name: &str) -> Result<NodeId, NamespaceError> {
        // Validate the parent before consuming an id.
        self.folder(parent)?;
        let node_id = self.allocate_numeric_id();
        let node = Node::Folder(FolderNode {
            browse_name: browse_name.to_owned(),
            children: Vec::new(),
        });
        let node_id = self.attach(parent, node_id, node)?;
        debug!(node_id = %node_id, browse_name, "folder registered");
        Ok(node_id)
    }

    fn add_variable(
        &mut self,
        parent: &NodeId,
        descriptor: VariableDescriptor,
        accessor: Box<dyn VariableAccessor>,
    ) -> Result<NodeId, NamespaceError> {
        let category = classify(descriptor.data_type);
        if category == Category::Unspecified {
            warn!(
                node_id = %descriptor.node_id,
                data_type = %descriptor.data_type,
                "no category for declared data type, advertising empty label"
            );
        }

        let metadata = VariableMetadata {
            node_id: descriptor.node_id.clone(),
            value_rank: descriptor.value_rank(),
            browse_name: descriptor.browse_name,
            parent: parent.clone(),
            data_type: category,
            declared_type: descriptor.data_type,
            array_dimensions: descriptor.array_dimensions,
            access_level: descriptor.access,
            minimum_sampling_interval_ms: descriptor.minimum_sampling_interval_ms,
        };
        let node_id = descriptor.node_id;
        let node = Node::Variable(VariableNode { metadata, accessor });
        let node_id = self.attach(parent, node_id, node)?;
        debug!(node_id = %node_id, data_type = %category, "variable registered");
        Ok(node_id)
    }

    fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    fn allocate_numeric_id(&mut self) -> NodeId {
        loop {
            let candidate = NodeId::Numeric(self.next_numeric);
            self.next_numeric = self.next_numeric.saturating_add(1);
            if !self.nodes.contains_key(&candidate) || self.next_numeric == u32::MAX {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use opcsim_types::{Scalar, ValueShape, VariantKind};

    use super::*;
    use crate::accessor::StaticAccessor;

    fn string_descriptor(id: &str, access: AccessLevel) -> VariableDescriptor {
        VariableDescriptor::new(
            NodeId::string(id),
            id,
            VariantKind {
                data_type: DataType::String,
                shape: ValueShape::Scalar,
            },
        )
        .with_access(access)
    }

    fn static_string(value: &str, writable: bool) -> Box<dyn VariableAccessor> {
        Box::new(StaticAccessor::new(Scalar::from(value).into(), writable))
    }

    #[test]
    fn starts_with_empty_objects_folder() {
        let space = AddressSpace::new();
        assert!(space.contains(&NodeId::OBJECTS_FOLDER));
        assert!(space.browse(&NodeId::OBJECTS_FOLDER).unwrap().is_empty());
        assert_eq!(space.variable_count(), 0);
    }

    #[test]
    fn folders_get_numeric_ids_and_browse_in_order() {
        let mut space = AddressSpace::new();
        let a = space.add_folder(&NodeId::OBJECTS_FOLDER, "MyDevice").unwrap();
        let b = space.add_folder(&NodeId::OBJECTS_FOLDER, "Simulator").unwrap();
        assert_eq!(a, NodeId::Numeric(1000));
        assert_eq!(b, NodeId::Numeric(1001));

        let refs = space.browse(&NodeId::OBJECTS_FOLDER).unwrap();
        let names: Vec<&str> = refs.iter().map(|r| r.browse_name.as_str()).collect();
        assert_eq!(names, vec!["MyDevice", "Simulator"]);
        assert!(refs.iter().all(|r| r.node_class == NodeClass::Folder));
        assert_eq!(space.find_child(&NodeId::OBJECTS_FOLDER, "Simulator"), Some(b));
    }

    #[test]
    fn metadata_carries_category_label() {
        let mut space = AddressSpace::new();
        let id = space
            .add_variable(
                &NodeId::OBJECTS_FOLDER,
                string_descriptor("Label", AccessLevel::READ_ONLY),
                static_string("x", false),
            )
            .unwrap();
        let meta = space.variable(&id).unwrap();
        assert_eq!(meta.data_type, Category::String);
        assert_eq!(meta.value_rank, -1);
        assert_eq!(meta.parent, NodeId::OBJECTS_FOLDER);
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let mut space = AddressSpace::new();
        space
            .add_variable(
                &NodeId::OBJECTS_FOLDER,
                string_descriptor("Dup", AccessLevel::READ_ONLY),
                static_string("first", false),
            )
            .unwrap();
        let err = space
            .add_variable(
                &NodeId::OBJECTS_FOLDER,
                string_descriptor("Dup", AccessLevel::READ_ONLY),
                static_string("second", false),
            )
            .unwrap_err();
        assert_eq!(err, NamespaceError::DuplicateNodeId(NodeId::string("Dup")));

        let value = space.read(&NodeId::string("Dup")).value.unwrap();
        assert_eq!(value, Variant::Scalar(Scalar::from("first")));
        assert_eq!(space.browse(&NodeId::OBJECTS_FOLDER).unwrap().len(), 1);
    }

    #[test]
    fn variables_cannot_hold_children() {
        let mut space = AddressSpace::new();
        let id = space
            .add_variable(
                &NodeId::OBJECTS_FOLDER,
                string_descriptor("Leaf", AccessLevel::READ_ONLY),
                static_string("x", false),
            )
            .unwrap();
        assert_eq!(
            space.add_folder(&id, "Child").unwrap_err(),
            NamespaceError::NotAFolder(id.clone())
        );
        assert_eq!(
            space.browse(&id).unwrap_err(),
            NamespaceError::NotAFolder(id)
        );
        assert!(matches!(
            space.add_folder(&NodeId::Numeric(4242), "Orphan"),
            Err(NamespaceError::NodeNotFound(_))
        ));
    }

    #[test]
    fn access_level_is_enforced_before_accessor() {
        let mut space = AddressSpace::new();
        // Accessor would accept the write; the node's access level does not.
        let id = space
            .add_variable(
                &NodeId::OBJECTS_FOLDER,
                string_descriptor("Locked", AccessLevel::READ_ONLY),
                static_string("x", true),
            )
            .unwrap();
        assert_eq!(
            space.write(&id, Scalar::from("y").into()),
            StatusCode::BadNotWritable
        );
        assert_eq!(space.read(&id).value, Some(Variant::Scalar(Scalar::from("x"))));
    }

    #[test]
    fn unknown_nodes_report_status() {
        let space = AddressSpace::new();
        let missing = NodeId::string("Missing");
        let value = space.read(&missing);
        assert_eq!(value.status, StatusCode::BadNodeIdUnknown);
        assert!(value.value.is_none());
        assert_eq!(
            space.write(&missing, Scalar::Int32(1).into()),
            StatusCode::BadNodeIdUnknown
        );
        assert_eq!(
            space.read(&NodeId::OBJECTS_FOLDER).status,
            StatusCode::BadNotReadable
        );
    }

    #[test]
    fn unspecified_category_still_registers() {
        let mut space = AddressSpace::new();
        let descriptor = VariableDescriptor::new(
            NodeId::string("Raw"),
            "Raw",
            VariantKind {
                data_type: DataType::UInt32,
                shape: ValueShape::Scalar,
            },
        );
        let id = space
            .add_variable(&NodeId::OBJECTS_FOLDER, descriptor, static_string("x", false))
            .unwrap();
        let meta = space.variable(&id).unwrap();
        assert_eq!(meta.data_type.label(), "");
        assert_eq!(meta.declared_type, DataType::UInt32);
    }
}
