//! In-memory address space.
//!
//! Holds every node of the server: the namespace-0 scaffolding the plant
//! needs, the object types declared at startup, and the instances created
//! from them. Values of bound variables are served by their [`ValueSource`].

use std::collections::HashMap;

use cf_core::CellRef;
use tracing::debug;

use crate::node::{AccessLevel, NodeClass, NodeId, QualifiedName, Reference, ReferenceKind, ns0};
use crate::source::{FieldAccess, ValueSource};
use crate::status::StatusCode;
use crate::variant::{DataValue, NumericRange, ValueKind};

/// Namespace used for every node the application creates.
pub const APP_NAMESPACE: u16 = 1;

/// First numeric id handed out for nodes created without a requested id.
const FIRST_AUTO_ID: u32 = 50_000;

/// Variable-specific attributes.
#[derive(Debug)]
pub struct VariableAttrs {
    pub kind: ValueKind,
    pub access: AccessLevel,
    pub context: Option<CellRef>,
    pub source: Option<Box<dyn ValueSource>>,
}

/// A node and its forward references.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub class: NodeClass,
    pub browse_name: QualifiedName,
    pub display_name: String,
    pub references: Vec<Reference>,
    pub variable: Option<VariableAttrs>,
}

impl Node {
    fn new(id: NodeId, class: NodeClass, browse_name: QualifiedName) -> Self {
        let display_name = browse_name.name.clone();
        Self {
            id,
            class,
            browse_name,
            display_name,
            references: Vec::new(),
            variable: None,
        }
    }

    fn targets(&self, kind: ReferenceKind) -> impl Iterator<Item = NodeId> + '_ {
        self.references
            .iter()
            .filter(move |r| r.kind == kind)
            .map(|r| r.target)
    }

    /// Whether this node carries a `HasModellingRule -> Mandatory` reference.
    pub fn is_mandatory(&self) -> bool {
        self.references.iter().any(|r| {
            r.kind == ReferenceKind::HasModellingRule && r.target == ns0::MODELLING_RULE_MANDATORY
        })
    }

    /// Whether a value source is attached.
    pub fn is_bound(&self) -> bool {
        self.variable.as_ref().is_some_and(|v| v.source.is_some())
    }
}

/// One row of a browse result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseEntry {
    pub reference: ReferenceKind,
    pub target: NodeId,
    pub browse_name: QualifiedName,
    pub class: NodeClass,
}

/// The node store.
#[derive(Debug)]
pub struct AddressSpace {
    nodes: HashMap<NodeId, Node>,
    next_auto_id: u32,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace {
    /// Create an address space seeded with the namespace-0 nodes the plant uses.
    pub fn new() -> Self {
        let mut space = Self {
            nodes: HashMap::new(),
            next_auto_id: FIRST_AUTO_ID,
        };
        let seeds = [
            (ns0::OBJECTS_FOLDER, NodeClass::Object, "Objects"),
            (ns0::BASE_OBJECT_TYPE, NodeClass::ObjectType, "BaseObjectType"),
            (ns0::FOLDER_TYPE, NodeClass::ObjectType, "FolderType"),
            (
                ns0::BASE_DATA_VARIABLE_TYPE,
                NodeClass::VariableType,
                "BaseDataVariableType",
            ),
            (ns0::MODELLING_RULE_MANDATORY, NodeClass::Other, "Mandatory"),
            (ns0::ORGANIZES, NodeClass::ReferenceType, "Organizes"),
            (ns0::HAS_COMPONENT, NodeClass::ReferenceType, "HasComponent"),
            (ns0::HAS_SUBTYPE, NodeClass::ReferenceType, "HasSubtype"),
            (
                ns0::HAS_TYPE_DEFINITION,
                NodeClass::ReferenceType,
                "HasTypeDefinition",
            ),
            (
                ns0::HAS_MODELLING_RULE,
                NodeClass::ReferenceType,
                "HasModellingRule",
            ),
            (ns0::BOOLEAN, NodeClass::DataType, "Boolean"),
            (ns0::INT32, NodeClass::DataType, "Int32"),
            (ns0::UINT32, NodeClass::DataType, "UInt32"),
            (ns0::FLOAT, NodeClass::DataType, "Float"),
            (ns0::DOUBLE, NodeClass::DataType, "Double"),
            (ns0::STRING, NodeClass::DataType, "String"),
        ];
        for (id, class, name) in seeds {
            space
                .nodes
                .insert(id, Node::new(id, class, QualifiedName::new(0, name)));
        }
        if let Some(base) = space.nodes.get_mut(&ns0::BASE_OBJECT_TYPE) {
            base.references.push(Reference {
                kind: ReferenceKind::HasSubtype,
                target: ns0::FOLDER_TYPE,
            });
        }
        space
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn browse_name(&self, id: NodeId) -> Option<&QualifiedName> {
        self.nodes.get(&id).map(|n| &n.browse_name)
    }

    fn allocate_id(&mut self) -> NodeId {
        loop {
            let id = NodeId::numeric(APP_NAMESPACE, self.next_auto_id);
            self.next_auto_id += 1;
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    fn claim_id(&mut self, requested: Option<NodeId>) -> Result<NodeId, StatusCode> {
        match requested {
            Some(id) if self.nodes.contains_key(&id) => Err(StatusCode::BAD_NODE_ID_EXISTS),
            Some(id) => Ok(id),
            None => Ok(self.allocate_id()),
        }
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Add a forward reference.
    pub fn add_reference(
        &mut self,
        source: NodeId,
        kind: ReferenceKind,
        target: NodeId,
    ) -> Result<(), StatusCode> {
        if !self.nodes.contains_key(&target) {
            return Err(StatusCode::BAD_NODE_ID_UNKNOWN);
        }
        let node = self
            .nodes
            .get_mut(&source)
            .ok_or(StatusCode::BAD_NODE_ID_UNKNOWN)?;
        let reference = Reference { kind, target };
        if !node.references.contains(&reference) {
            node.references.push(reference);
        }
        Ok(())
    }

    /// Hierarchical children of `parent` whose browse name is `name`.
    fn children_named(&self, parent: &Node, name: &str) -> Vec<NodeId> {
        parent
            .references
            .iter()
            .filter(|r| r.kind.is_hierarchical())
            .filter(|r| {
                self.nodes
                    .get(&r.target)
                    .is_some_and(|child| child.browse_name.name == name)
            })
            .map(|r| r.target)
            .collect()
    }

    fn ensure_unique_child(&self, parent: NodeId, name: &str) -> Result<(), StatusCode> {
        let node = self
            .nodes
            .get(&parent)
            .ok_or(StatusCode::BAD_PARENT_NODE_ID_INVALID)?;
        if self.children_named(node, name).is_empty() {
            Ok(())
        } else {
            Err(StatusCode::BAD_BROWSE_NAME_DUPLICATED)
        }
    }

    /// Create a folder object under `parent`.
    pub fn add_folder(&mut self, parent: NodeId, name: &str) -> Result<NodeId, StatusCode> {
        self.ensure_unique_child(parent, name)?;
        let id = self.allocate_id();
        self.insert(Node::new(
            id,
            NodeClass::Object,
            QualifiedName::new(APP_NAMESPACE, name),
        ));
        self.add_reference(parent, ReferenceKind::Organizes, id)?;
        self.add_reference(id, ReferenceKind::HasTypeDefinition, ns0::FOLDER_TYPE)?;
        debug!(folder = name, %id, "folder created");
        Ok(id)
    }

    /// Declare an object type as a subtype of `BaseObjectType`.
    pub fn add_object_type(
        &mut self,
        requested: Option<NodeId>,
        name: &str,
    ) -> Result<NodeId, StatusCode> {
        let id = self.claim_id(requested)?;
        self.insert(Node::new(
            id,
            NodeClass::ObjectType,
            QualifiedName::new(APP_NAMESPACE, name),
        ));
        self.add_reference(ns0::BASE_OBJECT_TYPE, ReferenceKind::HasSubtype, id)?;
        Ok(id)
    }

    /// Add a variable component to an object type.
    pub fn add_type_variable(
        &mut self,
        type_node: NodeId,
        name: &str,
        kind: ValueKind,
        access: AccessLevel,
    ) -> Result<NodeId, StatusCode> {
        match self.nodes.get(&type_node).map(|n| n.class) {
            Some(NodeClass::ObjectType) => {}
            Some(_) => return Err(StatusCode::BAD_NODE_CLASS_INVALID),
            None => return Err(StatusCode::BAD_PARENT_NODE_ID_INVALID),
        }
        self.ensure_unique_child(type_node, name)?;
        let id = self.add_variable_node(name, kind, access);
        self.add_reference(type_node, ReferenceKind::HasComponent, id)?;
        Ok(id)
    }

    fn add_variable_node(&mut self, name: &str, kind: ValueKind, access: AccessLevel) -> NodeId {
        let id = self.allocate_id();
        let mut node = Node::new(
            id,
            NodeClass::Variable,
            QualifiedName::new(APP_NAMESPACE, name),
        );
        node.references.push(Reference {
            kind: ReferenceKind::HasTypeDefinition,
            target: ns0::BASE_DATA_VARIABLE_TYPE,
        });
        node.variable = Some(VariableAttrs {
            kind,
            access,
            context: None,
            source: None,
        });
        self.insert(node)
    }

    /// Mark a type member as mandatory for every instance.
    pub fn add_mandatory(&mut self, member: NodeId) -> Result<(), StatusCode> {
        self.add_reference(
            member,
            ReferenceKind::HasModellingRule,
            ns0::MODELLING_RULE_MANDATORY,
        )
    }

    /// Instantiate an object of `type_node` under `parent`.
    ///
    /// Every mandatory variable member of the type is copied into the new
    /// object as an unbound child with the same browse name, kind and access.
    pub fn create_entity(
        &mut self,
        parent: NodeId,
        type_node: NodeId,
        name: &str,
    ) -> Result<NodeId, StatusCode> {
        match self.nodes.get(&type_node).map(|n| n.class) {
            Some(NodeClass::ObjectType) => {}
            _ => return Err(StatusCode::BAD_TYPE_DEFINITION_INVALID),
        }
        self.ensure_unique_child(parent, name)?;

        let members: Vec<(String, ValueKind, AccessLevel)> = self
            .nodes
            .get(&type_node)
            .map(|t| t.targets(ReferenceKind::HasComponent).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|member| self.nodes.get(&member))
            .filter(|member| member.is_mandatory())
            .filter_map(|member| {
                member
                    .variable
                    .as_ref()
                    .map(|v| (member.browse_name.name.clone(), v.kind, v.access))
            })
            .collect();

        let id = self.allocate_id();
        self.insert(Node::new(
            id,
            NodeClass::Object,
            QualifiedName::new(APP_NAMESPACE, name),
        ));
        self.add_reference(parent, ReferenceKind::Organizes, id)?;
        self.add_reference(id, ReferenceKind::HasTypeDefinition, type_node)?;
        for (member, kind, access) in members {
            let child = self.add_variable_node(&member, kind, access);
            self.add_reference(id, ReferenceKind::HasComponent, child)?;
        }
        Ok(id)
    }

    /// Resolve a component child of `parent` by browse name, one hop only.
    ///
    /// Zero or several matches are both `BadNotFound`.
    pub fn resolve_child(&self, parent: NodeId, name: &str) -> Result<NodeId, StatusCode> {
        let node = self
            .nodes
            .get(&parent)
            .ok_or(StatusCode::BAD_NODE_ID_UNKNOWN)?;
        let matches: Vec<NodeId> = node
            .targets(ReferenceKind::HasComponent)
            .filter(|child| {
                self.nodes
                    .get(child)
                    .is_some_and(|c| c.browse_name.name == name)
            })
            .collect();
        match matches.as_slice() {
            [single] => Ok(*single),
            _ => Err(StatusCode::BAD_NOT_FOUND),
        }
    }

    /// Follow hierarchical references from the Objects folder, one name per hop.
    pub fn resolve_path(&self, path: &[&str]) -> Result<NodeId, StatusCode> {
        let mut current = ns0::OBJECTS_FOLDER;
        for name in path {
            let node = self
                .nodes
                .get(&current)
                .ok_or(StatusCode::BAD_NODE_ID_UNKNOWN)?;
            match self.children_named(node, name).as_slice() {
                [single] => current = *single,
                _ => return Err(StatusCode::BAD_NOT_FOUND),
            }
        }
        Ok(current)
    }

    fn variable_mut(&mut self, node: NodeId) -> Result<&mut VariableAttrs, StatusCode> {
        self.nodes
            .get_mut(&node)
            .ok_or(StatusCode::BAD_NODE_ID_UNKNOWN)?
            .variable
            .as_mut()
            .ok_or(StatusCode::BAD_NODE_CLASS_INVALID)
    }

    /// Attach the storage context handed to the node's value source.
    pub fn bind_context(
        &mut self,
        node: NodeId,
        context: Option<CellRef>,
    ) -> Result<(), StatusCode> {
        self.variable_mut(node)?.context = context;
        Ok(())
    }

    /// Make `source` the authoritative value source of a variable.
    pub fn set_value_source(
        &mut self,
        node: NodeId,
        source: Box<dyn ValueSource>,
    ) -> Result<(), StatusCode> {
        let variable = self.variable_mut(node)?;
        if source.kind() != variable.kind {
            return Err(StatusCode::BAD_TYPE_MISMATCH);
        }
        variable.source = Some(source);
        Ok(())
    }

    /// Detach the value source and context of a variable.
    pub fn clear_value_source(&mut self, node: NodeId) -> Result<(), StatusCode> {
        let variable = self.variable_mut(node)?;
        variable.source = None;
        variable.context = None;
        Ok(())
    }

    fn field(&self, node: NodeId) -> Result<(&Node, &VariableAttrs), StatusCode> {
        let n = self
            .nodes
            .get(&node)
            .ok_or(StatusCode::BAD_NODE_ID_UNKNOWN)?;
        let v = n
            .variable
            .as_ref()
            .ok_or(StatusCode::BAD_NODE_CLASS_INVALID)?;
        Ok((n, v))
    }

    /// Read the value of a variable.
    pub fn read(
        &self,
        node: NodeId,
        range: Option<&NumericRange>,
        include_source_timestamp: bool,
    ) -> DataValue {
        let (n, v) = match self.field(node) {
            Ok(found) => found,
            Err(status) => return DataValue::bad(status),
        };
        if !v.access.can_read() {
            return DataValue::bad(StatusCode::BAD_NOT_READABLE);
        }
        let Some(source) = v.source.as_ref() else {
            return DataValue::bad(StatusCode::BAD_WAITING_FOR_INITIAL_DATA);
        };
        let access = FieldAccess {
            node,
            browse_name: Some(&n.browse_name),
            context: v.context,
        };
        source
            .read(&access, range, include_source_timestamp)
            .unwrap_or_else(DataValue::bad)
    }

    /// Write the value of a variable.
    pub fn write(
        &self,
        node: NodeId,
        range: Option<&NumericRange>,
        value: &DataValue,
    ) -> StatusCode {
        let (n, v) = match self.field(node) {
            Ok(found) => found,
            Err(status) => return status,
        };
        if !v.access.can_write() {
            return StatusCode::BAD_NOT_WRITABLE;
        }
        let Some(source) = v.source.as_ref() else {
            return StatusCode::BAD_WAITING_FOR_INITIAL_DATA;
        };
        let access = FieldAccess {
            node,
            browse_name: Some(&n.browse_name),
            context: v.context,
        };
        source.write(&access, range, value).into()
    }

    /// Forward references of a node, in insertion order.
    pub fn browse(&self, node: NodeId) -> Result<Vec<BrowseEntry>, StatusCode> {
        let n = self
            .nodes
            .get(&node)
            .ok_or(StatusCode::BAD_NODE_ID_UNKNOWN)?;
        Ok(n.references
            .iter()
            .filter_map(|r| {
                self.nodes.get(&r.target).map(|t| BrowseEntry {
                    reference: r.kind,
                    target: r.target,
                    browse_name: t.browse_name.clone(),
                    class: t.class,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    fn sensor_type(space: &mut AddressSpace) -> NodeId {
        let ty = space
            .add_object_type(Some(NodeId::numeric(1, 1002)), "SensorType")
            .unwrap();
        let pv = space
            .add_type_variable(ty, "PROCESS_VALUE", ValueKind::Double, AccessLevel::READ)
            .unwrap();
        space.add_mandatory(pv).unwrap();
        space
            .add_type_variable(ty, "OPTIONAL", ValueKind::Double, AccessLevel::READ)
            .unwrap();
        ty
    }

    #[test]
    fn seeded_with_objects_folder() {
        let space = AddressSpace::new();
        assert!(space.contains(ns0::OBJECTS_FOLDER));
        assert_eq!(
            space.browse_name(ns0::OBJECTS_FOLDER).unwrap().name,
            "Objects"
        );
    }

    #[test]
    fn requested_type_id_must_be_free() {
        let mut space = AddressSpace::new();
        sensor_type(&mut space);
        let again = space.add_object_type(Some(NodeId::numeric(1, 1002)), "Other");
        assert_eq!(again, Err(StatusCode::BAD_NODE_ID_EXISTS));
    }

    #[test]
    fn create_entity_copies_mandatory_members_only() {
        let mut space = AddressSpace::new();
        let ty = sensor_type(&mut space);
        let folder = space.add_folder(ns0::OBJECTS_FOLDER, "Sensors").unwrap();
        let obj = space.create_entity(folder, ty, "FRA-1").unwrap();

        assert!(space.resolve_child(obj, "PROCESS_VALUE").is_ok());
        assert_eq!(
            space.resolve_child(obj, "OPTIONAL"),
            Err(StatusCode::BAD_NOT_FOUND)
        );
    }

    #[test]
    fn create_entity_rejects_duplicate_names_and_bad_types() {
        let mut space = AddressSpace::new();
        let ty = sensor_type(&mut space);
        let folder = space.add_folder(ns0::OBJECTS_FOLDER, "Sensors").unwrap();
        space.create_entity(folder, ty, "FRA-1").unwrap();

        assert_eq!(
            space.create_entity(folder, ty, "FRA-1"),
            Err(StatusCode::BAD_BROWSE_NAME_DUPLICATED)
        );
        assert_eq!(
            space.create_entity(folder, folder, "X"),
            Err(StatusCode::BAD_TYPE_DEFINITION_INVALID)
        );
        assert_eq!(
            space.create_entity(NodeId::numeric(1, 9), ty, "Y"),
            Err(StatusCode::BAD_PARENT_NODE_ID_INVALID)
        );
    }

    #[test]
    fn resolve_child_is_one_hop() {
        let mut space = AddressSpace::new();
        let ty = sensor_type(&mut space);
        let folder = space.add_folder(ns0::OBJECTS_FOLDER, "Sensors").unwrap();
        space.create_entity(folder, ty, "FRA-1").unwrap();

        // PROCESS_VALUE is two hops below the folder.
        assert_eq!(
            space.resolve_child(folder, "PROCESS_VALUE"),
            Err(StatusCode::BAD_NOT_FOUND)
        );
    }

    #[test]
    fn unbound_variables_report_missing_data() {
        let mut space = AddressSpace::new();
        let ty = sensor_type(&mut space);
        let obj = space.create_entity(ns0::OBJECTS_FOLDER, ty, "S").unwrap();
        let pv = space.resolve_child(obj, "PROCESS_VALUE").unwrap();

        let dv = space.read(pv, None, false);
        assert_eq!(dv.status, StatusCode::BAD_WAITING_FOR_INITIAL_DATA);
        assert!(dv.value.is_none());
    }

    #[test]
    fn read_only_variables_reject_writes() {
        let mut space = AddressSpace::new();
        let ty = sensor_type(&mut space);
        let obj = space.create_entity(ns0::OBJECTS_FOLDER, ty, "S").unwrap();
        let pv = space.resolve_child(obj, "PROCESS_VALUE").unwrap();

        let status = space.write(pv, None, &DataValue::new(Variant::Double(1.0)));
        assert_eq!(status, StatusCode::BAD_NOT_WRITABLE);
    }

    #[test]
    fn unknown_nodes() {
        let space = AddressSpace::new();
        let missing = NodeId::numeric(1, 4242);
        assert_eq!(
            space.read(missing, None, false).status,
            StatusCode::BAD_NODE_ID_UNKNOWN
        );
        assert_eq!(
            space.write(missing, None, &DataValue::new(1.0)),
            StatusCode::BAD_NODE_ID_UNKNOWN
        );
        assert!(space.browse(missing).is_err());
    }

    #[test]
    fn resolve_path_walks_folders_and_components() {
        let mut space = AddressSpace::new();
        let ty = sensor_type(&mut space);
        let folder = space.add_folder(ns0::OBJECTS_FOLDER, "Sensors").unwrap();
        let obj = space.create_entity(folder, ty, "TRA-1").unwrap();
        let pv = space.resolve_child(obj, "PROCESS_VALUE").unwrap();

        assert_eq!(
            space.resolve_path(&["Sensors", "TRA-1", "PROCESS_VALUE"]),
            Ok(pv)
        );
        assert_eq!(space.resolve_path(&[]), Ok(ns0::OBJECTS_FOLDER));
        assert_eq!(
            space.resolve_path(&["Sensors", "nope"]),
            Err(StatusCode::BAD_NOT_FOUND)
        );
    }

    #[test]
    fn browse_lists_organized_children() {
        let mut space = AddressSpace::new();
        let folder = space.add_folder(ns0::OBJECTS_FOLDER, "Valves").unwrap();
        let entries = space.browse(ns0::OBJECTS_FOLDER).unwrap();
        assert!(entries.iter().any(|e| e.target == folder
            && e.reference == ReferenceKind::Organizes
            && e.browse_name.name == "Valves"));
    }
}
