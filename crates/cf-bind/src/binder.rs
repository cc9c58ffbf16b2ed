//! Instance binding: create typed entities and wire their fields to cells.
//!
//! For every mandatory field of a template the binder resolves the slot the
//! address space created under the new entity (one hop, by name), checks the
//! backing cell, and installs the matching value source.
//!
//! Two flavours exist:
//! - [`InstanceBinder::instantiate`] attaches field by field and stops at the
//!   first failure. Fields attached before the failure stay attached.
//! - [`InstanceBinder::instantiate_staged`] checks every field first and
//!   attaches all of them or none.

use std::collections::HashMap;

use cf_core::{CellRef, SharedCells};
use cf_space::{AddressSpace, NodeId};
use tracing::{debug, error, info};

use crate::bridge::source_for;
use crate::error::{BindError, BindResult};
use crate::template::{FieldSpec, TypeDescriptor, kind_name};

/// Maps template field names to the storage cells that back them.
pub trait FieldBacking {
    fn cell(&self, field: &str) -> Option<CellRef>;
}

impl<S: AsRef<str>> FieldBacking for [(S, CellRef)] {
    fn cell(&self, field: &str) -> Option<CellRef> {
        self.iter()
            .find(|(name, _)| name.as_ref() == field)
            .map(|(_, cell)| *cell)
    }
}

impl<S: AsRef<str>, const N: usize> FieldBacking for [(S, CellRef); N] {
    fn cell(&self, field: &str) -> Option<CellRef> {
        self.as_slice().cell(field)
    }
}

impl FieldBacking for HashMap<String, CellRef> {
    fn cell(&self, field: &str) -> Option<CellRef> {
        self.get(field).copied()
    }
}

/// A field slot bound to a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundField {
    pub name: String,
    pub slot: NodeId,
    pub cell: CellRef,
}

/// A bound entity in the address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub node: NodeId,
    pub kind: String,
    pub name: String,
    pub fields: Vec<BoundField>,
}

impl Instance {
    pub fn slot(&self, field: &str) -> Option<NodeId> {
        self.fields.iter().find(|f| f.name == field).map(|f| f.slot)
    }
}

/// Binds entities and tracks which cells are already exposed.
#[derive(Debug)]
pub struct InstanceBinder {
    cells: SharedCells,
    exposed: HashMap<CellRef, NodeId>,
}

impl InstanceBinder {
    pub fn new(cells: SharedCells) -> Self {
        Self {
            cells,
            exposed: HashMap::new(),
        }
    }

    /// Slot currently exposing `cell`, if any.
    pub fn exposed_at(&self, cell: CellRef) -> Option<NodeId> {
        self.exposed.get(&cell).copied()
    }

    fn create(
        &self,
        space: &mut AddressSpace,
        descriptor: &TypeDescriptor,
        parent: NodeId,
        name: &str,
    ) -> BindResult<NodeId> {
        match space.create_entity(parent, descriptor.type_node, name) {
            Ok(node) => {
                info!(kind = %descriptor.kind, name, %node, "instance created");
                Ok(node)
            }
            Err(status) => {
                error!(kind = %descriptor.kind, name, %status, "failed to add instance");
                Err(BindError::Creation {
                    name: name.to_string(),
                    status,
                })
            }
        }
    }

    /// Resolve and check one field without touching the address space.
    fn stage<B: FieldBacking + ?Sized>(
        &self,
        space: &AddressSpace,
        entity: NodeId,
        instance: &str,
        field: &FieldSpec,
        backing: &B,
    ) -> BindResult<BoundField> {
        let slot = space
            .resolve_child(entity, &field.name)
            .map_err(|status| BindError::ChildResolution {
                parent: entity,
                field: field.name.clone(),
                status,
            })?;
        let cell = backing
            .cell(&field.name)
            .ok_or_else(|| BindError::UnboundField {
                instance: instance.to_string(),
                field: field.name.clone(),
            })?;
        if cell.kind() != field.kind {
            return Err(BindError::KindMismatch {
                instance: instance.to_string(),
                field: field.name.clone(),
                declared: kind_name(field.kind),
                actual: kind_name(cell.kind()),
            });
        }
        if let Some(existing) = self.exposed_at(cell) {
            return Err(BindError::CellAliased {
                field: field.name.clone(),
                existing,
            });
        }
        Ok(BoundField {
            name: field.name.clone(),
            slot,
            cell,
        })
    }

    /// Install context and value source for a staged field.
    fn attach(&mut self, space: &mut AddressSpace, field: &BoundField) -> BindResult<()> {
        let attach_err = |status| BindError::Attach {
            node: field.slot,
            field: field.name.clone(),
            status,
        };
        space
            .bind_context(field.slot, Some(field.cell))
            .map_err(attach_err)?;
        if let Err(status) = space.set_value_source(field.slot, source_for(field.cell, &self.cells))
        {
            // Leave no context behind on a slot without a source.
            let _ = space.bind_context(field.slot, None);
            return Err(attach_err(status));
        }
        self.exposed.insert(field.cell, field.slot);
        debug!(field = %field.name, slot = %field.slot, "field attached");
        Ok(())
    }

    fn detach(&mut self, space: &mut AddressSpace, field: &BoundField) {
        let _ = space.clear_value_source(field.slot);
        self.exposed.remove(&field.cell);
    }

    /// Create `name` under `parent` and bind every mandatory field in order.
    ///
    /// Returns the first failure. Fields bound before it remain bound.
    pub fn instantiate<B: FieldBacking + ?Sized>(
        &mut self,
        space: &mut AddressSpace,
        descriptor: &TypeDescriptor,
        parent: NodeId,
        name: &str,
        backing: &B,
    ) -> BindResult<Instance> {
        let node = self.create(space, descriptor, parent, name)?;
        let mut fields = Vec::new();
        for spec in descriptor.mandatory_fields() {
            let field = self.stage(space, node, name, spec, backing)?;
            self.attach(space, &field)?;
            fields.push(field);
        }
        Ok(Instance {
            node,
            kind: descriptor.kind.clone(),
            name: name.to_string(),
            fields,
        })
    }

    /// Like [`instantiate`](Self::instantiate), but all-or-nothing.
    ///
    /// Every field is resolved and checked before the first attachment. If
    /// any check or attachment fails, no field of the entity stays bound. The
    /// entity node itself remains in the address space.
    pub fn instantiate_staged<B: FieldBacking + ?Sized>(
        &mut self,
        space: &mut AddressSpace,
        descriptor: &TypeDescriptor,
        parent: NodeId,
        name: &str,
        backing: &B,
    ) -> BindResult<Instance> {
        let node = self.create(space, descriptor, parent, name)?;

        let mut staged: Vec<BoundField> = Vec::new();
        let mut claimed: HashMap<CellRef, NodeId> = HashMap::new();
        for spec in descriptor.mandatory_fields() {
            let field = self.stage(space, node, name, spec, backing)?;
            if let Some(&existing) = claimed.get(&field.cell) {
                return Err(BindError::CellAliased {
                    field: field.name.clone(),
                    existing,
                });
            }
            claimed.insert(field.cell, field.slot);
            staged.push(field);
        }

        for (done, field) in staged.iter().enumerate() {
            if let Err(err) = self.attach(space, field) {
                for committed in &staged[..done] {
                    self.detach(space, committed);
                }
                return Err(err);
            }
        }

        Ok(Instance {
            node,
            kind: descriptor.kind.clone(),
            name: name.to_string(),
            fields: staged,
        })
    }
}

/// Mandatory fields of `descriptor` that have no value source under `entity`.
///
/// An instance is usable only when this is empty.
pub fn unbound_fields(
    space: &AddressSpace,
    descriptor: &TypeDescriptor,
    entity: NodeId,
) -> Vec<String> {
    descriptor
        .mandatory_fields()
        .filter(|f| {
            space
                .resolve_child(entity, &f.name)
                .ok()
                .and_then(|slot| space.node(slot))
                .is_none_or(|slot| !slot.is_bound())
        })
        .map(|f| f.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{CellStore, DoubleCell, UInt32Cell};
    use cf_space::{DataValue, StatusCode, Variant, ns0};

    use crate::template::{AccessMode, FieldSpec, TypeRegistry, TypeSpec};
    use cf_core::CellKind;

    struct Fixture {
        space: AddressSpace,
        cells: SharedCells,
        model: TypeDescriptor,
        config: [DoubleCell; 2],
        substance: UInt32Cell,
    }

    fn fixture() -> Fixture {
        let mut store = CellStore::new();
        let config = [store.alloc_f64(1.0), store.alloc_f64(2.0)];
        let substance = store.alloc_u32(7);
        let mut space = AddressSpace::new();
        let mut registry = TypeRegistry::new();
        let model = registry
            .declare_type(
                &mut space,
                TypeSpec::new(
                    "ModelType",
                    vec![
                        FieldSpec::mandatory(
                            "SUBSTANCE_ID",
                            CellKind::UInt32,
                            AccessMode::ReadWrite,
                        ),
                        FieldSpec::mandatory("K01", CellKind::Double, AccessMode::ReadWrite),
                        FieldSpec::mandatory("K02", CellKind::Double, AccessMode::ReadWrite),
                    ],
                ),
            )
            .unwrap();
        Fixture {
            space,
            cells: SharedCells::new(store),
            model,
            config,
            substance,
        }
    }

    fn read_f64(space: &AddressSpace, node: NodeId) -> f64 {
        space.read(node, None, false).value.unwrap().as_f64().unwrap()
    }

    #[test]
    fn instantiate_binds_every_mandatory_field() {
        let mut fx = fixture();
        let mut binder = InstanceBinder::new(fx.cells.clone());
        let backing = [
            ("SUBSTANCE_ID", CellRef::from(fx.substance)),
            ("K01", fx.config[0].into()),
            ("K02", fx.config[1].into()),
        ];
        let inst = binder
            .instantiate(&mut fx.space, &fx.model, ns0::OBJECTS_FOLDER, "Config", &backing)
            .unwrap();

        assert_eq!(inst.fields.len(), 3);
        assert!(unbound_fields(&fx.space, &fx.model, inst.node).is_empty());

        let k02 = inst.slot("K02").unwrap();
        assert_eq!(read_f64(&fx.space, k02), 2.0);
        assert_eq!(
            fx.space.write(k02, None, &DataValue::new(4.5)),
            StatusCode::GOOD
        );
        assert_eq!(fx.cells.lock().unwrap().get_f64(fx.config[1]).unwrap(), 4.5);

        let id = fx
            .space
            .read(inst.slot("SUBSTANCE_ID").unwrap(), None, false)
            .value;
        assert_eq!(id, Some(Variant::UInt32(7)));
        assert_eq!(binder.exposed_at(fx.config[0].into()), inst.slot("K01"));
    }

    #[test]
    fn partial_binding_keeps_earlier_fields() {
        let mut fx = fixture();
        let mut binder = InstanceBinder::new(fx.cells.clone());
        let backing = [
            ("SUBSTANCE_ID", CellRef::from(fx.substance)),
            ("K01", fx.config[0].into()),
        ];
        let err = binder
            .instantiate(&mut fx.space, &fx.model, ns0::OBJECTS_FOLDER, "Config", &backing)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::UnboundField {
                instance: "Config".into(),
                field: "K02".into()
            }
        );

        let entity = fx
            .space
            .resolve_path(&["Config"])
            .expect("entity stays in the space");
        assert_eq!(unbound_fields(&fx.space, &fx.model, entity), vec!["K02"]);
        let k01 = fx.space.resolve_child(entity, "K01").unwrap();
        assert_eq!(read_f64(&fx.space, k01), 1.0);
        let k02 = fx.space.resolve_child(entity, "K02").unwrap();
        assert_eq!(
            fx.space.read(k02, None, false).status,
            StatusCode::BAD_WAITING_FOR_INITIAL_DATA
        );
    }

    #[test]
    fn staged_binding_is_all_or_nothing() {
        let mut fx = fixture();
        let mut binder = InstanceBinder::new(fx.cells.clone());
        let backing = [
            ("SUBSTANCE_ID", CellRef::from(fx.substance)),
            ("K01", fx.config[0].into()),
        ];
        let err = binder
            .instantiate_staged(&mut fx.space, &fx.model, ns0::OBJECTS_FOLDER, "Config", &backing)
            .unwrap_err();
        assert!(matches!(err, BindError::UnboundField { .. }));

        let entity = fx.space.resolve_path(&["Config"]).unwrap();
        assert_eq!(
            unbound_fields(&fx.space, &fx.model, entity),
            vec!["SUBSTANCE_ID", "K01", "K02"]
        );
        assert_eq!(binder.exposed_at(fx.config[0].into()), None);
    }

    #[test]
    fn staged_binding_succeeds_like_partial() {
        let mut fx = fixture();
        let mut binder = InstanceBinder::new(fx.cells.clone());
        let mut backing = HashMap::new();
        backing.insert("SUBSTANCE_ID".to_string(), CellRef::from(fx.substance));
        backing.insert("K01".to_string(), fx.config[0].into());
        backing.insert("K02".to_string(), fx.config[1].into());
        let inst = binder
            .instantiate_staged(&mut fx.space, &fx.model, ns0::OBJECTS_FOLDER, "Config", &backing)
            .unwrap();
        assert!(unbound_fields(&fx.space, &fx.model, inst.node).is_empty());
        assert_eq!(read_f64(&fx.space, inst.slot("K01").unwrap()), 1.0);
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let mut fx = fixture();
        let mut binder = InstanceBinder::new(fx.cells.clone());
        let backing = [
            ("SUBSTANCE_ID", CellRef::from(fx.config[0])),
            ("K01", fx.config[0].into()),
            ("K02", fx.config[1].into()),
        ];
        let err = binder
            .instantiate(&mut fx.space, &fx.model, ns0::OBJECTS_FOLDER, "Config", &backing)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::KindMismatch {
                instance: "Config".into(),
                field: "SUBSTANCE_ID".into(),
                declared: "uint32",
                actual: "double",
            }
        );
    }

    #[test]
    fn a_cell_is_exposed_at_most_once() {
        let mut fx = fixture();
        let mut binder = InstanceBinder::new(fx.cells.clone());
        let backing = [
            ("SUBSTANCE_ID", CellRef::from(fx.substance)),
            ("K01", fx.config[0].into()),
            ("K02", fx.config[1].into()),
        ];
        let first = binder
            .instantiate(&mut fx.space, &fx.model, ns0::OBJECTS_FOLDER, "A", &backing)
            .unwrap();
        let err = binder
            .instantiate(&mut fx.space, &fx.model, ns0::OBJECTS_FOLDER, "B", &backing)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::CellAliased {
                field: "SUBSTANCE_ID".into(),
                existing: first.slot("SUBSTANCE_ID").unwrap(),
            }
        );

        let same_cell_twice = [
            ("SUBSTANCE_ID", CellRef::from(fx.substance)),
            ("K01", fx.config[0].into()),
            ("K02", fx.config[0].into()),
        ];
        let mut fresh = InstanceBinder::new(fx.cells.clone());
        let err = fresh
            .instantiate_staged(
                &mut fx.space,
                &fx.model,
                ns0::OBJECTS_FOLDER,
                "C",
                &same_cell_twice,
            )
            .unwrap_err();
        assert!(matches!(err, BindError::CellAliased { ref field, .. } if field == "K02"));
    }

    #[test]
    fn duplicate_instance_name_fails_creation() {
        let mut fx = fixture();
        let mut binder = InstanceBinder::new(fx.cells.clone());
        let backing = [
            ("SUBSTANCE_ID", CellRef::from(fx.substance)),
            ("K01", fx.config[0].into()),
            ("K02", fx.config[1].into()),
        ];
        binder
            .instantiate(&mut fx.space, &fx.model, ns0::OBJECTS_FOLDER, "Config", &backing)
            .unwrap();
        let err = binder
            .instantiate_staged(&mut fx.space, &fx.model, ns0::OBJECTS_FOLDER, "Config", &backing)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::Creation {
                name: "Config".into(),
                status: StatusCode::BAD_BROWSE_NAME_DUPLICATED
            }
        );
    }
}
