//! Integration tests for cf-space: value-source dispatch.

use std::sync::{Arc, Mutex};

use cf_core::{CellRef, CellStore};
use cf_space::{
    AccessLevel, AddressSpace, DataValue, FieldAccess, NodeId, NumericRange, StatusCode,
    ValueKind, ValueSource, Variant, ns0,
};

/// Records what the address space hands to its value source.
#[derive(Debug, Default, Clone)]
struct Recorder {
    seen: Arc<Mutex<Vec<(NodeId, Option<String>, Option<CellRef>)>>>,
    value: Arc<Mutex<f64>>,
}

impl ValueSource for Recorder {
    fn kind(&self) -> ValueKind {
        ValueKind::Double
    }

    fn read(
        &self,
        field: &FieldAccess<'_>,
        _range: Option<&NumericRange>,
        include_source_timestamp: bool,
    ) -> Result<DataValue, StatusCode> {
        self.seen.lock().unwrap().push((
            field.node,
            field.browse_name.map(|b| b.name.clone()),
            field.context,
        ));
        let v = *self.value.lock().unwrap();
        Ok(DataValue::new(v).stamped(include_source_timestamp))
    }

    fn write(
        &self,
        _field: &FieldAccess<'_>,
        _range: Option<&NumericRange>,
        value: &DataValue,
    ) -> Result<(), StatusCode> {
        let v = value
            .value
            .as_ref()
            .and_then(Variant::as_f64)
            .ok_or(StatusCode::BAD_TYPE_MISMATCH)?;
        *self.value.lock().unwrap() = v;
        Ok(())
    }
}

fn valve(space: &mut AddressSpace) -> NodeId {
    let ty = space
        .add_object_type(Some(NodeId::numeric(1, 1005)), "ValveHandleControlType")
        .unwrap();
    let out = space
        .add_type_variable(
            ty,
            "MANUAL_OUTPUT",
            ValueKind::Double,
            AccessLevel::READ_WRITE,
        )
        .unwrap();
    space.add_mandatory(out).unwrap();
    let folder = space.add_folder(ns0::OBJECTS_FOLDER, "Valves").unwrap();
    let obj = space.create_entity(folder, ty, "HC-1").unwrap();
    space.resolve_child(obj, "MANUAL_OUTPUT").unwrap()
}

#[test]
fn read_and_write_go_through_the_source_with_context() {
    let mut space = AddressSpace::new();
    let slot = valve(&mut space);

    let mut store = CellStore::new();
    let cell: CellRef = store.alloc_f64(0.0).into();

    let recorder = Recorder::default();
    space.bind_context(slot, Some(cell)).unwrap();
    space
        .set_value_source(slot, Box::new(recorder.clone()))
        .unwrap();
    assert!(space.node(slot).unwrap().is_bound());

    assert_eq!(
        space.write(slot, None, &DataValue::new(42.0)),
        StatusCode::GOOD
    );
    let dv = space.read(slot, None, true);
    assert_eq!(dv.value, Some(Variant::Double(42.0)));
    assert!(dv.source_timestamp.is_some());

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, slot);
    assert_eq!(seen[0].1.as_deref(), Some("MANUAL_OUTPUT"));
    assert_eq!(seen[0].2, Some(cell));
}

#[test]
fn source_kind_must_match_variable_kind() {
    #[derive(Debug)]
    struct Text;
    impl ValueSource for Text {
        fn kind(&self) -> ValueKind {
            ValueKind::String
        }
        fn read(
            &self,
            _: &FieldAccess<'_>,
            _: Option<&NumericRange>,
            _: bool,
        ) -> Result<DataValue, StatusCode> {
            Ok(DataValue::new(Variant::String("x".into())))
        }
        fn write(
            &self,
            _: &FieldAccess<'_>,
            _: Option<&NumericRange>,
            _: &DataValue,
        ) -> Result<(), StatusCode> {
            Ok(())
        }
    }

    let mut space = AddressSpace::new();
    let slot = valve(&mut space);
    assert_eq!(
        space.set_value_source(slot, Box::new(Text)),
        Err(StatusCode::BAD_TYPE_MISMATCH)
    );
    assert!(!space.node(slot).unwrap().is_bound());
}

#[test]
fn clearing_a_source_unbinds_the_slot() {
    let mut space = AddressSpace::new();
    let slot = valve(&mut space);
    space
        .set_value_source(slot, Box::new(Recorder::default()))
        .unwrap();
    space.clear_value_source(slot).unwrap();
    assert_eq!(
        space.read(slot, None, false).status,
        StatusCode::BAD_WAITING_FOR_INITIAL_DATA
    );
}

#[test]
fn context_binding_requires_a_variable() {
    let mut space = AddressSpace::new();
    assert_eq!(
        space.bind_context(ns0::OBJECTS_FOLDER, None),
        Err(StatusCode::BAD_NODE_CLASS_INVALID)
    );
}
