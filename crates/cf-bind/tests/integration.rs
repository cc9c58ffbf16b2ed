use cf_bind::{AccessMode, FieldSpec, InstanceBinder, TypeRegistry, TypeSpec, unbound_fields};
use cf_core::{CellKind, CellRef, CellStore, SharedCells};
use cf_space::{AddressSpace, DataValue, NodeId, StatusCode, Variant, ns0};

fn sensor_type() -> TypeSpec {
    TypeSpec::new(
        "SensorType",
        vec![FieldSpec::mandatory(
            "PROCESS_VALUE",
            CellKind::Double,
            AccessMode::Read,
        )],
    )
    .with_node_id(NodeId::numeric(1, 1002))
}

fn valve_type() -> TypeSpec {
    TypeSpec::new(
        "ValveHandleControlType",
        vec![FieldSpec::mandatory(
            "MANUAL_OUTPUT",
            CellKind::Double,
            AccessMode::ReadWrite,
        )],
    )
    .with_node_id(NodeId::numeric(1, 1005))
}

#[test]
fn sensors_and_valves_share_one_cell_store() {
    let mut store = CellStore::new();
    let pv = store.alloc_f64(0.0);
    let out = store.alloc_f64(0.0);
    let cells = SharedCells::new(store);

    let mut space = AddressSpace::new();
    let mut registry = TypeRegistry::new();
    let sensor = registry.declare_type(&mut space, sensor_type()).unwrap();
    let valve = registry.declare_type(&mut space, valve_type()).unwrap();
    let sensors = space.add_folder(ns0::OBJECTS_FOLDER, "Sensors").unwrap();
    let valves = space.add_folder(ns0::OBJECTS_FOLDER, "Valves").unwrap();

    let mut binder = InstanceBinder::new(cells.clone());
    binder
        .instantiate(
            &mut space,
            &sensor,
            sensors,
            "FRA-1",
            &[("PROCESS_VALUE", CellRef::from(pv))],
        )
        .unwrap();
    binder
        .instantiate(
            &mut space,
            &valve,
            valves,
            "HC-2",
            &[("MANUAL_OUTPUT", CellRef::from(out))],
        )
        .unwrap();

    let pv_node = space
        .resolve_path(&["Sensors", "FRA-1", "PROCESS_VALUE"])
        .unwrap();
    let out_node = space
        .resolve_path(&["Valves", "HC-2", "MANUAL_OUTPUT"])
        .unwrap();

    // Valve outputs are client-writable, sensor values are not.
    assert_eq!(space.write(out_node, None, &DataValue::new(50.0)), StatusCode::GOOD);
    assert_eq!(
        space.write(pv_node, None, &DataValue::new(1.0)),
        StatusCode::BAD_NOT_WRITABLE
    );
    assert_eq!(cells.lock().unwrap().get_f64(out).unwrap(), 50.0);

    cells.lock().unwrap().set_f64(pv, 36.0).unwrap();
    let dv = space.read(pv_node, None, true);
    assert_eq!(dv.value, Some(Variant::Double(36.0)));
    assert!(dv.source_timestamp.is_some());
    assert!(dv.server_timestamp.is_some());
}

#[test]
fn template_members_follow_the_type_node() {
    let mut space = AddressSpace::new();
    let mut registry = TypeRegistry::new();
    let sensor = registry.declare_type(&mut space, sensor_type()).unwrap();

    let entity = space
        .create_entity(ns0::OBJECTS_FOLDER, sensor.type_node, "TRA-1")
        .unwrap();
    assert_eq!(unbound_fields(&space, &sensor, entity), vec!["PROCESS_VALUE"]);
}
