use cf_bind::{InstanceBinder, TypeRegistry};
use cf_model::schema::{self, fields};
use cf_model::{Engine, KineticsValues, ModelContext, PlantBuilder, TickOutcome};
use cf_space::{AddressSpace, DataValue, StatusCode, Variant, ns0};

#[test]
fn client_writes_drive_the_next_tick() {
    let mut b = PlantBuilder::new("Config", KineticsValues::default());
    let context = ModelContext {
        reactor: b.reactor("1-F", 100.0),
        flow_sensor: b.sensor("FRA-1"),
        temperature_sensor: b.sensor("TRA-1"),
        inlet_sensor: b.sensor("CRA-1"),
        outlet_sensor: b.sensor("CRA-2"),
        concentration_valve: b.actuator("HC-1", 0.0),
        flow_valve: b.actuator("HC-2", 0.0),
        temperature_valve: b.actuator("HC-3", 0.0),
    };
    let plant = b.build();
    let engine = Engine::new(context);

    let mut space = AddressSpace::new();
    let mut registry = TypeRegistry::new();
    for spec in schema::all() {
        registry.declare_type(&mut space, spec).unwrap();
    }
    let mut binder = InstanceBinder::new(plant.cells().clone());
    let sensor_type = registry.get(schema::SENSOR_TYPE).unwrap().clone();
    let valve_type = registry.get(schema::VALVE_TYPE).unwrap().clone();
    for (_, sensor) in plant.sensors() {
        binder
            .instantiate(&mut space, &sensor_type, ns0::OBJECTS_FOLDER, &sensor.name, sensor)
            .unwrap();
    }
    for (_, valve) in plant.actuators() {
        binder
            .instantiate(&mut space, &valve_type, ns0::OBJECTS_FOLDER, &valve.name, valve)
            .unwrap();
    }

    let slot = |entity: &str, field: &str| space.resolve_path(&[entity, field]).unwrap();
    for (valve, value) in [("HC-1", 50.0), ("HC-2", 70.0), ("HC-3", 100.0)] {
        let status = space.write(slot(valve, fields::MANUAL_OUTPUT), None, &DataValue::new(value));
        assert_eq!(status, StatusCode::GOOD);
    }
    let rejected = space.write(
        slot("HC-2", fields::MANUAL_OUTPUT),
        None,
        &DataValue::new(f64::NAN),
    );
    assert_eq!(rejected, StatusCode::BAD_OUT_OF_RANGE);

    let report = engine.tick(&plant).unwrap();
    assert_eq!(report.outlet, TickOutcome::Published(0.0));

    let read = |entity: &str| space.read(slot(entity, fields::PROCESS_VALUE), None, false).value;
    assert_eq!(read("FRA-1"), Some(Variant::Double(144.0)));
    assert_eq!(read("TRA-1"), Some(Variant::Double(16.0)));
    assert_eq!(read("CRA-2"), Some(Variant::Double(0.0)));
    match read("CRA-1") {
        Some(Variant::Double(ca)) => assert!((ca - 0.357_142_857).abs() < 1e-9),
        other => panic!("unexpected {other:?}"),
    }
}
