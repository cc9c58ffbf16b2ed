//! Assembly of the reactor server: plant, address space, bindings and tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cf_bind::{FieldBacking, Instance, InstanceBinder, TypeRegistry};
use cf_model::schema;
use cf_model::{Engine, ModelContext, Plant, PlantBuilder, TickOutcome};
use cf_space::{AddressSpace, NodeClass, NodeId, ReferenceKind, Scheduler, TaskId, ns0};
use tracing::{debug, info, warn};

use crate::config::PlantConfig;
use crate::error::{AppError, AppResult};
use crate::service::{self, Request, Response};

pub const MODEL_FOLDER: &str = "Model";
pub const VALVES_FOLDER: &str = "Valves";
pub const SENSORS_FOLDER: &str = "Sensors";
pub const REACTORS_FOLDER: &str = "Reactors";

/// A fully bound plant with its periodic model tick.
#[derive(Debug)]
pub struct ReactorServer {
    space: AddressSpace,
    plant: Plant,
    registry: TypeRegistry,
    instances: Vec<Instance>,
    scheduler: Scheduler,
    tick_task: TaskId,
    ticks: Arc<AtomicU64>,
}

fn plant_from(config: &PlantConfig) -> (Plant, ModelContext) {
    let mut b = PlantBuilder::new(config.model.name.clone(), config.model.kinetics);
    let s = &config.sensors;
    let v = &config.valves;
    let context = ModelContext {
        reactor: b.reactor(config.reactor.name.clone(), config.reactor.volume),
        flow_sensor: b.sensor(s.flow.clone()),
        temperature_sensor: b.sensor(s.temperature.clone()),
        inlet_sensor: b.sensor(s.inlet_concentration.clone()),
        outlet_sensor: b.sensor(s.outlet_concentration.clone()),
        concentration_valve: b.actuator(v.concentration.clone(), 0.0),
        flow_valve: b.actuator(v.flow.clone(), 0.0),
        temperature_valve: b.actuator(v.temperature.clone(), 0.0),
    };
    (b.build(), context)
}

impl ReactorServer {
    /// Build the server and register the model tick, first due one period
    /// after `now`.
    ///
    /// Any binding failure aborts the build.
    pub fn build(config: &PlantConfig, now: Instant) -> AppResult<Self> {
        config.validate()?;
        let (plant, context) = plant_from(config);
        let engine = Engine::new(context);
        engine.context().validate(&plant)?;

        let mut space = AddressSpace::new();
        let mut registry = TypeRegistry::new();
        for spec in schema::all() {
            registry.declare_type(&mut space, spec)?;
        }

        let mut folder = |name: &str| {
            space
                .add_folder(ns0::OBJECTS_FOLDER, name)
                .map_err(|status| AppError::Folder {
                    name: name.to_string(),
                    status,
                })
        };
        let model_folder = folder(MODEL_FOLDER)?;
        let valves_folder = folder(VALVES_FOLDER)?;
        let sensors_folder = folder(SENSORS_FOLDER)?;
        let reactors_folder = folder(REACTORS_FOLDER)?;

        let mut binder = InstanceBinder::new(plant.cells().clone());
        let mut instances = Vec::new();
        let mut bind = |space: &mut AddressSpace,
                        kind: &str,
                        parent: NodeId,
                        name: &str,
                        backing: &dyn FieldBacking|
         -> AppResult<()> {
            let descriptor = registry.get(kind)?;
            instances.push(binder.instantiate_staged(space, descriptor, parent, name, backing)?);
            Ok(())
        };

        for (_, reactor) in plant.reactors() {
            let backing = reactor as &dyn FieldBacking;
            bind(&mut space, schema::REACTOR_TYPE, reactors_folder, &reactor.name, backing)?;
        }
        for (_, sensor) in plant.sensors() {
            let backing = sensor as &dyn FieldBacking;
            bind(&mut space, schema::SENSOR_TYPE, sensors_folder, &sensor.name, backing)?;
        }
        for (_, valve) in plant.actuators() {
            let backing = valve as &dyn FieldBacking;
            bind(&mut space, schema::VALVE_TYPE, valves_folder, &valve.name, backing)?;
        }
        let kinetics = plant.kinetics();
        let backing = kinetics as &dyn FieldBacking;
        bind(&mut space, schema::MODEL_TYPE, model_folder, &kinetics.name, backing)?;

        let ticks = Arc::new(AtomicU64::new(0));
        let mut scheduler = Scheduler::new();
        let tick_task = {
            let plant = plant.clone();
            let ticks = ticks.clone();
            scheduler
                .register_periodic(
                    Duration::from_millis(config.tick_period_ms),
                    now,
                    move || run_tick(&engine, &plant, &ticks),
                )
                .map_err(AppError::Schedule)?
        };

        info!(
            nodes = space.len(),
            instances = instances.len(),
            period_ms = config.tick_period_ms,
            "reactor server ready"
        );
        Ok(Self {
            space,
            plant,
            registry,
            instances,
            scheduler,
            tick_task,
            ticks,
        })
    }

    pub fn space(&self) -> &AddressSpace {
        &self.space
    }

    pub fn plant(&self) -> &Plant {
        &self.plant
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Number of completed model ticks.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Run the model tick if it is due.
    pub fn run_pending(&mut self, now: Instant) -> usize {
        self.scheduler.run_pending(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn handle(&self, request: &Request) -> Response {
        service::handle(&self.space, request)
    }

    pub fn handle_line(&self, line: &str) -> String {
        service::handle_line(&self.space, line)
    }

    /// Stop the model tick and drop every entity.
    pub fn shutdown(mut self) {
        self.scheduler.remove(self.tick_task);
        info!(
            ticks = self.tick_count(),
            instances = self.instances.len(),
            "reactor server released"
        );
    }

    /// Indented listing of the Objects hierarchy with current values.
    pub fn tree(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.walk(ns0::OBJECTS_FOLDER, 0, &mut lines);
        lines
    }

    fn walk(&self, id: NodeId, depth: usize, lines: &mut Vec<String>) {
        let Some(node) = self.space.node(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        let mut line = format!("{indent}{} ({id})", node.browse_name.name);
        if node.class == NodeClass::Variable {
            let dv = self.space.read(id, None, false);
            match dv.value {
                Some(value) => line.push_str(&format!(" = {value:?}")),
                None => line.push_str(&format!(" [{}]", dv.status.name())),
            }
        }
        lines.push(line);
        let children: Vec<NodeId> = node
            .references
            .iter()
            .filter(|r| matches!(r.kind, ReferenceKind::Organizes | ReferenceKind::HasComponent))
            .map(|r| r.target)
            .collect();
        for child in children {
            self.walk(child, depth + 1, lines);
        }
    }
}

fn run_tick(engine: &Engine, plant: &Plant, ticks: &AtomicU64) {
    match engine.tick(plant) {
        Ok(report) => {
            let n = ticks.fetch_add(1, Ordering::Relaxed) + 1;
            match report.outlet {
                TickOutcome::Published(cb) => debug!(
                    tick = n,
                    flow = report.flow,
                    temperature = report.temperature,
                    ca = report.inlet_concentration,
                    cb,
                    "model tick"
                ),
                TickOutcome::Retained(reason) => debug!(
                    tick = n,
                    flow = report.flow,
                    temperature = report.temperature,
                    ca = report.inlet_concentration,
                    ?reason,
                    "model tick, outlet retained"
                ),
            }
        }
        Err(err) => warn!(%err, "model tick failed"),
    }
}
