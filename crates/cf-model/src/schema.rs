//! Object types of the plant and their well-known node ids.

use cf_bind::{AccessMode, FieldSpec, TypeSpec};
use cf_core::CellKind;
use cf_space::{APP_NAMESPACE, NodeId};

/// Field browse names.
pub mod fields {
    pub const PROCESS_VALUE: &str = "PROCESS_VALUE";
    pub const REACTOR_VOLUME: &str = "REACTOR_VOLUME";
    pub const MANUAL_OUTPUT: &str = "MANUAL_OUTPUT";
    pub const SUBSTANCE_ID: &str = "SUBSTANCE_ID";
    pub const K01: &str = "K01";
    pub const K02: &str = "K02";
    pub const EA1: &str = "EA1";
    pub const EA2: &str = "EA2";
}

pub const SENSOR_TYPE: &str = "SensorType";
pub const REACTOR_TYPE: &str = "ReactorType";
pub const VALVE_TYPE: &str = "ValveHandleControlType";
pub const MODEL_TYPE: &str = "MathModelType";

pub const SENSOR_TYPE_ID: NodeId = NodeId::numeric(APP_NAMESPACE, 1002);
pub const REACTOR_TYPE_ID: NodeId = NodeId::numeric(APP_NAMESPACE, 1004);
pub const VALVE_TYPE_ID: NodeId = NodeId::numeric(APP_NAMESPACE, 1005);
pub const MODEL_TYPE_ID: NodeId = NodeId::numeric(APP_NAMESPACE, 1006);

pub fn sensor_type() -> TypeSpec {
    TypeSpec::new(
        SENSOR_TYPE,
        vec![FieldSpec::mandatory(
            fields::PROCESS_VALUE,
            CellKind::Double,
            AccessMode::Read,
        )],
    )
    .with_node_id(SENSOR_TYPE_ID)
}

pub fn reactor_type() -> TypeSpec {
    TypeSpec::new(
        REACTOR_TYPE,
        vec![FieldSpec::mandatory(
            fields::REACTOR_VOLUME,
            CellKind::Double,
            AccessMode::ReadWrite,
        )],
    )
    .with_node_id(REACTOR_TYPE_ID)
}

pub fn valve_type() -> TypeSpec {
    TypeSpec::new(
        VALVE_TYPE,
        vec![FieldSpec::mandatory(
            fields::MANUAL_OUTPUT,
            CellKind::Double,
            AccessMode::ReadWrite,
        )],
    )
    .with_node_id(VALVE_TYPE_ID)
}

pub fn model_type() -> TypeSpec {
    let rw = |name: &str, kind: CellKind| FieldSpec::mandatory(name, kind, AccessMode::ReadWrite);
    TypeSpec::new(
        MODEL_TYPE,
        vec![
            rw(fields::SUBSTANCE_ID, CellKind::UInt32),
            rw(fields::K01, CellKind::Double),
            rw(fields::K02, CellKind::Double),
            rw(fields::EA1, CellKind::Double),
            rw(fields::EA2, CellKind::Double),
        ],
    )
    .with_node_id(MODEL_TYPE_ID)
}

/// All plant types, in declaration order.
pub fn all() -> [TypeSpec; 4] {
    [sensor_type(), reactor_type(), valve_type(), model_type()]
}
