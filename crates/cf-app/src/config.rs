//! Plant configuration file.
//!
//! Every field has a default matching the reference deployment, so an empty
//! file (or no file) yields a runnable plant.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use cf_model::KineticsValues;
use serde::{Deserialize, Serialize};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Duplicate name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorDef {
    pub name: String,
    /// Liters.
    pub volume: f64,
}

impl Default for ReactorDef {
    fn default() -> Self {
        Self {
            name: "1-F".into(),
            volume: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorNames {
    pub flow: String,
    pub temperature: String,
    pub inlet_concentration: String,
    pub outlet_concentration: String,
}

impl Default for SensorNames {
    fn default() -> Self {
        Self {
            flow: "FRA-1".into(),
            temperature: "TRA-1".into(),
            inlet_concentration: "CRA-1".into(),
            outlet_concentration: "CRA-2".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValveNames {
    pub concentration: String,
    pub flow: String,
    pub temperature: String,
}

impl Default for ValveNames {
    fn default() -> Self {
        Self {
            concentration: "HC-1".into(),
            flow: "HC-2".into(),
            temperature: "HC-3".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDef {
    pub name: String,
    pub kinetics: KineticsValues,
}

impl Default for ModelDef {
    fn default() -> Self {
        Self {
            name: "Config".into(),
            kinetics: KineticsValues::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub tick_period_ms: u64,
    /// `ip:port` of the JSON-lines endpoint; none disables it.
    pub listen: Option<String>,
    pub reactor: ReactorDef,
    pub sensors: SensorNames,
    pub valves: ValveNames,
    pub model: ModelDef,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1000,
            listen: None,
            reactor: ReactorDef::default(),
            sensors: SensorNames::default(),
            valves: ValveNames::default(),
            model: ModelDef::default(),
        }
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(field: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite"))
    }
}

fn unique<'a>(context: &str, names: impl IntoIterator<Item = &'a str>) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(invalid(context, "\"\"", "names must not be empty"));
        }
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateName {
                name: name.to_string(),
                context: context.to_string(),
            });
        }
    }
    Ok(())
}

impl PlantConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.tick_period_ms == 0 {
            return Err(invalid("tick_period_ms", 0, "must be positive"));
        }
        if let Some(addr) = &self.listen {
            addr.parse::<SocketAddr>()
                .map_err(|_| invalid("listen", addr, "expected ip:port"))?;
        }

        finite("reactor.volume", self.reactor.volume)?;
        let k = &self.model.kinetics;
        finite("model.kinetics.k01", k.k01)?;
        finite("model.kinetics.ea1", k.ea1)?;
        finite("model.kinetics.k02", k.k02)?;
        finite("model.kinetics.ea2", k.ea2)?;
        if !(k.gas_constant.is_finite() && k.gas_constant > 0.0) {
            return Err(invalid(
                "model.kinetics.gas_constant",
                k.gas_constant,
                "must be finite and positive",
            ));
        }

        let s = &self.sensors;
        unique(
            "sensors",
            [
                s.flow.as_str(),
                s.temperature.as_str(),
                s.inlet_concentration.as_str(),
                s.outlet_concentration.as_str(),
            ],
        )?;
        let v = &self.valves;
        unique(
            "valves",
            [
                v.concentration.as_str(),
                v.flow.as_str(),
                v.temperature.as_str(),
            ],
        )?;
        unique("reactors", [self.reactor.name.as_str()])?;
        unique("model", [self.model.name.as_str()])?;
        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: PlantConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

pub fn load_yaml(path: &Path) -> ConfigResult<PlantConfig> {
    let content = std::fs::read_to_string(path)?;
    PlantConfig::from_yaml_str(&content)
}
