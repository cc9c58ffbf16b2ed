//! Values carried across the protocol boundary.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::StatusCode;

/// Built-in scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Boolean,
    Int32,
    UInt32,
    Float,
    Double,
    String,
}

/// A dynamically typed value: a scalar or a one-dimensional array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    Boolean(bool),
    Int32(i32),
    UInt32(u32),
    Float(f32),
    Double(f64),
    String(String),
    Array(Vec<Variant>),
}

impl Variant {
    /// Kind of a scalar; `None` for arrays.
    pub fn scalar_kind(&self) -> Option<ValueKind> {
        match self {
            Variant::Boolean(_) => Some(ValueKind::Boolean),
            Variant::Int32(_) => Some(ValueKind::Int32),
            Variant::UInt32(_) => Some(ValueKind::UInt32),
            Variant::Float(_) => Some(ValueKind::Float),
            Variant::Double(_) => Some(ValueKind::Double),
            Variant::String(_) => Some(ValueKind::String),
            Variant::Array(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Double(v)
    }
}

impl From<u32> for Variant {
    fn from(v: u32) -> Self {
        Variant::UInt32(v)
    }
}

/// A value with its status and timestamps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Variant>,
    #[serde(default)]
    pub status: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl DataValue {
    /// A good value without timestamps, as sent by a writing client.
    pub fn new(value: impl Into<Variant>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// A value container carrying only a bad status.
    pub fn bad(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Stamp with the server clock and, when requested, the source clock.
    pub fn stamped(mut self, include_source_timestamp: bool) -> Self {
        let now = Utc::now();
        if include_source_timestamp {
            self.source_timestamp = Some(now);
        }
        self.server_timestamp = Some(now);
        self
    }
}

/// Index range addressing into array values, e.g. `"2"` or `"0:3,1"`.
///
/// The plant exposes scalars only, so any non-empty range is rejected by the
/// value sources.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NumericRange {
    pub dimensions: Vec<(u32, u32)>,
}

impl NumericRange {
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed index range '{input}'")]
pub struct RangeParseError {
    pub input: String,
}

impl FromStr for NumericRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || RangeParseError {
            input: s.to_string(),
        };
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut dimensions = Vec::new();
        for dim in s.split(',') {
            let (lo, hi) = match dim.split_once(':') {
                Some((lo, hi)) => (lo, hi),
                None => (dim, dim),
            };
            let lo = lo.trim().parse::<u32>().map_err(|_| err())?;
            let hi = hi.trim().parse::<u32>().map_err(|_| err())?;
            if hi < lo {
                return Err(err());
            }
            dimensions.push((lo, hi));
        }
        Ok(Self { dimensions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_kinds() {
        assert_eq!(Variant::Double(1.0).scalar_kind(), Some(ValueKind::Double));
        assert_eq!(Variant::UInt32(1).scalar_kind(), Some(ValueKind::UInt32));
        assert_eq!(
            Variant::Array(vec![Variant::Double(1.0)]).scalar_kind(),
            None
        );
    }

    #[test]
    fn stamped_sets_requested_timestamps() {
        let dv = DataValue::new(1.0).stamped(false);
        assert!(dv.server_timestamp.is_some());
        assert!(dv.source_timestamp.is_none());

        let dv = DataValue::new(1.0).stamped(true);
        assert!(dv.source_timestamp.is_some());
    }

    #[test]
    fn parse_ranges() {
        assert!("".parse::<NumericRange>().unwrap().is_empty());
        let r: NumericRange = "2".parse().unwrap();
        assert_eq!(r.dimensions, vec![(2, 2)]);
        let r: NumericRange = "0:3,1".parse().unwrap();
        assert_eq!(r.dimensions, vec![(0, 3), (1, 1)]);
        assert!("3:1".parse::<NumericRange>().is_err());
        assert!("a".parse::<NumericRange>().is_err());
    }

    #[test]
    fn data_value_json_shape() {
        let json = serde_json::to_string(&DataValue::new(2.5)).unwrap();
        assert_eq!(json, r#"{"value":{"Double":2.5},"status":0}"#);
    }
}
