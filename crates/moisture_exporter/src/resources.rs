//! Resource model for the moisture monitor device.
//!
//! The device serves everything it knows at `/allResources` as a compact JSON
//! document with single-letter keys:
//!
//! ```json
//! {"pS":[{"i":0,"s":true}],"mS":[{"i":0,"v":3228,"n":41,"d":5392,"w":2808,"t":4651}]}
//! ```
//!
//! Decoding is permissive: unknown keys are ignored, and missing keys or
//! `null` values (fields, lists and list entries) fall back to zero values.

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;

/// On/off state of a single pump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PumpState {
    #[serde(rename = "i", deserialize_with = "null_as_default")]
    pub index: i64,

    #[serde(rename = "s", deserialize_with = "null_as_default")]
    pub on: bool,
}

/// Raw reading of a capacitive moisture sensor plus its calibration bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MoistureSensor {
    #[serde(rename = "i", deserialize_with = "null_as_default")]
    pub index: i64,

    /// Raw ADC reading. Negative when the probe is unplugged.
    #[serde(rename = "v", deserialize_with = "null_as_default")]
    pub value: i64,

    /// Plant the probe is stuck into
    #[serde(rename = "n", deserialize_with = "null_as_default")]
    pub plant_id: i64,

    /// Reading in dry air
    #[serde(rename = "d", deserialize_with = "null_as_default")]
    pub dry_calibration: i64,

    /// Reading in water
    #[serde(rename = "w", deserialize_with = "null_as_default")]
    pub wet_calibration: i64,

    /// Reading above which the device starts watering
    #[serde(rename = "t", deserialize_with = "null_as_default")]
    pub threshold: i64,
}

impl MoistureSensor {
    pub fn is_connected(&self) -> bool {
        self.value >= 0
    }
}

/// Everything the device reported in one `/allResources` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResourceSnapshot {
    #[serde(rename = "pS", deserialize_with = "null_items_as_default")]
    pub pumps: Vec<PumpState>,

    #[serde(rename = "mS", deserialize_with = "null_items_as_default")]
    pub sensors: Vec<MoistureSensor>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A `null` list is empty and a `null` entry is a zero-valued item
fn null_items_as_default<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(items
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid resource payload: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Parse the body of an `/allResources` response.
pub fn decode(bytes: &[u8]) -> Result<ResourceSnapshot, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

impl fmt::Display for PumpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.on { "ON" } else { "OFF" };
        write!(f, "pump: {} state: {}", self.index, state)
    }
}

impl fmt::Display for MoistureSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sensor: {} value: {} plant: {} dry: {} wet: {} threshold: {}",
            self.index,
            self.value,
            self.plant_id,
            self.dry_calibration,
            self.wet_calibration,
            self.threshold
        )
    }
}

impl fmt::Display for ResourceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .pumps
            .iter()
            .map(ToString::to_string)
            .chain(std::iter::once("---------".to_string()))
            .chain(self.sensors.iter().map(ToString::to_string))
            .collect();

        f.write_str(&lines.join("\n"))
    }
}
