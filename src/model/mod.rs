//! Typed device records parsed from the pods payload.

mod convert;
pub mod wire;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::JsonObject;

pub use convert::{parse_device, parse_devices};

/// Raw pods payload alongside the parsed devices, keyed by device id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensiboData {
    pub raw: JsonObject,
    pub parsed: BTreeMap<String, SensiboDevice>,
}

/// One Sensibo device (pod) with its state, capabilities and settings.
///
/// Mode names (fan, swing, light) are lowercased; the `*_translated` maps
/// give back the spelling the API expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensiboDevice {
    pub id: String,
    pub mac: Option<String>,
    pub serial: Option<String>,
    pub name: String,
    pub ac_states: JsonObject,

    pub temp: Option<f64>,
    pub feelslike: Option<f64>,
    pub humidity: Option<f64>,
    pub pm25: Option<f64>,
    pub pm25_pure: Option<PureAqi>,
    pub tvoc: Option<i64>,
    pub co2: Option<i64>,
    pub etoh: Option<f64>,
    pub iaq: Option<i64>,
    pub rcda: Option<f64>,

    pub target_temp: Option<i64>,
    pub hvac_mode: Option<String>,
    pub device_on: Option<bool>,
    pub fan_mode: Option<String>,
    pub swing_mode: Option<String>,
    pub horizontal_swing_mode: Option<String>,
    pub light_mode: Option<String>,
    pub available: bool,
    pub hvac_modes: Vec<String>,
    /// Current mode, or `"off"`.
    pub state: String,

    pub fan_modes: Option<Vec<String>>,
    pub fan_modes_translated: Option<BTreeMap<String, String>>,
    pub swing_modes: Option<Vec<String>>,
    pub swing_modes_translated: Option<BTreeMap<String, String>>,
    pub horizontal_swing_modes: Option<Vec<String>>,
    pub horizontal_swing_modes_translated: Option<BTreeMap<String, String>>,
    pub light_modes: Option<Vec<String>>,
    pub light_modes_translated: Option<BTreeMap<String, String>>,

    pub temp_unit: Option<String>,
    pub temp_list: Vec<i64>,
    pub temp_step: i64,

    pub active_features: Vec<String>,
    pub full_features: BTreeSet<String>,
    pub full_capabilities: JsonObject,

    pub fw_ver: String,
    pub fw_ver_available: Option<String>,
    pub fw_type: String,
    pub update_available: bool,
    pub model: String,

    pub calibration_temp: Option<f64>,
    pub calibration_hum: Option<f64>,

    pub motion_sensors: BTreeMap<String, MotionSensor>,
    /// Only reported when motion sensors are attached.
    pub room_occupied: Option<bool>,

    pub schedules: BTreeMap<String, Schedule>,

    // Pure devices only
    pub pure_boost_enabled: Option<bool>,
    pub pure_sensitivity: Option<String>,
    pub pure_ac_integration: Option<bool>,
    pub pure_geo_integration: Option<bool>,
    pub pure_measure_integration: Option<bool>,
    pub pure_prime_integration: Option<bool>,
    pub pure_conf: JsonObject,

    pub timer_on: Option<bool>,
    pub timer_id: Option<String>,
    pub timer_state_on: Option<bool>,
    pub timer_time: Option<DateTime<Utc>>,

    // Climate React
    pub smart_on: Option<bool>,
    pub smart_type: Option<String>,
    pub smart_low_temp_threshold: Option<f64>,
    pub smart_high_temp_threshold: Option<f64>,
    pub smart_low_state: JsonObject,
    pub smart_high_state: JsonObject,

    pub filter_clean: bool,
    pub filter_last_reset: Option<DateTime<Utc>>,

    pub location_id: String,
    pub location_name: String,

    pub anti_mold_running: Option<bool>,
    pub anti_mold_enabled: Option<bool>,
    pub anti_mold_fan_time: Option<i64>,
    pub auto_off: bool,
    pub auto_off_minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionSensor {
    pub id: String,
    pub alive: Option<bool>,
    pub motion: Option<bool>,
    pub fw_ver: Option<String>,
    pub fw_type: Option<String>,
    pub is_main_sensor: Option<bool>,
    pub battery_voltage: Option<i64>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub model: Option<String>,
    pub rssi: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    pub id: String,
    pub enabled: bool,
    pub name: Option<String>,
    pub state_on: Option<bool>,
    pub state_full: JsonObject,
    pub days: Vec<String>,
    pub time: String,
    pub next_utc: DateTime<Utc>,
}

/// Air quality level reported by Pure devices in place of a PM2.5 reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PureAqi {
    Unknown = 0,
    Good = 1,
    Moderate = 2,
    Bad = 3,
}

impl TryFrom<i64> for PureAqi {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PureAqi::Unknown),
            1 => Ok(PureAqi::Good),
            2 => Ok(PureAqi::Moderate),
            3 => Ok(PureAqi::Bad),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for PureAqi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PureAqi::Unknown => "unknown",
            PureAqi::Good => "good",
            PureAqi::Moderate => "moderate",
            PureAqi::Bad => "bad",
        };
        write!(f, "{}", name)
    }
}
