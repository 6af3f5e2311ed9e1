//! Serde shapes of the `/users/me/pods` payload.
//!
//! Free-form sections (AC state, measurements, capabilities) stay as JSON
//! objects; only the fields the parser relies on are typed.

use serde::Deserialize;

use crate::http::JsonObject;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PodWire {
    pub id: String,
    pub mac_address: Option<String>,
    pub serial: Option<String>,
    pub room: RoomWire,
    pub location: LocationWire,
    #[serde(default)]
    pub measurements: JsonObject,
    #[serde(default)]
    pub ac_state: JsonObject,
    #[serde(default)]
    pub connection_status: ConnectionStatusWire,
    pub remote_capabilities: Option<JsonObject>,
    pub temperature_unit: Option<String>,
    pub firmware_version: String,
    pub currently_available_firmware_version: Option<String>,
    pub firmware_type: String,
    pub product_model: String,
    #[serde(default)]
    pub sensors_calibration: CalibrationWire,
    pub main_measurements_sensor: Option<MainSensorWire>,
    pub motion_sensors: Option<Vec<MotionSensorWire>>,
    pub pure_boost_config: Option<JsonObject>,
    pub room_is_occupied: Option<bool>,
    pub filters_cleaning: Option<FiltersCleaningWire>,
    pub timer: Option<TimerWire>,
    pub smart_mode: Option<SmartModeWire>,
    pub schedules: Option<Vec<ScheduleWire>>,
    pub anti_mold_config: Option<JsonObject>,
    #[serde(default)]
    pub auto_off_enabled: bool,
    pub auto_off_minutes: Option<i64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RoomWire {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LocationWire {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusWire {
    pub is_alive: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CalibrationWire {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MainSensorWire {
    #[serde(default)]
    pub measurements: JsonObject,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MotionSensorWire {
    pub id: String,
    #[serde(default)]
    pub connection_status: ConnectionStatusWire,
    #[serde(default)]
    pub measurements: JsonObject,
    pub firmware_version: Option<String>,
    pub firmware_type: Option<String>,
    pub is_main_sensor: Option<bool>,
    pub product_model: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FiltersCleaningWire {
    pub should_clean_filters: Option<bool>,
    pub last_filters_clean_time: Option<TimeWire>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TimeWire {
    pub time: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimerWire {
    pub id: Option<String>,
    pub is_enabled: Option<bool>,
    pub ac_state: Option<JsonObject>,
    pub target_time: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SmartModeWire {
    pub enabled: Option<bool>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub low_temperature_threshold: Option<f64>,
    pub high_temperature_threshold: Option<f64>,
    pub low_temperature_state: Option<JsonObject>,
    pub high_temperature_state: Option<JsonObject>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWire {
    pub id: String,
    pub is_enabled: bool,
    pub name: Option<String>,
    #[serde(default)]
    pub ac_state: JsonObject,
    #[serde(default)]
    pub recurring_days: Vec<String>,
    pub target_time_local: String,
    pub next_time: String,
}

/// Capabilities of a single HVAC mode.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModeCapabilitiesWire {
    pub temperatures: Option<JsonObject>,
    pub fan_levels: Option<Vec<String>>,
    pub swing: Option<Vec<String>>,
    pub horizontal_swing: Option<Vec<String>>,
    pub light: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct TemperatureValuesWire {
    pub values: Option<Vec<i64>>,
}
