//! Wire pods to `SensiboDevice`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use serde_json::Value;

use super::wire::{ModeCapabilitiesWire, PodWire, TemperatureValuesWire};
use super::{MotionSensor, PureAqi, Schedule, SensiboDevice};
use crate::error::ApiError;
use crate::http::JsonObject;

/// Upper bound for the temperature step when a mode lists a single value.
const MAX_POSSIBLE_STEP: i64 = 1000;

const PURE_MODEL: &str = "pure";
const FILTER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const TARGET_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses every pod under `result` in a pods payload.
pub fn parse_devices(data: &JsonObject) -> Result<BTreeMap<String, SensiboDevice>, ApiError> {
    let Some(result) = data.get("result") else {
        warn!("No result in data from devices");
        debug!("Data without result: {:?}", data);
        return Err(ApiError::decode(None, "No result in data"));
    };

    let pods: Vec<PodWire> = serde_json::from_value(result.clone())
        .map_err(|e| ApiError::decode(None, format!("Could not parse devices: {}", e)))?;

    pods.into_iter()
        .map(|pod| parse_device(pod).map(|device| (device.id.clone(), device)))
        .collect()
}

/// Derives a typed device from one pod.
pub fn parse_device(pod: PodWire) -> Result<SensiboDevice, ApiError> {
    let is_pure = pod.product_model == PURE_MODEL;
    let measure = &pod.measurements;
    let ac_state = &pod.ac_state;

    let mut temperature = number(measure, "temperature");
    let mut humidity = number(measure, "humidity");
    // A main motion sensor replaces the pod's own climate readings.
    if let Some(main) = pod.main_measurements_sensor.as_ref() {
        temperature = number(&main.measurements, "temperature");
        humidity = number(&main.measurements, "humidity");
    }

    let capabilities = pod.remote_capabilities.clone().unwrap_or_default();
    let modes = capabilities.get("modes").and_then(Value::as_object);

    let mut hvac_modes: Vec<String> = modes.map(|m| m.keys().cloned().collect()).unwrap_or_default();
    if hvac_modes.is_empty() {
        warn!(
            "Device {} not correctly registered with remote on Sensibo cloud.",
            pod.room.name
        );
    }
    hvac_modes.push("off".to_string());

    let hvac_mode = string(ac_state, "mode");
    let state = hvac_mode.clone().unwrap_or_else(|| "off".to_string());

    let current = match (modes, hvac_mode.as_deref()) {
        (Some(modes), Some(mode)) => match modes.get(mode) {
            Some(value) => serde_json::from_value::<ModeCapabilitiesWire>(value.clone())
                .map_err(|e| ApiError::decode(None, format!("Invalid capabilities for mode {}: {}", mode, e)))?,
            None => ModeCapabilitiesWire::default(),
        },
        _ => ModeCapabilitiesWire::default(),
    };

    let (fan_modes, fan_modes_translated) = translate(current.fan_levels.clone());
    let (swing_modes, swing_modes_translated) = translate(current.swing.clone());
    let (horizontal_swing_modes, horizontal_swing_modes_translated) =
        translate(current.horizontal_swing.clone());
    let (light_modes, light_modes_translated) = translate(current.light.clone());

    let temp_unit = pod
        .temperature_unit
        .clone()
        .filter(|u| !u.is_empty())
        .or_else(|| string(ac_state, "temperatureUnit"));
    let temp_list = temperature_values(&current, temp_unit.as_deref());
    let temp_step = temperature_step(&temp_list);

    let motion_sensors = pod
        .motion_sensors
        .iter()
        .flatten()
        .map(|sensor| {
            let m = &sensor.measurements;
            let parsed = MotionSensor {
                id: sensor.id.clone(),
                alive: sensor.connection_status.is_alive,
                motion: boolean(m, "motion"),
                fw_ver: sensor.firmware_version.clone(),
                fw_type: sensor.firmware_type.clone(),
                is_main_sensor: sensor.is_main_sensor,
                battery_voltage: integer(m, "batteryVoltage"),
                humidity: number(m, "humidity"),
                temperature: number(m, "temperature"),
                model: sensor.product_model.clone(),
                rssi: integer(m, "rssi"),
            };
            (sensor.id.clone(), parsed)
        })
        .collect();

    let pure_conf = pod.pure_boost_config.clone().unwrap_or_default();
    let mut pure = PureSettings::default();
    let mut pm25 = None;
    let mut pm25_pure = None;
    if is_pure {
        pure = PureSettings::from_conf(&pure_conf);
        pm25_pure = integer(measure, "pm25").and_then(|value| match PureAqi::try_from(value) {
            Ok(aqi) => Some(aqi),
            Err(other) => {
                warn!("Device {} reported unknown AQI level {}", pod.id, other);
                None
            }
        });
    } else {
        pm25 = number(measure, "pm25");
    }

    let filters = pod.filters_cleaning.as_ref();
    let filter_clean = filters.and_then(|f| f.should_clean_filters).unwrap_or(false);
    let filter_last_reset = filters
        .and_then(|f| f.last_filters_clean_time.as_ref())
        .and_then(|t| t.time.as_deref())
        .map(|s| parse_utc(s, FILTER_TIME_FORMAT))
        .transpose()?;

    let (mut timer_on, mut timer_id, mut timer_state_on, mut timer_time) = (None, None, None, None);
    if !is_pure {
        let timer = pod.timer.as_ref();
        timer_on = Some(timer.and_then(|t| t.is_enabled).unwrap_or(false));
        timer_id = timer.and_then(|t| t.id.clone());
        timer_state_on = timer
            .and_then(|t| t.ac_state.as_ref())
            .and_then(|s| boolean(s, "on"));
        timer_time = timer
            .and_then(|t| t.target_time.as_deref())
            .map(|s| parse_utc(s, TARGET_TIME_FORMAT))
            .transpose()?;
    }

    let smart = pod.smart_mode.as_ref();
    let smart_on = (!is_pure).then(|| smart.and_then(|s| s.enabled).unwrap_or(false));
    let smart_type = smart.and_then(|s| s.kind.as_deref()).map(str::to_lowercase);
    let smart_low_state = smart
        .and_then(|s| s.low_temperature_state.as_ref())
        .map(lowercase_state)
        .unwrap_or_default();
    let smart_high_state = smart
        .and_then(|s| s.high_temperature_state.as_ref())
        .map(lowercase_state)
        .unwrap_or_default();

    let mut schedules = BTreeMap::new();
    for schedule in pod.schedules.iter().flatten() {
        let parsed = Schedule {
            id: schedule.id.clone(),
            enabled: schedule.is_enabled,
            name: schedule.name.clone(),
            state_on: boolean(&schedule.ac_state, "on"),
            state_full: lowercase_state(&schedule.ac_state),
            days: schedule.recurring_days.iter().map(|d| d.to_lowercase()).collect(),
            time: schedule.target_time_local.clone(),
            next_utc: parse_utc(&schedule.next_time, TARGET_TIME_FORMAT)?,
        };
        schedules.insert(schedule.id.clone(), parsed);
    }

    let anti_mold = pod.anti_mold_config.as_ref();
    let update_available =
        pod.currently_available_firmware_version.as_deref() != Some(pod.firmware_version.as_str());

    Ok(SensiboDevice {
        id: pod.id.clone(),
        mac: pod.mac_address.clone(),
        serial: pod.serial.clone(),
        name: pod.room.name.clone(),
        ac_states: ac_state.clone(),
        temp: temperature,
        feelslike: number(measure, "feelsLike"),
        humidity,
        pm25,
        pm25_pure,
        tvoc: integer(measure, "tvoc"),
        co2: integer(measure, "co2"),
        etoh: number(measure, "etoh"),
        iaq: integer(measure, "iaq"),
        rcda: number(measure, "rcda"),
        target_temp: integer(ac_state, "targetTemperature"),
        hvac_mode,
        device_on: boolean(ac_state, "on"),
        fan_mode: string(ac_state, "fanLevel").map(|s| s.to_lowercase()),
        swing_mode: string(ac_state, "swing").map(|s| s.to_lowercase()),
        horizontal_swing_mode: string(ac_state, "horizontalSwing").map(|s| s.to_lowercase()),
        light_mode: string(ac_state, "light").map(|s| s.to_lowercase()),
        available: pod.connection_status.is_alive.unwrap_or(true),
        hvac_modes,
        state,
        fan_modes,
        fan_modes_translated,
        swing_modes,
        swing_modes_translated,
        horizontal_swing_modes,
        horizontal_swing_modes_translated,
        light_modes,
        light_modes_translated,
        temp_unit,
        temp_list,
        temp_step,
        active_features: ac_state.keys().cloned().collect(),
        full_features: full_features(modes),
        full_capabilities: capabilities.clone(),
        fw_ver: pod.firmware_version.clone(),
        fw_ver_available: pod.currently_available_firmware_version.clone(),
        fw_type: pod.firmware_type.clone(),
        update_available,
        model: pod.product_model.clone(),
        calibration_temp: pod.sensors_calibration.temperature,
        calibration_hum: pod.sensors_calibration.humidity,
        motion_sensors,
        room_occupied: pod.room_is_occupied,
        schedules,
        pure_boost_enabled: pure.boost_enabled,
        pure_sensitivity: pure.sensitivity,
        pure_ac_integration: pure.ac_integration,
        pure_geo_integration: pure.geo_integration,
        pure_measure_integration: pure.measure_integration,
        pure_prime_integration: pure.prime_integration,
        pure_conf,
        timer_on,
        timer_id,
        timer_state_on,
        timer_time,
        smart_on,
        smart_type,
        smart_low_temp_threshold: smart.and_then(|s| s.low_temperature_threshold),
        smart_high_temp_threshold: smart.and_then(|s| s.high_temperature_threshold),
        smart_low_state,
        smart_high_state,
        filter_clean,
        filter_last_reset,
        location_id: pod.location.id.clone(),
        location_name: pod.location.name.clone(),
        anti_mold_running: anti_mold.and_then(|c| boolean(c, "anti_mold_running")),
        anti_mold_enabled: anti_mold.and_then(|c| boolean(c, "anti_mold_enabled")),
        anti_mold_fan_time: anti_mold.and_then(|c| integer(c, "fan_time")),
        auto_off: pod.auto_off_enabled,
        auto_off_minutes: pod.auto_off_minutes,
    })
}

#[derive(Debug, Default)]
struct PureSettings {
    boost_enabled: Option<bool>,
    sensitivity: Option<String>,
    ac_integration: Option<bool>,
    geo_integration: Option<bool>,
    measure_integration: Option<bool>,
    prime_integration: Option<bool>,
}

impl PureSettings {
    fn from_conf(conf: &JsonObject) -> Self {
        let flag = |key: &str| Some(boolean(conf, key).unwrap_or(false));
        Self {
            boost_enabled: flag("enabled"),
            sensitivity: Some(
                string(conf, "sensitivity")
                    .unwrap_or_else(|| "n".to_string())
                    .to_lowercase(),
            ),
            ac_integration: flag("ac_integration"),
            geo_integration: flag("geo_integration"),
            measure_integration: flag("measurements_integration"),
            prime_integration: flag("prime_integration"),
        }
    }
}

/// Lowercased list plus a lowercase-to-original lookup. Empty lists get no lookup.
fn translate(modes: Option<Vec<String>>) -> (Option<Vec<String>>, Option<BTreeMap<String, String>>) {
    match modes {
        Some(modes) if !modes.is_empty() => {
            let translated = modes.iter().map(|m| (m.to_lowercase(), m.clone())).collect();
            let lowered = modes.iter().map(|m| m.to_lowercase()).collect();
            (Some(lowered), Some(translated))
        }
        other => (other, None),
    }
}

fn temperature_values(current: &ModeCapabilitiesWire, unit: Option<&str>) -> Vec<i64> {
    current
        .temperatures
        .as_ref()
        .zip(unit)
        .and_then(|(temps, unit)| temps.get(unit))
        .and_then(|v| match serde_json::from_value::<TemperatureValuesWire>(v.clone()) {
            Ok(t) => t.values,
            Err(e) => {
                warn!("Unreadable temperature values {}: {}", v, e);
                None
            }
        })
        .unwrap_or_else(|| vec![0, 1])
}

/// Smallest gap between consecutive temperatures.
fn temperature_step(values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    values
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(MAX_POSSIBLE_STEP, i64::min)
}

fn full_features(modes: Option<&JsonObject>) -> BTreeSet<String> {
    const FEATURES: [(&str, &str); 5] = [
        ("temperatures", "targetTemperature"),
        ("swing", "swing"),
        ("fanLevels", "fanLevel"),
        ("horizontalSwing", "horizontalSwing"),
        ("light", "light"),
    ];

    let mut features = BTreeSet::new();
    for mode in modes.into_iter().flat_map(|m| m.values()).filter_map(Value::as_object) {
        for (capability, feature) in FEATURES {
            if mode.contains_key(capability) {
                features.insert(feature.to_string());
            }
        }
    }
    features
}

/// Lowercases keys and string values of an AC state.
fn lowercase_state(state: &JsonObject) -> JsonObject {
    state
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => Value::String(s.to_lowercase()),
                other => other.clone(),
            };
            (key.to_lowercase(), value)
        })
        .collect()
}

fn parse_utc(value: &str, format: &str) -> Result<DateTime<Utc>, ApiError> {
    NaiveDateTime::parse_from_str(value, format)
        .map(|dt| dt.and_utc())
        .map_err(|e| ApiError::decode(None, format!("Invalid time {:?}: {}", value, e)))
}

fn number(map: &JsonObject, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

fn integer(map: &JsonObject, key: &str) -> Option<i64> {
    map.get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
}

fn boolean(map: &JsonObject, key: &str) -> Option<bool> {
    map.get(key).and_then(Value::as_bool)
}

fn string(map: &JsonObject, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}
