use anyhow::{Context, Result, anyhow};
use log::debug;
use serde_json::Value;
use std::io::Write;

use super::print_json;
use crate::client::SensiboApi;
use crate::http::JsonObject;

/// Changes one AC-state property, e.g. `targetTemperature 23` or `mode cool`.
///
/// `value` is read as JSON when it parses (numbers, booleans) and as a plain
/// string otherwise.
#[tracing::instrument(skip(api, out))]
pub async fn set<A: SensiboApi>(
    api: &A,
    uid: &str,
    property: &str,
    value: &str,
    assumed: bool,
    out: &mut impl Write,
) -> Result<()> {
    let value = parse_value(value);
    change_property(api, uid, property, &value, assumed, out).await
}

/// Turns a device on or off.
#[tracing::instrument(skip(api, out))]
pub async fn power<A: SensiboApi>(api: &A, uid: &str, on: bool, out: &mut impl Write) -> Result<()> {
    change_property(api, uid, "on", &Value::Bool(on), false, out).await
}

/// Clears the "clean filters" notification after a filter change.
#[tracing::instrument(skip(api, out))]
pub async fn reset_filter<A: SensiboApi>(api: &A, uid: &str, out: &mut impl Write) -> Result<()> {
    let result = api
        .reset_filter(uid)
        .await
        .with_context(|| format!("Failed to reset filter of {}", uid))?;
    print_json(out, &result)
}

async fn change_property<A: SensiboApi>(
    api: &A,
    uid: &str,
    property: &str,
    value: &Value,
    assumed: bool,
    out: &mut impl Write,
) -> Result<()> {
    let ac_state = current_ac_state(api, uid).await?;
    debug!("Setting {} of {} to {} from {:?}", property, uid, value, ac_state);

    let result = api
        .set_ac_state_property(uid, property, value, &ac_state, assumed)
        .await
        .with_context(|| format!("Failed to set {} of {}", property, uid))?;
    print_json(out, &result)
}

/// The API wants the state being changed alongside every property update.
async fn current_ac_state<A: SensiboApi>(api: &A, uid: &str) -> Result<JsonObject> {
    let device = api
        .get_device(uid, "acState")
        .await
        .with_context(|| format!("Failed to fetch device {}", uid))?;

    device
        .get("result")
        .and_then(|r| r.get("acState"))
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| anyhow!("Device {} did not report an AC state", uid))
}

fn parse_value(value: &str) -> Value {
    serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
}
