use anyhow::{Context, Result};
use futures_util::future::try_join_all;
use log::debug;
use std::io::Write;

use super::print_json;
use crate::client::SensiboApi;
use crate::model::SensiboDevice;

/// Prints the account behind the API key.
#[tracing::instrument(skip(api, out))]
pub async fn me<A: SensiboApi>(api: &A, out: &mut impl Write) -> Result<()> {
    let result = api.get_me().await.context("Failed to fetch account")?;
    print_json(out, &result)
}

/// Prints the raw pods payload.
#[tracing::instrument(skip(api, out))]
pub async fn devices<A: SensiboApi>(api: &A, fields: &str, out: &mut impl Write) -> Result<()> {
    let result = api.get_devices(fields).await.context("Failed to fetch devices")?;
    print_json(out, &result)
}

/// Fetches several devices concurrently and prints them in argument order.
#[tracing::instrument(skip(api, out))]
pub async fn device<A: SensiboApi>(
    api: &A,
    uids: &[String],
    fields: &str,
    out: &mut impl Write,
) -> Result<()> {
    let results = try_join_all(uids.iter().map(|uid| async move {
        api.get_device(uid, fields)
            .await
            .with_context(|| format!("Failed to fetch device {}", uid))
    }))
    .await?;

    for result in &results {
        print_json(out, result)?;
    }
    Ok(())
}

/// Prints one summary line per device.
#[tracing::instrument(skip(api, out))]
pub async fn status<A: SensiboApi>(api: &A, out: &mut impl Write) -> Result<()> {
    let data = api
        .get_devices_data()
        .await
        .context("Failed to fetch devices")?;

    if data.parsed.is_empty() {
        writeln!(out, "No devices found.")?;
        return Ok(());
    }

    debug!("Found {} device(s)", data.parsed.len());
    for device in data.parsed.values() {
        writeln!(out, "{}", summary_line(device))?;
    }
    Ok(())
}

fn summary_line(device: &SensiboDevice) -> String {
    let unit = device.temp_unit.as_deref().unwrap_or("");
    let power = match device.device_on {
        Some(true) => "on",
        Some(false) => "off",
        None => "-",
    };

    let mut line = format!(
        "{}  {}  {} {}",
        device.id,
        device.name,
        power,
        device.hvac_mode.as_deref().unwrap_or("-"),
    );
    if let Some(target) = device.target_temp {
        line.push_str(&format!("  target {}{}", target, unit));
    }
    if let Some(temp) = device.temp {
        line.push_str(&format!("  temp {:.1}{}", temp, unit));
    }
    if let Some(humidity) = device.humidity {
        line.push_str(&format!("  humidity {:.0}%", humidity));
    }
    if let Some(aqi) = device.pm25_pure {
        line.push_str(&format!("  air {}", aqi));
    }
    if device.filter_clean {
        line.push_str("  [clean filter]");
    }
    if !device.available {
        line.push_str("  [offline]");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockSensiboApi;
    use crate::error::ApiError;
    use crate::http::JsonObject;
    use crate::model::{SensiboData, parse_device};
    use mockall::predicate::eq;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    fn sample_device(id: &str, name: &str) -> SensiboDevice {
        let pod = json!({
            "id": id,
            "room": {"name": name},
            "location": {"id": "L1", "name": "Home"},
            "measurements": {"temperature": 21.24, "humidity": 38.4},
            "acState": {"on": true, "mode": "cool", "targetTemperature": 22},
            "temperatureUnit": "C",
            "firmwareVersion": "SKY30046",
            "firmwareType": "esp8266ex",
            "productModel": "skyv2",
            "filtersCleaning": {"shouldCleanFilters": true}
        });
        parse_device(serde_json::from_value(pod).unwrap()).unwrap()
    }

    fn output(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_me_prints_json() {
        let mut api = MockSensiboApi::new();
        api.expect_get_me()
            .times(1)
            .returning(|| Ok(object(json!({"result": {"username": "jane"}}))));

        let mut out = Vec::new();
        me(&api, &mut out).await.unwrap();

        assert!(output(out).contains("\"username\": \"jane\""));
    }

    #[test_log::test(tokio::test)]
    async fn test_me_auth_failure_has_context() {
        let mut api = MockSensiboApi::new();
        api.expect_get_me()
            .returning(|| Err(ApiError::AuthenticationFailed { status: 401 }));

        let mut out = Vec::new();
        let err = me(&api, &mut out).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch account");
        assert!(err.root_cause().to_string().contains("Authentication failed"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_devices_passes_fields() {
        let mut api = MockSensiboApi::new();
        api.expect_get_devices()
            .with(eq("id,room"))
            .times(1)
            .returning(|_| Ok(object(json!({"result": []}))));

        let mut out = Vec::new();
        devices(&api, "id,room", &mut out).await.unwrap();

        assert!(output(out).contains("\"result\": []"));
    }

    #[tokio::test]
    async fn test_device_prints_in_argument_order() {
        let mut api = MockSensiboApi::new();
        api.expect_get_device()
            .times(2)
            .returning(|uid, _| Ok(object(json!({"result": {"id": uid}}))));

        let uids = vec!["BBB".to_string(), "AAA".to_string()];
        let mut out = Vec::new();
        device(&api, &uids, "*", &mut out).await.unwrap();

        let text = output(out);
        assert!(text.find("BBB").unwrap() < text.find("AAA").unwrap());
    }

    #[tokio::test]
    async fn test_device_failure_names_device() {
        let mut api = MockSensiboApi::new();
        api.expect_get_device()
            .with(eq("AAA"), eq("*"))
            .returning(|_, _| Ok(JsonObject::new()));
        api.expect_get_device()
            .with(eq("MISSING"), eq("*"))
            .returning(|_, _| {
                Err(ApiError::NotFound {
                    body: "no such pod".to_string(),
                })
            });

        let uids = vec!["AAA".to_string(), "MISSING".to_string()];
        let mut out = Vec::new();
        let err = device(&api, &uids, "*", &mut out).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch device MISSING");
    }

    #[tokio::test]
    async fn test_status_one_line_per_device() {
        let mut api = MockSensiboApi::new();
        api.expect_get_devices_data().times(1).returning(|| {
            let mut parsed = BTreeMap::new();
            parsed.insert("AAA".to_string(), sample_device("AAA", "Bedroom"));
            parsed.insert("BBB".to_string(), sample_device("BBB", "Office"));
            Ok(SensiboData {
                raw: JsonObject::new(),
                parsed,
            })
        });

        let mut out = Vec::new();
        status(&api, &mut out).await.unwrap();

        let text = output(out);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "AAA  Bedroom  on cool  target 22C  temp 21.2C  humidity 38%  [clean filter]"
        );
        assert!(lines[1].starts_with("BBB  Office"));
    }

    #[tokio::test]
    async fn test_status_without_devices() {
        let mut api = MockSensiboApi::new();
        api.expect_get_devices_data().returning(|| {
            Ok(SensiboData {
                raw: JsonObject::new(),
                parsed: BTreeMap::new(),
            })
        });

        let mut out = Vec::new();
        status(&api, &mut out).await.unwrap();

        assert_eq!(output(out), "No devices found.\n");
    }

    #[test]
    fn test_summary_line_offline_device() {
        let mut device = sample_device("AAA", "Bedroom");
        device.available = false;
        device.filter_clean = false;
        device.device_on = None;
        device.hvac_mode = None;
        device.target_temp = None;

        assert_eq!(
            summary_line(&device),
            "AAA  Bedroom  - -  temp 21.2C  humidity 38%  [offline]"
        );
    }
}
