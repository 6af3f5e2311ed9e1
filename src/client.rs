//! Typed wrappers for every Sensibo endpoint.

use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::ClientConfig;
use crate::credential::ApiKey;
use crate::endpoint::{ApiVersion, Endpoint};
use crate::error::{ApiError, BuildError};
use crate::http::{HttpClient, JsonObject};
use crate::model::{SensiboData, parse_devices};

/// `fields` value that requests every field of a pod.
pub const ALL_FIELDS: &str = "*";

/// Reason sent with property changes that only correct the cloud's idea of
/// the AC state instead of sending an IR command.
const ASSUMED_STATE_REASON: &str = "StateCorrectionByUser";

/// Sensor offsets for `set_calibration`. Unset values are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Calibration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
}

/// Operations offered by the Sensibo cloud API.
///
/// Every call returns the decoded response object, or the `ApiError` that
/// ended it after retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SensiboApi: Send + Sync {
    async fn get_me(&self) -> Result<JsonObject, ApiError>;
    async fn get_devices(&self, fields: &str) -> Result<JsonObject, ApiError>;
    async fn get_devices_data(&self) -> Result<SensiboData, ApiError>;
    async fn get_device(&self, uid: &str, fields: &str) -> Result<JsonObject, ApiError>;
    async fn reset_filter(&self, uid: &str) -> Result<JsonObject, ApiError>;

    async fn get_climate_react(&self, uid: &str) -> Result<JsonObject, ApiError>;
    async fn enable_climate_react(&self, uid: &str, enabled: bool) -> Result<JsonObject, ApiError>;
    async fn set_climate_react(&self, uid: &str, data: &Value) -> Result<JsonObject, ApiError>;

    async fn get_timer(&self, uid: &str) -> Result<JsonObject, ApiError>;
    async fn set_timer(&self, uid: &str, data: &Value) -> Result<JsonObject, ApiError>;
    async fn delete_timer(&self, uid: &str) -> Result<JsonObject, ApiError>;

    async fn get_schedules(&self, uid: &str) -> Result<JsonObject, ApiError>;
    async fn get_schedule(&self, uid: &str, schedule_id: &str) -> Result<JsonObject, ApiError>;
    async fn set_schedule(&self, uid: &str, data: &Value) -> Result<JsonObject, ApiError>;
    async fn enable_schedule(
        &self,
        uid: &str,
        schedule_id: &str,
        enabled: bool,
    ) -> Result<JsonObject, ApiError>;
    async fn delete_schedule(&self, uid: &str, schedule_id: &str) -> Result<JsonObject, ApiError>;

    async fn set_calibration(
        &self,
        uid: &str,
        calibration: &Calibration,
    ) -> Result<JsonObject, ApiError>;
    async fn set_pure_boost(&self, uid: &str, data: &Value) -> Result<JsonObject, ApiError>;

    /// Replaces the whole AC state.
    async fn set_ac_states(&self, uid: &str, ac_state: &JsonObject) -> Result<JsonObject, ApiError>;

    /// Changes one AC-state property. With `assumed_state` the cloud record is
    /// corrected without sending a command to the AC.
    async fn set_ac_state_property(
        &self,
        uid: &str,
        name: &str,
        value: &Value,
        ac_state: &JsonObject,
        assumed_state: bool,
    ) -> Result<JsonObject, ApiError>;
}

/// Cloud client backed by [`HttpClient`].
#[derive(Clone)]
pub struct SensiboClient {
    http: HttpClient,
}

impl SensiboClient {
    #[tracing::instrument(skip(api_key, config))]
    pub fn new(api_key: ApiKey, config: &ClientConfig) -> Result<Self, BuildError> {
        Ok(Self {
            http: HttpClient::new(config, api_key)?,
        })
    }

    pub fn with_http(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    async fn call(&self, endpoint: Endpoint) -> Result<JsonObject, ApiError> {
        self.http.execute(&endpoint, None).await
    }

    async fn call_with(&self, endpoint: Endpoint, body: Value) -> Result<JsonObject, ApiError> {
        self.http.execute(&endpoint, Some(&body)).await
    }
}

fn pod(endpoint: Endpoint, uid: &str) -> Endpoint {
    endpoint.param("uid", uid)
}

fn schedule(endpoint: Endpoint, uid: &str, schedule_id: &str) -> Endpoint {
    endpoint.param("uid", uid).param("schedule_id", schedule_id)
}

#[async_trait]
impl SensiboApi for SensiboClient {
    #[tracing::instrument(skip(self))]
    async fn get_me(&self) -> Result<JsonObject, ApiError> {
        self.call(Endpoint::get(ApiVersion::V1, "/users/me")).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_devices(&self, fields: &str) -> Result<JsonObject, ApiError> {
        self.call(Endpoint::get(ApiVersion::V2, "/users/me/pods").query("fields", fields))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_devices_data(&self) -> Result<SensiboData, ApiError> {
        let raw = self.get_devices(ALL_FIELDS).await?;
        let parsed = parse_devices(&raw)?;
        debug!("Parsed {} devices", parsed.len());
        Ok(SensiboData { raw, parsed })
    }

    #[tracing::instrument(skip(self))]
    async fn get_device(&self, uid: &str, fields: &str) -> Result<JsonObject, ApiError> {
        let endpoint = pod(Endpoint::get(ApiVersion::V2, "/pods/{uid}"), uid).query("fields", fields);
        self.call(endpoint).await
    }

    #[tracing::instrument(skip(self))]
    async fn reset_filter(&self, uid: &str) -> Result<JsonObject, ApiError> {
        let endpoint = Endpoint::delete(ApiVersion::V2, "/pods/{uid}/cleanFiltersNotification");
        self.call(pod(endpoint, uid)).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_climate_react(&self, uid: &str) -> Result<JsonObject, ApiError> {
        self.call(pod(Endpoint::get(ApiVersion::V2, "/pods/{uid}/smartmode"), uid))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn enable_climate_react(&self, uid: &str, enabled: bool) -> Result<JsonObject, ApiError> {
        let endpoint = pod(Endpoint::put(ApiVersion::V2, "/pods/{uid}/smartmode"), uid);
        self.call_with(endpoint, json!({ "enabled": enabled })).await
    }

    #[tracing::instrument(skip(self, data))]
    async fn set_climate_react(&self, uid: &str, data: &Value) -> Result<JsonObject, ApiError> {
        let endpoint = pod(Endpoint::post(ApiVersion::V2, "/pods/{uid}/smartmode"), uid);
        self.call_with(endpoint, data.clone()).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_timer(&self, uid: &str) -> Result<JsonObject, ApiError> {
        self.call(pod(Endpoint::get(ApiVersion::V1, "/pods/{uid}/timer/"), uid))
            .await
    }

    #[tracing::instrument(skip(self, data))]
    async fn set_timer(&self, uid: &str, data: &Value) -> Result<JsonObject, ApiError> {
        let endpoint = pod(Endpoint::put(ApiVersion::V1, "/pods/{uid}/timer/"), uid);
        self.call_with(endpoint, data.clone()).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_timer(&self, uid: &str) -> Result<JsonObject, ApiError> {
        self.call(pod(Endpoint::delete(ApiVersion::V1, "/pods/{uid}/timer/"), uid))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_schedules(&self, uid: &str) -> Result<JsonObject, ApiError> {
        self.call(pod(Endpoint::get(ApiVersion::V1, "/pods/{uid}/schedules/"), uid))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_schedule(&self, uid: &str, schedule_id: &str) -> Result<JsonObject, ApiError> {
        let endpoint = Endpoint::get(ApiVersion::V1, "/pods/{uid}/schedules/{schedule_id}");
        self.call(schedule(endpoint, uid, schedule_id)).await
    }

    #[tracing::instrument(skip(self, data))]
    async fn set_schedule(&self, uid: &str, data: &Value) -> Result<JsonObject, ApiError> {
        let endpoint = pod(Endpoint::post(ApiVersion::V1, "/pods/{uid}/schedules/"), uid);
        self.call_with(endpoint, data.clone()).await
    }

    #[tracing::instrument(skip(self))]
    async fn enable_schedule(
        &self,
        uid: &str,
        schedule_id: &str,
        enabled: bool,
    ) -> Result<JsonObject, ApiError> {
        let endpoint = Endpoint::put(ApiVersion::V1, "/pods/{uid}/schedules/{schedule_id}");
        self.call_with(
            schedule(endpoint, uid, schedule_id),
            json!({ "isEnabled": enabled }),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_schedule(&self, uid: &str, schedule_id: &str) -> Result<JsonObject, ApiError> {
        let endpoint = Endpoint::delete(ApiVersion::V1, "/pods/{uid}/schedules/{schedule_id}");
        self.call(schedule(endpoint, uid, schedule_id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn set_calibration(
        &self,
        uid: &str,
        calibration: &Calibration,
    ) -> Result<JsonObject, ApiError> {
        let endpoint = pod(Endpoint::post(ApiVersion::V2, "/pods/{uid}/calibration/"), uid);
        let body = serde_json::to_value(calibration)
            .map_err(|e| ApiError::decode(None, format!("Could not encode calibration: {}", e)))?;
        self.call_with(endpoint, body).await
    }

    #[tracing::instrument(skip(self, data))]
    async fn set_pure_boost(&self, uid: &str, data: &Value) -> Result<JsonObject, ApiError> {
        let endpoint = pod(Endpoint::put(ApiVersion::V2, "/pods/{uid}/pureboost"), uid);
        self.call_with(endpoint, data.clone()).await
    }

    #[tracing::instrument(skip(self, ac_state))]
    async fn set_ac_states(&self, uid: &str, ac_state: &JsonObject) -> Result<JsonObject, ApiError> {
        let endpoint = pod(Endpoint::post(ApiVersion::V2, "/pods/{uid}/acStates"), uid);
        self.call_with(endpoint, json!({ "acState": ac_state })).await
    }

    #[tracing::instrument(skip(self, ac_state))]
    async fn set_ac_state_property(
        &self,
        uid: &str,
        name: &str,
        value: &Value,
        ac_state: &JsonObject,
        assumed_state: bool,
    ) -> Result<JsonObject, ApiError> {
        let endpoint = pod(Endpoint::patch(ApiVersion::V2, "/pods/{uid}/acStates/{name}"), uid)
            .param("name", name);

        let mut body = JsonObject::new();
        body.insert("currentAcState".to_string(), Value::Object(ac_state.clone()));
        body.insert("newValue".to_string(), value.clone());
        if assumed_state {
            body.insert("reason".to_string(), Value::from(ASSUMED_STATE_REASON));
        }

        self.call_with(endpoint, Value::Object(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryConfig;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use std::time::Duration;

    fn client_for(server: &Server) -> SensiboClient {
        let config = ClientConfig::default()
            .with_base_url(server.url())
            .with_retry(RetryConfig {
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(10),
                ..RetryConfig::default()
            });
        SensiboClient::new(ApiKey::new("secret"), &config).unwrap()
    }

    async fn ok_mock(server: &mut ServerGuard, method: &str, path: &str) -> Mock {
        server
            .mock(method, path)
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"status": "success", "result": {}}"#)
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_get_me() {
        let mut server = Server::new_async().await;
        let mock = ok_mock(&mut server, "GET", "/api/v1/users/me").await;

        let result = client_for(&server).get_me().await.unwrap();

        mock.assert_async().await;
        assert_eq!(result["status"], "success");
    }

    #[tokio::test]
    async fn test_get_devices_sends_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/users/me/pods")
            .match_query(Matcher::UrlEncoded("fields".into(), "id,room".into()))
            .with_status(200)
            .with_body(r#"{"result": []}"#)
            .expect(1)
            .create_async()
            .await;

        client_for(&server).get_devices("id,room").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_devices_data_parses_pods() {
        let mut server = Server::new_async().await;
        let body = json!({
            "status": "success",
            "result": [{
                "id": "ABC999111",
                "room": {"name": "Hallway"},
                "location": {"id": "L1", "name": "Home"},
                "measurements": {"temperature": 21.2, "humidity": 38},
                "acState": {"on": true, "mode": "cool", "targetTemperature": 21},
                "connectionStatus": {"isAlive": true},
                "remoteCapabilities": {"modes": {"cool": {"temperatures": {"C": {"values": [18, 20, 22]}}}}},
                "temperatureUnit": "C",
                "firmwareVersion": "SKY30046",
                "currentlyAvailableFirmwareVersion": "SKY30046",
                "firmwareType": "esp8266ex",
                "productModel": "skyv2"
            }]
        });
        let mock = server
            .mock("GET", "/api/v2/users/me/pods")
            .match_query(Matcher::UrlEncoded("fields".into(), "*".into()))
            .with_status(200)
            .with_body(body.to_string())
            .expect(1)
            .create_async()
            .await;

        let data = client_for(&server).get_devices_data().await.unwrap();

        mock.assert_async().await;
        assert!(data.raw.contains_key("result"));
        let device = &data.parsed["ABC999111"];
        assert_eq!(device.name, "Hallway");
        assert_eq!(device.temp_step, 2);
        assert_eq!(device.hvac_modes, vec!["cool", "off"]);
        assert!(!device.update_available);
    }

    #[tokio::test]
    async fn test_get_devices_data_without_result() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/users/me/pods")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "success"}"#)
            .create_async()
            .await;

        let err = client_for(&server).get_devices_data().await.unwrap_err();

        assert!(err.is_decode_failure());
    }

    #[tokio::test]
    async fn test_get_device() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/pods/ABC")
            .match_query(Matcher::UrlEncoded("fields".into(), "*".into()))
            .with_status(200)
            .with_body(r#"{"result": {"id": "ABC"}}"#)
            .expect(1)
            .create_async()
            .await;

        let result = client_for(&server).get_device("ABC", ALL_FIELDS).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result["result"]["id"], "ABC");
    }

    #[tokio::test]
    async fn test_reset_filter() {
        let mut server = Server::new_async().await;
        let mock = ok_mock(&mut server, "DELETE", "/api/v2/pods/ABC/cleanFiltersNotification").await;

        client_for(&server).reset_filter("ABC").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_climate_react_endpoints() {
        let mut server = Server::new_async().await;
        let get = ok_mock(&mut server, "GET", "/api/v2/pods/ABC/smartmode").await;
        let enable = server
            .mock("PUT", "/api/v2/pods/ABC/smartmode")
            .match_body(Matcher::Json(json!({"enabled": false})))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let set = server
            .mock("POST", "/api/v2/pods/ABC/smartmode")
            .match_body(Matcher::Json(json!({"enabled": true, "type": "temperature"})))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        client.get_climate_react("ABC").await.unwrap();
        client.enable_climate_react("ABC", false).await.unwrap();
        client
            .set_climate_react("ABC", &json!({"enabled": true, "type": "temperature"}))
            .await
            .unwrap();

        get.assert_async().await;
        enable.assert_async().await;
        set.assert_async().await;
    }

    #[tokio::test]
    async fn test_timer_endpoints() {
        let mut server = Server::new_async().await;
        let get = ok_mock(&mut server, "GET", "/api/v1/pods/ABC/timer/").await;
        let set = server
            .mock("PUT", "/api/v1/pods/ABC/timer/")
            .match_body(Matcher::Json(json!({"minutesFromNow": 30, "acState": {"on": false}})))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let delete = ok_mock(&mut server, "DELETE", "/api/v1/pods/ABC/timer/").await;

        let client = client_for(&server);
        client.get_timer("ABC").await.unwrap();
        client
            .set_timer("ABC", &json!({"minutesFromNow": 30, "acState": {"on": false}}))
            .await
            .unwrap();
        client.delete_timer("ABC").await.unwrap();

        get.assert_async().await;
        set.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_schedule_endpoints() {
        let mut server = Server::new_async().await;
        let list = ok_mock(&mut server, "GET", "/api/v1/pods/ABC/schedules/").await;
        let one = ok_mock(&mut server, "GET", "/api/v1/pods/ABC/schedules/11").await;
        let create = server
            .mock("POST", "/api/v1/pods/ABC/schedules/")
            .match_body(Matcher::PartialJson(json!({"targetTimeLocal": "17:40"})))
            .with_status(201)
            .with_body(r#"{"result": {"id": "12"}}"#)
            .expect(1)
            .create_async()
            .await;
        let enable = server
            .mock("PUT", "/api/v1/pods/ABC/schedules/11")
            .match_body(Matcher::Json(json!({"isEnabled": true})))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let delete = ok_mock(&mut server, "DELETE", "/api/v1/pods/ABC/schedules/11").await;

        let client = client_for(&server);
        client.get_schedules("ABC").await.unwrap();
        client.get_schedule("ABC", "11").await.unwrap();
        let created = client
            .set_schedule("ABC", &json!({"targetTimeLocal": "17:40", "recurOnDaysOfWeek": ["monday"]}))
            .await
            .unwrap();
        client.enable_schedule("ABC", "11", true).await.unwrap();
        client.delete_schedule("ABC", "11").await.unwrap();

        list.assert_async().await;
        one.assert_async().await;
        create.assert_async().await;
        enable.assert_async().await;
        delete.assert_async().await;
        assert_eq!(created["result"]["id"], "12");
    }

    #[tokio::test]
    async fn test_set_calibration_omits_unset_values() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/pods/ABC/calibration/")
            .match_body(Matcher::Json(json!({"temperature": 0.5})))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let calibration = Calibration {
            temperature: Some(0.5),
            humidity: None,
        };
        client_for(&server)
            .set_calibration("ABC", &calibration)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_pure_boost() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v2/pods/ABC/pureboost")
            .match_body(Matcher::Json(json!({"enabled": true, "sensitivity": "S"})))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        client_for(&server)
            .set_pure_boost("ABC", &json!({"enabled": true, "sensitivity": "S"}))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_ac_states_wraps_state() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/pods/ABC/acStates")
            .match_body(Matcher::Json(json!({"acState": {"on": true, "mode": "cool"}})))
            .with_status(200)
            .with_body(r#"{"result": {"status": "Success"}}"#)
            .expect(1)
            .create_async()
            .await;

        let state = json!({"on": true, "mode": "cool"});
        client_for(&server)
            .set_ac_states("ABC", state.as_object().unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_ac_state_property() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/api/v2/pods/ABC/acStates/targetTemperature")
            .match_body(Matcher::Json(json!({
                "currentAcState": {"on": true, "targetTemperature": 21},
                "newValue": 23
            })))
            .with_status(200)
            .with_body(r#"{"result": {"status": "Success"}}"#)
            .expect(1)
            .create_async()
            .await;

        let state = json!({"on": true, "targetTemperature": 21});
        client_for(&server)
            .set_ac_state_property("ABC", "targetTemperature", &json!(23), state.as_object().unwrap(), false)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_ac_state_property_assumed() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/api/v2/pods/ABC/acStates/on")
            .match_body(Matcher::Json(json!({
                "currentAcState": {"on": true},
                "newValue": false,
                "reason": "StateCorrectionByUser"
            })))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let state = json!({"on": true});
        client_for(&server)
            .set_ac_state_property("ABC", "on", &json!(false), state.as_object().unwrap(), true)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_device_id_is_escaped() {
        let mut server = Server::new_async().await;
        let mock = ok_mock(&mut server, "GET", "/api/v1/pods/a%2Fb/timer/").await;

        client_for(&server).get_timer("a/b").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_endpoint_error_passes_through() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/v1/pods/ABC/timer/")
            .with_status(404)
            .with_body("timer not found")
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server).delete_timer("ABC").await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ApiError::NotFound { .. }));
    }
}
