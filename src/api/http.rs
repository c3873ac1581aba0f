//! reqwest client for the charger vendor's REST API

use super::{ChargerApi, ChargerSnapshot, SessionsResponse, StatusResponse};
use crate::config::ApiConfig;
use crate::error::{ChargeSyncError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::session::SessionRecord;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::RwLock;

const REMOTE_ACTION_RESUME: u8 = 1;
const REMOTE_ACTION_PAUSE: u8 = 2;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    jwt: Option<String>,
}

/// Charger API over HTTPS with a bearer token obtained by `authenticate`
pub struct HttpChargerApi {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    token: RwLock<Option<String>>,
    logger: StructuredLogger,
}

impl HttpChargerApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            token: RwLock::new(None),
            logger: get_logger("api"),
        })
    }

    /// Whether a token is currently held
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, concat!("chargesync/", env!("CARGO_PKG_VERSION")))
    }

    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.token.read().await.clone().ok_or_else(|| {
            ChargeSyncError::auth("not authenticated; call authenticate first")
        })?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    /// Send and map the response status onto the error taxonomy
    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.logger
                .warn(&format!("Charger API rejected credentials: {}", status));
            return Err(ChargeSyncError::auth(format!(
                "charger API returned {}",
                status
            )));
        }
        if !status.is_success() {
            self.logger.error(&format!("Charger API error: {}", status));
            return Err(ChargeSyncError::fetch(format!(
                "charger API returned {}",
                status
            )));
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = self.send(req).await?;
        let body = resp.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| ChargeSyncError::data_shape(format!("undecodable response: {}", e)))
    }

    async fn send_unit(&self, req: RequestBuilder) -> Result<()> {
        self.send(req).await.map(|_| ())
    }

    async fn put_charger(&self, device_id: &str, body: serde_json::Value) -> Result<()> {
        let req = self
            .authorized(Method::PUT, &format!("/v2/charger/{}", device_id))
            .await?
            .json(&body);
        self.send_unit(req).await
    }

    async fn remote_action(&self, device_id: &str, action: u8) -> Result<()> {
        let req = self
            .authorized(
                Method::POST,
                &format!("/v3/chargers/{}/remote-action", device_id),
            )
            .await?
            .json(&json!({ "action": action }));
        self.send_unit(req).await
    }
}

#[async_trait]
impl ChargerApi for HttpChargerApi {
    async fn authenticate(&self) -> Result<()> {
        let req = self
            .request(Method::GET, "/auth/token/user")
            .basic_auth(&self.username, Some(&self.password));
        let resp: TokenResponse = self.send_json(req).await?;
        let Some(jwt) = resp.jwt.filter(|t| !t.is_empty()) else {
            return Err(ChargeSyncError::auth("token response carried no jwt"));
        };
        *self.token.write().await = Some(jwt);
        self.logger.info("Authenticated with charger API");
        Ok(())
    }

    async fn get_status(&self, device_id: &str) -> Result<ChargerSnapshot> {
        let req = self
            .authorized(Method::GET, &format!("/chargers/status/{}", device_id))
            .await?;
        let doc: StatusResponse = self.send_json(req).await?;
        ChargerSnapshot::try_from(doc)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        let req = self.authorized(Method::GET, "/sessions").await?;
        let resp: SessionsResponse = self.send_json(req).await?;
        Ok(resp.into_records())
    }

    async fn lock(&self, device_id: &str) -> Result<()> {
        self.put_charger(device_id, json!({ "locked": 1 })).await
    }

    async fn unlock(&self, device_id: &str) -> Result<()> {
        self.put_charger(device_id, json!({ "locked": 0 })).await
    }

    async fn pause(&self, device_id: &str) -> Result<()> {
        self.remote_action(device_id, REMOTE_ACTION_PAUSE).await
    }

    async fn resume(&self, device_id: &str) -> Result<()> {
        self.remote_action(device_id, REMOTE_ACTION_RESUME).await
    }

    async fn set_max_current(&self, device_id: &str, amps: f64) -> Result<()> {
        self.put_charger(device_id, json!({ "maxChargingCurrent": amps }))
            .await
    }

    async fn set_energy_cost(&self, device_id: &str, cost: f64) -> Result<()> {
        let req = self
            .authorized(Method::POST, &format!("/chargers/config/{}", device_id))
            .await?
            .json(&json!({ "energyCost": cost }));
        self.send_unit(req).await
    }
}
