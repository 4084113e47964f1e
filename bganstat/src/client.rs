//! REST client for the terminal's local status API.
//!
//! Every exchange is a short-lived request/response pair; the terminal is
//! consumed as a black box and each endpoint gets its own typed call.

use std::time::Duration;

use reqwest::{header, Url};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::instrument;

use crate::{
    error::ClientError,
    status::{ApnProfile, SignalSample},
};

/// Interstitial-bypass header for deployments that reach the terminal
/// through an ngrok-style tunnel. Harmless when talking to it directly.
const TUNNEL_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";

#[derive(Debug, Clone)]
pub struct TerminalClient {
    client: reqwest::Client,
    base_url: Url,
}

impl TerminalClient {
    /// `timeout: None` waits indefinitely on every request, matching the
    /// terminal firmware's own web UI.
    pub fn new(
        base_url: Url,
        timeout: Option<Duration>,
        tunnel_bypass: bool,
    ) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().user_agent("bganstat");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if tunnel_bypass {
            let mut headers = header::HeaderMap::new();
            headers.insert(
                TUNNEL_BYPASS_HEADER,
                header::HeaderValue::from_static("true"),
            );
            builder = builder.default_headers(headers);
        }
        let client = builder.build()?;

        Ok(Self { client, base_url })
    }

    pub async fn signal(&self) -> Result<SignalReading, ClientError> {
        self.get_json("/api/m2m/signal").await
    }

    pub async fn satellite(&self) -> Result<SatelliteInfo, ClientError> {
        self.get_json("/api/m2m/satellite").await
    }

    pub async fn imei(&self) -> Result<String, ClientError> {
        let resp: ImeiResponse = self.get_json("/api/m2m/imei").await?;
        Ok(resp.imei)
    }

    pub async fn imsi(&self) -> Result<String, ClientError> {
        let resp: ImsiResponse = self.get_json("/api/m2m/imsi").await?;
        Ok(resp.imsi)
    }

    /// Raw registration text; mapping to [`crate::status::NetworkStatus`]
    /// happens in the aggregation cycle.
    pub async fn network(&self) -> Result<String, ClientError> {
        let resp: NetworkRegistration = self.get_json("/api/m2m/network").await?;
        Ok(resp.status_text)
    }

    pub async fn apn_profiles(&self) -> Result<Vec<ApnProfile>, ClientError> {
        let resp: ApnTable = self.get_json("/api/m2m/apn").await?;
        Ok(resp.profiles)
    }

    #[instrument(skip(self, user, pass))]
    pub async fn save_apn(
        &self,
        apn: &str,
        user: &str,
        pass: &str,
    ) -> Result<bool, ClientError> {
        let url = self.url("/api/m2m/apn");
        let response = self
            .client
            .post(url)
            .json(&SaveApnRequest { apn, user, pass })
            .send()
            .await?;
        let resp: SaveApnResponse = Self::read_json(response).await?;
        Ok(resp.success)
    }

    pub async fn pdp_status(&self) -> Result<PdpStatus, ClientError> {
        self.get_json("/api/m2m/pdp-status").await
    }

    #[instrument(skip(self))]
    pub async fn activate_pdp(&self) -> Result<PdpActivation, ClientError> {
        self.get_json("/api/m2m/pdp-activate").await
    }

    /// The terminal's deactivate response carries nothing useful; callers
    /// learn the new state from the next status poll.
    #[instrument(skip(self))]
    pub async fn deactivate_pdp(&self) -> Result<(), ClientError> {
        let url = self.url("/api/m2m/pdp-deactivate");
        let response = self.client.post(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }
        Ok(())
    }

    pub async fn signal_history(
        &self,
        limit: usize,
    ) -> Result<Vec<SignalSample>, ClientError> {
        let url = self.url("/api/m2m/signal-history");
        let response = self
            .client
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ClientError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::read_json(response).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }
        response.json().await.map_err(ClientError::Malformed)
    }

    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }
}

/// Output of GET /api/m2m/signal.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalReading {
    #[serde(deserialize_with = "de_lenient_f64_opt", default)]
    pub signal_strength: Option<f64>,
    #[serde(default)]
    pub timestamp: String,
}

/// Output of GET /api/m2m/satellite.
#[derive(Debug, Clone, Deserialize)]
pub struct SatelliteInfo {
    pub satellite_id: String,
    pub satellite_name: String,
}

#[derive(Debug, Deserialize)]
struct ImeiResponse {
    imei: String,
}

#[derive(Debug, Deserialize)]
struct ImsiResponse {
    imsi: String,
}

#[derive(Debug, Deserialize)]
struct NetworkRegistration {
    status_text: String,
}

#[derive(Debug, Deserialize)]
struct ApnTable {
    profiles: Vec<ApnProfile>,
}

#[derive(Debug, Serialize)]
struct SaveApnRequest<'a> {
    apn: &'a str,
    user: &'a str,
    pass: &'a str,
}

#[derive(Debug, Deserialize)]
struct SaveApnResponse {
    success: bool,
}

/// Output of GET /api/m2m/pdp-status.
#[derive(Debug, Clone, Deserialize)]
pub struct PdpStatus {
    pub pdp_active: bool,
    pub ip: Option<String>,
}

/// Output of GET /api/m2m/pdp-activate.
#[derive(Debug, Clone, Deserialize)]
pub struct PdpActivation {
    pub success: bool,
    pub ip: Option<String>,
    pub message: Option<String>,
}

/// Parse the signal reading to f64. The firmware reports it as a number,
/// a numeric string, or "--"/null when there is no reading.
fn de_lenient_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;

    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) => match s.trim() {
            "" | "--" => Ok(None),
            trimmed => trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(serde::de::Error::custom),
        },
        Some(other) => Err(serde::de::Error::custom(format!(
            "unexpected signal_strength value: {other}"
        ))),
    }
}
