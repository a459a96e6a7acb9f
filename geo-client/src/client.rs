use std::{fmt, time::Duration};

use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    domain::{DeviceData, LiveData, PeriodicData},
    error::ClientError,
};

pub const DEFAULT_BASE_URL: &str = "https://api.geotogether.com";

const LOGIN_PATH: &str = "/usersservice/v2/login";
const DEVICE_PATH: &str = "/api/userapi/v2/user/detail-systems";
const LIVE_DATA_PATH: &str = "/api/userapi/system/smets2-live-data";
const PERIODIC_DATA_PATH: &str = "/api/userapi/system/smets2-periodic-data";

/// Bearer token returned by the login endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    identity: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

/// HTTP client for the Geo smart-meter API.
///
/// The access token is never refreshed; callers hold on to the token returned
/// by [`GeoClient::access_token`] for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct GeoClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeoClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange account credentials for an access token.
    pub async fn access_token(&self, username: &str, password: &str) -> Result<AccessToken, ClientError> {
        let req = self
            .http
            .post(format!("{}{LOGIN_PATH}", self.base_url))
            .json(&LoginRequest {
                identity: username,
                password,
            });

        let resp: LoginResponse = send_json(req).await?;
        Ok(AccessToken(resp.access_token))
    }

    /// List the systems (in-home displays) linked to the account.
    pub async fn device_data(&self, token: &AccessToken) -> Result<DeviceData, ClientError> {
        let req = self
            .http
            .get(format!("{}{DEVICE_PATH}", self.base_url))
            .query(&[("systemDetails", "true")])
            .bearer_auth(token.as_str());

        send_json(req).await
    }

    pub async fn live_meter_data(&self, token: &AccessToken, system_id: &str) -> Result<LiveData, ClientError> {
        let req = self
            .http
            .get(format!("{}{LIVE_DATA_PATH}/{system_id}", self.base_url))
            .bearer_auth(token.as_str());

        send_json(req).await
    }

    pub async fn periodic_meter_data(
        &self,
        token: &AccessToken,
        system_id: &str,
    ) -> Result<PeriodicData, ClientError> {
        let req = self
            .http
            .get(format!("{}{PERIODIC_DATA_PATH}/{system_id}", self.base_url))
            .bearer_auth(token.as_str());

        send_json(req).await
    }
}

async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ClientError> {
    let resp = req.send().await?;
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        tracing::debug!(status = status.as_u16(), "geo api returned error status");
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}
