use geo_client::{
    domain::{LiveData, PeriodicData},
    AccessToken, ClientError, GeoClient,
};

use super::ReadingSource;

/// [`ReadingSource`] for one discovered system on the Geo API.
#[derive(Clone, Debug)]
pub struct GeoSource {
    client: GeoClient,
    token: AccessToken,
    system_id: String,
}

impl GeoSource {
    pub fn new(client: GeoClient, token: AccessToken, system_id: impl Into<String>) -> Self {
        Self {
            client,
            token,
            system_id: system_id.into(),
        }
    }

    pub fn system_id(&self) -> &str {
        &self.system_id
    }
}

#[async_trait::async_trait]
impl ReadingSource for GeoSource {
    async fn live(&self) -> Result<LiveData, ClientError> {
        self.client.live_meter_data(&self.token, &self.system_id).await
    }

    async fn periodic(&self) -> Result<PeriodicData, ClientError> {
        self.client
            .periodic_meter_data(&self.token, &self.system_id)
            .await
    }
}
