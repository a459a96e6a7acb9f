pub mod geo;

pub use geo::GeoSource;

use std::sync::Arc;

use geo_client::{
    domain::{LiveData, PeriodicData},
    ClientError,
};

/// Upstream readings fetched once per poll tick.
#[async_trait::async_trait]
pub trait ReadingSource: Send + Sync {
    async fn live(&self) -> Result<LiveData, ClientError>;

    async fn periodic(&self) -> Result<PeriodicData, ClientError>;
}

#[async_trait::async_trait]
impl<T: ReadingSource + ?Sized> ReadingSource for Arc<T> {
    async fn live(&self) -> Result<LiveData, ClientError> {
        (**self).live().await
    }

    async fn periodic(&self) -> Result<PeriodicData, ClientError> {
        (**self).periodic().await
    }
}
