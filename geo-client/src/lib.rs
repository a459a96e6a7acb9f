//! Client for the Geo smart-meter cloud API.

pub mod client;
pub mod domain;
pub mod error;

pub use client::{AccessToken, GeoClient, DEFAULT_BASE_URL};
pub use error::ClientError;
