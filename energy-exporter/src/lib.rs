pub mod app;
pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod poller;
pub mod registry;
pub mod sources;
pub mod transform;

pub use poller::{Poller, TickReport};
pub use registry::{MetricRegistry, PrometheusRegistry};
