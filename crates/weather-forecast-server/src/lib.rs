//! Weather Forecast Server: HTTP API for next-day global average temperature.

pub mod config;
pub mod service;
pub mod transport;
pub mod types;

pub use config::{resolve_artifact_paths, ArtifactPaths};
pub use service::ForecastService;
pub use transport::{router, HttpTransport, RouterOptions};
