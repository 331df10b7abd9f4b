//! InfluxDB 2.x adapter for the telemetry store.

pub mod annotated;
pub mod client;
pub mod error;
pub mod normalize;

pub use client::InfluxClient;
pub use error::DecodeError;
