//! Domain entities: one module per dashboard concept, each holding its
//! response model, row builder, query and fetch function.

pub mod access_point;
pub mod anomaly;
pub mod cause_code;
pub mod client;
pub mod host_usage;
pub mod load;
pub mod os_distribution;
pub mod time_series;
pub mod venue;
