pub mod aggregate;
pub mod assemble;
pub mod config;
pub mod entities;
pub mod error;
pub mod query;
pub mod row;
pub mod store;

pub use error::{CoreError, CoreResult};
pub use row::{Row, Scalar};
pub use store::{MemoryStore, TelemetryStore};
