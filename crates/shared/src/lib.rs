pub mod config;
pub mod errors;
pub mod response;
pub mod telemetry;
pub mod tracing;

pub use config::*;
pub use errors::*;
pub use response::*;
pub use tracing::*;
