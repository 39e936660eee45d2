pub mod error;
pub mod handlers;
pub mod models;
pub mod router;

pub use error::ApiError;
pub use router::{route, AppContext};
