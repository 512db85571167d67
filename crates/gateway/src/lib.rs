pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod upload;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, SharedService};
