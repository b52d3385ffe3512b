//! HTTP surface (spec.md §6): the single dynamic-dispatch route, ambient
//! request-context middleware, and process liveness/readiness endpoints.

pub mod error;
pub mod handler;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use server::start_api_server;
pub use state::ApiState;
