//! HTTP surface: server-rendered pages, form actions and a small JSON API.
//!
//! Middleware stack (outermost → innermost):
//! 1. Response headers → 2. Section guard → 3. Access logger

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod redirect;
pub mod router;
pub mod server;
pub mod session;
pub mod state;

pub use error::WebError;
pub use router::build_router;
pub use state::AppState;
