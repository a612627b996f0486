//! Web layer for the stop monitor.
//!
//! Provides HTTP endpoints for configuring stops and reading their wait times.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
