//! Web layer for the dashboard.
//!
//! Serves the page shell, its static assets and the JSON summary it polls.

mod routes;
mod state;
pub mod templates;

pub use routes::create_router;
pub use state::AppState;
pub use templates::IndexTemplate;
