//! HTTP front door of the relay: routing, request extraction and the mapping
//! of domain errors onto HTTP responses.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
