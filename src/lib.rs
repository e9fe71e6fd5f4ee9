pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod money;
pub mod observer;
pub mod resources;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod tenant;
pub mod validation;

pub use routes::app;
pub use state::AppState;
