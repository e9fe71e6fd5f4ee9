pub mod config;
pub mod resources;
pub mod token;
