//! Configuration management module
//!
//! Loads application configuration from environment variables and `.env` files.

pub mod settings;

pub use settings::Settings;
