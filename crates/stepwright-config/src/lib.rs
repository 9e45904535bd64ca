//! # Stepwright Config
//!
//! Configuration schema and loading for the stepwright test runner.

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::Config;
