pub mod config;
pub mod db;
pub mod error;

// Search core
pub mod search;

// Outer surfaces
pub mod api;
pub mod cli;

// Re-exports
pub use config::Settings;
pub use error::{Error, Result};
