//! citedoc core — environment configuration and the shared error taxonomy.

pub mod config;
pub mod error;

pub use config::{Config, CorsPolicy, RunMode};
pub use error::{Error, Result};
