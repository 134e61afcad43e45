//! rootwalk Domain Layer
pub mod config;
pub mod errors;

pub use config::{CliOverrides, Config, ConfigError, LoggingConfig, ResolverConfig, ROOT_HINTS};
pub use errors::DomainError;
