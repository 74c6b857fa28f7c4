//! Configuration module for StarPlan
//!
//! The retry budget, backoff unit, request timeout, and inter-institution
//! pause range are policy constants with fixed defaults; a TOML file may
//! override them without changing observable behavior at the defaults.
//! The configuration file is optional; [`Config::default`] is a complete,
//! valid configuration.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, OutputConfig, PacingConfig};

// Re-export parser functions
pub use parser::load_config;

// Re-export validation for callers that build configs in code
pub use validation::validate;
