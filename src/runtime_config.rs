//! # Runtime Configuration Module
//!
//! Environment variable based configuration for validation behaviour.
//!
//! ## Environment Variables
//!
//! ### `REQCHECK_UNEXPECTED_BODY`
//!
//! What to do when a request carries a body (or form) but the route declared
//! no schema for it:
//! - `reject` (default): fail with an "unexpected data" error
//! - `ignore`: drop the data silently and leave the surface empty
//!
//! ### `REQCHECK_VALIDATE_FORMATS`
//!
//! Whether JSON Schema `format` keywords (`uuid`, `email`, `date-time`, ...)
//! are asserted when schemas are compiled from route files. Default: `true`.
//!
//! ### `REQCHECK_WARN_UNDECLARED_QUERY`
//!
//! Whether query parameters submitted to a route without a query schema are
//! logged at `warn`. Default: `true`.
//!
//! ## Usage
//!
//! ```rust
//! use reqcheck::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Unexpected body policy: {:?}", config.unexpected_body);
//! ```

use std::env;

/// Handling of data sent to a surface that has no declared schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnexpectedBodyPolicy {
    /// Fail the request with `UnexpectedData`
    #[default]
    Reject,
    /// Leave the surface empty and continue
    Ignore,
}

impl UnexpectedBodyPolicy {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "ignore" | "lenient" => UnexpectedBodyPolicy::Ignore,
            _ => UnexpectedBodyPolicy::Reject,
        }
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Policy for undeclared body/form data (default: reject)
    pub unexpected_body: UnexpectedBodyPolicy,
    /// Assert `format` keywords in compiled schemas (default: true)
    pub validate_formats: bool,
    /// Warn on query data arriving without a query schema (default: true)
    pub warn_undeclared_query: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            unexpected_body: UnexpectedBodyPolicy::Reject,
            validate_formats: true,
            warn_undeclared_query: true,
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(val) => match val.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let unexpected_body = env::var("REQCHECK_UNEXPECTED_BODY")
            .map(|v| UnexpectedBodyPolicy::parse(&v))
            .unwrap_or_default();
        RuntimeConfig {
            unexpected_body,
            validate_formats: env_flag("REQCHECK_VALIDATE_FORMATS", true),
            warn_undeclared_query: env_flag("REQCHECK_WARN_UNDECLARED_QUERY", true),
        }
    }
}
