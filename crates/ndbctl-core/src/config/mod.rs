//! Configuration and profile management
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Profiles name an NDB endpoint, its credentials and the wait timings used
//! by lifecycle actions against it.
//!
//! # Features
//!
//! - Multiple named profiles with a default
//! - Environment variable expansion in config files
//! - Secure credential storage using OS keyring (optional)
//! - Platform-specific config file locations

pub mod config;
pub mod credential;
pub mod error;

pub use config::{Config, Profile, ResolvedCredentials, Timeouts};
pub use credential::CredentialStore;
pub use error::{ConfigError, Result};
