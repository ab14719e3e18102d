//! Error types for ndbctl
//!
//! Every failure reaching `main` is rendered as a cargo-style diagnostic
//! with tips for resolving it.

use colored::Colorize;
use ndbctl_core::CoreError;
use ndbctl_core::config::ConfigError;
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'lab' not found
///
///   tip: List available profiles: ndbctl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    tips: Vec<String>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            tips: Vec::new(),
        }
    }

    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        for description in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
        }
    }
}

/// Main error type for the ndbctl application
#[derive(Error, Debug)]
pub enum NdbCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'ndbctl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Missing credentials for profile '{name}'")]
    MissingCredentials { name: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for ndbctl operations
pub type Result<T> = std::result::Result<T, NdbCtlError>;

impl NdbCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            NdbCtlError::ProfileNotFound { name } => vec![
                "List available profiles: ndbctl profile list".to_string(),
                format!(
                    "Create profile '{}': ndbctl profile set {} --url <url> --username <user>",
                    name, name
                ),
            ],
            NdbCtlError::NoProfileConfigured => vec![
                "Create a profile: ndbctl profile set <name> --url <url> --username <user>"
                    .to_string(),
                "Or set NDB_URL, NDB_USERNAME and NDB_PASSWORD".to_string(),
            ],
            NdbCtlError::MissingCredentials { name } => vec![
                format!("Check profile details: ndbctl profile show {}", name),
                "Set NDB_PASSWORD or store a password with 'ndbctl profile set'".to_string(),
            ],
            NdbCtlError::AuthenticationFailed { .. } => vec![
                "Check your credentials: ndbctl profile show <profile>".to_string(),
                "Ensure the NDB URL is correct".to_string(),
            ],
            NdbCtlError::ConnectionError { message }
                if message.contains("certificate") || message.contains("TLS") =>
            {
                vec![
                    "For self-signed appliances: ndbctl profile set <name> ... --insecure"
                        .to_string(),
                    "Check that the server URL is correct and reachable".to_string(),
                ]
            }
            NdbCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the server URL is correct: ndbctl profile show <profile>".to_string(),
            ],
            NdbCtlError::Timeout { .. } => vec![
                "The operation may still be running: ndbctl operation get <operation-id>"
                    .to_string(),
                "Wait longer with --timeout <seconds>".to_string(),
            ],
            NdbCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: ndbctl <command> --help".to_string(),
            ],
            NdbCtlError::FileError { path, .. } => vec![
                format!("Check that file exists: {}", path),
                "Verify the file is valid TOML, JSON or YAML".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }

        diag.print();
    }
}

impl From<CoreError> for NdbCtlError {
    fn from(err: CoreError) -> Self {
        if err.is_unauthorized() {
            return NdbCtlError::AuthenticationFailed {
                message: err.to_string(),
            };
        }

        match err {
            CoreError::Http(e) if e.is_connect() || e.is_timeout() => {
                NdbCtlError::ConnectionError {
                    message: e.to_string(),
                }
            }
            CoreError::OperationTimeout { .. } => NdbCtlError::Timeout {
                message: err.to_string(),
            },
            CoreError::OperationFailed { .. } | CoreError::MissingOperationId { .. } => {
                NdbCtlError::OperationFailed {
                    message: err.to_string(),
                }
            }
            CoreError::Validation(message) => NdbCtlError::InvalidInput { message },
            CoreError::Config(config_err) => NdbCtlError::from(config_err),
            _ => NdbCtlError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for NdbCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => NdbCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => NdbCtlError::NoProfileConfigured,
            _ => NdbCtlError::Configuration(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for NdbCtlError {
    fn from(err: serde_json::Error) -> Self {
        NdbCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for NdbCtlError {
    fn from(err: std::io::Error) -> Self {
        NdbCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for NdbCtlError {
    fn from(err: anyhow::Error) -> Self {
        NdbCtlError::OutputError {
            message: format!("{:#}", err),
        }
    }
}
