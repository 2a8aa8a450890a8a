//! CLI error types and exit codes.

use thiserror::Error;

use crate::api::ApiError;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: Authentication required
/// - 3: Network error
/// - 4: Validation error
/// - 5: Server error
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("No access token found. Set ORGADM_ACCESS_TOKEN or GOOGLE_OAUTH_ACCESS_TOKEN.")]
    NotAuthenticated,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Input error: {0}")]
    InputError(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotAuthenticated => 2,
            CliError::Network(_) => 3,
            CliError::Validation(_) | CliError::NotFound(_) | CliError::Conflict(_) => 4,
            CliError::Server(_) => 5,
            CliError::Api { status, .. } => {
                if *status >= 500 {
                    5
                } else if *status == 401 || *status == 403 {
                    2
                } else {
                    4
                }
            }
            CliError::Config(_) | CliError::Template(_) | CliError::Io(_) => 1,
            CliError::InputError(_) => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    /// Get a suggested action for this error
    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::NotAuthenticated => {
                Some("Export a token, e.g. ORGADM_ACCESS_TOKEN=$(gcloud auth print-access-token).")
            }
            CliError::Network(_) => Some("Check your network connection and try again."),
            CliError::Conflict(_) => {
                Some("The resource changed while this run was in flight. Re-run to pick up the new etag.")
            }
            _ => None,
        }
    }
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::NotFound(m) => CliError::NotFound(m),
            ApiError::Conflict(m) => CliError::Conflict(m),
            ApiError::Auth(m) => CliError::Api {
                status: 401,
                message: m,
            },
            ApiError::Api { status, message } => {
                if status >= 500 {
                    CliError::Server(message)
                } else {
                    CliError::Api { status, message }
                }
            }
            ApiError::Timeout(m) | ApiError::Network(m) => CliError::Network(m),
            ApiError::Parse(m) => CliError::Server(m),
            ApiError::InvalidConfig(m) => CliError::Config(m),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Config(format!("JSON error: {}", e))
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        CliError::Config(format!("YAML error: {}", e))
    }
}

impl From<handlebars::RenderError> for CliError {
    fn from(e: handlebars::RenderError) -> Self {
        CliError::Template(e.to_string())
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(e: dialoguer::Error) -> Self {
        CliError::InputError(format!("Dialog error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_not_authenticated() {
        assert_eq!(CliError::NotAuthenticated.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_network_error() {
        assert_eq!(CliError::Network("test".to_string()).exit_code(), 3);
    }

    #[test]
    fn test_exit_code_validation_error() {
        assert_eq!(CliError::Validation("test".to_string()).exit_code(), 4);
    }

    #[test]
    fn test_exit_code_conflict() {
        assert_eq!(CliError::Conflict("stale etag".to_string()).exit_code(), 4);
    }

    #[test]
    fn test_exit_code_server_error() {
        assert_eq!(CliError::Server("test".to_string()).exit_code(), 5);
    }

    #[test]
    fn test_exit_code_api_error_5xx() {
        assert_eq!(
            CliError::Api {
                status: 503,
                message: "test".to_string()
            }
            .exit_code(),
            5
        );
    }

    #[test]
    fn test_exit_code_api_error_403() {
        assert_eq!(
            CliError::Api {
                status: 403,
                message: "test".to_string()
            }
            .exit_code(),
            2
        );
    }

    #[test]
    fn test_exit_code_config_error() {
        assert_eq!(CliError::Config("test".to_string()).exit_code(), 1);
    }

    #[test]
    fn test_api_error_not_found_maps_to_not_found() {
        let e: CliError = ApiError::NotFound("role".to_string()).into();
        assert!(matches!(e, CliError::NotFound(_)));
    }

    #[test]
    fn test_api_error_5xx_maps_to_server() {
        let e: CliError = ApiError::Api {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert!(matches!(e, CliError::Server(_)));
    }

    #[test]
    fn test_error_display_not_authenticated() {
        assert!(CliError::NotAuthenticated
            .to_string()
            .contains("No access token"));
    }
}
