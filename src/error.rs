//! Error types for the directory client and the tagging workflow.

use thiserror::Error;

/// Failure reported by the remote changelog directory or the transport under it.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No token configured, or the service rejected the one we sent (HTTP 401).
    #[error(
        "Authentication required. Please provide a valid OAuth token with --token or the AMCH_TOKEN environment variable."
    )]
    AuthenticationRequired,

    #[error("Package {namespace}/{name} already exists")]
    AlreadyExists { namespace: String, name: String },

    #[error("Source {0} is already used by another package")]
    SourceAlreadyExists(String),

    #[error("{}", api_message(.status, .message, .request_id))]
    Api {
        status: u16,
        message: String,
        request_id: Option<String>,
    },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from the directory: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl DirectoryError {
    /// Errors that make every further remote call pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DirectoryError::AuthenticationRequired)
    }
}

fn api_message(status: &u16, message: &str, request_id: &Option<String>) -> String {
    match (*status, request_id.as_deref()) {
        (500..=599, Some(id)) => format!(
            "API returned \"{}\" with {} status code. \
             Please write to support@allmychanges.com and describe the situation. \
             Providing this unique code will help to investigate the logs: {}",
            message, status, id
        ),
        _ => format!("{} (HTTP {})", message, status),
    }
}

/// Failure of a single tagging request.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("Project \"{0}\" not found.")]
    ProjectNotFound(String),

    #[error("More than one project was found: {}", .0.join(", "))]
    AmbiguousProject(Vec<String>),

    /// The version is not known to the directory yet. Expected and recoverable.
    #[error("Version {version} of {namespace}/{name} not found")]
    VersionNotFound {
        namespace: String,
        name: String,
        version: String,
    },

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
