//! Error types shared by every stage of the manifest pipeline.

use thiserror::Error;

/// Errors that abort a manifest run.
///
/// Every variant is fatal: nothing is retried and no partial manifest is
/// written once one of these has been raised.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid settings, detected before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    /// The credential was rejected or the endpoint misbehaved during login.
    #[error("login error - is your token set/correct? {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<octocrab::Error>,
    },

    /// A listing call failed while enumerating repositories.
    #[error("failed to fetch {what}: {message}")]
    Fetch {
        what: String,
        message: String,
        #[source]
        source: Option<octocrab::Error>,
    },

    /// The manifest template could not be expanded.
    #[error("error interpolating template: {0}")]
    Render(String),

    /// The rendered manifest could not be written.
    #[error("failed to write {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn fetch(what: impl Into<String>, source: octocrab::Error) -> Self {
        Error::Fetch {
            what: what.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }
}

impl From<handlebars::RenderError> for Error {
    fn from(err: handlebars::RenderError) -> Self {
        Error::Render(err.to_string())
    }
}

impl From<handlebars::TemplateError> for Error {
    fn from(err: handlebars::TemplateError) -> Self {
        Error::Render(err.to_string())
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_mentions_token() {
        let err = Error::Auth {
            message: "empty login".to_string(),
            source: None,
        };
        assert!(err.to_string().contains("is your token set/correct?"));
        assert!(err.to_string().contains("empty login"));
    }

    #[test]
    fn test_output_error_names_path() {
        let err = Error::Output {
            path: "/tmp/out/.mrconfig".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "failed to write /tmp/out/.mrconfig: denied");
    }
}
