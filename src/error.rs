//! Error types for the offline-shell library.

use thiserror::Error;

/// Errors that can occur during worker lifecycle operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A request could not be issued, e.g. an unsupported method.
    ///
    /// Failures inside the HTTP client surface as [`Error::Http`].
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A precached asset answered with a non-success status.
    #[error("Bad response status {status} for {url}")]
    BadStatus {
        /// URL of the rejected response.
        url: String,
        /// HTTP status code received.
        status: u16,
    },

    /// Cache storage operation failed.
    #[error("Cache error: {0}")]
    Cache(String),

    /// I/O error during cache storage operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A request URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A manifest asset failed during install.
    #[error("Install failed for {path}: {source}")]
    Install {
        /// Manifest path that failed.
        path: String,
        /// Underlying failure.
        source: Box<Error>,
    },

    /// A stale cache generation could not be deleted during activate.
    #[error("Failed to delete cache {name}: {source}")]
    Delete {
        /// Generation name.
        name: String,
        /// Underlying failure.
        source: Box<Error>,
    },
}

/// A specialized `Result` type for offline-shell operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_error_names_path() {
        let err = Error::Install {
            path: "/granny-b-tin.png".to_string(),
            source: Box::new(Error::Network("connection refused".to_string())),
        };
        let msg = err.to_string();
        assert!(msg.contains("/granny-b-tin.png"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn io_errors_convert() {
        fn open() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(open(), Err(Error::Io(_))));
    }
}
