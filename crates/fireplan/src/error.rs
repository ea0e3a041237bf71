use fireplan_core::analysis::ValidationError;
use fireplan_core::selection::PageListError;
use fireplan_core::upload::UploadError;

/// Failures surfaced to the user, one variant per error class.
#[derive(thiserror::Error, Debug, Clone, PartialEq, serde::Serialize)]
pub enum Error {
    /// Rejected before anything was sent
    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with `success: false` or an error status
    #[error("Server error: {0}")]
    Server(String),

    /// The server answered with something other than the expected payload
    #[error("{0}")]
    Response(String),
}

impl From<UploadError> for Error {
    fn from(err: UploadError) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<PageListError> for Error {
    fn from(err: PageListError) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::from(ValidationError::NoPagesSelected).to_string(),
            "Please select at least one page to analyze"
        );
        assert_eq!(
            Error::Server("Local detector not initialized".to_string()).to_string(),
            "Server error: Local detector not initialized"
        );
        assert_eq!(
            Error::Network("connection refused".to_string()).to_string(),
            "Network error: connection refused"
        );
    }
}
