//! Error types for the SharePoint PDF splitter

use thiserror::Error;

/// Result type alias for the SharePoint PDF splitter
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the SharePoint PDF splitter
#[derive(Error, Debug)]
pub enum Error {
    /// One or more required configuration values are absent
    #[error("Missing configuration: {}", names.join(", "))]
    MissingConfiguration { names: Vec<String> },

    /// A configuration value is present but cannot be used
    #[error("Invalid configuration value for {name}: {value}")]
    InvalidConfiguration { name: String, value: String },

    /// Required request parameter not supplied
    #[error("Missing request parameter: {name}")]
    MissingParameter { name: String },

    /// Input URI cannot address a SharePoint file
    #[error("Invalid URI {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },

    /// Identity provider rejected the token request
    #[error("Authentication failed with status: {status}")]
    Authentication { status: u16 },

    /// Source file download returned a non-success status
    #[error("Download of {url} failed with status: {status}")]
    Download { url: String, status: u16 },

    /// Download too large
    #[error("Download too large: {size} bytes (max: {max_size} bytes)")]
    DownloadTooLarge { size: u64, max_size: u64 },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// qpdf error
    #[error("qpdf error: {reason}")]
    QpdfError { reason: String },

    /// Page upload returned a non-success status
    #[error("Upload of page {page} to {destination} failed with status: {status}")]
    Upload {
        page: u32,
        destination: String,
        status: u16,
    },

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Return a sanitized error message safe to send to clients.
    /// Internal details (paths, library errors, document names) are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::MissingConfiguration { .. } | Error::InvalidConfiguration { .. } => {
                "Function is not configured".to_string()
            }
            Error::MissingParameter { name } => format!("Missing request parameter: {}", name),
            Error::InvalidUri { reason, .. } => format!("Invalid URI: {}", reason),
            Error::Authentication { .. } => "Authentication failed".to_string(),
            Error::Download { .. } => "Failed to download source document".to_string(),
            Error::DownloadTooLarge { max_size, .. } => {
                format!("Download exceeds maximum size of {} bytes", max_size)
            }
            Error::InvalidPdf { .. } | Error::QpdfError { .. } => {
                "PDF processing error".to_string()
            }
            Error::Upload { .. } => "Failed to upload page".to_string(),
            Error::HttpRequest(_) => "HTTP request failed".to_string(),
            Error::Io(_) => "I/O error".to_string(),
        }
    }

    /// Whether the failure was caused by the caller's request rather than the function
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::MissingParameter { .. } | Error::InvalidUri { .. }
        )
    }
}
