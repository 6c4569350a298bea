//! Error types for PDF Form MCP Server

use thiserror::Error;

/// Result type alias for PDF Form MCP Server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for PDF Form MCP Server
#[derive(Error, Debug)]
pub enum Error {
    /// Stored document id is unknown or was evicted
    #[error("Document not found: {id}")]
    DocumentNotFound { id: String },

    /// PDF file not found on disk
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// Encrypted PDFs cannot be edited
    #[error("PDF is encrypted")]
    Encrypted,

    /// Neither inline bytes nor a document id were supplied
    #[error("Either documentId or originalPdfBase64 is required")]
    MissingSource,

    /// Upload rejected before parsing
    #[error("Upload rejected: {reason}")]
    UploadRejected { reason: String },

    /// Document larger than the whole session store budget
    #[error("Document of {size} bytes exceeds store budget of {max} bytes")]
    DocumentTooLarge { size: usize, max: usize },

    /// Page out of bounds
    #[error("Page {page} out of bounds (total: {total})")]
    PageOutOfBounds { page: u32, total: u32 },

    /// Named form field does not exist
    #[error("Form field not found: {name}")]
    FieldNotFound { name: String },

    /// Widget handle does not resolve to a widget annotation
    #[error("Widget not found: {reason}")]
    WidgetNotFound { reason: String },

    /// Malformed object graph encountered while reading or writing
    #[error("Malformed PDF structure: {reason}")]
    Malformed { reason: String },

    /// lopdf error
    #[error("lopdf error: {0}")]
    Lopdf(#[from] lopdf::Error),

    /// Base64 decode error
    #[error("Invalid base64 data: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Image decode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Background task failed to join
    #[error("Task join error: {reason}")]
    TaskJoin { reason: String },

    /// Path access denied (outside allowed resource directories)
    #[error("Path access denied: {path}")]
    PathAccessDenied { path: String },
}

impl Error {
    /// Return a sanitized error message safe to send to clients.
    /// Internal details (paths, library errors) are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::DocumentNotFound { .. } => "Document not found".to_string(),
            Error::PdfNotFound { .. } => "PDF not found".to_string(),
            Error::InvalidPdf { .. } => "Invalid PDF file".to_string(),
            Error::Encrypted => "PDF is encrypted".to_string(),
            Error::MissingSource => {
                "Either documentId or originalPdfBase64 is required".to_string()
            }
            Error::UploadRejected { reason } => reason.clone(),
            Error::DocumentTooLarge { max, .. } => {
                format!("Document too large to store (limit: {} bytes)", max)
            }
            Error::PageOutOfBounds { page, total } => {
                format!("Page {} out of bounds (total: {})", page, total)
            }
            Error::FieldNotFound { name } => format!("Form field not found: {}", name),
            Error::WidgetNotFound { .. } => "PDF processing error".to_string(),
            Error::Malformed { .. } => "PDF processing error".to_string(),
            Error::Lopdf(_) => "PDF processing error".to_string(),
            Error::Base64Decode(_) => "Invalid base64 data".to_string(),
            Error::Image(_) => "Invalid image data".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Serialization(_) => "Serialization error".to_string(),
            Error::TaskJoin { .. } => "Internal error".to_string(),
            Error::PathAccessDenied { .. } => "Access denied".to_string(),
        }
    }

    /// Shorthand for a [`Error::Malformed`] with a formatted reason
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::Malformed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_internal_details() {
        let err = Error::PdfNotFound {
            path: "/secret/location/form.pdf".to_string(),
        };
        assert_eq!(err.client_message(), "PDF not found");

        let err = Error::malformed("dangling reference 12 0 R");
        assert!(!err.client_message().contains("12 0 R"));
        assert!(err.to_string().contains("12 0 R"));
    }

    #[test]
    fn test_upload_rejection_message_is_passed_through() {
        let err = Error::UploadRejected {
            reason: "Only PDF files are allowed".to_string(),
        };
        assert_eq!(err.client_message(), "Only PDF files are allowed");
    }
}
