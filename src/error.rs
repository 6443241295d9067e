//! Error types for the PDF library.
//!
//! All fallible operations in this crate return [`Result`]. Parse failures
//! abort the parse and release document resources before the error is
//! returned; tolerated anomalies are handled at the point they occur and
//! never surface as errors.

/// Result type alias for PDF library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF parsing and processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file header is absent, too short, or its version is unparseable.
    #[error("invalid PDF header: '{0}'")]
    InvalidHeader(String),

    /// A required structural keyword was not found where expected.
    #[error("expected '{expected}', found '{actual}'")]
    ExpectedKeyword {
        /// The keyword the parser required at this point
        expected: &'static str,
        /// What was actually read from the file
        actual: String,
    },

    /// A `stream` keyword followed an object that is not a dictionary.
    #[error("stream not preceded by a dictionary")]
    StreamNotPrecededByDict,

    /// Lexical or structural failure at a specific byte offset.
    #[error("failed to parse object at byte {offset}: {reason}")]
    Parse {
        /// Byte offset where the failure occurred
        offset: usize,
        /// Reason for the failure
        reason: String,
    },

    /// Invalid PDF structure (generic).
    #[error("invalid PDF: {0}")]
    InvalidPdf(String),

    /// Stream decoding error.
    #[error("stream decoding error: {0}")]
    Decode(String),

    /// An operation was attempted on a closed document.
    #[error("document has been closed")]
    DocumentClosed,

    /// The operation requires a decrypted document.
    #[error("document is encrypted and must be decrypted first")]
    EncryptionRequired,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_header_message() {
        let err = Error::InvalidHeader("not a pdf".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("invalid PDF header"));
        assert!(msg.contains("not a pdf"));
    }

    #[test]
    fn test_expected_keyword_message() {
        let err = Error::ExpectedKeyword {
            expected: "endobj",
            actual: "endstream".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("endobj"));
        assert!(msg.contains("endstream"));
    }

    #[test]
    fn test_parse_error_message() {
        let err = Error::Parse {
            offset: 1234,
            reason: "invalid token".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1234"));
        assert!(msg.contains("invalid token"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
