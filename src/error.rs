//! Error types for the PDF reading core.
//!
//! Errors fall into four families with different severities:
//! structural parse errors and reference errors are fatal to the operation
//! that hit them; encryption errors are fatal to using protected content;
//! decode degradations (unmapped CIDs, unresolved fonts, unrecognized
//! filters) are handled inline by the content/font layers and never surface
//! through this type.

/// Result type alias for PDF library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Parse error at a specific byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where the error occurred
        offset: usize,
        /// Reason for parse failure
        reason: String,
    },

    /// Unexpected end of file
    #[error("End of file reached unexpectedly")]
    UnexpectedEof,

    /// Stream /Length missing or given as an indirect reference
    #[error("Stream /Length is not a literal integer: {0}")]
    UnsupportedStreamLength(String),

    /// Invalid cross-reference table
    #[error("Invalid cross-reference table: {0}")]
    InvalidXref(String),

    /// Referenced object not found in the cross-reference table
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Fetched object's number/generation disagree with its xref entry
    #[error("Object mismatch: xref says {expected_id} {expected_gen}, parsed {found_id} {found_gen}")]
    ObjectMismatch {
        /// Object number recorded in the xref table
        expected_id: u32,
        /// Generation recorded in the xref table
        expected_gen: u16,
        /// Object number parsed from the file
        found_id: u32,
        /// Generation parsed from the file
        found_gen: u16,
    },

    /// Object has the wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Page index outside the page tree
    #[error("Page index {index} out of range (document has {count} pages)")]
    PageOutOfRange {
        /// Requested page index
        index: usize,
        /// Number of pages in the document
        count: usize,
    },

    /// Encryption dictionary is missing a required field
    #[error("Encrypt dictionary missing /{0}")]
    MissingEncryptField(&'static str),

    /// Encryption scheme this implementation does not handle
    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),

    /// Password did not authenticate as either user or owner
    #[error("Password authentication failed")]
    AuthenticationFailed,

    /// Content access on an encrypted document before authentication
    #[error("Document is encrypted and not authenticated")]
    NotAuthenticated,

    /// Invalid PDF structure (generic)
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_not_found_message() {
        let err = Error::ObjectNotFound(10, 0);
        assert!(format!("{}", err).contains("10 0 R"));
    }

    #[test]
    fn test_object_mismatch_message() {
        let err = Error::ObjectMismatch {
            expected_id: 4,
            expected_gen: 0,
            found_id: 5,
            found_gen: 1,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("4 0"));
        assert!(msg.contains("5 1"));
    }

    #[test]
    fn test_page_out_of_range_message() {
        let err = Error::PageOutOfRange { index: 3, count: 2 };
        let msg = format!("{}", err);
        assert!(msg.contains('3'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
