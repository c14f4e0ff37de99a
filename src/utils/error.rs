//! Error Handling Module
//!
//! Defines custom error types for the cytoprep pipeline.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for cytoprep operations
///
/// All pipeline stages run eagerly during construction, so a caller that
/// receives a built pipeline will only ever see `IndexOutOfRange` or
/// `ImageLoad` afterwards.
#[derive(Error, Debug)]
pub enum CytoprepError {
    /// Invalid class catalog or split fractions
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or empty corpus root
    #[error("Data source error: {0}")]
    DataSource(String),

    /// A class cannot be stratified or weighted
    #[error("Split error: {0}")]
    Split(String),

    /// Out-of-range access on a split view
    #[error("Index {index} out of range for split of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Error loading or decoding an image
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience Result type for cytoprep operations
pub type Result<T> = std::result::Result<T, CytoprepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CytoprepError::Split("class 'platelet' has 1 sample".to_string());
        assert_eq!(
            format!("{}", err),
            "Split error: class 'platelet' has 1 sample"
        );
    }

    #[test]
    fn test_index_out_of_range_display() {
        let err = CytoprepError::IndexOutOfRange { index: 12, len: 10 };
        assert!(format!("{}", err).contains("12"));
        assert!(format!("{}", err).contains("10"));
    }

    #[test]
    fn test_image_load_error() {
        let path = PathBuf::from("/path/to/cell.jpg");
        let err = CytoprepError::ImageLoad(path, "file not found".to_string());
        assert!(format!("{}", err).contains("cell.jpg"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CytoprepError = io.into();
        assert!(matches!(err, CytoprepError::Io(_)));
    }
}
