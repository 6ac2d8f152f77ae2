//! Common error types for OCR Mate

use thiserror::Error;

/// Common result type for OCR Mate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across OCR Mate crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "IO error: config.toml");
        assert_eq!(
            Error::Config("bad level".to_string()).to_string(),
            "Configuration error: bad level"
        );
    }
}
