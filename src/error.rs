//! Error types for AUD container decoding.

use std::io;

use thiserror::Error;

/// Error type for AUD decoding operations.
#[derive(Debug, Error)]
pub enum AudError {
    /// Not enough bytes for a file or chunk header, or a chunk header
    /// failed its structural check.
    #[error("malformed header: {0}")]
    MalformedHeader(&'static str),

    /// Unrecognized compression type byte in the file header.
    #[error("unsupported compression type {0}")]
    UnsupportedCodec(u8),

    /// A chunk declared more payload bytes than the source holds.
    #[error("truncated chunk: expected {expected} encoded bytes, got {actual}")]
    TruncatedChunk { expected: usize, actual: usize },

    /// Underlying source fault.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for AUD decoding operations.
pub type AudResult<T> = Result<T, AudError>;

impl From<AudError> for io::Error {
    fn from(err: AudError) -> Self {
        match err {
            AudError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AudError::UnsupportedCodec(5);
        assert_eq!(format!("{}", err), "unsupported compression type 5");

        let err = AudError::TruncatedChunk {
            expected: 16,
            actual: 3,
        };
        assert_eq!(
            format!("{}", err),
            "truncated chunk: expected 16 encoded bytes, got 3"
        );
    }

    #[test]
    fn test_error_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AudError>();
    }

    #[test]
    fn test_io_error_passthrough() {
        let inner = io::Error::new(io::ErrorKind::BrokenPipe, "pipe");
        let err: io::Error = AudError::Io(inner).into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let err: io::Error = AudError::MalformedHeader("chunk header truncated").into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
