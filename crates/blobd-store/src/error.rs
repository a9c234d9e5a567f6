use std::time::Duration;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The object name is empty, reserved, or would escape the store root.
    #[error("invalid object name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// An upload declared a length of zero bytes.
    #[error("declared object length must be at least one byte")]
    EmptyObject,

    /// The requested object is not in the index.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The number of bytes moved differs from the declared or on-disk size.
    #[error("length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    /// The upload stream produced no data within the configured bound.
    #[error("upload stream stalled for more than {0:?}")]
    StalledStream(Duration),

    /// I/O error from the backing directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` when the caller sent something the store refuses,
    /// as opposed to the store failing to carry out a valid request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. } | Self::EmptyObject | Self::NotFound(_)
        )
    }

    pub(crate) fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_error_classification() {
        assert!(StoreError::EmptyObject.is_client_error());
        assert!(StoreError::NotFound("a".into()).is_client_error());
        assert!(StoreError::invalid_name("..", "traversal").is_client_error());

        assert!(!StoreError::LengthMismatch { expected: 2, actual: 1 }.is_client_error());
        assert!(!StoreError::StalledStream(Duration::from_secs(1)).is_client_error());
        assert!(!StoreError::Io(std::io::Error::other("disk")).is_client_error());
    }

    #[test]
    fn display_messages() {
        let e = StoreError::LengthMismatch { expected: 10, actual: 4 };
        assert_eq!(e.to_string(), "length mismatch: expected 10 bytes, got 4");
        assert_eq!(
            StoreError::NotFound("x.bin".into()).to_string(),
            "object not found: x.bin"
        );
    }
}
