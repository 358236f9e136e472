use thiserror::Error;

use crate::storage::StorageError;

/// Error outputs from `DocStatus`
#[derive(Debug, Error, uniffi::Error)]
pub enum DocStatusError {
    /// The presented input is not valid for the requested operation
    #[error("invalid_input_{attribute}: {reason}")]
    InvalidInput {
        /// The attribute that is invalid
        attribute: String,
        /// The reason the input is invalid
        reason: String,
    },
    /// The request could not be built or failed in a way that is not worth retrying
    #[error("network_error: {url} - {error}")]
    Network {
        /// The URL of the request
        url: String,
        /// The error message
        error: String,
    },
    /// Every attempt of a request failed at the transport level
    #[error("retries_exhausted: {url} after {attempts} attempts - {error}")]
    RetriesExhausted {
        /// The URL of the request
        url: String,
        /// Number of attempts performed
        attempts: u32,
        /// The last transport failure
        error: String,
    },
    /// The server answered, but not with a success status
    #[error("rejected: {url} - status {status}: {body}")]
    Rejected {
        /// The URL of the request
        url: String,
        /// HTTP status code returned by the server
        status: u16,
        /// Response body, as text
        body: String,
    },
    /// Unexpected error serializing or deserializing information
    #[error("serialization_error: {error}")]
    Serialization {
        /// The error message
        error: String,
    },
    /// The storage collaborator failed
    #[error("storage_error: {error}")]
    Storage {
        /// The error message
        error: String,
    },
    /// The device cannot perform biometric authentication
    #[error("biometric_unavailable")]
    BiometricUnavailable,
    /// Biometric authentication was attempted and did not succeed
    #[error("biometric_failed: {reason}")]
    BiometricFailed {
        /// Reason reported by the platform prompt
        reason: String,
    },
}

impl From<StorageError> for DocStatusError {
    fn from(error: StorageError) -> Self {
        Self::Storage {
            error: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for DocStatusError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            error: error.to_string(),
        }
    }
}
