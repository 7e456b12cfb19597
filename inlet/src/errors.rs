use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error as ThisError;

/// Failure classes the upload path logs distinctly.
///
/// None of these reach the HTTP caller: `/upload` answers 200 with the
/// generated blob name whether or not storage accepted the write, so every
/// variant here terminates in an ERROR log line.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Required storage settings are absent or inconsistent
    #[error("storage is not configured: {message}")]
    NotConfigured { message: String },

    /// The container vanished between the existence check and the operation
    #[error("container {container} not found while trying to {operation}")]
    ContainerNotFound { operation: String, container: String },

    /// Container creation raced with another writer that got there first
    #[error("container {container} already exists")]
    ContainerAlreadyExists { container: String },

    /// A conflicting operation (such as a pending delete) holds the container
    #[error("container {container} has a conflicting operation in progress")]
    ContainerBusy { container: String },

    /// The request never reached the storage service or timed out in flight
    #[error("transport failure while trying to {operation}: {message}")]
    Transport { operation: String, message: String },

    /// Any other service-side failure, with the SDK's full error chain
    #[error("storage error while trying to {operation}: {message}")]
    Storage { operation: String, message: String },
}

impl Error {
    /// Fold an SDK failure into one of the classes above.
    ///
    /// Dispatch and timeout failures never carry a service code, so they are
    /// split off before code classification.
    pub(crate) fn from_sdk<E, R>(operation: &str, container: &str, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug,
    {
        match &err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Error::Transport {
                operation: operation.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            },
            _ => classify(operation, container, err.code(), DisplayErrorContext(&err).to_string()),
        }
    }
}

/// Map a storage service error code onto an error class.
///
/// Codes are the S3 dialect of the failures the service distinguishes:
/// a missing container, a creation race, and a container held by a
/// conflicting operation. Everything else falls through to the catch-all.
fn classify(operation: &str, container: &str, code: Option<&str>, message: String) -> Error {
    match code {
        Some("NoSuchBucket") | Some("NotFound") => Error::ContainerNotFound {
            operation: operation.to_string(),
            container: container.to_string(),
        },
        Some("BucketAlreadyExists") | Some("BucketAlreadyOwnedByYou") => Error::ContainerAlreadyExists {
            container: container.to_string(),
        },
        Some("OperationAborted") => Error::ContainerBusy {
            container: container.to_string(),
        },
        _ => Error::Storage {
            operation: operation.to_string(),
            message,
        },
    }
}

/// Type alias for storage operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(code: Option<&str>) -> Error {
        classify("upload blob", "uploads", code, "boom".to_string())
    }

    #[test]
    fn test_classify_missing_container_codes() {
        assert!(matches!(classified(Some("NoSuchBucket")), Error::ContainerNotFound { .. }));
        assert!(matches!(classified(Some("NotFound")), Error::ContainerNotFound { .. }));
    }

    #[test]
    fn test_classify_creation_race_codes() {
        assert!(matches!(classified(Some("BucketAlreadyExists")), Error::ContainerAlreadyExists { .. }));
        assert!(matches!(
            classified(Some("BucketAlreadyOwnedByYou")),
            Error::ContainerAlreadyExists { .. }
        ));
    }

    #[test]
    fn test_classify_busy_container_code() {
        assert!(matches!(classified(Some("OperationAborted")), Error::ContainerBusy { .. }));
    }

    #[test]
    fn test_classify_unknown_codes_fall_through() {
        assert!(matches!(classified(Some("SlowDown")), Error::Storage { .. }));
        assert!(matches!(classified(None), Error::Storage { .. }));
    }

    #[test]
    fn test_classified_errors_name_the_container() {
        let err = classified(Some("NoSuchBucket"));
        assert!(err.to_string().contains("uploads"));
        assert!(err.to_string().contains("upload blob"));
    }
}
