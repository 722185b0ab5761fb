use crate::domain::DomainError;
use crate::external::FileStorageError;
use crate::storage::StorageError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Authorization,
    Validation,
    State,
    Infrastructure,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("chat not found")]
    ChatNotFound,

    #[error("message not found")]
    MessageNotFound,

    #[error("reaction not found")]
    ReactionNotFound,

    #[error("secret update not found")]
    SecretUpdateNotFound,

    #[error("update not found")]
    UpdateNotFound,

    #[error("file not found")]
    FileNotFound,

    #[error("chat already exists")]
    ChatAlreadyExists,

    #[error("invalid photo")]
    InvalidPhoto,

    #[error("operation {operation} is not supported for {chat_type} chats")]
    InvalidChatType {
        chat_type: String,
        operation: &'static str,
    },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("chat was modified concurrently")]
    Conflict,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ServiceError::Domain(e) if e.is_authorization() => ErrorClass::Authorization,
            ServiceError::Domain(e) if e.is_validation() => ErrorClass::Validation,
            ServiceError::Domain(_) => ErrorClass::State,
            ServiceError::ChatNotFound
            | ServiceError::MessageNotFound
            | ServiceError::ReactionNotFound
            | ServiceError::SecretUpdateNotFound
            | ServiceError::UpdateNotFound
            | ServiceError::FileNotFound => ErrorClass::NotFound,
            ServiceError::InvalidPhoto
            | ServiceError::InvalidChatType { .. }
            | ServiceError::BadRequest(_) => ErrorClass::Validation,
            ServiceError::ChatAlreadyExists => ErrorClass::State,
            ServiceError::Conflict
            | ServiceError::DeadlineExceeded
            | ServiceError::Config(_)
            | ServiceError::Internal(_) => ErrorClass::Infrastructure,
        }
    }

    /// Only infrastructure failures are worth retrying as a whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Conflict | ServiceError::DeadlineExceeded | ServiceError::Internal(_)
        )
    }

    /// Returns HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Conflict | ServiceError::ChatAlreadyExists => 409,
            ServiceError::DeadlineExceeded => 504,
            ServiceError::Config(_) | ServiceError::Internal(_) => 500,
            _ => match self.class() {
                ErrorClass::NotFound => 404,
                ErrorClass::Authorization => 403,
                ErrorClass::Validation => 400,
                ErrorClass::State => 409,
                ErrorClass::Infrastructure => 500,
            },
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::VersionConflict { .. } => ServiceError::Conflict,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<FileStorageError> for ServiceError {
    fn from(err: FileStorageError) -> Self {
        match err {
            FileStorageError::FileNotFound => ServiceError::FileNotFound,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

/// Translates a storage miss into the lookup-specific error.
pub trait StorageResultExt<T> {
    fn or_not_found(self, err: ServiceError) -> ServiceResult<T>;
}

impl<T> StorageResultExt<T> for Result<T, StorageError> {
    fn or_not_found(self, err: ServiceError) -> ServiceResult<T> {
        match self {
            Ok(value) => Ok(value),
            Err(StorageError::NotFound) => Err(err),
            Err(other) => Err(other.into()),
        }
    }
}
