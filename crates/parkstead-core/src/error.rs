// Error codes and error types shared across the Parkstead crates.
//
// Two layers: `ApiError` is the structured, user-presentable error every
// public operation returns (code + message, never a panic); `ParksteadError`
// is the internal umbrella that also carries backend/storage failures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable error codes surfaced to UI layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidEmailOrPassword,
    UserAlreadyExists,
    SessionNotFound,
    SessionExpired,
    Unauthorized,
    NotAllowedToModerateListings,
    NotAllowedToEditListing,
    NotAllowedToDeleteListing,
    ListingNotFound,
    AssetNotFound,
    UploadFailed,
    StorageError,
    InternalServerError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidEmailOrPassword => "Invalid email or password",
            Self::UserAlreadyExists => "User already exists",
            Self::SessionNotFound => "Session not found",
            Self::SessionExpired => "Session expired",
            Self::Unauthorized => "You must be signed in to do this",
            Self::NotAllowedToModerateListings => "You are not allowed to moderate listings",
            Self::NotAllowedToEditListing => "You are not allowed to edit this listing",
            Self::NotAllowedToDeleteListing => "You are not allowed to delete this listing",
            Self::ListingNotFound => "Listing not found",
            Self::AssetNotFound => "Asset not found",
            Self::UploadFailed => "Upload failed",
            Self::StorageError => "Storage error",
            Self::InternalServerError => "Internal server error",
        };
        write!(f, "{msg}")
    }
}

/// Structured error returned by public operations.
///
/// Carries a stable code plus a human-readable message so the UI decides
/// presentation (toast, inline field error, access-denied view).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.to_string(),
            code,
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized)
    }

    pub fn forbidden(code: ErrorCode) -> Self {
        Self::new(code)
    }

    pub fn not_found(code: ErrorCode) -> Self {
        Self::new(code)
    }

    /// Build a JSON body for transporting the error to a UI layer.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code,
            "message": self.message,
        })
    }
}

/// Internal (non-presentable) error umbrella.
#[derive(Debug, thiserror::Error)]
pub enum ParksteadError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl ParksteadError {
    /// The `ApiError` inside, if this is a structured API failure.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(api) => Some(api),
            _ => None,
        }
    }

    /// The stable error code, if one applies.
    pub fn code(&self) -> Option<ErrorCode> {
        self.as_api().map(|api| api.code)
    }
}

/// Unified result type for Parkstead operations.
pub type Result<T> = std::result::Result<T, ParksteadError>;
