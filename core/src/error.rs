//! Error types for the leave-management API client.
//!
//! # Design
//! Every failed call is normalized into one `ApiError` carrying a message a
//! view can show as-is (`Display`). The first seven variants are the
//! classifier's taxonomy; the rest are local failures that never reached the
//! network (serialization, missing session, saving a download).

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied. Insufficient permissions.";
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Errors returned by `ApiClient` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A protected endpoint answered 401; the session has been cleared.
    #[error("{}", SESSION_EXPIRED_MESSAGE)]
    AuthExpired,

    /// The backend answered 403.
    #[error("{message}")]
    Forbidden { message: String },

    /// The backend answered 5xx.
    #[error("{message}")]
    ServerError { status: u16, message: String, body: Value },

    /// Any other non-2xx answer, including 401 from the login/register
    /// endpoints, which is passed through untouched.
    #[error("{message}")]
    ClientError { status: u16, message: String, body: Value },

    /// No response: the backend refused the connection.
    #[error("{message}")]
    ConnectionRefused { message: String },

    /// No response: the request was blocked (cross-origin policy or a
    /// network layer that gives no further detail).
    #[error("{message}")]
    CorsOrNetworkBlocked { message: String },

    /// No response, cause unknown.
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    GenericNetworkError,

    /// The request failed before it could be sent.
    #[error("{0}")]
    Unexpected(String),

    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("failed to save {}: {source}", .path.display())]
    Download {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse category of a normalized error, as shown to views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Network,
    Cors,
    Auth,
    Forbidden,
    Server,
    Client,
}

impl ApiError {
    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthExpired => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::ServerError { status, .. } | ApiError::ClientError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Taxonomy tag; `None` for failures that never reached the network.
    pub fn classification(&self) -> Option<Classification> {
        match self {
            ApiError::AuthExpired => Some(Classification::Auth),
            ApiError::ClientError { status: 401, .. } => Some(Classification::Auth),
            ApiError::Forbidden { .. } => Some(Classification::Forbidden),
            ApiError::ServerError { .. } => Some(Classification::Server),
            ApiError::ClientError { .. } => Some(Classification::Client),
            ApiError::ConnectionRefused { .. } | ApiError::GenericNetworkError => Some(Classification::Network),
            ApiError::CorsOrNetworkBlocked { .. } => Some(Classification::Cors),
            _ => None,
        }
    }

    /// Message suitable for display.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
