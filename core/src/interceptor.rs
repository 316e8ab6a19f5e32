//! Request and response interceptors.
//!
//! # Design
//! `attach_bearer` runs on every outgoing request; `classify_response` and
//! `classify_failure` run on every outcome. Classification is a fixed-order
//! first-match chain:
//!
//! - response present: 401, then 403, then >= 500, then any other error
//! - no response: connection refused, then blocked/CORS, then generic
//!
//! Browsers and native stacks alike report blocked requests vaguely, so the
//! no-response branch works from heuristic signals (error code and message
//! substrings) rather than a precise cause.

use serde_json::Value;
use tracing::{debug, error};

use crate::base_url::Location;
use crate::error::{ApiError, ACCESS_DENIED_MESSAGE, GENERIC_ERROR_MESSAGE, UNEXPECTED_ERROR_MESSAGE};
use crate::http::{HttpRequest, HttpResponse};
use crate::session::SessionContext;
use crate::transport::TransportError;

/// Endpoints that must never carry a bearer token, and whose 401 answers are
/// reported to the caller instead of ending the session.
pub const AUTH_ENDPOINTS: [&str; 3] = ["/auth/login", "/auth/admin/login", "/auth/register"];

pub fn is_auth_endpoint(path: &str) -> bool {
    AUTH_ENDPOINTS.iter().any(|endpoint| path.contains(endpoint))
}

/// Attach the stored token as a bearer credential unless the request goes to
/// an auth endpoint.
pub fn attach_bearer(request: &mut HttpRequest, session: &SessionContext) {
    if is_auth_endpoint(&request.path) {
        return;
    }
    if let Some(token) = session.token() {
        request.set_header("Authorization", &format!("Bearer {token}"));
    }
}

/// Where the client sends calls, as needed for network error messages.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    /// Configured API origin; empty for same-origin calls.
    pub base_url: &'a str,
    pub location: &'a Location,
}

impl Endpoint<'_> {
    fn backend(&self) -> &str {
        if self.base_url.is_empty() {
            self.location.origin()
        } else {
            self.base_url
        }
    }
}

/// Pass successful responses through; turn error statuses into `ApiError`.
///
/// A 401 from anything but an auth endpoint ends the session as a side
/// effect.
pub fn classify_response(path: &str, response: HttpResponse, session: &SessionContext) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        debug!(status = response.status, path, "response");
        return Ok(response);
    }

    let status = response.status;
    let data = response.data();
    debug!(status, path, non_json = data.is_string(), "error response");

    if status == 401 && !is_auth_endpoint(path) {
        session.expire();
        return Err(ApiError::AuthExpired);
    }

    if status == 403 {
        let message = non_empty_text(&data)
            .or_else(|| first_message(&data, &["message", "title"]))
            .unwrap_or_else(|| ACCESS_DENIED_MESSAGE.to_string());
        return Err(ApiError::Forbidden { message });
    }

    if status >= 500 {
        let message = first_message(&data, &["message"]).unwrap_or_else(|| format!("Server error ({status})."));
        return Err(ApiError::ServerError {
            status,
            message,
            body: data,
        });
    }

    let message =
        first_message(&data, &["message", "title", "error"]).unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
    Err(ApiError::ClientError {
        status,
        message,
        body: data,
    })
}

/// Turn a failure with no HTTP response into `ApiError`.
pub fn classify_failure(failure: TransportError, endpoint: Endpoint<'_>) -> ApiError {
    let (code, message) = match failure {
        TransportError::NoResponse { code, message } => (code, message),
        TransportError::Setup(message) => {
            let message = if message.is_empty() {
                UNEXPECTED_ERROR_MESSAGE.to_string()
            } else {
                message
            };
            return ApiError::Unexpected(message);
        }
        TransportError::BodyTooLarge { limit } => {
            error!(limit, "response body too large");
            return ApiError::Unexpected(format!("Response body exceeds the {limit} byte limit."));
        }
    };
    let code = code.as_deref().unwrap_or("");
    let origin = endpoint.location.origin();
    let backend = endpoint.backend();

    let refused = code == "ERR_CONNECTION_REFUSED"
        || message.contains("CONNECTION_REFUSED")
        || message.contains("Failed to fetch");
    if refused {
        let mut text = format!(
            "Connection Refused: Unable to reach the backend API at {backend}. \
             Please ensure the backend server is running and accessible."
        );
        if backend.contains("localhost") && origin.contains("192.168") {
            text.push_str(&format!(
                "\n\nNote: You're accessing the frontend from {origin}, but trying to connect to localhost. \
                 Make sure the backend is accessible at {}.",
                backend.replacen("localhost", endpoint.location.hostname(), 1)
            ));
        }
        error!(frontend_origin = origin, backend_url = backend, "connection refused");
        return ApiError::ConnectionRefused { message: text };
    }

    if message.contains("CORS") || code == "ERR_NETWORK" {
        let text = if endpoint.base_url.is_empty() {
            format!("Connection Error: Unable to reach the API server at {origin}. Please ensure the server is running.")
        } else {
            format!(
                "CORS Configuration Error: The backend API at {backend} is not configured to allow requests from {origin}.\
                 \n\nPlease configure the backend to allow CORS requests from {origin}."
            )
        };
        error!(frontend_origin = origin, backend_url = backend, "request blocked");
        return ApiError::CorsOrNetworkBlocked { message: text };
    }

    debug!(code, message = %message, "network error");
    ApiError::GenericNetworkError
}

fn non_empty_text(data: &Value) -> Option<String> {
    data.as_str().filter(|s| !s.is_empty()).map(str::to_string)
}

/// First non-empty string among `keys` of a JSON object body.
fn first_message(data: &Value, keys: &[&str]) -> Option<String> {
    let object = data.as_object()?;
    keys.iter()
        .filter_map(|key| object.get(*key)?.as_str())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
