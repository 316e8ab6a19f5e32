//! Typed client for the leave management HR backend.
//!
//! # Overview
//! Every backend call goes through one gateway, [`ApiClient`], which
//! attaches the stored bearer token, sends the request through a
//! [`Transport`] and turns the outcome into data or a classified
//! [`ApiError`]. Endpoints are grouped by area:
//!
//! - `auth()` for login, register, profile and logout
//! - `leaves()` and `leave_types()` for leave requests and their catalogue
//! - `employees()` for staff records and bulk import
//! - `hr()` for balances, accruals, calendar and exports
//! - `core_hr()` for identity, employment, documents and compliance
//!
//! # Design
//! - The network is reached only through `Transport`; `UreqTransport` is the
//!   blocking default and tests swap in a recording double.
//! - Session state lives in a shared [`SessionContext`] backed by a
//!   `SessionStore`, so a 401 clears the token and the user everywhere at once.
//! - Navigation guards ([`Router`]) read the same session, so expiry and
//!   role checks agree between API calls and page access.
//! - Response bodies stay as `serde_json::Value`; the backend's record
//!   shapes are loose and callers pick the fields they need.

pub mod auth;
pub mod base_url;
pub mod client;
pub mod config;
pub mod core_hr;
pub mod dates;
pub mod download;
pub mod employees;
pub mod error;
pub mod hr;
pub mod http;
pub mod interceptor;
pub mod leave_types;
pub mod leaves;
pub mod query;
pub mod router;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use base_url::{resolve_base_url, BuildMode, Location};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use dates::{format_date, format_date_for_api, format_date_time, format_short_date, format_time};
pub use download::Download;
pub use error::{ApiError, Classification, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use router::{Navigation, Router};
pub use session::{FileStore, MemoryStore, SessionContext, SessionStore};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{AuditLogFilter, BalanceFilter, CalendarFilter, Credentials, EmployeeId, ExportFormat, LoginResponse, User};
