//! The API gateway client: one request pipeline shared by every endpoint.
//!
//! # Design
//! `ApiClient` owns the resolved API origin, the session context, the
//! download directory and a `Transport`. Every call goes through `send`:
//!
//! 1. `attach_bearer` adds the stored token (request interceptor)
//! 2. the relative path becomes an absolute URL
//! 3. the transport executes the request
//! 4. `classify_response` / `classify_failure` normalize the outcome
//!    (response interceptor)
//!
//! Endpoint groups are thin borrowed views over the client
//! (`client.leaves().pending()`), so they share one session and one
//! transport without any state of their own.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthService;
use crate::base_url::{resolve_base_url, Location};
use crate::config::ClientConfig;
use crate::core_hr::CoreHrService;
use crate::download::Downloads;
use crate::employees::EmployeeService;
use crate::error::Result;
use crate::hr::HrLeaveService;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::interceptor::{attach_bearer, classify_failure, classify_response, Endpoint};
use crate::leave_types::LeaveTypeService;
use crate::leaves::LeaveService;
use crate::session::{FileStore, SessionContext};
use crate::transport::{Transport, UreqTransport};

#[derive(Debug)]
pub struct ApiClient<T = UreqTransport> {
    base_url: String,
    location: Location,
    session: SessionContext,
    downloads: Downloads,
    transport: T,
}

impl ApiClient<UreqTransport> {
    /// Build a network client: resolve the API origin, restore any persisted
    /// session and configure the request timeout.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let location = config.location()?;
        let base_url = resolve_base_url(&location, config.api_base_url.as_deref(), config.mode);
        let session = match &config.session_file {
            Some(path) => SessionContext::new(FileStore::open(path)?),
            None => SessionContext::in_memory(),
        };
        debug!(base_url = %base_url, mode = ?config.mode, "API client configured");
        let client = Self::new(&base_url, location, session, UreqTransport::new(config.timeout()));
        Ok(client.with_download_dir(config.download_dir.clone()))
    }
}

impl<T: Transport> ApiClient<T> {
    /// `base_url` may be empty, meaning calls go to the page's own origin.
    pub fn new(base_url: &str, location: Location, session: SessionContext, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            location,
            session,
            downloads: Downloads::new("."),
            transport,
        }
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.downloads = Downloads::new(dir);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn downloads(&self) -> &Downloads {
        &self.downloads
    }

    pub fn auth(&self) -> AuthService<'_, T> {
        AuthService::new(self)
    }

    pub fn leaves(&self) -> LeaveService<'_, T> {
        LeaveService::new(self)
    }

    pub fn leave_types(&self) -> LeaveTypeService<'_, T> {
        LeaveTypeService::new(self)
    }

    pub fn employees(&self) -> EmployeeService<'_, T> {
        EmployeeService::new(self)
    }

    pub fn hr(&self) -> HrLeaveService<'_, T> {
        HrLeaveService::new(self)
    }

    pub fn core_hr(&self) -> CoreHrService<'_, T> {
        CoreHrService::new(self)
    }

    /// Run a request through the interceptors and the transport.
    pub fn send(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        let path = request.path.clone();
        attach_bearer(&mut request, &self.session);
        request.path = self.url(&path);
        debug!(method = %request.method, url = %request.path, "request");

        match self.transport.execute(&request) {
            Ok(response) => classify_response(&path, response, &self.session),
            Err(failure) => Err(classify_failure(
                failure,
                Endpoint {
                    base_url: &self.base_url,
                    location: &self.location,
                },
            )),
        }
    }

    fn url(&self, path: &str) -> String {
        let origin = if self.base_url.is_empty() {
            self.location.origin()
        } else {
            self.base_url.as_str()
        };
        format!("{origin}{path}")
    }

    pub(crate) fn call(&self, request: HttpRequest) -> Result<Value> {
        Ok(self.send(request)?.data())
    }

    pub(crate) fn get(&self, path: impl Into<String>) -> Result<Value> {
        self.call(HttpRequest::new(HttpMethod::Get, path))
    }

    pub(crate) fn get_bytes(&self, path: impl Into<String>) -> Result<HttpResponse> {
        self.send(HttpRequest::new(HttpMethod::Get, path))
    }

    pub(crate) fn post<B: Serialize + ?Sized>(&self, path: impl Into<String>, body: &B) -> Result<Value> {
        self.call(HttpRequest::json(HttpMethod::Post, path, body)?)
    }

    pub(crate) fn post_empty(&self, path: impl Into<String>) -> Result<Value> {
        self.call(HttpRequest::new(HttpMethod::Post, path))
    }

    pub(crate) fn put<B: Serialize + ?Sized>(&self, path: impl Into<String>, body: &B) -> Result<Value> {
        self.call(HttpRequest::json(HttpMethod::Put, path, body)?)
    }

    pub(crate) fn put_empty(&self, path: impl Into<String>) -> Result<Value> {
        self.call(HttpRequest::new(HttpMethod::Put, path))
    }

    pub(crate) fn delete(&self, path: impl Into<String>) -> Result<Value> {
        self.call(HttpRequest::new(HttpMethod::Delete, path))
    }
}
