//! In-process transport double for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::Value;

use crate::base_url::Location;
use crate::client::ApiClient;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::SessionContext;
use crate::transport::{Transport, TransportError};

/// Records every request and answers from a queue; `200 {}` once the queue
/// runs dry.
#[derive(Default)]
pub(crate) struct StubTransport {
    requests: RefCell<Vec<HttpRequest>>,
    replies: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply_json(&self, status: u16, body: Value) {
        self.reply(HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: serde_json::to_vec(&body).unwrap(),
        });
    }

    pub(crate) fn reply_bytes(&self, content_type: &str, extra_headers: &[(&str, &str)], body: &[u8]) {
        let mut headers = vec![("content-type".to_string(), content_type.to_string())];
        headers.extend(extra_headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self.reply(HttpResponse {
            status: 200,
            headers,
            body: body.to_vec(),
        });
    }

    pub(crate) fn reply(&self, response: HttpResponse) {
        self.replies.borrow_mut().push_back(Ok(response));
    }

    pub(crate) fn fail(&self, failure: TransportError) {
        self.replies.borrow_mut().push_back(Err(failure));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub(crate) fn last(&self) -> HttpRequest {
        self.requests.borrow().last().cloned().expect("no request sent")
    }

    /// Path of the last request relative to the stub origin.
    pub(crate) fn last_path(&self) -> String {
        self.last().path.trim_start_matches(ORIGIN).to_string()
    }

    pub(crate) fn last_json(&self) -> Value {
        serde_json::from_slice(self.last().body.as_deref().expect("request has no body")).unwrap()
    }
}

impl Transport for StubTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.replies.borrow_mut().pop_front().unwrap_or_else(|| {
            Ok(HttpResponse {
                status: 200,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: b"{}".to_vec(),
            })
        })
    }
}

pub(crate) const ORIGIN: &str = "http://api.test";

/// Client over `stub` with an empty in-memory session.
pub(crate) fn client(stub: &StubTransport) -> ApiClient<&StubTransport> {
    ApiClient::new(
        ORIGIN,
        Location::parse("http://localhost:5173").unwrap(),
        SessionContext::in_memory(),
        stub,
    )
}
