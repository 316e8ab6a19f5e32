//! Check the response and failure classifiers against the JSON vectors in
//! `test-vectors/classify.json`.
//!
//! Each case gives either a backend response (path, status, body) or a
//! transport failure (code, message, backend, page origin) and the
//! `ApiError` it must turn into.

use leave_client::interceptor::{classify_failure, classify_response, Endpoint};
use leave_client::{ApiError, Classification, HttpResponse, Location, SessionContext, TransportError, User};
use serde_json::{json, Value};

fn vectors() -> Value {
    let raw = include_str!("../../test-vectors/classify.json");
    serde_json::from_str(raw).unwrap()
}

fn variant(err: &ApiError) -> &'static str {
    match err {
        ApiError::AuthExpired => "auth_expired",
        ApiError::Forbidden { .. } => "forbidden",
        ApiError::ServerError { .. } => "server_error",
        ApiError::ClientError { .. } => "client_error",
        ApiError::ConnectionRefused { .. } => "connection_refused",
        ApiError::CorsOrNetworkBlocked { .. } => "cors_or_network_blocked",
        ApiError::GenericNetworkError => "generic_network_error",
        ApiError::Unexpected(_) => "unexpected",
        other => panic!("classifier produced a local error: {other:?}"),
    }
}

fn classification_name(classification: Classification) -> &'static str {
    match classification {
        Classification::Network => "network",
        Classification::Cors => "cors",
        Classification::Auth => "auth",
        Classification::Forbidden => "forbidden",
        Classification::Server => "server",
        Classification::Client => "client",
    }
}

fn assert_error(name: &str, err: &ApiError, expect: &Value) {
    assert_eq!(variant(err), expect["variant"], "{name}: variant");
    assert_eq!(err.to_string(), expect["message"], "{name}: message");
    assert_eq!(
        err.classification().map(classification_name),
        expect["classification"].as_str(),
        "{name}: classification"
    );
}

#[test]
fn response_vectors() {
    for case in vectors()["responses"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let session = SessionContext::in_memory();
        session
            .start("tok", &User::from_employee(&json!({"id": 1, "role": "employee"})))
            .unwrap();

        let mut headers = Vec::new();
        let content_type = case["content_type"].as_str().unwrap();
        if !content_type.is_empty() {
            headers.push(("content-type".to_string(), content_type.to_string()));
        }
        let status = case["status"].as_u64().unwrap() as u16;
        let response = HttpResponse {
            status,
            headers,
            body: case["body"].as_str().unwrap().as_bytes().to_vec(),
        };

        let expect = &case["expect"];
        match classify_response(case["path"].as_str().unwrap(), response, &session) {
            Ok(passed) => {
                assert_eq!(expect["ok"], true, "{name}: expected an error");
                assert_eq!(passed.status, status, "{name}: status");
                assert!(session.is_authenticated(), "{name}: session kept");
            }
            Err(err) => {
                assert_error(name, &err, expect);
                assert_eq!(err.status(), Some(status), "{name}: status");
                let expired = expect["expired"].as_bool().unwrap();
                assert_eq!(!session.is_authenticated(), expired, "{name}: session cleared");
                assert_eq!(session.take_redirect().is_some(), expired, "{name}: redirect queued");
            }
        }
    }
}

#[test]
fn failure_vectors() {
    for case in vectors()["failures"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let location = Location::parse(case["origin"].as_str().unwrap()).unwrap();
        let failure = TransportError::no_response(case["code"].as_str(), case["message"].as_str().unwrap());
        let endpoint = Endpoint {
            base_url: case["base_url"].as_str().unwrap(),
            location: &location,
        };

        let err = classify_failure(failure, endpoint);
        assert_error(name, &err, &case["expect"]);
        assert_eq!(err.status(), None, "{name}: no status without a response");
    }
}

#[test]
fn setup_failure_is_unexpected() {
    let location = Location::default();
    let endpoint = Endpoint {
        base_url: "http://localhost:8070",
        location: &location,
    };
    let err = classify_failure(TransportError::Setup(String::new()), endpoint);
    assert_eq!(variant(&err), "unexpected");
    assert_eq!(err.to_string(), "An unexpected error occurred");
    assert_eq!(err.classification(), None);
}
