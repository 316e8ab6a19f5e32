//! Sign-in, registration and profile endpoints.

use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::query::segment;
use crate::transport::Transport;
use crate::types::{Credentials, LoginResponse, User};

pub const EMPLOYEE_LOGIN_PATH: &str = "/auth/login";
pub const ADMIN_LOGIN_PATH: &str = "/auth/admin/login";
pub const REGISTER_PATH: &str = "/auth/register";

#[derive(Serialize)]
#[serde(untagged)]
enum LoginPayload<'a> {
    Admin {
        username: &'a str,
        password: &'a str,
    },
    Employee {
        #[serde(skip_serializing_if = "Option::is_none")]
        nrc: Option<&'a str>,
        password: &'a str,
    },
}

pub struct AuthService<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> AuthService<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Sign in. A username selects the admin endpoint, otherwise the NRC
    /// endpoint is used. On a response carrying a token the session is
    /// started with the normalized user.
    pub fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let (path, payload) = match credentials.username.as_deref() {
            Some(username) if credentials.is_admin() => (
                ADMIN_LOGIN_PATH,
                LoginPayload::Admin {
                    username,
                    password: &credentials.password,
                },
            ),
            _ => (
                EMPLOYEE_LOGIN_PATH,
                LoginPayload::Employee {
                    nrc: credentials.nrc.as_deref(),
                    password: &credentials.password,
                },
            ),
        };

        let data = self.client.post(path, &payload)?;
        let response: LoginResponse =
            serde_json::from_value(data).map_err(|e| ApiError::DeserializationError(e.to_string()))?;

        if let Some(token) = response.token.as_deref().filter(|t| !t.is_empty()) {
            let user = User::from_employee(response.employee.as_ref().unwrap_or(&Value::Null));
            self.client.session().start(token, &user)?;
        }
        Ok(response)
    }

    pub fn register<B: Serialize + ?Sized>(&self, user: &B) -> Result<Value> {
        self.client.post(REGISTER_PATH, user)
    }

    /// Full employee record of the signed-in user.
    pub fn profile(&self) -> Result<Value> {
        let id = self
            .client
            .session()
            .current_user()
            .and_then(|u| u.id)
            .ok_or(ApiError::NotAuthenticated)?;
        self.client.get(format!("/api/employees/{}", segment(id)))
    }

    /// Clear every session key and queue a redirect to the login view.
    pub fn logout(&self) {
        self.client.session().logout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::router::LOGIN_PATH;
    use crate::testing::{client, StubTransport};
    use serde_json::json;

    #[test]
    fn username_selects_admin_login() {
        let stub = StubTransport::new();
        client(&stub).auth().login(&Credentials::admin("root", "pw")).unwrap();
        assert_eq!(stub.last().method, HttpMethod::Post);
        assert_eq!(stub.last_path(), ADMIN_LOGIN_PATH);
        assert_eq!(stub.last_json(), json!({"username": "root", "password": "pw"}));
    }

    #[test]
    fn nrc_selects_employee_login() {
        let stub = StubTransport::new();
        client(&stub)
            .auth()
            .login(&Credentials::employee("12/ABC(N)000001", "pw"))
            .unwrap();
        assert_eq!(stub.last_path(), EMPLOYEE_LOGIN_PATH);
        assert_eq!(stub.last_json(), json!({"nrc": "12/ABC(N)000001", "password": "pw"}));
    }

    #[test]
    fn login_never_sends_a_stale_token() {
        let stub = StubTransport::new();
        let api = client(&stub);
        api.session().start("old", &User::from_employee(&json!({"id": 1}))).unwrap();
        api.auth().login(&Credentials::employee("1", "pw")).unwrap();
        assert!(stub.last().header("authorization").is_none());
    }

    #[test]
    fn successful_login_persists_normalized_user() {
        let stub = StubTransport::new();
        stub.reply_json(200, json!({"token": "t-1", "employee": {"id": 5, "name": "Hla"}}));
        let api = client(&stub);

        let response = api.auth().login(&Credentials::employee("1", "pw")).unwrap();
        assert_eq!(response.token.as_deref(), Some("t-1"));

        let session = api.session().session().unwrap();
        assert_eq!(session.token, "t-1");
        assert!(session.user.roles.is_empty());
        assert_eq!(session.user.extra["name"], "Hla");
    }

    #[test]
    fn login_without_token_leaves_session_empty() {
        let stub = StubTransport::new();
        stub.reply_json(200, json!({"message": "OTP required"}));
        let api = client(&stub);
        let response = api.auth().login(&Credentials::employee("1", "pw")).unwrap();
        assert_eq!(response.extra["message"], "OTP required");
        assert!(!api.session().is_authenticated());
    }

    #[test]
    fn rejected_login_keeps_existing_session() {
        let stub = StubTransport::new();
        stub.reply_json(401, json!({"message": "Invalid NRC or password"}));
        let api = client(&stub);
        api.session().start("keep", &User::from_employee(&json!({"id": 1}))).unwrap();

        let err = api.auth().login(&Credentials::employee("1", "bad")).unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Invalid NRC or password");
        assert_eq!(api.session().token().as_deref(), Some("keep"));
    }

    #[test]
    fn profile_requires_stored_user() {
        let stub = StubTransport::new();
        let err = client(&stub).auth().profile().unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
        assert!(stub.requests().is_empty());
    }

    #[test]
    fn profile_fetches_own_record() {
        let stub = StubTransport::new();
        let api = client(&stub);
        api.session().start("t", &User::from_employee(&json!({"id": 12}))).unwrap();
        api.auth().profile().unwrap();
        assert_eq!(stub.last_path(), "/api/employees/12");
    }

    #[test]
    fn register_posts_payload() {
        let stub = StubTransport::new();
        client(&stub).auth().register(&json!({"nrc": "1", "name": "Su"})).unwrap();
        assert_eq!(stub.last_path(), REGISTER_PATH);
        assert_eq!(stub.last_json()["name"], "Su");
    }

    #[test]
    fn logout_clears_and_redirects() {
        let stub = StubTransport::new();
        let api = client(&stub);
        api.session().start("t", &User::from_employee(&json!({"id": 1}))).unwrap();
        api.auth().logout();
        assert!(!api.session().is_authenticated());
        assert_eq!(api.session().take_redirect().as_deref(), Some(LOGIN_PATH));
    }
}
