//! Domain DTOs for the leave-management API.
//!
//! # Design
//! Only the shapes the client itself inspects are typed: credentials, the
//! login response, the signed-in user and the query filters. Everything the
//! backend returns for views to render stays `serde_json::Value`, and request
//! payloads are any `Serialize` value.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of an employee record. The backend uses numbers, but string
/// keys are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmployeeId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployeeId::Number(n) => write!(f, "{n}"),
            EmployeeId::Text(s) => f.write_str(s),
        }
    }
}

/// The signed-in user, normalized from the backend's `employee` object.
///
/// `roles` is always present after normalization. Any other fields the
/// backend sent are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EmployeeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Normalize a login `employee` payload: an explicit `roles` array wins,
    /// then a single `role`, else no roles at all.
    pub fn from_employee(employee: &Value) -> Self {
        let mut extra = employee.as_object().cloned().unwrap_or_default();
        let id = extra.remove("id").and_then(|v| serde_json::from_value(v).ok());
        let role = extra
            .remove("role")
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|r| !r.is_empty());
        let roles = match extra.remove("roles") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => role.iter().cloned().collect(),
        };
        Self { id, role, roles, extra }
    }

    pub fn has_role(&self, role: &str) -> bool {
        if self.roles.is_empty() {
            return self.role.as_deref() == Some(role);
        }
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|r| self.has_role(r.as_ref()))
    }
}

/// Login form input. Admins sign in with a username, employees and managers
/// with their NRC number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nrc: Option<String>,
    pub password: String,
}

impl Credentials {
    pub fn admin(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            nrc: None,
            password: password.to_string(),
        }
    }

    pub fn employee(nrc: &str, password: &str) -> Self {
        Self {
            username: None,
            nrc: Some(nrc.to_string()),
            password: password.to_string(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Body of a successful login.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub employee: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RejectLeave<'a> {
    pub reason: &'a str,
}

/// Filters for the annual-leave balance listing and its export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceFilter {
    pub department: Option<String>,
    pub status: Option<String>,
}

/// Filters for the leave calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub department: Option<String>,
}

/// Filters for the audit log listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub performed_by: Option<String>,
}

/// Format of an annual-leave balance export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "excel",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn employee_without_role_gets_empty_roles() {
        let user = User::from_employee(&json!({"id": 7, "name": "Aye"}));
        assert_eq!(user.id, Some(EmployeeId::Number(7)));
        assert!(user.roles.is_empty());
        assert_eq!(user.extra["name"], "Aye");

        let stored = serde_json::to_value(&user).unwrap();
        assert_eq!(stored["roles"], json!([]));
    }

    #[test]
    fn single_role_becomes_roles_array() {
        let user = User::from_employee(&json!({"id": 2, "role": "manager"}));
        assert_eq!(user.role.as_deref(), Some("manager"));
        assert_eq!(user.roles, vec!["manager".to_string()]);
    }

    #[test]
    fn explicit_roles_are_kept() {
        let user = User::from_employee(&json!({"id": "e-1", "role": "employee", "roles": ["employee", "manager"]}));
        assert_eq!(user.id, Some(EmployeeId::Text("e-1".to_string())));
        assert_eq!(user.roles, vec!["employee".to_string(), "manager".to_string()]);
    }

    #[test]
    fn role_checks_prefer_roles_list() {
        let user = User::from_employee(&json!({"role": "manager", "roles": ["employee"]}));
        assert!(user.has_role("employee"));
        assert!(!user.has_role("manager"));
        assert!(user.has_any_role(&["admin", "employee"]));
        assert!(!user.has_any_role(&["admin"]));
    }

    #[test]
    fn stored_user_roundtrips_extra_fields() {
        let user = User::from_employee(&json!({"id": 3, "role": "admin", "department": "HR"}));
        let text = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&text).unwrap();
        assert_eq!(back, user);
        assert_eq!(back.extra["department"], "HR");
    }

    #[test]
    fn credentials_pick_admin_by_username() {
        assert!(Credentials::admin("root", "pw").is_admin());
        assert!(!Credentials::employee("12/ABC(N)000001", "pw").is_admin());
        let blank = Credentials {
            username: Some(String::new()),
            nrc: Some("1".to_string()),
            password: "pw".to_string(),
        };
        assert!(!blank.is_admin());
    }
}
