//! Route table and navigation guard.
//!
//! # Design
//! Routes are static data. The guard is a pure decision over a target path
//! and the shared `SessionContext`: proceed, redirect elsewhere, or block.
//! Callers that render views drive navigation by calling `Router::navigate`
//! and following the outcome.

use url::form_urlencoded;

use crate::session::SessionContext;

pub const LOGIN_PATH: &str = "/auth/login";
pub const DASHBOARD_PATH: &str = "/app/dashboard";

/// Upper bound on chained redirects followed by `Router::navigate`.
const MAX_REDIRECTS: usize = 8;

const STAFF: &[&str] = &["manager", "admin"];
const ADMIN: &[&str] = &["admin"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: Option<&'static str>,
    pub redirect: Option<&'static str>,
    pub requires_auth: bool,
    /// Roles allowed in; empty means any authenticated user.
    pub roles: &'static [&'static str],
}

impl Route {
    const fn public(path: &'static str, name: &'static str) -> Self {
        Self {
            path,
            name: Some(name),
            redirect: None,
            requires_auth: false,
            roles: &[],
        }
    }

    const fn redirect(path: &'static str, to: &'static str) -> Self {
        Self {
            path,
            name: None,
            redirect: Some(to),
            requires_auth: false,
            roles: &[],
        }
    }

    const fn private(path: &'static str, name: &'static str, roles: &'static [&'static str]) -> Self {
        Self {
            path,
            name: Some(name),
            redirect: None,
            requires_auth: true,
            roles,
        }
    }
}

static ROUTES: [Route; 13] = [
    Route::redirect("/", LOGIN_PATH),
    Route::public(LOGIN_PATH, "login"),
    Route::public("/auth/register", "register"),
    Route::redirect("/app", DASHBOARD_PATH),
    Route::private(DASHBOARD_PATH, "dashboard", &[]),
    Route::private("/app/profile", "profile", &[]),
    Route::private("/app/leaves", "my-leaves", &[]),
    Route::private("/app/leaves/apply", "apply-leave", &[]),
    Route::private("/app/leaves/balance", "leave-balance", &[]),
    Route::private("/app/leaves/pending", "pending-leaves", STAFF),
    Route::private("/app/leaves/:id/audit", "leave-audit", STAFF),
    Route::private("/app/admin/leave-types", "leave-types", ADMIN),
    Route::private("/app/admin/employees", "employees", ADMIN),
];

pub fn routes() -> &'static [Route] {
    &ROUTES
}

/// A route matched against a concrete path, with its `:param` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: &'static Route,
    pub params: Vec<(String, String)>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Match a path (query string and fragment ignored) against the route table.
pub fn resolve(path: &str) -> Option<RouteMatch> {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let wanted = segments(path);
    routes().iter().find_map(|route| {
        let pattern = segments(route.path);
        if pattern.len() != wanted.len() {
            return None;
        }
        let mut params = Vec::new();
        for (p, w) in pattern.iter().zip(&wanted) {
            match p.strip_prefix(':') {
                Some(name) => params.push((name.to_string(), w.to_string())),
                None if p == w => {}
                None => return None,
            }
        }
        Some(RouteMatch { route, params })
    })
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(String),
    Blocked,
}

#[derive(Debug, Clone)]
pub struct Router {
    session: SessionContext,
}

impl Router {
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }

    /// Decide whether navigation to `to` may proceed.
    pub fn guard(&self, to: &str) -> Navigation {
        let Some(matched) = resolve(to) else {
            return Navigation::Blocked;
        };
        let route = matched.route;
        if let Some(target) = route.redirect {
            return Navigation::Redirect(target.to_string());
        }
        if !route.requires_auth {
            return Navigation::Proceed;
        }

        let Some(session) = self.session.session() else {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("redirect", to)
                .finish();
            return Navigation::Redirect(format!("{LOGIN_PATH}?{query}"));
        };
        if !route.roles.is_empty() && !session.user.has_any_role(route.roles) {
            return Navigation::Redirect(DASHBOARD_PATH.to_string());
        }
        Navigation::Proceed
    }

    /// Follow guard redirects from `to` and return the path finally
    /// entered, or `None` when navigation is blocked.
    pub fn navigate(&self, to: &str) -> Option<String> {
        let mut current = to.to_string();
        for _ in 0..MAX_REDIRECTS {
            match self.guard(&current) {
                Navigation::Proceed => return Some(current),
                Navigation::Redirect(next) => current = next,
                Navigation::Blocked => return None,
            }
        }
        None
    }
}
