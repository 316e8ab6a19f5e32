//! API origin resolution.
//!
//! # Design
//! The client talks to the backend either through an explicit origin or
//! through same-origin relative paths. Resolution is a pure function of the
//! page location, the configured override and the build mode, so it can be
//! evaluated once at construction and tested without a network.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{ApiError, Result};

/// Port the backend listens on when the page is served from a LAN host.
pub const NETWORK_BACKEND_PORT: u16 = 8080;
/// Backend origin used on a local machine with no other hint.
pub const LOCAL_BACKEND_URL: &str = "http://localhost:8070";

/// How the front end was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Served by the backend itself; calls are same-origin.
    Production,
    /// Served by a dev server that proxies `/api` and `/auth`.
    Development,
    #[default]
    Other,
}

/// Where the front end itself was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    origin: String,
    hostname: String,
    port: Option<u16>,
}

impl Location {
    pub fn parse(origin: &str) -> Result<Self> {
        let url = Url::parse(origin).map_err(|e| ApiError::Config(format!("invalid origin {origin:?}: {e}")))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| ApiError::Config(format!("origin {origin:?} has no host")))?
            .to_string();
        Ok(Self {
            origin: url.origin().ascii_serialization(),
            hostname,
            port: url.port(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// True when the page was loaded from this machine.
    pub fn is_local(&self) -> bool {
        self.hostname == "localhost" || self.hostname == "127.0.0.1"
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            origin: "http://localhost".to_string(),
            hostname: "localhost".to_string(),
            port: None,
        }
    }
}

/// Resolve the origin API calls are sent to. An empty string means
/// same-origin relative calls.
pub fn resolve_base_url(location: &Location, explicit: Option<&str>, mode: BuildMode) -> String {
    if let Some(explicit) = explicit.filter(|s| !s.is_empty()) {
        let resolved = if !location.is_local() && explicit.contains("localhost") {
            let rewritten = rewrite_host(explicit, location.hostname());
            debug!(from = explicit, to = %rewritten, "network access detected, rewrote localhost API host");
            rewritten
        } else {
            explicit.to_string()
        };
        debug!(base_url = %resolved, "using explicit API base URL");
        return resolved;
    }

    match mode {
        BuildMode::Production => String::new(),
        BuildMode::Development => {
            debug!("development mode, using relative URLs through the dev proxy");
            String::new()
        }
        BuildMode::Other => {
            let fallback = if location.is_local() {
                LOCAL_BACKEND_URL.to_string()
            } else {
                format!("http://{}:{NETWORK_BACKEND_PORT}", location.hostname())
            };
            debug!(base_url = %fallback, "using fallback API base URL");
            fallback
        }
    }
}

fn rewrite_host(explicit: &str, hostname: &str) -> String {
    match Url::parse(explicit) {
        Ok(mut url) => match url.set_host(Some(hostname)) {
            Ok(()) => url.to_string(),
            Err(_) => explicit.replace("localhost", hostname),
        },
        Err(_) => explicit.replace("localhost", hostname),
    }
}
