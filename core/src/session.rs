//! Session context shared by the HTTP client and the navigation guard.
//!
//! # Design
//! The session lives in a small key-value store (`token`, `user`, ...), the
//! way a browser front end keeps it in local storage. `SessionContext` wraps
//! that store with the lifecycle operations the client needs: start on
//! login, expire on a rejected token, clear on logout. It is cheap to clone
//! and every clone sees the same store.
//!
//! Clearing a session also queues a redirect to the login view; whoever
//! drives navigation picks it up with `take_redirect`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::router::LOGIN_PATH;
use crate::types::User;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Keys removed on an explicit logout.
const LOGOUT_KEYS: [&str; 5] = [TOKEN_KEY, USER_KEY, "roles", "permissions", "refreshToken"];
/// Keys removed when the backend rejects the stored token.
const EXPIRY_KEYS: [&str; 2] = [TOKEN_KEY, USER_KEY];

/// Persistent string key-value storage for session data.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable one is discarded with a warning.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "discarding unreadable session file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> io::Result<()> {
        let bytes = serde_json::to_vec_pretty(entries).map_err(io::Error::other)?;
        fs::write(&self.path, bytes)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// A signed-in session: a bearer token together with its user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

struct Inner {
    store: Box<dyn SessionStore>,
    redirect: Mutex<Option<String>>,
}

impl SessionContext {
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Box::new(store),
                redirect: Mutex::new(None),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn token(&self) -> Option<String> {
        self.inner.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// The stored user, or `None` if absent or unreadable.
    pub fn current_user(&self) -> Option<User> {
        let raw = self.inner.store.get(USER_KEY)?;
        serde_json::from_str(&raw).ok()
    }

    pub fn session(&self) -> Option<Session> {
        Some(Session {
            token: self.token()?,
            user: self.current_user()?,
        })
    }

    /// Authenticated means both a token and a user are stored.
    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.current_user().is_some_and(|u| u.has_role(role))
    }

    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.current_user().is_some_and(|u| u.has_any_role(roles))
    }

    /// Persist a freshly issued token and its user.
    pub fn start(&self, token: &str, user: &User) -> io::Result<()> {
        let user_json = serde_json::to_string(user).map_err(io::Error::other)?;
        self.inner.store.set(TOKEN_KEY, token)?;
        self.inner.store.set(USER_KEY, &user_json)?;
        debug!(user = ?user.id, "session started");
        Ok(())
    }

    /// Drop a session the backend no longer accepts.
    pub fn expire(&self) {
        self.clear(&EXPIRY_KEYS);
        debug!("session expired");
    }

    /// End the session on the user's request.
    pub fn logout(&self) {
        self.clear(&LOGOUT_KEYS);
        debug!("logged out");
    }

    /// Pending navigation queued by `expire` or `logout`.
    pub fn take_redirect(&self) -> Option<String> {
        self.inner.redirect.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn clear(&self, keys: &[&str]) {
        for key in keys {
            if let Err(e) = self.inner.store.remove(key) {
                warn!(key, error = %e, "failed to remove session key");
            }
        }
        *self.inner.redirect.lock().unwrap_or_else(PoisonError::into_inner) = Some(LOGIN_PATH.to_string());
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &dyn SessionStore {
        self.inner.store.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager() -> User {
        User::from_employee(&json!({"id": 2, "role": "manager"}))
    }

    #[test]
    fn token_alone_is_not_authenticated() {
        let session = SessionContext::in_memory();
        session.store().set(TOKEN_KEY, "abc").unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn user_alone_is_not_authenticated() {
        let session = SessionContext::in_memory();
        session.store().set(USER_KEY, r#"{"id":1,"roles":[]}"#).unwrap();
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_some());
    }

    #[test]
    fn start_then_roles() {
        let session = SessionContext::in_memory();
        session.start("abc", &manager()).unwrap();
        assert!(session.is_authenticated());
        assert!(session.has_role("manager"));
        assert!(session.has_any_role(&["manager", "admin"]));
        assert!(!session.has_any_role(&["admin"]));
        assert_eq!(session.session().unwrap().token, "abc");
    }

    #[test]
    fn corrupt_user_is_ignored() {
        let session = SessionContext::in_memory();
        session.store().set(TOKEN_KEY, "abc").unwrap();
        session.store().set(USER_KEY, "{not json").unwrap();
        assert!(session.current_user().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn expire_keeps_unrelated_keys_and_queues_redirect() {
        let session = SessionContext::in_memory();
        session.start("abc", &manager()).unwrap();
        session.store().set("permissions", "[]").unwrap();

        session.expire();
        assert!(session.token().is_none());
        assert!(session.current_user().is_none());
        assert_eq!(session.store().get("permissions").as_deref(), Some("[]"));
        assert_eq!(session.take_redirect().as_deref(), Some(LOGIN_PATH));
        assert!(session.take_redirect().is_none());
    }

    #[test]
    fn logout_removes_every_session_key() {
        let session = SessionContext::in_memory();
        session.start("abc", &manager()).unwrap();
        for key in ["roles", "permissions", "refreshToken"] {
            session.store().set(key, "x").unwrap();
        }
        session.logout();
        for key in LOGOUT_KEYS {
            assert!(session.store().get(key).is_none(), "{key} should be cleared");
        }
    }

    #[test]
    fn clones_share_state() {
        let session = SessionContext::in_memory();
        let other = session.clone();
        session.start("abc", &manager()).unwrap();
        assert!(other.is_authenticated());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let session = SessionContext::new(FileStore::open(&path).unwrap());
        session.start("persisted", &manager()).unwrap();
        drop(session);

        let reopened = SessionContext::new(FileStore::open(&path).unwrap());
        assert_eq!(reopened.token().as_deref(), Some("persisted"));
        assert!(reopened.has_role("manager"));

        reopened.logout();
        let again = FileStore::open(&path).unwrap();
        assert!(again.get(TOKEN_KEY).is_none());
    }

    #[test]
    fn file_store_discards_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "garbage").unwrap();
        let store = FileStore::open(&path).unwrap();
        assert!(store.get(TOKEN_KEY).is_none());
    }
}
