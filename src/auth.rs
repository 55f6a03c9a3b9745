//! Session handling: where the bearer token lives and how it gets there.
//!
//! The token and the logged-in user are kept in a small key-value store under
//! two keys, `token` and `user`. Every gated action reads the token again, so
//! a logout elsewhere takes effect on the next request.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use anyhow::{anyhow, Context, Result};
use log::{log, Level};

use crate::{
    api::gateway::AccountGateway,
    error::ClientError,
    schema::api::{Credentials, LoginResponse, User},
};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FileSessionStore {
    /// A missing file is an empty session.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Corrupt session file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(anyhow!(e).context(format!("Could not read {}", path.display())))
            }
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(values)?)
            .with_context(|| format!("Could not write {}", self.path.display()))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

/// Handle to the current session, shared by the gateway and the store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    pub fn token(&self) -> Option<String> {
        self.store
            .get(TOKEN_KEY)
            .filter(|token| !token.trim().is_empty())
    }

    pub fn user(&self) -> Option<User> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                log!(Level::Warn, "Ignoring unreadable stored user: {e}");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn begin(&self, login: &LoginResponse) -> Result<()> {
        self.store.set(TOKEN_KEY, &login.token)?;
        self.store
            .set(USER_KEY, &serde_json::to_string(&login.user)?)?;
        log!(Level::Info, "Session started for {}", login.user.username);
        Ok(())
    }

    pub fn end(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        log!(Level::Info, "Session ended");
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

fn credentials(username: &str, password: &str) -> Result<Credentials> {
    if username.trim().is_empty() {
        return Err(anyhow!("Username must not be empty"));
    }
    if password.trim().is_empty() {
        return Err(anyhow!("Password must not be empty"));
    }
    Ok(Credentials {
        username: username.trim().to_string(),
        password: password.to_string(),
    })
}

/// Logs in and, on success, starts the session.
pub async fn login(
    gateway: &dyn AccountGateway,
    session: &Session,
    username: &str,
    password: &str,
) -> Result<User> {
    let creds = credentials(username, password)?;
    let response = gateway.login(&creds).await?;
    session.begin(&response)?;
    Ok(response.user)
}

pub async fn register(gateway: &dyn AccountGateway, username: &str, password: &str) -> Result<()> {
    let creds = credentials(username, password)?;
    gateway.register(&creds).await?;
    log!(Level::Info, "Registered {}", creds.username);
    Ok(())
}

/// Maps a failed account call onto the message shown to the user.
pub(crate) fn account_failure(status: u16, body: &[u8], fallback: &str) -> ClientError {
    let message = serde_json::from_slice::<crate::schema::api::ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    ClientError::Api { status, message }
}
