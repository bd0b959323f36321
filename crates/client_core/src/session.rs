//! Signed-in user context, read from a key-value session store.

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use shared::domain::UserType;

use crate::error::SessionError;

const USER_KEY: &str = "user";
const JWT_KEY: &str = "jwt";

pub trait SessionStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    items: HashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_item(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.items.insert(key.into(), value.into());
    }
}

impl SessionStore for MemorySessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }
}

/// Session items persisted as one JSON object on disk.
///
/// String values are returned as-is; any other JSON value is returned in its
/// serialized form, so `"user"` may be stored either as an object or as an
/// already-encoded string.
#[derive(Debug, Default, Clone)]
pub struct FileSessionStore {
    items: HashMap<String, serde_json::Value>,
}

impl FileSessionStore {
    pub fn open(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session file '{}'", path.display()))?;
        let items = serde_json::from_str(&raw)
            .with_context(|| format!("session file '{}' is not a JSON object", path.display()))?;
        Ok(Self { items })
    }
}

impl SessionStore for FileSessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        match self.items.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(value) => Some(value.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    pub email: String,
    #[serde(rename = "type", default)]
    pub user_type: Option<UserType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user: SessionUser,
    jwt: Option<String>,
}

impl SessionContext {
    pub fn new(user: SessionUser, jwt: Option<String>) -> Self {
        Self { user, jwt }
    }

    pub fn for_email(email: impl Into<String>) -> Self {
        Self::new(
            SessionUser {
                email: email.into(),
                user_type: Some(UserType::Employee),
            },
            None,
        )
    }

    pub fn from_store(store: &dyn SessionStore) -> Result<Self, SessionError> {
        let raw_user = store.get_item(USER_KEY).ok_or(SessionError::MissingUser)?;
        let user = serde_json::from_str(&raw_user)?;
        Ok(Self::new(user, store.get_item(JWT_KEY)))
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.user.user_type
    }

    /// Sessions without a recorded type are treated as employees.
    pub fn require_employee(&self) -> Result<(), SessionError> {
        match self.user_type() {
            Some(UserType::Admin) => Err(SessionError::NotEmployee(UserType::Admin)),
            Some(UserType::Employee) | None => Ok(()),
        }
    }

    pub fn jwt(&self) -> Option<&str> {
        self.jwt.as_deref()
    }
}
