use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::APP_NAME;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
}

/// Credential handed to every call that needs the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub token: String,
    pub email: String,
    pub generation: u64,
}

impl AuthContext {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Session persisted as JSON under the user's config directory.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    generation: u64,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            generation: 0,
        }
    }

    pub fn default_location() -> anyhow::Result<Self> {
        let dir = dirs::config_dir()
            .context("no config directory available for the session file")?
            .join(APP_NAME);
        Ok(Self::new(dir.join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn load(&self) -> anyhow::Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if !session.token.is_empty() => Ok(Some(session)),
            Ok(_) => Ok(None),
            Err(error) => {
                tracing::warn!(%error, path = %self.path.display(), "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    pub fn auth_context(&self) -> anyhow::Result<Option<AuthContext>> {
        Ok(self.load()?.map(|session| AuthContext {
            token: session.token,
            email: session.email,
            generation: self.generation,
        }))
    }

    pub fn save(&mut self, token: &str, email: &str) -> anyhow::Result<AuthContext> {
        let session = Session {
            token: token.to_string(),
            email: email.to_string(),
            issued_at: Utc::now(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(&session)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        self.generation += 1;
        tracing::info!(email, "session stored");

        Ok(AuthContext {
            token: session.token,
            email: session.email,
            generation: self.generation,
        })
    }

    /// Removes the stored credential; contexts issued earlier become stale.
    pub fn clear(&mut self) -> anyhow::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove {}", self.path.display()))?;
        }
        self.generation += 1;
        tracing::info!("session cleared");
        Ok(())
    }
}
