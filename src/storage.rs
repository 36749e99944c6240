use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::rider::UserProfile;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(AppError::Validation(format!("unknown theme: {other}"))),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub device_id: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            auth_token: None,
            profile: None,
            theme: Theme::default(),
            language: default_language(),
            device_id: None,
        }
    }
}

/// Device-local session: auth token, cached profile, preferences and the
/// generated push device id, persisted as one JSON document.
pub struct SessionStore {
    path: PathBuf,
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();

        let mut state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<SessionState>(&bytes)
                .map_err(|err| AppError::Storage(format!("corrupt session file: {err}")))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => SessionState::default(),
            Err(err) => return Err(err.into()),
        };

        let generated = state.device_id.is_none();
        if generated {
            state.device_id = Some(Uuid::new_v4().to_string());
        }

        let store = Self {
            path,
            state: RwLock::new(state),
        };

        if generated {
            info!("generated new device id");
            store.persist().await?;
        }

        Ok(store)
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.auth_token.clone()
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.state.read().await.profile.clone()
    }

    pub async fn user_id(&self) -> Option<String> {
        self.state
            .read()
            .await
            .profile
            .as_ref()
            .map(|profile| profile.id.clone())
    }

    pub async fn device_id(&self) -> String {
        self.state.read().await.device_id.clone().unwrap_or_default()
    }

    pub async fn set_token(&self, token: String) -> AppResult<()> {
        self.state.write().await.auth_token = Some(token);
        self.persist().await
    }

    pub async fn set_profile(&self, profile: UserProfile) -> AppResult<()> {
        self.state.write().await.profile = Some(profile);
        self.persist().await
    }

    pub async fn set_theme(&self, theme: Theme) -> AppResult<()> {
        self.state.write().await.theme = theme;
        self.persist().await
    }

    pub async fn set_language(&self, language: &str) -> AppResult<()> {
        let language = language.trim();
        if language.is_empty() {
            return Err(AppError::Validation("language cannot be empty".to_string()));
        }
        self.state.write().await.language = language.to_string();
        self.persist().await
    }

    /// Drops the token and profile. The device id survives so the device
    /// keeps one push registration across sign-ins.
    pub async fn clear(&self) -> AppResult<()> {
        {
            let mut state = self.state.write().await;
            let device_id = state.device_id.take();
            *state = SessionState {
                device_id,
                ..SessionState::default()
            };
        }
        self.persist().await
    }

    async fn persist(&self) -> AppResult<()> {
        let bytes = {
            let state = self.state.read().await;
            serde_json::to_vec_pretty(&*state)?
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "session persisted");
        Ok(())
    }
}
