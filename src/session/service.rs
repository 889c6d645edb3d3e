use crate::api::AppError;
use crate::http::{ApiClient, Endpoint, HttpMethod, HttpRequest};
use crate::session::model::{LoginRequest, Session};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{info, warn};

pub struct AuthOperations {
    pub(crate) client: ApiClient,
}

impl AuthOperations {
    pub async fn login(&self, name: &str) -> Result<Session, AppError> {
        let session = self
            .client
            .execute(HttpRequest::json(
                Endpoint::new(HttpMethod::POST, &["auth", "login"]),
                &LoginRequest {
                    name: name.to_string(),
                },
            )?)
            .await?;
        Ok(session)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Owns the logged-in session: hydrated from disk on startup, persisted on
/// login, removed on logout.
pub struct SessionStore {
    path: PathBuf,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            current: RwLock::new(None),
        }
    }

    pub async fn hydrate(&self) -> Option<Session> {
        let loaded = match load(&self.path).await {
            Ok(session) => session,
            Err(err) => {
                warn!("ignoring unreadable session file {}: {}", self.path.display(), err);
                None
            }
        };
        if let Some(session) = &loaded {
            info!("restored session for {} ({})", session.user.name, session.role);
        }
        *self.current.write().await = loaded.clone();
        loaded
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn require(&self) -> Result<Session, AppError> {
        self.current()
            .await
            .ok_or_else(|| AppError::Unauthorized("Please log in".to_string()))
    }

    pub async fn require_supervisor(&self, action: &str) -> Result<Session, AppError> {
        let session = self.require().await?;
        session.require_supervisor(action)?;
        Ok(session)
    }

    pub async fn login(&self, auth: &AuthOperations, name: &str) -> Result<Session, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name must not be empty".to_string()));
        }
        let session = auth.login(name).await?;
        self.set(session.clone()).await?;
        info!("logged in as {} ({})", session.user.name, session.role);
        Ok(session)
    }

    pub async fn set(&self, session: Session) -> Result<(), AppError> {
        save(&self.path, &session)
            .await
            .map_err(|e| AppError::Internal(format!("could not persist session: {}", e)))?;
        *self.current.write().await = Some(session);
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        *self.current.write().await = None;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::Internal(format!("could not clear session: {}", err))),
        }
    }
}

async fn load(path: &Path) -> Result<Option<Session>, PersistenceError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let session = serde_json::from_str::<Session>(&contents)?;
    Ok(Some(session))
}

async fn save(path: &Path, session: &Session) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let contents = serde_json::to_string_pretty(session)?;
    write_private(path, contents.as_bytes()).await?;
    Ok(())
}

// The file holds a bearer token, so only the owner may read it.
#[cfg(unix)]
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;
    // `mode` only applies on creation; tighten files left by older versions.
    file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
    file.write_all(contents).await?;
    file.flush().await
}

#[cfg(not(unix))]
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(path, contents).await
}
