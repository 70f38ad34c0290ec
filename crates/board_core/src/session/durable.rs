use crate::config;
use crate::error::AppError;
use crate::session::{SessionScope, User};
use std::path::{Path, PathBuf};

const SESSION_FILE_NAME: &str = "session.json";
const SESSION_ENV_VAR: &str = "TASKBOARD_SESSION_PATH";

pub fn session_path(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    config::resolve_path(SESSION_ENV_VAR, configured, SESSION_FILE_NAME)
}

/// Session slot kept in a JSON file so it survives restarts.
#[derive(Debug, Clone)]
pub struct DurableScope {
    path: PathBuf,
}

impl DurableScope {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl SessionScope for DurableScope {
    fn load(&self) -> Option<User> {
        if !self.path.exists() {
            return None;
        }

        let parsed = std::fs::read_to_string(&self.path)
            .map_err(AppError::from)
            .and_then(|content| serde_json::from_str(&content).map_err(AppError::from));
        match parsed {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to parse stored user");
                None
            }
        }
    }

    fn store(&self, user: &User) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(user)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
