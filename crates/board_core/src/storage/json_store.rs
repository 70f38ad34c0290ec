use crate::config;
use crate::error::AppError;
use crate::model::Board;
use crate::storage::BoardPersistence;
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "board.json";
const STORE_ENV_VAR: &str = "TASKBOARD_STORE_PATH";

pub fn store_path(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    config::resolve_path(STORE_ENV_VAR, configured, STORE_FILE_NAME)
}

/// Board snapshot kept as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BoardPersistence for JsonFileStore {
    fn load(&self) -> Option<Board> {
        if !self.path.exists() {
            return None;
        }

        match std::fs::read_to_string(&self.path) {
            Ok(content) => decode_board(&content, &self.path.display().to_string()),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "board store unreadable, starting fresh");
                None
            }
        }
    }

    fn save(&self, board: &Board) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(board)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), tasks = board.tasks.len(), "board saved");
        Ok(())
    }
}

/// Parses a stored snapshot. Anything unusable is logged and reported as
/// absent so the caller falls back to the default board.
pub(crate) fn decode_board(content: &str, source: &str) -> Option<Board> {
    let board: Board = match serde_json::from_str(content) {
        Ok(board) => board,
        Err(err) => {
            tracing::warn!(source, error = %err, "discarding corrupt board snapshot");
            return None;
        }
    };

    if let Err(err) = board.validate_layout() {
        tracing::warn!(source, error = %err, "discarding malformed board snapshot");
        return None;
    }

    Some(board)
}
