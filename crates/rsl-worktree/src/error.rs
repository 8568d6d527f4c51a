use rsl_git::GitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error("filesystem operation on {path} failed: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("no worktree registered at {0}")]
    NotFound(String),
}
