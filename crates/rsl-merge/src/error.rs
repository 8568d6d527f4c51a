use rsl_git::GitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error("failed to write resolved content to {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("merge still has {0} unresolved conflict(s)")]
    Unresolved(usize),
}
