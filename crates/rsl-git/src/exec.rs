use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
#[error("git command failed (exit {exit_code}): {message}")]
pub struct GitError {
    pub message: String,
    pub stderr: String,
    pub exit_code: i32,
}

#[derive(Debug, Clone, Default)]
pub struct GitExecOptions {
    pub timeout_ms: Option<u64>,
    pub env: Option<HashMap<String, String>>,
}

/// Spawns `git` with `argv`, piped stdio, no shell. Arguments are always
/// passed positionally; nothing here is ever interpreted as shell syntax.
pub async fn exec_git(argv: &[&str], cwd: &Path, opts: GitExecOptions) -> Result<String, GitError> {
    let mut command = Command::new("git");
    command
        .args(argv)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // If the timeout branch below wins the select, the wait_with_output
        // future (and the child it owns) gets dropped; kill_on_drop ensures
        // that drop actually sends the kill instead of leaving git running.
        .kill_on_drop(true);

    if let Some(env) = &opts.env {
        for (key, value) in env {
            command.env(key, value);
        }
    }

    let mut child = command.spawn().map_err(|err| GitError {
        message: format!("failed to spawn git {argv:?}: {err}"),
        stderr: String::new(),
        exit_code: -1,
    })?;

    let output = match opts.timeout_ms {
        Some(timeout_ms) => {
            tokio::select! {
                output = child.wait_with_output() => output.map_err(|err| GitError {
                    message: format!("failed to read git {argv:?} output: {err}"),
                    stderr: String::new(),
                    exit_code: -1,
                })?,
                _ = tokio::time::sleep(Duration::from_millis(timeout_ms)) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(argv = ?argv, timeout_ms, "git command timed out, killing child");
                    return Err(GitError {
                        message: "Git command timed out".to_string(),
                        stderr: String::new(),
                        exit_code: -1,
                    });
                }
            }
        }
        None => child.wait_with_output().await.map_err(|err| GitError {
            message: format!("failed to read git {argv:?} output: {err}"),
            stderr: String::new(),
            exit_code: -1,
        })?,
    };

    if !output.status.success() {
        #[cfg(feature = "tracing")]
        tracing::debug!(argv = ?argv, code = ?output.status.code(), "git command failed");

        return Err(GitError {
            message: format!("git {argv:?} failed"),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn init_repo(dir: &Path) {
        StdCommand::new("git").args(["init", "-q"]).current_dir(dir).status().unwrap();
        StdCommand::new("git")
            .args(["-c", "user.name=test", "-c", "user.email=test@example.com", "commit", "--allow-empty", "-qm", "init"])
            .current_dir(dir)
            .status()
            .unwrap();
    }

    #[tokio::test]
    async fn runs_a_git_command_and_trims_stdout() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());

        let out = exec_git(&["rev-parse", "--is-inside-work-tree"], dir.path(), GitExecOptions::default())
            .await
            .unwrap();
        assert_eq!(out, "true");
    }

    #[tokio::test]
    async fn nonzero_exit_carries_stderr_and_code() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());

        let err = exec_git(&["show", "nonexistent-ref"], dir.path(), GitExecOptions::default())
            .await
            .unwrap_err();
        assert_ne!(err.exit_code, 0);
    }

    #[tokio::test]
    async fn timeout_kills_the_child_and_reports_a_timeout_error() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        StdCommand::new("git")
            .args(["config", "alias.slow", "!sleep 7"])
            .current_dir(dir.path())
            .status()
            .unwrap();

        let err = exec_git(
            &["slow"],
            dir.path(),
            GitExecOptions {
                timeout_ms: Some(50),
                env: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "Git command timed out");

        // Give the OS a moment to reap the killed process, then confirm the
        // aliased "sleep 7" didn't survive the timeout as a detached process.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let still_running = StdCommand::new("pgrep")
            .args(["-f", "sleep 7"])
            .status()
            .map(|status| status.success())
            .unwrap_or(false);
        assert!(!still_running, "git subprocess should have been killed on timeout, not left running");
    }
}
