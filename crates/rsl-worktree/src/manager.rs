use crate::config::WorktreeConfig;
use crate::error::WorktreeError;
use crate::model::{CreateWorktreeOptions, WorktreeInfo, WorktreeStats};
use rsl_git::{exec_git, get_current_branch, get_commit_count, get_diff_stats, GitExecOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub struct WorktreeManager {
    repo_root: PathBuf,
    config: WorktreeConfig,
}

impl WorktreeManager {
    pub fn new(repo_root: impl Into<PathBuf>, config: WorktreeConfig) -> Self {
        Self {
            repo_root: repo_root.into(),
            config,
        }
    }

    pub async fn create(&self, options: CreateWorktreeOptions) -> Result<WorktreeInfo, WorktreeError> {
        let base = match options.base_branch {
            Some(branch) => branch,
            None => get_current_branch(&self.repo_root).await.unwrap_or_else(|| "HEAD".to_string()),
        };
        let new_branch = options
            .branch_name
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.config.branch_prefix, options.task_id));
        let worktree_path = self.config.base_path.join(&options.task_id);

        #[cfg(feature = "tracing")]
        tracing::debug!(task_id = %options.task_id, branch = %new_branch, base = %base, "creating worktree");

        tokio::fs::create_dir_all(&self.config.base_path)
            .await
            .map_err(|source| WorktreeError::Io {
                path: self.config.base_path.display().to_string(),
                source,
            })?;

        if let Some(existing) = self
            .list()
            .await?
            .into_iter()
            .find(|info| info.path == worktree_path)
        {
            return Ok(existing);
        }

        let path_str = worktree_path.display().to_string();
        let add_result = exec_git(
            &["worktree", "add", "-b", &new_branch, &path_str, &base],
            &self.repo_root,
            GitExecOptions::default(),
        )
        .await;

        if let Err(err) = add_result {
            if err.stderr.contains("already exists") {
                exec_git(&["worktree", "add", &path_str, &new_branch], &self.repo_root, GitExecOptions::default()).await?;
            } else {
                return Err(err.into());
            }
        }

        let stats = self.compute_stats(&worktree_path, &base, &new_branch).await;
        Ok(WorktreeInfo {
            path: worktree_path,
            branch: new_branch,
            task_id: options.task_id,
            task_name: options.task_name,
            base_branch: base,
            is_active: false,
            stats,
            created_at: SystemTime::now(),
        })
    }

    pub async fn list(&self) -> Result<Vec<WorktreeInfo>, WorktreeError> {
        let out = exec_git(&["worktree", "list", "--porcelain"], &self.repo_root, GitExecOptions::default()).await?;
        let repo_root = canonical_or_self(&self.repo_root).await;

        let mut infos = Vec::new();
        for block in out.split("\n\n") {
            let block = block.trim();
            if block.is_empty() {
                continue;
            }

            let mut path = None;
            let mut branch = None;
            let mut locked = false;
            for line in block.lines() {
                if let Some(rest) = line.strip_prefix("worktree ") {
                    path = Some(PathBuf::from(rest));
                } else if let Some(rest) = line.strip_prefix("branch refs/heads/") {
                    branch = Some(rest.to_string());
                } else if line == "locked" || line.starts_with("locked ") {
                    locked = true;
                }
            }

            let (Some(path), Some(branch)) = (path, branch) else {
                continue;
            };

            let canonical_path = canonical_or_self(&path).await;
            if canonical_path == repo_root {
                continue;
            }
            if path.strip_prefix(&self.config.base_path).is_err() {
                continue;
            }

            let task_id = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            let base_branch = detect_upstream(&path).await;
            let stats = self.compute_stats(&path, &base_branch, &branch).await;
            let created_at = fs_created_at(&path).await;

            infos.push(WorktreeInfo {
                path,
                branch,
                task_id,
                task_name: None,
                base_branch,
                is_active: locked,
                stats,
                created_at,
            });
        }

        Ok(infos)
    }

    pub async fn remove(&self, path: &Path) -> Result<(), WorktreeError> {
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), "removing worktree");

        let path_str = path.display().to_string();
        let result = exec_git(&["worktree", "remove", &path_str], &self.repo_root, GitExecOptions::default()).await;

        match result {
            Ok(_) => {}
            Err(err) if err.stderr.contains("contains modified or untracked files") => {
                exec_git(&["worktree", "remove", "--force", &path_str], &self.repo_root, GitExecOptions::default()).await?;
            }
            Err(err) if err.stderr.contains("is not a working tree") => {
                tokio::fs::remove_dir_all(path).await.map_err(|source| WorktreeError::Io {
                    path: path_str.clone(),
                    source,
                })?;
            }
            Err(err) => return Err(err.into()),
        }

        exec_git(&["worktree", "prune"], &self.repo_root, GitExecOptions::default()).await?;
        Ok(())
    }

    pub async fn lock(&self, path: &Path, reason: Option<&str>) -> Result<(), WorktreeError> {
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), reason, "locking worktree");

        let path_str = path.display().to_string();
        let mut argv = vec!["worktree", "lock", path_str.as_str()];
        if let Some(reason) = reason {
            argv.push("--reason");
            argv.push(reason);
        }
        exec_git(&argv, &self.repo_root, GitExecOptions::default()).await?;
        Ok(())
    }

    pub async fn unlock(&self, path: &Path) -> Result<(), WorktreeError> {
        let path_str = path.display().to_string();
        exec_git(&["worktree", "unlock", &path_str], &self.repo_root, GitExecOptions::default()).await?;
        Ok(())
    }

    pub async fn cleanup(&self) -> Result<Vec<PathBuf>, WorktreeError> {
        let cutoff = SystemTime::now() - Duration::from_secs(self.config.auto_cleanup_hours * 3600);
        let mut removed = Vec::new();

        for info in self.list().await? {
            if info.is_active || info.created_at > cutoff {
                continue;
            }
            self.remove(&info.path).await?;
            removed.push(info.path);
        }

        #[cfg(feature = "tracing")]
        tracing::info!(removed = removed.len(), "worktree cleanup pass finished");

        Ok(removed)
    }

    async fn compute_stats(&self, worktree_path: &Path, base: &str, branch: &str) -> WorktreeStats {
        let commits_ahead = get_commit_count(worktree_path, &format!("{base}..{branch}")).await;
        let diff = get_diff_stats(worktree_path, &format!("{base}...{branch}")).await;
        WorktreeStats {
            commits_ahead,
            files_changed: diff.files_changed,
            additions: diff.insertions,
            deletions: diff.deletions,
        }
    }
}

async fn detect_upstream(worktree_path: &Path) -> String {
    for candidate in ["main", "master"] {
        if exec_git(&["rev-parse", "--verify", candidate], worktree_path, GitExecOptions::default())
            .await
            .is_ok()
        {
            return candidate.to_string();
        }
    }
    "main".to_string()
}

async fn canonical_or_self(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path).await.unwrap_or_else(|_| path.to_path_buf())
}

async fn fs_created_at(path: &Path) -> SystemTime {
    let Ok(metadata) = tokio::fs::metadata(path).await else {
        return SystemTime::now();
    };
    metadata.created().or_else(|_| metadata.modified()).unwrap_or_else(|_| SystemTime::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn init_repo(dir: &Path) {
        StdCommand::new("git").args(["init", "-q", "-b", "main"]).current_dir(dir).status().unwrap();
        StdCommand::new("git")
            .args(["-c", "user.name=test", "-c", "user.email=test@example.com", "commit", "--allow-empty", "-qm", "init"])
            .current_dir(dir)
            .status()
            .unwrap();
    }

    fn manager(repo_root: &Path) -> WorktreeManager {
        let config = WorktreeConfig::builder(repo_root).auto_cleanup_hours(1).build().unwrap();
        WorktreeManager::new(repo_root.to_path_buf(), config)
    }

    #[tokio::test]
    async fn create_makes_a_new_worktree_on_a_prefixed_branch() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let manager = manager(dir.path());

        let info = manager.create(CreateWorktreeOptions::new("task-1")).await.unwrap();
        assert_eq!(info.branch, "task/task-1");
        assert_eq!(info.base_branch, "main");
        assert!(info.path.exists());
    }

    #[tokio::test]
    async fn create_is_idempotent_for_an_existing_worktree() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let manager = manager(dir.path());

        let first = manager.create(CreateWorktreeOptions::new("task-2")).await.unwrap();
        let second = manager.create(CreateWorktreeOptions::new("task-2")).await.unwrap();
        assert_eq!(first.path, second.path);
        assert_eq!(first.branch, second.branch);
    }

    #[tokio::test]
    async fn list_skips_the_main_worktree_and_finds_task_worktrees() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let manager = manager(dir.path());
        manager.create(CreateWorktreeOptions::new("task-3")).await.unwrap();

        let infos = manager.list().await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].task_id, "task-3");
        assert!(!infos[0].is_active);
    }

    #[tokio::test]
    async fn lock_marks_a_worktree_active_in_the_listing() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let manager = manager(dir.path());
        let info = manager.create(CreateWorktreeOptions::new("task-4")).await.unwrap();

        manager.lock(&info.path, Some("in use")).await.unwrap();
        let infos = manager.list().await.unwrap();
        assert!(infos[0].is_active);

        manager.unlock(&info.path).await.unwrap();
        let infos = manager.list().await.unwrap();
        assert!(!infos[0].is_active);
    }

    #[tokio::test]
    async fn remove_deletes_the_worktree_and_list_no_longer_sees_it() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let manager = manager(dir.path());
        let info = manager.create(CreateWorktreeOptions::new("task-5")).await.unwrap();

        manager.remove(&info.path).await.unwrap();
        assert!(manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cleanup_skips_locked_worktrees_regardless_of_age() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let manager = manager(dir.path());
        let info = manager.create(CreateWorktreeOptions::new("task-6")).await.unwrap();
        manager.lock(&info.path, None).await.unwrap();

        let removed = manager.cleanup().await.unwrap();
        assert!(removed.is_empty());
        assert_eq!(manager.list().await.unwrap().len(), 1);
    }
}
