use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("auto_cleanup_hours must be >= 1")]
    AutoCleanupTooLow,
}

#[derive(Debug, Clone)]
pub struct WorktreeConfig {
    pub enabled: bool,
    pub base_path: PathBuf,
    pub branch_prefix: String,
    pub auto_cleanup_hours: u64,
    pub merge_on_success: bool,
}

impl WorktreeConfig {
    pub fn builder(repo_root: impl AsRef<Path>) -> WorktreeConfigBuilder {
        WorktreeConfigBuilder::new(repo_root)
    }
}

pub struct WorktreeConfigBuilder {
    enabled: bool,
    base_path: PathBuf,
    branch_prefix: String,
    auto_cleanup_hours: u64,
    merge_on_success: bool,
}

impl WorktreeConfigBuilder {
    pub fn new(repo_root: impl AsRef<Path>) -> Self {
        Self {
            enabled: true,
            base_path: repo_root.as_ref().join(".worktrees"),
            branch_prefix: "task/".to_string(),
            auto_cleanup_hours: 24,
            merge_on_success: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = path.into();
        self
    }

    pub fn branch_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.branch_prefix = prefix.into();
        self
    }

    pub fn auto_cleanup_hours(mut self, hours: u64) -> Self {
        self.auto_cleanup_hours = hours;
        self
    }

    pub fn merge_on_success(mut self, merge_on_success: bool) -> Self {
        self.merge_on_success = merge_on_success;
        self
    }

    pub fn build(self) -> Result<WorktreeConfig, ConfigError> {
        if self.auto_cleanup_hours < 1 {
            return Err(ConfigError::AutoCleanupTooLow);
        }
        Ok(WorktreeConfig {
            enabled: self.enabled,
            base_path: self.base_path,
            branch_prefix: self.branch_prefix,
            auto_cleanup_hours: self.auto_cleanup_hours,
            merge_on_success: self.merge_on_success,
        })
    }
}
