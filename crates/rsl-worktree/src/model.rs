use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Debug, Clone, Default)]
pub struct CreateWorktreeOptions {
    pub task_id: String,
    pub task_name: Option<String>,
    pub base_branch: Option<String>,
    pub branch_name: Option<String>,
}

impl CreateWorktreeOptions {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Default::default()
        }
    }

    pub fn task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = Some(name.into());
        self
    }

    pub fn base_branch(mut self, branch: impl Into<String>) -> Self {
        self.base_branch = Some(branch.into());
        self
    }

    pub fn branch_name(mut self, branch: impl Into<String>) -> Self {
        self.branch_name = Some(branch.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorktreeStats {
    pub commits_ahead: u32,
    pub files_changed: u32,
    pub additions: u32,
    pub deletions: u32,
}

#[derive(Debug, Clone)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub branch: String,
    pub task_id: String,
    pub task_name: Option<String>,
    pub base_branch: String,
    pub is_active: bool,
    pub stats: WorktreeStats,
    pub created_at: SystemTime,
}
