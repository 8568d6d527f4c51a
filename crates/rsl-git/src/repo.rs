use crate::exec::{exec_git, GitExecOptions};
use crate::status::{parse_git_status, GitStatus};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Reports the current branch name, or `None` in a detached-HEAD state.
pub async fn get_current_branch(cwd: &Path) -> Option<String> {
    let out = exec_git(&["rev-parse", "--abbrev-ref", "HEAD"], cwd, GitExecOptions::default())
        .await
        .ok()?;
    if out == "HEAD" {
        None
    } else {
        Some(out)
    }
}

/// `false` on any error, including `cwd` not existing or git not being
/// installed, same defensive posture as a probe that is never allowed to
/// bubble an error up to a caller that's just asking a yes/no question.
pub async fn is_git_repository(cwd: &Path) -> bool {
    exec_git(&["rev-parse", "--is-inside-work-tree"], cwd, GitExecOptions::default())
        .await
        .map(|out| out == "true")
        .unwrap_or(false)
}

pub async fn get_repo_root(cwd: &Path) -> Option<PathBuf> {
    exec_git(&["rev-parse", "--show-toplevel"], cwd, GitExecOptions::default())
        .await
        .ok()
        .map(PathBuf::from)
}

/// Number of commits in `range` (e.g. `"main..HEAD"`), 0 on any error.
pub async fn get_commit_count(cwd: &Path, range: &str) -> u32 {
    exec_git(&["rev-list", "--count", range], cwd, GitExecOptions::default())
        .await
        .ok()
        .and_then(|out| out.parse().ok())
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files_changed: u32,
    pub insertions: u32,
    pub deletions: u32,
}

fn shortstat_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?:(\d+)\sfiles?\schanged)?
            (?:,?\s*(\d+)\sinsertions?\(\+\))?
            (?:,?\s*(\d+)\sdeletions?\(-\))?
            ",
        )
        .expect("shortstat regex is valid")
    })
}

/// Parses `git diff --shortstat` output. All zeros on any error or when the
/// diff is empty.
pub async fn get_diff_stats(cwd: &Path, range: &str) -> DiffStats {
    let Ok(out) = exec_git(&["diff", "--shortstat", range], cwd, GitExecOptions::default()).await else {
        return DiffStats::default();
    };
    parse_shortstat(&out)
}

fn parse_shortstat(line: &str) -> DiffStats {
    let Some(caps) = shortstat_regex().captures(line) else {
        return DiffStats::default();
    };
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    DiffStats {
        files_changed: field(1),
        insertions: field(2),
        deletions: field(3),
    }
}

pub async fn has_uncommitted_changes(cwd: &Path) -> bool {
    exec_git(&["status", "--porcelain"], cwd, GitExecOptions::default())
        .await
        .map(|out| !out.is_empty())
        .unwrap_or(false)
}

pub async fn get_status(cwd: &Path) -> Result<GitStatus, crate::exec::GitError> {
    let out = exec_git(&["status", "--porcelain=v2", "--branch"], cwd, GitExecOptions::default()).await?;
    Ok(parse_git_status(&out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_shortstat_line() {
        let stats = parse_shortstat(" 3 files changed, 42 insertions(+), 7 deletions(-)");
        assert_eq!(
            stats,
            DiffStats {
                files_changed: 3,
                insertions: 42,
                deletions: 7,
            }
        );
    }

    #[test]
    fn parses_insertions_only() {
        let stats = parse_shortstat(" 1 file changed, 5 insertions(+)");
        assert_eq!(
            stats,
            DiffStats {
                files_changed: 1,
                insertions: 5,
                deletions: 0,
            }
        );
    }

    #[test]
    fn empty_diff_yields_all_zeros() {
        assert_eq!(parse_shortstat(""), DiffStats::default());
    }
}
