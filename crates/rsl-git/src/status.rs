use std::path::PathBuf;

/// Parsed `git status --porcelain=v2 --branch` output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitStatus {
    pub branch: Option<String>,
    pub is_clean: bool,
    pub staged: Vec<PathBuf>,
    pub unstaged: Vec<PathBuf>,
    pub untracked: Vec<PathBuf>,
    pub ahead: u32,
    pub behind: u32,
}

/// Parses porcelain v2 status lines:
///
/// - `# branch.head <name>`
/// - `# branch.ab +N -M`
/// - `? <path>` untracked
/// - `1 XY ... <path>` ordinary changed entry
/// - `2 XY ... <path>\t<original>` renamed/copied entry
/// - `u XY ... <path>` unmerged entry
///
/// `X` is the staged status, `Y` the worktree status; `.` means unchanged in
/// that slot. A path only shows up as staged/unstaged/untracked, never in
/// more than its actual status category.
pub fn parse_git_status(porcelain_v2: &str) -> GitStatus {
    let mut status = GitStatus::default();

    for line in porcelain_v2.lines() {
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("# branch.head ") {
            if rest != "(detached)" {
                status.branch = Some(rest.to_string());
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("# branch.ab ") {
            for token in rest.split_whitespace() {
                if let Some(n) = token.strip_prefix('+') {
                    status.ahead = n.parse().unwrap_or(0);
                } else if let Some(n) = token.strip_prefix('-') {
                    status.behind = n.parse().unwrap_or(0);
                }
            }
            continue;
        }

        if let Some(path) = line.strip_prefix("? ") {
            status.untracked.push(PathBuf::from(path));
            continue;
        }

        let mut fields = line.splitn(2, ' ');
        let kind = fields.next().unwrap_or("");
        let rest = fields.next().unwrap_or("");

        match kind {
            "1" | "2" => {
                let mut parts = rest.splitn(2, ' ');
                let xy = parts.next().unwrap_or("");
                let tail = parts.next().unwrap_or("");
                let path = tail.rsplit(' ').next().unwrap_or(tail);
                let path = path.split('\t').next().unwrap_or(path);
                classify_xy(xy, path, &mut status);
            }
            "u" => {
                let mut parts = rest.splitn(2, ' ');
                let _xy = parts.next().unwrap_or("");
                let tail = parts.next().unwrap_or("");
                let path = tail.rsplit(' ').next().unwrap_or(tail);
                // unmerged entries are always unstaged conflicts regardless
                // of the reported X/Y letters; never run them through
                // classify_xy, which would also push into staged.
                status.unstaged.push(PathBuf::from(path));
            }
            _ => {}
        }
    }

    status.is_clean = status.staged.is_empty() && status.unstaged.is_empty() && status.untracked.is_empty();
    status
}

fn classify_xy(xy: &str, path: &str, status: &mut GitStatus) {
    let mut chars = xy.chars();
    let x = chars.next().unwrap_or('.');
    let y = chars.next().unwrap_or('.');

    if x != '.' {
        status.staged.push(PathBuf::from(path));
    }
    if y != '.' {
        status.unstaged.push(PathBuf::from(path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_branch_head_and_ahead_behind() {
        let input = "# branch.head main\n# branch.ab +2 -1\n";
        let status = parse_git_status(input);
        assert_eq!(status.branch.as_deref(), Some("main"));
        assert_eq!(status.ahead, 2);
        assert_eq!(status.behind, 1);
        assert!(status.is_clean);
    }

    #[test]
    fn classifies_staged_unstaged_and_untracked_paths() {
        let input = "# branch.head main\n\
# branch.ab +0 -0\n\
1 M. N... 100644 100644 100644 abc123 def456 staged.rs\n\
1 .M N... 100644 100644 100644 abc123 def456 unstaged.rs\n\
1 MM N... 100644 100644 100644 abc123 def456 both.rs\n\
? new_file.rs\n";
        let status = parse_git_status(input);
        assert_eq!(status.staged, vec![PathBuf::from("staged.rs"), PathBuf::from("both.rs")]);
        assert_eq!(status.unstaged, vec![PathBuf::from("unstaged.rs"), PathBuf::from("both.rs")]);
        assert_eq!(status.untracked, vec![PathBuf::from("new_file.rs")]);
        assert!(!status.is_clean);
    }

    #[test]
    fn parses_renamed_entries_and_keeps_the_new_path() {
        let input = "2 R. N... 100644 100644 100644 abc123 def456 R100 new_name.rs\told_name.rs\n";
        let status = parse_git_status(input);
        assert_eq!(status.staged, vec![PathBuf::from("new_name.rs")]);
    }

    #[test]
    fn unmerged_entries_land_in_unstaged() {
        let input = "u UU N... 100644 100644 100644 100644 abc123 def456 111111 conflict.rs\n";
        let status = parse_git_status(input);
        assert_eq!(status.unstaged, vec![PathBuf::from("conflict.rs")]);
        assert!(status.staged.is_empty(), "unmerged entries must never also land in staged");
    }

    #[test]
    fn detached_head_leaves_branch_as_none() {
        let input = "# branch.head (detached)\n";
        let status = parse_git_status(input);
        assert_eq!(status.branch, None);
    }
}
