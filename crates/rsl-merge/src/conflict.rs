use crate::error::MergeError;
use crate::model::{ConflictMarkers, MergeConflict};
use rsl_git::{exec_git, GitExecOptions};
use std::path::Path;

const CONFLICT_START: &str = "<<<<<<< ";
const CONFLICT_MIDDLE: &str = "=======";
const CONFLICT_END: &str = ">>>>>>> ";

/// Lists unmerged files and parses each for conflict markers. `Ok(vec![])`
/// when there's no merge in progress rather than an error, since "nothing to
/// detect" is the expected steady state outside a conflict.
pub async fn detect_conflicts(worktree_path: &Path) -> Result<Vec<MergeConflict>, MergeError> {
    let listing = match exec_git(&["diff", "--name-only", "--diff-filter=U"], worktree_path, GitExecOptions::default()).await {
        Ok(out) => out,
        Err(err) if err.stderr.contains("not a merge") => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut conflicts = Vec::new();
    for rel_path in listing.lines().filter(|line| !line.is_empty()) {
        let abs_path = worktree_path.join(rel_path);
        let content = tokio::fs::read_to_string(&abs_path).await.map_err(|source| MergeError::Io {
            path: abs_path.display().to_string(),
            source,
        })?;

        let Some((ours, theirs, markers)) = parse_conflict_markers(&content) else {
            continue;
        };

        let base = exec_git(&["show", &format!(":1:{rel_path}")], worktree_path, GitExecOptions::default())
            .await
            .ok();

        conflicts.push(MergeConflict {
            file: abs_path,
            ours,
            theirs,
            base,
            markers,
        });
    }

    Ok(conflicts)
}

/// Scans for the first `<<<<<<< ` / `=======` / `>>>>>>> ` triple and splits
/// the ours/theirs blocks around it. Only the first conflict hunk per file is
/// reported; a file with multiple hunks is resolved hunk-by-hunk across
/// repeated calls as earlier hunks are cleared.
fn parse_conflict_markers(content: &str) -> Option<(String, String, ConflictMarkers)> {
    let lines: Vec<&str> = content.lines().collect();

    let start_idx = lines.iter().position(|line| line.starts_with(CONFLICT_START))?;
    let middle_idx = lines[start_idx..].iter().position(|line| *line == CONFLICT_MIDDLE).map(|i| i + start_idx)?;
    let end_idx = lines[middle_idx..].iter().position(|line| line.starts_with(CONFLICT_END)).map(|i| i + middle_idx)?;

    let ours = lines[start_idx + 1..middle_idx].join("\n");
    let theirs = lines[middle_idx + 1..end_idx].join("\n");

    Some((
        ours,
        theirs,
        ConflictMarkers {
            start_line: start_idx + 1,
            middle_line: middle_idx + 1,
            end_line: end_idx + 1,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_conflict_hunk_and_records_marker_lines() {
        let content = "a\n<<<<<<< HEAD\nours line\n=======\ntheirs line\n>>>>>>> feature\nb\n";
        let (ours, theirs, markers) = parse_conflict_markers(content).unwrap();
        assert_eq!(ours, "ours line");
        assert_eq!(theirs, "theirs line");
        assert_eq!(markers, ConflictMarkers { start_line: 2, middle_line: 4, end_line: 6 });
    }

    #[test]
    fn content_without_markers_yields_none() {
        assert!(parse_conflict_markers("clean file\nno conflicts here\n").is_none());
    }
}
