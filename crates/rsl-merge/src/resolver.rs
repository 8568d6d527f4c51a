use crate::conflict::detect_conflicts;
use crate::error::MergeError;
use crate::model::{MergeConflict, MergeOutcome, MergeResolution, ResolutionStrategy, ResolveAllOutcome};
use rsl_git::{exec_git, has_uncommitted_changes, GitExecOptions};
use std::path::{Path, PathBuf};

pub async fn start_merge(worktree_path: &Path, source_branch: &str) -> Result<MergeOutcome, MergeError> {
    #[cfg(feature = "tracing")]
    tracing::debug!(source_branch, "starting merge");

    match exec_git(&["merge", source_branch, "--no-commit"], worktree_path, GitExecOptions::default()).await {
        Ok(_) => Ok(MergeOutcome {
            success: true,
            merged: false,
            conflicts: Vec::new(),
            message: "Merge staged, ready to commit".to_string(),
        }),
        Err(err) if err.stderr.contains("CONFLICT") => {
            let conflicts = detect_conflicts(worktree_path).await?;

            #[cfg(feature = "tracing")]
            tracing::info!(source_branch, conflicts = conflicts.len(), "merge produced conflicts");

            Ok(MergeOutcome {
                success: false,
                merged: false,
                conflicts,
                message: "Merge produced conflicts".to_string(),
            })
        }
        Err(err) => Err(err.into()),
    }
}

/// Writes the resolution to disk and stages it. The worktree root is derived
/// from the absolute path: if it runs through a `.worktrees` segment, the
/// root is `{prefix}/.worktrees/{next_segment}`; otherwise it's just the
/// file's parent directory.
pub async fn resolve_conflict(resolution: &MergeResolution) -> Result<(), MergeError> {
    tokio::fs::write(&resolution.file, &resolution.resolved)
        .await
        .map_err(|source| MergeError::Io {
            path: resolution.file.display().to_string(),
            source,
        })?;

    let worktree_root = worktree_root_of(&resolution.file);
    let rel_path = resolution
        .file
        .strip_prefix(&worktree_root)
        .unwrap_or(&resolution.file)
        .display()
        .to_string();

    exec_git(&["add", &rel_path], &worktree_root, GitExecOptions::default()).await?;
    Ok(())
}

fn worktree_root_of(file: &Path) -> PathBuf {
    let components: Vec<_> = file.components().collect();
    if let Some(idx) = components.iter().position(|c| c.as_os_str() == ".worktrees") {
        if idx + 1 < components.len() {
            return components[..=idx + 1].iter().collect();
        }
    }
    file.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
}

pub async fn abort_merge(worktree_path: &Path) -> Result<(), MergeError> {
    #[cfg(feature = "tracing")]
    tracing::debug!("aborting merge");

    exec_git(&["merge", "--abort"], worktree_path, GitExecOptions::default()).await?;
    Ok(())
}

pub async fn complete_merge(worktree_path: &Path, message: Option<&str>) -> Result<MergeOutcome, MergeError> {
    let remaining = detect_conflicts(worktree_path).await?;
    if !remaining.is_empty() {
        return Ok(MergeOutcome {
            success: false,
            merged: false,
            conflicts: remaining,
            message: "Unresolved conflicts remain".to_string(),
        });
    }

    if !has_uncommitted_changes(worktree_path).await {
        return Ok(MergeOutcome {
            success: true,
            merged: true,
            conflicts: Vec::new(),
            message: "No changes to commit".to_string(),
        });
    }

    let message = message.unwrap_or("Merge resolved conflicts");
    exec_git(&["commit", "-m", message], worktree_path, GitExecOptions::default()).await?;

    #[cfg(feature = "tracing")]
    tracing::info!(message, "merge committed");

    Ok(MergeOutcome {
        success: true,
        merged: true,
        conflicts: Vec::new(),
        message: message.to_string(),
    })
}

pub async fn resolve_all(worktree_path: &Path, strategy: ResolutionStrategy) -> Result<ResolveAllOutcome, MergeError> {
    let conflicts = detect_conflicts(worktree_path).await?;
    let mut resolutions = Vec::with_capacity(conflicts.len());

    for conflict in &conflicts {
        let resolution = resolve_by_strategy(conflict, strategy);
        resolve_conflict(&resolution).await?;
        resolutions.push(resolution);
    }

    let requires_review = resolutions.iter().any(|r| r.confidence < 0.8);

    #[cfg(feature = "tracing")]
    tracing::debug!(strategy = ?strategy, resolved = resolutions.len(), requires_review, "resolved all conflicts");

    Ok(ResolveAllOutcome { resolutions, requires_review })
}

fn resolve_by_strategy(conflict: &MergeConflict, strategy: ResolutionStrategy) -> MergeResolution {
    let (resolved, confidence, reasoning) = match strategy {
        ResolutionStrategy::Ours => (conflict.ours.clone(), 1.0, "Kept our changes"),
        ResolutionStrategy::Theirs => (conflict.theirs.clone(), 1.0, "Accepted their changes"),
        ResolutionStrategy::Combined => (
            format!("{}\n{}", conflict.ours, conflict.theirs),
            0.5,
            "Combined sequentially — review recommended",
        ),
        ResolutionStrategy::Manual => (
            format!("<<<<<<< ours\n{}\n=======\n{}\n>>>>>>> theirs", conflict.ours, conflict.theirs),
            0.0,
            "Requires manual resolution",
        ),
    };

    MergeResolution {
        file: conflict.file.clone(),
        resolved,
        strategy,
        confidence,
        reasoning: reasoning.to_string(),
    }
}
