use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictMarkers {
    pub start_line: usize,
    pub middle_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone)]
pub struct MergeConflict {
    pub file: PathBuf,
    pub ours: String,
    pub theirs: String,
    pub base: Option<String>,
    pub markers: ConflictMarkers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    Ours,
    Theirs,
    Combined,
    Manual,
}

#[derive(Debug, Clone)]
pub struct MergeResolution {
    pub file: PathBuf,
    pub resolved: String,
    pub strategy: ResolutionStrategy,
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub success: bool,
    pub merged: bool,
    pub conflicts: Vec<MergeConflict>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ResolveAllOutcome {
    pub resolutions: Vec<MergeResolution>,
    pub requires_review: bool,
}
