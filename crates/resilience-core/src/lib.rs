//! Resilience engine and git worktree/merge toolkit for multi-agent
//! orchestration platforms.
//!
//! `resilience-core` collects the error classification, retry, circuit
//! breaker, timeout, and fallback primitives an orchestrator needs to keep
//! calling flaky providers and tools, plus a git worktree and merge engine
//! for running agent tasks in isolated branches. Each piece is available as
//! its own crate and as a feature here.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! resilience-core = { version = "0.1", features = ["manager", "worktree", "merge"] }
//! ```
//!
//! # Components
//!
//! - **[Classifier]** — turns arbitrary errors into a retryable/permanent
//!   category, consulting HTTP status, message patterns, and provider
//!   overrides.
//! - **[Retry]** — exponential backoff with jitter, short-circuiting on
//!   errors the classifier marks non-retryable.
//! - **[Circuit]** — per-key (`provider:{id}` / `agent:{id}`) admission
//!   control backed by a sliding failure window, with a shared registry.
//! - **[Timeout]** — per-operation deadlines, with a default table keyed by
//!   operation type.
//! - **[Fallback]** — ordered fallback chains with an optional degraded
//!   terminal value for when every alternative fails.
//! - **[Manager]** — composes the above outside-in (timeout ∘ circuit ∘
//!   retry, optionally wrapped in a fallback chain) behind one call and a
//!   merged recovery event stream.
//! - **[Git]** — async `git` subprocess runner and porcelain v2/shortstat
//!   parsers.
//! - **[Worktree]** — per-task worktree lifecycle: create, list, lock,
//!   cleanup.
//! - **[Merge]** — conflict detection and resolution strategies (ours,
//!   theirs, combined, manual) layered over plain git merge plumbing.
//!
//! [Classifier]: #classifier
//! [Retry]: #retry
//! [Circuit]: #circuit
//! [Timeout]: #timeout
//! [Fallback]: #fallback
//! [Manager]: #manager
//! [Git]: #git
//! [Worktree]: #worktree
//! [Merge]: #merge
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "manager")]
//! # {
//! use resilience_core::manager::{ResilienceManager, ResilienceOptions, execute_with_resilience};
//! use resilience_core::circuit::CircuitConfig;
//! use resilience_core::retry::RetryConfig;
//!
//! # #[derive(Debug)]
//! # struct ProviderError;
//! # impl std::fmt::Display for ProviderError {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "provider error") }
//! # }
//! # impl std::error::Error for ProviderError {}
//! # impl resilience_core::classifier::ClassifiableError for ProviderError {}
//! # async fn example() {
//! let manager = ResilienceManager::new(
//!     RetryConfig::builder().max_attempts(3).build().unwrap(),
//!     CircuitConfig::builder().failure_threshold(5).build().unwrap(),
//! );
//!
//! let options = ResilienceOptions::<(), ProviderError>::new("call-provider").provider("openai");
//! let _ = execute_with_resilience(&manager, || async { Ok(()) }, options).await;
//! # }
//! # }
//! ```

#[cfg(feature = "classifier")]
pub use rsl_classifier as classifier;

#[cfg(feature = "retry")]
pub use rsl_retry as retry;

#[cfg(feature = "circuit")]
pub use rsl_circuit as circuit;

#[cfg(feature = "timeout")]
pub use rsl_timeout as timeout;

#[cfg(feature = "fallback")]
pub use rsl_fallback as fallback;

#[cfg(feature = "manager")]
pub use rsl_manager as manager;

#[cfg(feature = "git")]
pub use rsl_git as git;

#[cfg(feature = "worktree")]
pub use rsl_worktree as worktree;

#[cfg(feature = "merge")]
pub use rsl_merge as merge;

/// Event/metrics infrastructure underlying every component's event stream,
/// always available regardless of which optional components are enabled.
pub use rsl_core as events;
