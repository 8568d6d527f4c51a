//! Property-based tests for the resilience engine's core invariants.
//!
//! Run with: cargo test --test property_tests
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold across the classifier, retry, and circuit breaker
//! components.

pub mod circuit_breaker;
pub mod classifier;
pub mod retry;
