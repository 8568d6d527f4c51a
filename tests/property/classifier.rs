//! Property tests over `rsl-classifier`'s determinism guarantees.

use proptest::prelude::*;
use rsl_classifier::{ClassifyContext, ErrorClassifier};

proptest! {
    /// Classifying the same message under the same context twice always
    /// yields the same verdict — the classifier carries no hidden state.
    #[test]
    fn classify_message_is_idempotent(message in ".{0,200}", provider in proptest::option::of("[a-z]{2,10}")) {
        let classifier = ErrorClassifier::new();
        let ctx = provider.map(ClassifyContext::for_provider);

        let first = classifier.classify_message(&message, ctx.as_ref());
        let second = classifier.classify_message(&message, ctx.as_ref());

        prop_assert_eq!(first.category(), second.category());
        prop_assert_eq!(first.is_retryable(), second.is_retryable());
        prop_assert_eq!(first.suggested_delay_ms(), second.suggested_delay_ms());
        prop_assert_eq!(first.max_retries(), second.max_retries());
    }

    /// A non-retryable verdict never carries a delay or a retry budget,
    /// whatever message produced it.
    #[test]
    fn non_retryable_verdicts_never_carry_delay_or_budget(message in ".{0,200}") {
        let classifier = ErrorClassifier::new();
        let classified = classifier.classify_message(&message, None);

        if !classified.is_retryable() {
            prop_assert_eq!(classified.suggested_delay_ms(), 0);
            prop_assert_eq!(classified.max_retries(), 0);
        }
    }

    /// Unauthorized and forbidden statuses are always classified the same
    /// way regardless of the accompanying message text.
    #[test]
    fn auth_statuses_are_never_retryable(status in prop::sample::select(vec![401u16, 403]), message in ".{0,100}") {
        use rsl_classifier::HttpError;
        let classifier = ErrorClassifier::new();
        let err = HttpError { status, message, retry_after_ms: None };
        let classified = classifier.classify_dyn(&err, None);
        prop_assert!(!classified.is_retryable());
    }
}
