use crate::error::ResilienceError;
use rsl_circuit::CircuitConfig;
use rsl_retry::RetryConfig;
use rsl_timeout::OperationType;
use tokio_util::sync::CancellationToken;

/// Per-call overrides for [`crate::execute_with_resilience`]. Every field
/// left `None`/`false` falls back to the manager's configured defaults.
pub struct ResilienceOptions<T, E> {
    pub operation_name: String,
    pub provider: Option<String>,
    pub agent: Option<String>,
    pub retry: Option<RetryConfig>,
    pub circuit: Option<CircuitConfig>,
    pub timeout_ms: Option<u64>,
    pub operation_type: Option<OperationType>,
    pub fallback_chain: Option<rsl_fallback::FallbackChain<T, ResilienceError<E>>>,
    pub skip_circuit_breaker: bool,
    pub skip_retry: bool,
    pub cancel: Option<CancellationToken>,
}

impl<T, E> ResilienceOptions<T, E> {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            provider: None,
            agent: None,
            retry: None,
            circuit: None,
            timeout_ms: None,
            operation_type: None,
            fallback_chain: None,
            skip_circuit_breaker: false,
            skip_retry: false,
            cancel: None,
        }
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn circuit(mut self, circuit: CircuitConfig) -> Self {
        self.circuit = Some(circuit);
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn operation_type(mut self, operation_type: OperationType) -> Self {
        self.operation_type = Some(operation_type);
        self
    }

    pub fn fallback_chain(mut self, chain: rsl_fallback::FallbackChain<T, ResilienceError<E>>) -> Self {
        self.fallback_chain = Some(chain);
        self
    }

    pub fn skip_circuit_breaker(mut self) -> Self {
        self.skip_circuit_breaker = true;
        self
    }

    pub fn skip_retry(mut self) -> Self {
        self.skip_retry = true;
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// `"provider:{id}"` if `provider` is set, else `"agent:{id}"` if `agent`
    /// is set, else `None` (no circuit wrap for this call).
    pub fn circuit_key(&self) -> Option<String> {
        self.provider
            .as_deref()
            .map(rsl_circuit::provider_key)
            .or_else(|| self.agent.as_deref().map(rsl_circuit::agent_key))
    }
}
