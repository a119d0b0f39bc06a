//! Operator configuration read from the process environment.

use pchat::{ChatPolicy, DEFAULT_MAX_CONTINUATION_CYCLES};
use pprovider::ProviderConfig;

pub const MAX_TOOL_CYCLES_ENV: &str = "PARLEY_MAX_TOOL_CYCLES";

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub provider: ProviderConfig,
    pub policy: ChatPolicy,
}

impl GatewayConfig {
    /// Reads `GOOGLE_API_KEY`, `GOOGLE_URL`, `VISION_MODELS` and `PARLEY_MAX_TOOL_CYCLES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let provider = ProviderConfig::from_lookup(&lookup);
        let mut policy = ChatPolicy::default();

        if let Some(raw) = lookup(MAX_TOOL_CYCLES_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(cycles) => policy = policy.with_max_continuation_cycles(cycles),
                Err(err) => tracing::warn!(
                    phase = "config",
                    event = "invalid_value",
                    variable = MAX_TOOL_CYCLES_ENV,
                    value = %raw,
                    default = DEFAULT_MAX_CONTINUATION_CYCLES,
                    error = %err,
                    "ignoring invalid tool cycle limit"
                ),
            }
        }

        Self { provider, policy }
    }

    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }
}
