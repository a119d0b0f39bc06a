//! Operator-level provider configuration: base endpoint, default key, per-model tables.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use pprovider::{ProviderConfig, TimeoutTable, VisionTable};
//!
//! let config = ProviderConfig::default().with_base_url("proxy.internal/");
//! assert_eq!(config.base_url(), "https://proxy.internal");
//!
//! let timeouts = TimeoutTable::default();
//! assert_eq!(timeouts.timeout_for("gemini-1.5-flash"), Duration::from_secs(60));
//! assert_eq!(timeouts.timeout_for("gemini-2.0-flash-thinking-exp"), Duration::from_secs(300));
//!
//! assert!(VisionTable::default().supports("gemini-1.5-pro"));
//! ```

use std::time::Duration;

use secrecy::SecretString;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const THINKING_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

const DEFAULT_VISION_KEYWORDS: &[&str] = &[
    "vision",
    "gemini-1.5",
    "gemini-2",
    "gemini-exp",
    "learnlm",
    "gemini-pro-vision",
    "gpt-4o",
    "claude-3",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelMatch {
    Contains(String),
    Prefix(String),
    Exact(String),
}

impl ModelMatch {
    pub fn matches(&self, model: &str) -> bool {
        let model = model.to_ascii_lowercase();
        match self {
            Self::Contains(needle) => model.contains(needle.as_str()),
            Self::Prefix(prefix) => model.starts_with(prefix.as_str()),
            Self::Exact(name) => model == *name,
        }
    }
}

/// Per-model request deadlines. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutTable {
    default: Duration,
    rules: Vec<(ModelMatch, Duration)>,
}

impl Default for TimeoutTable {
    fn default() -> Self {
        let slow = [
            ModelMatch::Contains("-thinking".to_string()),
            ModelMatch::Contains("deepseek-r".to_string()),
            ModelMatch::Prefix("o1".to_string()),
            ModelMatch::Prefix("o3".to_string()),
            ModelMatch::Prefix("dall-e".to_string()),
        ];

        Self {
            default: DEFAULT_REQUEST_TIMEOUT,
            rules: slow
                .into_iter()
                .map(|rule| (rule, THINKING_REQUEST_TIMEOUT))
                .collect(),
        }
    }
}

impl TimeoutTable {
    pub fn with_default(mut self, timeout: Duration) -> Self {
        self.default = timeout;
        self
    }

    /// Operator rules take priority over the built-in ones.
    pub fn with_rule(mut self, rule: ModelMatch, timeout: Duration) -> Self {
        self.rules.insert(0, (rule, timeout));
        self
    }

    pub fn timeout_for(&self, model: &str) -> Duration {
        self.rules
            .iter()
            .find(|(rule, _)| rule.matches(model))
            .map(|(_, timeout)| *timeout)
            .unwrap_or(self.default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionTable {
    keywords: Vec<String>,
    enabled: Vec<String>,
    disabled: Vec<String>,
}

impl Default for VisionTable {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_VISION_KEYWORDS
                .iter()
                .map(|keyword| keyword.to_string())
                .collect(),
            enabled: Vec::new(),
            disabled: Vec::new(),
        }
    }
}

impl VisionTable {
    /// Applies a `VISION_MODELS` style list: `name` enables, `-name` disables.
    pub fn with_overrides(mut self, list: &str) -> Self {
        for entry in list.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            match entry.strip_prefix('-') {
                Some(name) => self.disabled.push(name.trim().to_ascii_lowercase()),
                None => self
                    .enabled
                    .push(entry.trim_start_matches('+').trim().to_ascii_lowercase()),
            }
        }
        self
    }

    pub fn supports(&self, model: &str) -> bool {
        let model = model.to_ascii_lowercase();
        if self.disabled.iter().any(|name| *name == model) {
            return false;
        }

        if self.enabled.iter().any(|name| *name == model) {
            return true;
        }

        self.keywords.iter().any(|keyword| model.contains(keyword.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    base_url: String,
    pub api_key: Option<SecretString>,
    pub timeouts: TimeoutTable,
    pub vision: VisionTable,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: None,
            timeouts: TimeoutTable::default(),
            vision: VisionTable::default(),
        }
    }
}

impl ProviderConfig {
    /// Reads `GOOGLE_API_KEY`, `GOOGLE_URL` and `VISION_MODELS` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(key) = lookup("GOOGLE_API_KEY").filter(|value| !value.trim().is_empty()) {
            config = config.with_api_key(SecretString::from(key.trim().to_string()));
        }

        if let Some(url) = lookup("GOOGLE_URL").filter(|value| !value.trim().is_empty()) {
            config = config.with_base_url(url);
        }

        if let Some(list) = lookup("VISION_MODELS") {
            config.vision = config.vision.with_overrides(&list);
        }

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutTable) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_vision(mut self, vision: VisionTable) -> Self {
        self.vision = vision;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    with_scheme.trim_end_matches('/').to_string()
}
