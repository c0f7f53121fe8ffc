//! Configuration types for team runs.
//!
//! Every knob that influences a run (model choice, sampling, timeouts, web
//! search, progress reporting) lives in [`CrewConfig`], built via
//! [`CrewConfigBuilder`]. The same config is shared by every stage of a run
//! and by every CV of a directory screening.

use crate::error::CrewError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for a team run.
///
/// Built via [`CrewConfig::builder()`] or using [`CrewConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_crew::CrewConfig;
///
/// let config = CrewConfig::builder()
///     .model("gpt-4o-mini")
///     .instructions("Be concise")
///     .search_max_results(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CrewConfig {
    /// LLM model identifier, e.g. "gpt-4o-mini", "claude-sonnet-4-20250514".
    /// If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for every stage. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the model may generate per stage. Default: 4096.
    ///
    /// The report writers produce several sections with tables; 4 096 leaves
    /// room for a full report without truncation.
    pub max_tokens: usize,

    /// Per-stage LLM call timeout in seconds. `None` waits indefinitely.
    /// Default: 120.
    pub api_timeout_secs: Option<u64>,

    /// Free-text instruction attached to every stage request, e.g. "Be concise".
    pub instructions: Option<String>,

    /// PDF user password for encrypted CVs.
    pub password: Option<String>,

    /// Number of web-search results attached to a search-enabled stage. Default: 5.
    pub search_max_results: usize,

    /// Timeout for one web-search HTTP request in seconds. Default: 30.
    pub search_timeout_secs: u64,

    /// Stream the final stage's answer through
    /// [`TeamProgressCallback::on_stage_delta`](crate::progress::TeamProgressCallback::on_stage_delta)
    /// when the provider supports it. Default: true.
    ///
    /// The provider's streaming call takes a single prompt, so a streamed
    /// stage runs with the provider's own sampling settings and reports no
    /// token counts.
    pub stream: bool,

    /// Receives per-stage events while a team runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.3,
            max_tokens: 4096,
            api_timeout_secs: Some(120),
            instructions: None,
            password: None,
            search_max_results: 5,
            search_timeout_secs: 30,
            stream: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CrewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrewConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("instructions", &self.instructions)
            .field("search_max_results", &self.search_max_results)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("stream", &self.stream)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl CrewConfig {
    /// Create a new builder for `CrewConfig`.
    pub fn builder() -> CrewConfigBuilder {
        CrewConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model name that will be requested from the provider.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`CrewConfig`].
pub struct CrewConfigBuilder {
    config: CrewConfig,
}

impl fmt::Debug for CrewConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrewConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl CrewConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    /// `0` disables the timeout.
    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = if secs == 0 { None } else { Some(secs) };
        self
    }

    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.config.instructions = Some(text.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn search_max_results(mut self, n: usize) -> Self {
        self.config.search_max_results = n;
        self
    }

    pub fn search_timeout_secs(mut self, secs: u64) -> Self {
        self.config.search_timeout_secs = secs;
        self
    }

    pub fn stream(mut self, enabled: bool) -> Self {
        self.config.stream = enabled;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CrewConfig, CrewError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(CrewError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.search_max_results == 0 {
            return Err(CrewError::InvalidConfig(
                "search_max_results must be ≥ 1".into(),
            ));
        }
        if c.search_timeout_secs == 0 {
            return Err(CrewError::InvalidConfig(
                "search_timeout_secs must be ≥ 1".into(),
            ));
        }
        if let Some(ref model) = c.model {
            if model.trim().is_empty() {
                return Err(CrewError::InvalidConfig("model must not be empty".into()));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = CrewConfig::default();
        assert_eq!(c.model_or_default(), "gpt-4o-mini");
        assert_eq!(c.max_tokens, 4096);
        assert_eq!(c.api_timeout_secs, Some(120));
        assert_eq!(c.search_max_results, 5);
        assert!(c.stream);
        assert!(c.instructions.is_none());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = CrewConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_timeout_disables_it() {
        let c = CrewConfig::builder().api_timeout_secs(0).build().unwrap();
        assert_eq!(c.api_timeout_secs, None);
    }

    #[test]
    fn rejects_zero_max_tokens() {
        let err = CrewConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, CrewError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_blank_model() {
        assert!(CrewConfig::builder().model("  ").build().is_err());
    }

    #[test]
    fn debug_without_provider() {
        let dbg = format!("{:?}", CrewConfig::default());
        assert!(dbg.starts_with("CrewConfig"));
        assert!(dbg.contains("provider: None"));
    }
}
