use std::fmt;
use tracing::warn;

use super::LocationMode;
use crate::client::DEFAULT_MODEL;

/// Environment variables searched for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
pub const LOCATION_MODE_VAR: &str = "ASSISTANT_LOCATION_MODE";

/// Settings for building an [`Assistant`](super::Assistant).
#[derive(Clone, PartialEq)]
pub struct AssistantConfig {
    /// `None` means the assistant answers every prompt with the missing-key reply.
    pub api_key: Option<String>,
    pub model: String,
    /// `None` uses the public Gemini endpoint.
    pub base_url: Option<String>,
    pub location_mode: LocationMode,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            location_mode: LocationMode::default(),
        }
    }
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("location_mode", &self.location_mode)
            .finish()
    }
}

impl AssistantConfig {
    /// Defaults: no key, the default model, the public endpoint, prompt-context mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from the process environment.
    ///
    /// When no key is set at runtime, a key captured from the build environment is used.
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|name| std::env::var(name).ok());
        if config.api_key.is_none() {
            config.api_key = build_time_api_key().map(str::to_string);
        }
        config
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Empty or whitespace-only values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = Self {
            api_key: API_KEY_VARS.iter().find_map(|name| get(*name)),
            base_url: get(BASE_URL_VAR),
            ..Self::default()
        };

        if let Some(model) = get(MODEL_VAR) {
            config.model = model;
        }

        if let Some(mode) = get(LOCATION_MODE_VAR) {
            match mode.parse() {
                Ok(mode) => config.location_mode = mode,
                Err(error) => warn!(%error, "falling back to the default location mode"),
            }
        }

        config
    }

    /// Set the API key; a blank key leaves the assistant unconfigured.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into()).filter(|key| !key.trim().is_empty());
        self
    }

    /// Set the model name, with or without the `models/` prefix.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send requests to `base_url` instead of the public endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Choose how the driver's location reaches the model.
    pub fn with_location_mode(mut self, location_mode: LocationMode) -> Self {
        self.location_mode = location_mode;
        self
    }
}

fn build_time_api_key() -> Option<&'static str> {
    first_usable_key([option_env!("GEMINI_API_KEY"), option_env!("API_KEY")])
}

/// First candidate that is set and not blank, in order.
fn first_usable_key<'a>(candidates: [Option<&'a str>; 2]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .find(|key| !key.trim().is_empty())
}
