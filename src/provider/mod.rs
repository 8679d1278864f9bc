//! LLM provider interfaces
//!
//! HTTP clients live outside this crate. What is modelled here is the seam
//! they plug into: a [`Provider`] trait, the [`GenerationParams`] shared by
//! every call, and a [`ModelRegistry`] mapping model names to the factory of
//! the provider that serves them.

pub mod batch;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
pub use batch::{
    BatchRecord, BatchRequest, BatchResult, BatchSubmitter, PreparedRequest, RecordedRequest,
    ResultStatus, submit_prepared,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters. `None` means "let the provider decide".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            temperature: Some(0.7),
            max_tokens: Some(1000),
            top_p: Some(0.95),
            top_k: Some(40),
            frequency_penalty: Some(0.0),
            presence_penalty: Some(0.0),
            seed: None,
        }
    }
}

impl GenerationParams {
    /// No parameter set; useful as an override base.
    pub fn unset() -> Self {
        GenerationParams {
            temperature: None,
            max_tokens: None,
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
            seed: None,
        }
    }

    /// `self` with every parameter set in `overrides` replaced.
    pub fn merged(&self, overrides: &GenerationParams) -> GenerationParams {
        GenerationParams {
            temperature: overrides.temperature.or(self.temperature),
            max_tokens: overrides.max_tokens.or(self.max_tokens),
            top_p: overrides.top_p.or(self.top_p),
            top_k: overrides.top_k.or(self.top_k),
            frequency_penalty: overrides.frequency_penalty.or(self.frequency_penalty),
            presence_penalty: overrides.presence_penalty.or(self.presence_penalty),
            seed: overrides.seed.or(self.seed),
        }
    }

    /// The set parameters as a JSON object, ready to merge into a request body.
    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// A model endpoint able to answer prompts.
pub trait Provider: Send + Sync {
    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;

    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ProviderError>;

    fn chat(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, ProviderError>;

    /// Batch support, for providers that offer it.
    fn batch_submitter(&self) -> Option<&dyn BatchSubmitter> {
        None
    }
}

/// Builds a provider for `(model, api_key, default params)`.
pub type ProviderFactory =
    Box<dyn Fn(&str, &str, &GenerationParams) -> Box<dyn Provider> + Send + Sync>;

/// Environment variable holding the API key of a provider (`OPENAI_API_KEY`, ...).
pub fn api_key_env_var(provider_name: &str) -> String {
    format!("{}_API_KEY", provider_name.to_ascii_uppercase())
}

/// Model name to provider factory.
///
/// Built once at startup and passed by reference.
pub struct ModelRegistry {
    defaults: GenerationParams,
    factories: HashMap<String, ProviderFactory>,
    models: HashMap<String, String>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("defaults", &self.defaults)
            .field("providers", &self.providers())
            .finish()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(GenerationParams::default())
    }
}

impl ModelRegistry {
    pub fn new(defaults: GenerationParams) -> Self {
        Self {
            defaults,
            factories: HashMap::new(),
            models: HashMap::new(),
        }
    }

    pub fn defaults(&self) -> &GenerationParams {
        &self.defaults
    }

    /// Register a provider and the models it serves.
    ///
    /// A model already registered by another provider is taken over.
    pub fn register<F>(
        &mut self,
        provider_name: &str,
        models: &[&str],
        factory: F,
    ) -> Result<(), ProviderError>
    where
        F: Fn(&str, &str, &GenerationParams) -> Box<dyn Provider> + Send + Sync + 'static,
    {
        if models.is_empty() {
            return Err(ProviderError::NoModels(provider_name.to_string()));
        }

        for model in models {
            if let Some(previous) = self
                .models
                .insert(model.to_string(), provider_name.to_string())
            {
                log::warn!("Model '{model}' was registered by {previous}, now served by {provider_name}");
            }
        }
        self.factories
            .insert(provider_name.to_string(), Box::new(factory));

        log::debug!("Registered provider {provider_name} with {} models", models.len());
        Ok(())
    }

    /// Instantiate the provider serving `model`.
    ///
    /// Without an explicit key, the provider's `<NAME>_API_KEY` environment
    /// variable is used.
    pub fn create(
        &self,
        model: &str,
        api_key: Option<&str>,
    ) -> Result<Box<dyn Provider>, ProviderError> {
        let provider_name = self
            .models
            .get(model)
            .ok_or_else(|| ProviderError::UnknownModel {
                model: model.to_string(),
                available: self.available_models(),
            })?;

        let api_key = match api_key {
            Some(key) => key.to_string(),
            None => std::env::var(api_key_env_var(provider_name)).unwrap_or_default(),
        };
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey(provider_name.clone()));
        }

        let factory = self
            .factories
            .get(provider_name)
            .ok_or_else(|| ProviderError::NoModels(provider_name.clone()))?;
        Ok(factory(model, &api_key, &self.defaults))
    }

    pub fn provider_for(&self, model: &str) -> Option<&str> {
        self.models.get(model).map(String::as_str)
    }

    pub fn available_models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.models.keys().cloned().collect();
        models.sort();
        models
    }

    /// Provider name to its sorted models.
    pub fn providers(&self) -> BTreeMap<String, Vec<String>> {
        let mut providers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (model, provider) in &self.models {
            providers
                .entry(provider.clone())
                .or_default()
                .push(model.clone());
        }
        for models in providers.values_mut() {
            models.sort();
        }
        providers
    }
}
