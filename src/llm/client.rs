//! `LlmClient` trait — abstraction over remote model backends.
//!
//! Providers implement this trait so the tutor can be pointed at any
//! supported backend; only Gemini is built in today.

use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over remote text-generation backends.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends a single prompt and returns the model's free-text response.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Lists the model identifiers available to the configured credential.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Human-readable description of the provider and model.
    ///
    /// Used in status output, e.g. `"gemini (gemini-2.5-flash)"`.
    fn description(&self) -> String;
}
