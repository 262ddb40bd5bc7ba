//! Advisory feedback on submitted code.
//!
//! Wraps an optional [`LlmClient`]. Mirrors the sandbox's "errors become
//! data" contract: every method returns display-ready text, so the UI has
//! one uniform display rule for both collaborators.

use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::llm::{GeminiClient, LlmClient};

/// Fixed text returned when no API credential is configured.
pub const NOT_CONFIGURED: &str =
    "[Feedback is not configured. Set llm.api_key in the config file or export GEMINI_API_KEY.]";

/// Turns (code, error) pairs into free-text tutoring commentary.
pub struct Tutor {
    client: Option<Box<dyn LlmClient>>,
}

impl Tutor {
    pub fn new(client: Option<Box<dyn LlmClient>>) -> Self {
        Self { client }
    }

    /// Builds a tutor from config. Without an API key the tutor still
    /// works but answers every request with [`NOT_CONFIGURED`].
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = config.is_configured().then(|| {
            let key = config.api_key.clone().unwrap_or_default();
            Box::new(GeminiClient::new(config.clone(), key)) as Box<dyn LlmClient>
        });
        Self::new(client)
    }

    pub fn description(&self) -> String {
        match &self.client {
            Some(client) => client.description(),
            None => "not configured".to_string(),
        }
    }

    /// Asks the model for commentary on `code`, optionally with the error
    /// the code produced. Never fails; provider errors come back as text.
    pub async fn feedback(&self, code: &str, error: Option<&str>) -> String {
        let Some(client) = &self.client else {
            return NOT_CONFIGURED.to_string();
        };

        let prompt = build_prompt(code, error);
        match client.generate(&prompt).await {
            Ok(text) => {
                info!("Feedback received: {} chars", text.len());
                text
            }
            Err(e) => {
                warn!("Feedback call failed: {e}");
                format!("[Feedback error: {e}]")
            }
        }
    }

    /// Lists available model identifiers; a failure (including a missing
    /// credential) becomes a one-element descriptive list.
    pub async fn list_models(&self) -> Vec<String> {
        let Some(client) = &self.client else {
            return vec![format!("Error listing models: {NOT_CONFIGURED}")];
        };

        match client.list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!("Model listing failed: {e}");
                vec![format!("Error listing models: {e}")]
            }
        }
    }
}

/// Tutor persona prompt. With an error the model is asked to diagnose and
/// fix; without, only style/structure/efficiency suggestions.
fn build_prompt(code: &str, error: Option<&str>) -> String {
    let mut prompt = format!(
        "You are an expert Python tutor. Analyze the following code and provide feedback.\n\n\
         Code:\n{code}\n"
    );

    match error {
        Some(error) => {
            prompt.push_str(&format!(
                "\nError:\n{error}\n\n\
                 1. Explain what went wrong.\n\
                 2. Suggest how to fix it.\n\
                 3. Suggest improvements for code style, structure, or efficiency."
            ));
        }
        None => {
            prompt.push_str("\n1. Suggest improvements for code style, structure, or efficiency.");
        }
    }

    prompt
}
