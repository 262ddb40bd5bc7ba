pub mod client;
pub mod gemini;

pub use client::LlmClient;
pub use gemini::GeminiClient;
