//! Outbound HTTP API clients

pub mod gemini;

pub use gemini::{GeminiClient, GenerateContentRequest, GenerationBackend};
