use async_trait::async_trait;
use std::fmt;

use crate::Result;

/// Sampling parameters passed along with every prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self { temperature, max_tokens }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(0.3, 1024)
    }
}

#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    /// Human readable backend name, used in logs
    fn name(&self) -> &str;

    /// Send a single prompt and return the generated text.
    ///
    /// Backends return the raw text, which may be empty; callers decide what
    /// an empty reply means at their call site.
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}
