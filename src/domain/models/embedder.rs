#[cfg(test)]
#[path = "embedder_test.rs"]
pub mod fake_embedders;

use async_trait::async_trait;

use super::BackendError;

#[async_trait]
pub trait Embedder {
    /// Embeds every text, returning one vector per input in the same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError>;
}

pub type EmbedderBox = Box<dyn Embedder + Send + Sync>;
