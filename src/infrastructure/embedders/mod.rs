pub mod gemini;

use crate::domain::models::EmbedderBox;

pub struct EmbedderManager {}

impl EmbedderManager {
    /// Gemini is the only embedding provider, the token is always a Gemini
    /// API key.
    pub fn get(token: &str) -> EmbedderBox {
        return Box::new(gemini::GeminiEmbedder::new(token));
    }
}
