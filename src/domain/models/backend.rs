#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::AttachmentPayload;
use super::ChatTurn;

/// Output budget for every completion request.
pub const MAX_OUTPUT_TOKENS: u32 = 1000;
pub const TEMPERATURE: f32 = 0.7;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Claude,
    Gemini,
}

impl BackendName {
    pub fn parse(text: &str) -> Option<BackendName> {
        return BackendName::iter().find(|e| return e.to_string() == text);
    }
}

/// Models that can be picked in the settings form.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    EnumVariantNames,
    strum::Display,
)]
pub enum ModelName {
    #[default]
    #[serde(rename = "claude-3-5-sonnet-20241022")]
    #[strum(serialize = "claude-3-5-sonnet-20241022")]
    Claude35Sonnet,
    #[serde(rename = "claude-3-5-haiku-20241022")]
    #[strum(serialize = "claude-3-5-haiku-20241022")]
    Claude35Haiku,
    #[serde(rename = "claude-3-opus-20240229")]
    #[strum(serialize = "claude-3-opus-20240229")]
    Claude3Opus,
    #[serde(rename = "gemini-1.5-pro")]
    #[strum(serialize = "gemini-1.5-pro")]
    Gemini15Pro,
    #[serde(rename = "gemini-1.5-flash")]
    #[strum(serialize = "gemini-1.5-flash")]
    Gemini15Flash,
}

impl ModelName {
    pub fn parse(text: &str) -> Option<ModelName> {
        return ModelName::iter().find(|e| return e.to_string() == text.trim());
    }

    pub fn list() -> Vec<ModelName> {
        return ModelName::iter().collect();
    }

    pub fn backend(&self) -> BackendName {
        match self {
            ModelName::Claude35Sonnet | ModelName::Claude35Haiku | ModelName::Claude3Opus => {
                return BackendName::Claude;
            }
            ModelName::Gemini15Pro | ModelName::Gemini15Flash => return BackendName::Gemini,
        }
    }

    /// Cycles through the model list, wrapping at both ends.
    pub fn step(&self, forward: bool) -> ModelName {
        let models = ModelName::list();
        let idx = models.iter().position(|e| return e == self).unwrap_or(0);
        let len = models.len();

        if forward {
            return models[(idx + 1) % len];
        }

        return models[(idx + len - 1) % len];
    }
}

/// Typed failure of a remote model call.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{backend} rejected the API key (status {status}). Check the key in your settings.")]
    Authorization { backend: BackendName, status: u16 },
    #[error("{backend} is not reachable: {message}")]
    Network {
        backend: BackendName,
        message: String,
    },
    #[error("{backend} returned a malformed response: {message}")]
    MalformedResponse {
        backend: BackendName,
        message: String,
    },
    #[error("{backend} request failed with status {status}: {message}")]
    Status {
        backend: BackendName,
        status: u16,
        message: String,
    },
}

impl BackendError {
    pub fn from_reqwest(backend: BackendName, err: reqwest::Error) -> BackendError {
        if err.is_decode() {
            return BackendError::MalformedResponse {
                backend,
                message: err.to_string(),
            };
        }

        return BackendError::Network {
            backend,
            message: err.to_string(),
        };
    }

    pub fn from_status(backend: BackendName, status: u16, body: &str) -> BackendError {
        if status == 401 || status == 403 {
            return BackendError::Authorization { backend, status };
        }

        return BackendError::Status {
            backend,
            status,
            message: body.trim().to_string(),
        };
    }

    pub fn malformed(backend: BackendName, message: &str) -> BackendError {
        return BackendError::MalformedResponse {
            backend,
            message: message.to_string(),
        };
    }
}

/// Everything a backend needs for one completion call.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendPrompt {
    pub model: ModelName,
    pub system: String,
    pub turns: Vec<ChatTurn>,
    pub attachment: AttachmentPayload,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl BackendPrompt {
    pub fn new(model: ModelName, system_prompt: &str, turns: &[ChatTurn]) -> BackendPrompt {
        return BackendPrompt {
            model,
            system: system_prompt.to_string(),
            turns: turns.to_vec(),
            attachment: AttachmentPayload::None,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        };
    }

    /// Appends retrieved document context to the system instruction.
    pub fn append_context(&mut self, context: &str) {
        if context.trim().is_empty() {
            return;
        }

        self.system = format!(
            "{}\n\nAnswer using the following excerpts from the uploaded documents when they are relevant:\n\n{}",
            self.system.trim_end(),
            context.trim()
        );
    }

    pub fn with_attachment(mut self, attachment: AttachmentPayload) -> BackendPrompt {
        self.attachment = attachment;
        return self;
    }
}

#[async_trait]
pub trait Backend {
    /// Returns the name of the backend.
    fn name(&self) -> BackendName;

    /// Used after settings are saved to verify the API key and that the
    /// backend is reachable.
    async fn health_check(&self) -> Result<()>;

    /// Requests a single, complete reply for the prompt. Attachments are
    /// sent along with the latest user turn.
    async fn get_completion(&self, prompt: &BackendPrompt) -> Result<String, BackendError>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
