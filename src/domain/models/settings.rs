#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;

use std::fmt;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Attachment;
use super::BackendName;
use super::ModelName;
use crate::configuration::Config;
use crate::configuration::ConfigKey;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Please provide accurate and helpful responses.";

fn default_system_prompt() -> String {
    return DEFAULT_SYSTEM_PROMPT.to_string();
}

/// User settings entered in the settings form. The attachment is never
/// serialized, only the key, prompt, and model reach the settings file.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub selected_model: ModelName,
    #[serde(skip)]
    pub attachment: Attachment,
}

impl Default for Settings {
    fn default() -> Settings {
        return Settings {
            api_key: "".to_string(),
            system_prompt: default_system_prompt(),
            selected_model: ModelName::default(),
            attachment: Attachment::None,
        };
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f
            .debug_struct("Settings")
            .field("api_key", &Settings::mask(&self.api_key))
            .field("system_prompt", &self.system_prompt)
            .field("selected_model", &self.selected_model)
            .field("attachment", &self.attachment)
            .finish();
    }
}

impl Settings {
    /// Chat is only enabled once an API key is present.
    pub fn is_ready(&self) -> bool {
        return !self.api_key.trim().is_empty();
    }

    pub fn backend(&self) -> BackendName {
        return self.selected_model.backend();
    }

    /// Hides all but the last four characters of a secret.
    pub fn mask(secret: &str) -> String {
        let count = secret.chars().count();
        if count <= 4 {
            return "*".repeat(count);
        }

        let visible = secret.chars().skip(count - 4).collect::<String>();
        return format!("{}{visible}", "*".repeat(count - 4));
    }

    /// Gemini key used for document embeddings. Gemini models reuse the chat
    /// key, Claude models need `embedding-token` from the config.
    pub fn embedding_token(&self) -> String {
        if self.backend() == BackendName::Gemini {
            return self.api_key.to_string();
        }

        return Config::get(ConfigKey::EmbeddingToken);
    }

    pub fn masked_api_key(&self) -> String {
        return Settings::mask(&self.api_key);
    }
}
