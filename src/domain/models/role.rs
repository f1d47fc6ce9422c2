use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

/// Who authored a turn in the transcript. Provider specific labels such as
/// Gemini's `model` only exist on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Name shown on top of a chat bubble.
    pub fn display_name(&self, model_name: &str) -> String {
        match self {
            Role::User => return Config::get(ConfigKey::Username),
            Role::Assistant => return model_name.to_string(),
        }
    }
}
