#[cfg(test)]
#[path = "claude_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AttachmentPayload;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendName;
use crate::domain::models::BackendPrompt;
use crate::domain::models::Role;
use crate::domain::models::MIME_PDF;
use crate::domain::models::MIME_TEXT;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Source {
    Base64 { media_type: String, data: String },
    Text { media_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: Source,
    },
    Document {
        source: Source,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    messages: Vec<MessageRequest>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default)]
    text: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    content: Vec<ResponseBlock>,
}

fn attachment_block(attachment: &AttachmentPayload) -> Option<ContentBlock> {
    match attachment {
        AttachmentPayload::None => return None,
        AttachmentPayload::Image { mime_type, data } => {
            return Some(ContentBlock::Image {
                source: Source::Base64 {
                    media_type: mime_type.to_string(),
                    data: data.to_string(),
                },
            });
        }
        AttachmentPayload::Pdf { file_name, data } => {
            return Some(ContentBlock::Document {
                source: Source::Base64 {
                    media_type: MIME_PDF.to_string(),
                    data: data.to_string(),
                },
                title: Some(file_name.to_string()),
            });
        }
        AttachmentPayload::Text { file_name, text } => {
            return Some(ContentBlock::Document {
                source: Source::Text {
                    media_type: MIME_TEXT.to_string(),
                    data: text.to_string(),
                },
                title: Some(file_name.to_string()),
            });
        }
    }
}

fn to_request(prompt: &BackendPrompt) -> CompletionRequest {
    let last_idx = prompt.turns.len().saturating_sub(1);
    let messages = prompt
        .turns
        .iter()
        .enumerate()
        .map(|(idx, turn)| {
            let mut content = vec![];
            if idx == last_idx && turn.role() == Role::User {
                content.extend(attachment_block(&prompt.attachment));
            }
            content.push(ContentBlock::Text {
                text: turn.content().to_string(),
            });

            return MessageRequest {
                role: turn.role().to_string(),
                content,
            };
        })
        .collect();

    return CompletionRequest {
        model: prompt.model.to_string(),
        max_tokens: prompt.max_tokens,
        temperature: prompt.temperature,
        system: prompt.system.to_string(),
        messages,
    };
}

pub struct Claude {
    url: String,
    token: String,
    timeout: String,
}

impl Claude {
    pub fn new(token: &str) -> Claude {
        return Claude {
            url: Config::get(ConfigKey::ClaudeURL),
            token: token.to_string(),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Backend for Claude {
    fn name(&self) -> BackendName {
        return BackendName::Claude;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Claude URL is not defined");
        }
        if self.token.is_empty() {
            bail!("Claude API key is not defined");
        }

        let res = reqwest::Client::new()
            .get(format!("{url}/v1/models", url = self.url))
            .header("x-api-key", &self.token)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let result = match res {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = ?err, "Claude is not reachable");
                bail!("Claude is not reachable");
            }
        };

        let status = result.status().as_u16();
        if status == 401 || status == 403 {
            bail!("Claude rejected the API key");
        }
        if status >= 400 {
            tracing::error!(status = status, "Claude health check failed");
            bail!("Claude health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, prompt: &BackendPrompt) -> Result<String, BackendError> {
        let req = to_request(prompt);

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/messages", url = self.url))
            .header("x-api-key", &self.token)
            .header("content-type", "application/json")
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&req)
            .send()
            .await
            .map_err(|err| return BackendError::from_reqwest(BackendName::Claude, err))?;

        let status = res.status().as_u16();
        if !res.status().is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status = status, "Failed to make completion request to Claude");
            return Err(BackendError::from_status(BackendName::Claude, status, &body));
        }

        let ores = res
            .json::<CompletionResponse>()
            .await
            .map_err(|err| return BackendError::from_reqwest(BackendName::Claude, err))?;
        tracing::debug!(body = ?ores, "Completion response");

        let text = ores
            .content
            .iter()
            .filter(|block| return block._type == "text")
            .map(|block| return block.text.as_str())
            .collect::<Vec<&str>>()
            .join("");

        if text.is_empty() {
            return Err(BackendError::malformed(
                BackendName::Claude,
                "response contained no text",
            ));
        }

        return Ok(text);
    }
}
