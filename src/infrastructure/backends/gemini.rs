#[cfg(test)]
#[path = "gemini_test.rs"]
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

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentPartsBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum ContentParts {
    Text(String),
    InlineData(ContentPartsBlob),
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentParts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

fn attachment_part(attachment: &AttachmentPayload) -> Option<ContentParts> {
    match attachment {
        AttachmentPayload::None => return None,
        AttachmentPayload::Image { mime_type, data } => {
            return Some(ContentParts::InlineData(ContentPartsBlob {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            }));
        }
        AttachmentPayload::Pdf { data, .. } => {
            return Some(ContentParts::InlineData(ContentPartsBlob {
                mime_type: MIME_PDF.to_string(),
                data: data.to_string(),
            }));
        }
        AttachmentPayload::Text { file_name, text } => {
            return Some(ContentParts::Text(format!(
                "Contents of {file_name}:\n\n{text}"
            )));
        }
    }
}

fn to_request(prompt: &BackendPrompt) -> CompletionRequest {
    let last_idx = prompt.turns.len().saturating_sub(1);
    let contents = prompt
        .turns
        .iter()
        .enumerate()
        .map(|(idx, turn)| {
            let mut parts = vec![];
            if idx == last_idx && turn.role() == Role::User {
                parts.extend(attachment_part(&prompt.attachment));
            }
            parts.push(ContentParts::Text(turn.content().to_string()));

            let role = match turn.role() {
                Role::User => "user",
                Role::Assistant => "model",
            };

            return Content {
                role: Some(role.to_string()),
                parts,
            };
        })
        .collect();

    let mut system_instruction = None;
    if !prompt.system.trim().is_empty() {
        system_instruction = Some(Content {
            role: None,
            parts: vec![ContentParts::Text(prompt.system.to_string())],
        });
    }

    return CompletionRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig {
            max_output_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
        },
    };
}

pub struct Gemini {
    url: String,
    token: String,
    timeout: String,
}

impl Gemini {
    pub fn new(token: &str) -> Gemini {
        return Gemini {
            url: Config::get(ConfigKey::GeminiURL),
            token: token.to_string(),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Backend for Gemini {
    fn name(&self) -> BackendName {
        return BackendName::Gemini;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Gemini URL is not defined");
        }
        if self.token.is_empty() {
            bail!("Gemini API key is not defined");
        }

        let res = reqwest::Client::new()
            .get(format!("{url}/v1beta/models", url = self.url))
            .query(&[("key", &self.token)])
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let result = match res {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = err.without_url().to_string(), "Gemini is not reachable");
                bail!("Gemini is not reachable");
            }
        };

        let status = result.status().as_u16();
        if status >= 400 {
            let body = result.text().await.unwrap_or_default();
            if body.contains("API_KEY_INVALID") || status == 401 || status == 403 {
                bail!("Gemini rejected the API key");
            }

            tracing::error!(status = status, "Gemini health check failed");
            bail!("Gemini health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, prompt: &BackendPrompt) -> Result<String, BackendError> {
        let req = to_request(prompt);

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1beta/models/{model}:generateContent",
                url = self.url,
                model = prompt.model,
            ))
            .query(&[("key", &self.token)])
            .json(&req)
            .send()
            .await
            .map_err(|err| {
                return BackendError::from_reqwest(BackendName::Gemini, err.without_url());
            })?;

        let status = res.status().as_u16();
        if !res.status().is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status = status, "Failed to make completion request to Gemini");
            if status == 400 && body.contains("API_KEY_INVALID") {
                return Err(BackendError::Authorization {
                    backend: BackendName::Gemini,
                    status,
                });
            }

            return Err(BackendError::from_status(BackendName::Gemini, status, &body));
        }

        let ores = res.json::<GenerateContentResponse>().await.map_err(|err| {
            return BackendError::from_reqwest(BackendName::Gemini, err.without_url());
        })?;
        tracing::debug!(body = ?ores, "Completion response");

        let text = ores
            .candidates
            .first()
            .and_then(|candidate| return candidate.content.as_ref())
            .map(|content| {
                return content
                    .parts
                    .iter()
                    .map(|part| return part.text.as_str())
                    .collect::<Vec<&str>>()
                    .join("");
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(BackendError::malformed(
                BackendName::Gemini,
                "response contained no candidates",
            ));
        }

        return Ok(text);
    }
}
