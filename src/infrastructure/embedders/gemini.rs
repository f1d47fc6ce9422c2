#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;

use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendError;
use crate::domain::models::BackendName;
use crate::domain::models::Embedder;

const EMBEDDING_MODEL: &str = "models/text-embedding-004";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EmbedRequest {
    model: String,
    content: Content,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Embedding>,
}

pub struct GeminiEmbedder {
    url: String,
    token: String,
}

impl GeminiEmbedder {
    pub fn new(token: &str) -> GeminiEmbedder {
        return GeminiEmbedder {
            url: Config::get(ConfigKey::GeminiURL),
            token: token.to_string(),
        };
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    #[allow(clippy::implicit_return)]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let req = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| {
                    return EmbedRequest {
                        model: EMBEDDING_MODEL.to_string(),
                        content: Content {
                            parts: vec![Part {
                                text: text.to_string(),
                            }],
                        },
                    };
                })
                .collect(),
        };

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1beta/{EMBEDDING_MODEL}:batchEmbedContents",
                url = self.url
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
            tracing::error!(status = status, "Failed to embed texts with Gemini");
            if status == 400 && body.contains("API_KEY_INVALID") {
                return Err(BackendError::Authorization {
                    backend: BackendName::Gemini,
                    status,
                });
            }

            return Err(BackendError::from_status(BackendName::Gemini, status, &body));
        }

        let ores = res.json::<BatchEmbedResponse>().await.map_err(|err| {
            return BackendError::from_reqwest(BackendName::Gemini, err.without_url());
        })?;

        if ores.embeddings.len() != texts.len() {
            return Err(BackendError::malformed(
                BackendName::Gemini,
                &format!(
                    "expected {} embeddings but received {}",
                    texts.len(),
                    ores.embeddings.len()
                ),
            ));
        }

        return Ok(ores
            .embeddings
            .into_iter()
            .map(|embedding| return embedding.values)
            .collect());
    }
}
