#[cfg(test)]
#[path = "chat_session_test.rs"]
mod tests;

use crate::domain::models::AttachmentPayload;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendPrompt;
use crate::domain::models::ChatTurn;
use crate::domain::models::DocumentIndex;
use crate::domain::models::Role;
use crate::domain::models::Settings;
use crate::domain::models::Transcript;
use crate::domain::models::RETRIEVAL_K;
use crate::domain::services::Documents;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChatState {
    AwaitingInput,
    AwaitingResponse,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Please enter an API key in the settings before chatting.")]
    MissingApiKey,
    #[error("Please enter a message.")]
    EmptyMessage,
    #[error("Still waiting for the previous reply.")]
    Busy,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("{0}")]
    Document(String),
}

/// Transcript plus the two state request cycle. Only one reply can be
/// outstanding at a time.
pub struct ChatSession {
    state: ChatState,
    transcript: Transcript,
    index: Option<DocumentIndex>,
}

impl Default for ChatSession {
    fn default() -> ChatSession {
        return ChatSession {
            state: ChatState::AwaitingInput,
            transcript: Transcript::default(),
            index: None,
        };
    }
}

impl ChatSession {
    pub fn state(&self) -> ChatState {
        return self.state;
    }

    pub fn is_waiting(&self) -> bool {
        return self.state == ChatState::AwaitingResponse;
    }

    pub fn transcript(&self) -> &Transcript {
        return &self.transcript;
    }

    pub fn has_index(&self) -> bool {
        return self.index.is_some();
    }

    pub fn set_index(&mut self, index: Option<DocumentIndex>) {
        self.index = index;
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Records the user's message and builds the prompt to send. On success
    /// the session waits for `finish`.
    pub async fn begin(&mut self, settings: &Settings, text: &str) -> Result<BackendPrompt, ChatError> {
        if self.state == ChatState::AwaitingResponse {
            return Err(ChatError::Busy);
        }
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if !settings.is_ready() {
            return Err(ChatError::MissingApiKey);
        }

        self.transcript.push(ChatTurn::user(text.trim()));
        self.state = ChatState::AwaitingResponse;

        match self.build_prompt(settings, text).await {
            Ok(prompt) => {
                tracing::debug!(
                    model = prompt.model.to_string(),
                    turns = prompt.turns.len(),
                    "Built backend prompt"
                );
                return Ok(prompt);
            }
            Err(err) => {
                self.state = ChatState::AwaitingInput;
                return Err(err);
            }
        }
    }

    async fn build_prompt(&self, settings: &Settings, text: &str) -> Result<BackendPrompt, ChatError> {
        let mut prompt = BackendPrompt::new(
            settings.selected_model,
            &settings.system_prompt,
            self.transcript.turns(),
        );

        if let Some(index) = &self.index {
            let chunks = index.query(text, RETRIEVAL_K).await.map_err(|err| {
                return ChatError::Document(format!("Failed to search the uploaded documents: {err}"));
            })?;
            let context = chunks
                .iter()
                .map(|chunk| return chunk.text.as_str())
                .collect::<Vec<&str>>()
                .join("\n\n");
            prompt.append_context(&context);
        }

        // Indexed documents reach the model as context, not inline.
        if self.index.is_some() && settings.attachment.document().is_some() {
            return Ok(prompt.with_attachment(AttachmentPayload::None));
        }

        let payload = Documents::prepare_payload(&settings.attachment)
            .map_err(|err| return ChatError::Document(err.to_string()))?;

        return Ok(prompt.with_attachment(payload));
    }

    /// Completes the cycle started by `begin`. Only a successful reply becomes
    /// part of the transcript. Returns `Ok(None)` when the result no longer
    /// answers anything, such as after a `clear` or a fresh session.
    pub fn finish(&mut self, res: Result<String, BackendError>) -> Result<Option<String>, ChatError> {
        let was_waiting = self.state == ChatState::AwaitingResponse;
        self.state = ChatState::AwaitingInput;

        let answers_question = self
            .transcript
            .last()
            .map(|turn| return turn.role() == Role::User)
            .unwrap_or(false);

        if !was_waiting || !answers_question {
            tracing::warn!(failed = res.is_err(), "Dropping result without a matching question");
            return Ok(None);
        }

        let text = res?;
        self.transcript.push(ChatTurn::assistant(&text));
        return Ok(Some(text));
    }

    pub async fn submit(
        &mut self,
        settings: &Settings,
        backend: &(dyn Backend + Send + Sync),
        text: &str,
    ) -> Result<String, ChatError> {
        let prompt = self.begin(settings, text).await?;
        let res = backend.get_completion(&prompt).await;
        if let Err(err) = &res {
            tracing::error!(error = err.to_string(), "Completion failed");
        }

        let text = self.finish(res)?;
        return Ok(text.unwrap_or_default());
    }
}
