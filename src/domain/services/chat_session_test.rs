use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::ChatError;
use super::ChatSession;
use super::ChatState;
use crate::domain::models::fake_embedders::FailingEmbedder;
use crate::domain::models::fake_embedders::KeywordEmbedder;
use crate::domain::models::Attachment;
use crate::domain::models::AttachmentPayload;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendName;
use crate::domain::models::BackendPrompt;
use crate::domain::models::DocumentChunk;
use crate::domain::models::DocumentIndex;
use crate::domain::models::ModelName;
use crate::domain::models::Role;
use crate::domain::models::Settings;
use crate::domain::models::MAX_OUTPUT_TOKENS;

#[derive(Default)]
struct EchoBackend {
    prompts: Mutex<Vec<BackendPrompt>>,
}

#[async_trait]
impl Backend for EchoBackend {
    fn name(&self) -> BackendName {
        return BackendName::Claude;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> anyhow::Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, prompt: &BackendPrompt) -> Result<String, BackendError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let last = prompt.turns.last().unwrap();
        return Ok(format!("echo: {}", last.content()));
    }
}

struct FailingBackend {}

#[async_trait]
impl Backend for FailingBackend {
    fn name(&self) -> BackendName {
        return BackendName::Gemini;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> anyhow::Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, _prompt: &BackendPrompt) -> Result<String, BackendError> {
        return Err(BackendError::Network {
            backend: BackendName::Gemini,
            message: "connection refused".to_string(),
        });
    }
}

fn ready_settings() -> Settings {
    return Settings {
        api_key: "sk-test-1234".to_string(),
        ..Settings::default()
    };
}

fn create_index() -> DocumentIndex {
    let chunks = ["Oolong tea is partially oxidised.", "Jupiter has four large moons."]
        .iter()
        .map(|text| {
            return DocumentChunk {
                text: text.to_string(),
                embedding: KeywordEmbedder::vector(text),
            };
        })
        .collect();

    return DocumentIndex::new(chunks, Box::<KeywordEmbedder>::default());
}

#[tokio::test]
async fn it_alternates_roles_over_successful_submits() -> Result<()> {
    let settings = ready_settings();
    let backend = EchoBackend::default();
    let mut session = ChatSession::default();

    for idx in 0..3 {
        let res = session.submit(&settings, &backend, &format!("question {idx}")).await?;
        assert_eq!(res, format!("echo: question {idx}"));
    }

    let turns = session.transcript().turns();
    assert_eq!(turns.len(), 6);
    for (idx, turn) in turns.iter().enumerate() {
        if idx % 2 == 0 {
            assert_eq!(turn.role(), Role::User);
        } else {
            assert_eq!(turn.role(), Role::Assistant);
        }
    }
    assert_eq!(session.state(), ChatState::AwaitingInput);

    return Ok(());
}

#[tokio::test]
async fn it_sends_full_history_with_settings() -> Result<()> {
    let settings = Settings {
        system_prompt: "Be brief.".to_string(),
        selected_model: ModelName::Gemini15Flash,
        ..ready_settings()
    };
    let backend = EchoBackend::default();
    let mut session = ChatSession::default();

    session.submit(&settings, &backend, "first").await?;
    session.submit(&settings, &backend, "second").await?;

    let prompts = backend.prompts.lock().unwrap();
    let prompt = prompts.last().unwrap();
    assert_eq!(prompt.model, ModelName::Gemini15Flash);
    assert_eq!(prompt.system, "Be brief.");
    assert_eq!(prompt.max_tokens, MAX_OUTPUT_TOKENS);
    assert_eq!(
        prompt
            .turns
            .iter()
            .map(|turn| return turn.content())
            .collect::<Vec<&str>>(),
        vec!["first", "echo: first", "second"]
    );

    return Ok(());
}

#[tokio::test]
async fn it_requires_api_key() {
    let backend = EchoBackend::default();
    let mut session = ChatSession::default();

    let res = session.submit(&Settings::default(), &backend, "hello").await;

    assert!(matches!(res, Err(ChatError::MissingApiKey)));
    assert!(session.transcript().is_empty());
    assert_eq!(session.state(), ChatState::AwaitingInput);
    assert!(backend.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn it_treats_whitespace_api_key_as_missing() {
    let settings = Settings {
        api_key: "   ".to_string(),
        ..Settings::default()
    };
    let mut session = ChatSession::default();

    let res = session.begin(&settings, "hello").await;
    assert!(matches!(res, Err(ChatError::MissingApiKey)));
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn it_rejects_empty_messages() {
    let mut session = ChatSession::default();

    let res = session.begin(&ready_settings(), "  \n ").await;
    assert!(matches!(res, Err(ChatError::EmptyMessage)));
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn it_rejects_messages_while_waiting() -> Result<()> {
    let settings = ready_settings();
    let mut session = ChatSession::default();

    session.begin(&settings, "first").await?;
    assert_eq!(session.state(), ChatState::AwaitingResponse);

    let res = session.begin(&settings, "second").await;
    assert!(matches!(res, Err(ChatError::Busy)));
    assert_eq!(session.transcript().len(), 1);

    return Ok(());
}

#[tokio::test]
async fn it_keeps_user_turn_on_remote_failure() {
    let mut session = ChatSession::default();

    let res = session.submit(&ready_settings(), &FailingBackend {}, "hello").await;

    let err = res.unwrap_err();
    assert!(matches!(err, ChatError::Backend(BackendError::Network { .. })));
    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.transcript().last().unwrap().role(), Role::User);
    assert_eq!(session.state(), ChatState::AwaitingInput);
}

#[tokio::test]
async fn it_accepts_input_after_failure() -> Result<()> {
    let settings = ready_settings();
    let mut session = ChatSession::default();

    let _ = session.submit(&settings, &FailingBackend {}, "hello").await;
    session.submit(&settings, &EchoBackend::default(), "again").await?;

    assert_eq!(session.transcript().len(), 3);
    return Ok(());
}

#[tokio::test]
async fn it_clears_transcript_without_touching_settings() -> Result<()> {
    let settings = ready_settings();
    let mut session = ChatSession::default();
    session.submit(&settings, &EchoBackend::default(), "hello").await?;

    let before = settings.clone();
    session.clear();

    assert!(session.transcript().is_empty());
    assert_eq!(settings, before);
    return Ok(());
}

#[tokio::test]
async fn it_drops_reply_when_cleared_while_waiting() -> Result<()> {
    let mut session = ChatSession::default();
    session.begin(&ready_settings(), "hello").await?;
    session.clear();

    let res = session.finish(Ok("late".to_string()))?;

    assert_eq!(res, None);
    assert!(session.transcript().is_empty());
    assert_eq!(session.state(), ChatState::AwaitingInput);
    return Ok(());
}

#[tokio::test]
async fn it_drops_error_when_cleared_while_waiting() -> Result<()> {
    let mut session = ChatSession::default();
    session.begin(&ready_settings(), "hello").await?;
    session.clear();

    let res = session.finish(Err(BackendError::Network {
        backend: BackendName::Claude,
        message: "connection reset".to_string(),
    }));

    assert!(matches!(res, Ok(None)));
    assert!(session.transcript().is_empty());
    assert_eq!(session.state(), ChatState::AwaitingInput);
    return Ok(());
}

#[test]
fn it_drops_error_on_a_fresh_session() {
    let mut session = ChatSession::default();

    let res = session.finish(Err(BackendError::Authorization {
        backend: BackendName::Gemini,
        status: 403,
    }));

    assert!(matches!(res, Ok(None)));
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn it_returns_error_for_the_pending_question() -> Result<()> {
    let mut session = ChatSession::default();
    session.begin(&ready_settings(), "hello").await?;

    let res = session.finish(Err(BackendError::Authorization {
        backend: BackendName::Gemini,
        status: 403,
    }));

    assert!(matches!(res, Err(ChatError::Backend(BackendError::Authorization { .. }))));
    assert_eq!(session.transcript().len(), 1);
    return Ok(());
}

#[tokio::test]
async fn it_appends_retrieved_context() -> Result<()> {
    let backend = EchoBackend::default();
    let mut session = ChatSession::default();
    session.set_index(Some(create_index()));
    assert!(session.has_index());

    session.submit(&ready_settings(), &backend, "How many moons does Jupiter have?").await?;

    let prompts = backend.prompts.lock().unwrap();
    let system = &prompts[0].system;
    assert!(system.starts_with("You are a helpful AI assistant."));
    assert!(system.contains("Jupiter has four large moons."));
    return Ok(());
}

#[tokio::test]
async fn it_skips_indexed_documents_but_keeps_images() -> Result<()> {
    let mut session = ChatSession::default();
    session.set_index(Some(create_index()));

    let document = Settings {
        attachment: Attachment::from_upload("notes.txt", b"Oolong tea".to_vec())?,
        ..ready_settings()
    };
    let prompt = session.begin(&document, "tea?").await?;
    assert_eq!(prompt.attachment, AttachmentPayload::None);
    session.finish(Ok("ok".to_string()))?;

    let image = Settings {
        attachment: Attachment::from_upload("cat.png", vec![1, 2, 3])?,
        ..ready_settings()
    };
    let prompt = session.begin(&image, "what is this?").await?;
    assert!(matches!(prompt.attachment, AttachmentPayload::Image { .. }));

    return Ok(());
}

#[tokio::test]
async fn it_sends_documents_inline_without_index() -> Result<()> {
    let settings = Settings {
        attachment: Attachment::from_upload("notes.txt", b"Oolong tea".to_vec())?,
        ..ready_settings()
    };
    let mut session = ChatSession::default();

    let prompt = session.begin(&settings, "summarise").await?;
    assert_eq!(
        prompt.attachment,
        AttachmentPayload::Text {
            file_name: "notes.txt".to_string(),
            text: "Oolong tea".to_string(),
        }
    );
    return Ok(());
}

#[tokio::test]
async fn it_returns_to_input_when_retrieval_fails() {
    let mut session = ChatSession::default();
    session.set_index(Some(DocumentIndex::new(vec![], Box::new(FailingEmbedder {}))));

    let res = session.begin(&ready_settings(), "hello").await;

    assert!(matches!(res, Err(ChatError::Document(_))));
    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.state(), ChatState::AwaitingInput);
}

#[tokio::test]
async fn it_returns_to_input_when_extraction_fails() -> Result<()> {
    let settings = Settings {
        attachment: Attachment::from_upload("notes.docx", b"garbage".to_vec())?,
        ..ready_settings()
    };
    let mut session = ChatSession::default();

    let res = session.begin(&settings, "summarise").await;

    assert!(matches!(res, Err(ChatError::Document(_))));
    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.state(), ChatState::AwaitingInput);
    return Ok(());
}
