use anyhow::Result;
use tokio::sync::mpsc;

use crate::domain::models::Action;
use crate::domain::models::BackendName;
use crate::domain::models::BackendPrompt;
use crate::domain::models::Event;
use crate::domain::models::FileUpload;
use crate::domain::models::Notice;
use crate::domain::services::Documents;
use crate::infrastructure::backends::BackendManager;
use crate::infrastructure::embedders::EmbedderManager;

async fn health_check(
    backend_name: BackendName,
    api_key: String,
    tx: mpsc::UnboundedSender<Event>,
) -> Result<()> {
    let backend = BackendManager::get(backend_name, &api_key);
    if let Err(err) = backend.health_check().await {
        tracing::error!(
            backend = backend.name().to_string(),
            error = err.to_string(),
            "Health check failed"
        );
        tx.send(Event::BackendNotice(Notice::error(&format!(
            "Hey, it looks like I can't reach {backend_name} with the saved API key. Double check the key in your settings (CTRL+R), otherwise every question will fail.\n\nError: {err}"
        ))))?;
    }

    return Ok(());
}

async fn completion(
    prompt: BackendPrompt,
    api_key: String,
    tx: mpsc::UnboundedSender<Event>,
) -> Result<()> {
    let backend = BackendManager::get(prompt.model.backend(), &api_key);
    let res = backend.get_completion(&prompt).await;
    if let Err(err) = &res {
        tracing::error!(
            backend = backend.name().to_string(),
            model = prompt.model.to_string(),
            error = err.to_string(),
            "Completion failed"
        );
    }

    tx.send(Event::BackendPromptResponse(res))?;
    return Ok(());
}

async fn index_documents(
    uploads: Vec<FileUpload>,
    token: String,
    generation: u64,
    tx: mpsc::UnboundedSender<Event>,
) -> Result<()> {
    let embedder = EmbedderManager::get(&token);
    let res = Documents::index(&uploads, embedder).await;
    if let Err(err) = &res {
        tracing::error!(error = err.to_string(), "Indexing failed");
    }

    tx.send(Event::DocumentsIndexed(generation, res))?;
    return Ok(());
}

pub struct ActionsService {}

impl ActionsService {
    /// Performs remote work requested by the UI on worker tasks, reporting
    /// results back as events. Runs until the action channel closes.
    pub async fn start(
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        while let Some(action) = rx.recv().await {
            let worker_tx = tx.clone();
            match action {
                Action::BackendHealthCheck(backend_name, api_key) => {
                    tokio::spawn(health_check(backend_name, api_key, worker_tx));
                }
                Action::BackendRequest(prompt, api_key) => {
                    tracing::debug!(model = prompt.model.to_string(), "Sending prompt");
                    tokio::spawn(completion(prompt, api_key, worker_tx));
                }
                Action::IndexDocuments(uploads, token, generation) => {
                    tracing::debug!(
                        documents = uploads.len(),
                        generation = generation,
                        "Indexing documents"
                    );
                    tokio::spawn(index_documents(uploads, token, generation, worker_tx));
                }
            }
        }

        return Ok(());
    }
}
