use super::BackendName;
use super::BackendPrompt;
use super::FileUpload;

/// Work requested by the UI and performed by the actions service.
pub enum Action {
    /// Verifies the API key against the backend. Carries the API key.
    BackendHealthCheck(BackendName, String),
    /// Requests a completion. Carries the API key for the prompt's backend.
    BackendRequest(BackendPrompt, String),
    /// Builds a similarity index over uploaded documents. Carries the
    /// embedding API key and the build generation echoed back in
    /// `Event::DocumentsIndexed`.
    IndexDocuments(Vec<FileUpload>, String, u64),
}
