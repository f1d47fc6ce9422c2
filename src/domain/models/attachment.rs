#[cfg(test)]
#[path = "attachment_test.rs"]
mod tests;

use std::fmt;
use std::path;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";

#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f
            .debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish();
    }
}

/// File uploaded through the settings form. Lives only as long as the
/// session, it is never written to the settings file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Attachment {
    #[default]
    None,
    Image(FileUpload),
    Document(FileUpload),
}

impl Attachment {
    /// Classifies an upload by its file extension.
    pub fn from_upload(file_name: &str, bytes: Vec<u8>) -> Result<Attachment> {
        let extension = path::Path::new(file_name)
            .extension()
            .map(|ext| return ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let (mime_type, is_image) = match extension.as_str() {
            "png" => ("image/png", true),
            "jpg" | "jpeg" => ("image/jpeg", true),
            "gif" => ("image/gif", true),
            "webp" => ("image/webp", true),
            "pdf" => (MIME_PDF, false),
            "docx" => (MIME_DOCX, false),
            "txt" => (MIME_TEXT, false),
            "md" => (MIME_MARKDOWN, false),
            _ => {
                bail!(format!(
                    "Unsupported file type for {file_name}. Supported types are pdf, docx, txt, md, png, jpg, gif and webp."
                ));
            }
        };

        let upload = FileUpload {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
        };

        if is_image {
            return Ok(Attachment::Image(upload));
        }

        return Ok(Attachment::Document(upload));
    }

    pub async fn from_path(file_path: &str) -> Result<Attachment> {
        let file_path = path::PathBuf::from(file_path.trim());
        if !file_path.is_file() {
            bail!(format!("No file found at {}", file_path.display()));
        }

        let file_name = file_path
            .file_name()
            .map(|name| return name.to_string_lossy().to_string())
            .unwrap_or_default();
        let bytes = fs::read(&file_path).await?;

        return Attachment::from_upload(&file_name, bytes);
    }

    pub fn is_none(&self) -> bool {
        return *self == Attachment::None;
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            Attachment::None => return None,
            Attachment::Image(upload) | Attachment::Document(upload) => {
                return Some(&upload.file_name);
            }
        }
    }

    pub fn document(&self) -> Option<&FileUpload> {
        if let Attachment::Document(upload) = self {
            return Some(upload);
        }

        return None;
    }
}

/// What actually travels to a backend for an attachment, resolved once when
/// the outbound prompt is built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AttachmentPayload {
    #[default]
    None,
    /// Base64 encoded image.
    Image { mime_type: String, data: String },
    /// Base64 encoded PDF, both providers read these natively.
    Pdf { file_name: String, data: String },
    /// Text extracted from DOCX, markdown, or plain text uploads.
    Text { file_name: String, text: String },
}
