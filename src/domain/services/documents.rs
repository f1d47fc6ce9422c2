#[cfg(test)]
#[path = "documents_test.rs"]
mod tests;

use std::io::Cursor;
use std::io::Read;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::models::Attachment;
use crate::domain::models::AttachmentPayload;
use crate::domain::models::DocumentChunk;
use crate::domain::models::DocumentIndex;
use crate::domain::models::EmbedderBox;
use crate::domain::models::FileUpload;
use crate::domain::models::MIME_DOCX;
use crate::domain::models::MIME_MARKDOWN;
use crate::domain::models::MIME_PDF;
use crate::domain::models::MIME_TEXT;

/// Characters per chunk.
pub const CHUNK_SIZE: usize = 1000;
/// Characters shared between neighbouring chunks.
pub const CHUNK_OVERLAP: usize = 200;
/// Maximum texts per embedding request.
pub const EMBEDDING_BATCH_SIZE: usize = 100;

static XML_TAG: Lazy<Regex> = Lazy::new(|| return Regex::new(r"<[^>]+>").unwrap());

pub struct Documents {}

impl Documents {
    pub fn extract_text(upload: &FileUpload) -> Result<String> {
        let file_name = &upload.file_name;
        let mime_type = upload.mime_type.as_str();

        if mime_type == MIME_TEXT || mime_type == MIME_MARKDOWN {
            return Ok(String::from_utf8_lossy(&upload.bytes).to_string());
        }

        if mime_type == MIME_PDF {
            return pdf_extract::extract_text_from_mem(&upload.bytes).map_err(|err| {
                return anyhow!(format!("Failed to read text from {file_name}: {err:?}"));
            });
        }

        if mime_type == MIME_DOCX {
            return Documents::extract_docx(upload);
        }

        bail!(format!("Cannot read text from {file_name} ({mime_type})"));
    }

    fn extract_docx(upload: &FileUpload) -> Result<String> {
        let file_name = &upload.file_name;
        let mut archive = zip::ZipArchive::new(Cursor::new(&upload.bytes))
            .map_err(|err| return anyhow!(format!("{file_name} is not a valid DOCX file: {err}")))?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|err| return anyhow!(format!("{file_name} has no document body: {err}")))?
            .read_to_string(&mut xml)?;

        let xml = xml
            .replace("</w:p>", "\n")
            .replace("<w:br/>", "\n")
            .replace("<w:tab/>", "  ");

        let text = XML_TAG
            .replace_all(&xml, "")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&");

        return Ok(text
            .lines()
            .map(|line| return line.trim_end())
            .collect::<Vec<&str>>()
            .join("\n")
            .trim()
            .to_string());
    }

    /// Splits text into windows of at most `chunk_size` characters where
    /// neighbours share up to `overlap` characters. A window ends on
    /// whitespace when one exists in its second half.
    pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
        let mut chunks: Vec<String> = vec![];
        if chunk_size == 0 {
            return chunks;
        }

        let chars = text.chars().collect::<Vec<char>>();
        let mut start = 0;

        while start < chars.len() {
            let mut end = (start + chunk_size).min(chars.len());
            if end < chars.len() {
                let half = (start + chunk_size / 2).max(start + 1);
                if let Some(pos) = (half..end).rev().find(|idx| return chars[*idx].is_whitespace()) {
                    end = pos;
                }
            }

            let chunk = chars[start..end].iter().collect::<String>();
            if !chunk.trim().is_empty() {
                chunks.push(chunk.trim().to_string());
            }

            if end >= chars.len() {
                break;
            }

            let next = end.saturating_sub(overlap);
            if next > start {
                start = next;
            } else {
                start = end;
            }
        }

        return chunks;
    }

    /// Resolves the attachment into what a backend sends over the wire. Text
    /// extraction happens here, once per prompt.
    pub fn prepare_payload(attachment: &Attachment) -> Result<AttachmentPayload> {
        match attachment {
            Attachment::None => return Ok(AttachmentPayload::None),
            Attachment::Image(upload) => {
                return Ok(AttachmentPayload::Image {
                    mime_type: upload.mime_type.to_string(),
                    data: STANDARD.encode(&upload.bytes),
                });
            }
            Attachment::Document(upload) => {
                if upload.mime_type == MIME_PDF {
                    return Ok(AttachmentPayload::Pdf {
                        file_name: upload.file_name.to_string(),
                        data: STANDARD.encode(&upload.bytes),
                    });
                }

                return Ok(AttachmentPayload::Text {
                    file_name: upload.file_name.to_string(),
                    text: Documents::extract_text(upload)?,
                });
            }
        }
    }

    /// Extracts, splits, and embeds every document. Any failure aborts the
    /// whole build.
    pub async fn index(uploads: &[FileUpload], embedder: EmbedderBox) -> Result<DocumentIndex> {
        let mut texts: Vec<String> = vec![];
        for upload in uploads.iter() {
            let text = Documents::extract_text(upload)?;
            if text.trim().is_empty() {
                bail!(format!("No text could be read from {}", upload.file_name));
            }
            texts.push(text);
        }

        let windows = Documents::split_text(&texts.join("\n\n"), CHUNK_SIZE, CHUNK_OVERLAP);

        let mut embeddings: Vec<Vec<f32>> = vec![];
        for batch in windows.chunks(EMBEDDING_BATCH_SIZE) {
            embeddings.extend(embedder.embed(batch).await?);
        }

        if embeddings.len() != windows.len() {
            bail!(format!(
                "Expected {} embeddings but received {}",
                windows.len(),
                embeddings.len()
            ));
        }

        let chunks = windows
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| return DocumentChunk { text, embedding })
            .collect::<Vec<DocumentChunk>>();

        tracing::info!(
            documents = uploads.len(),
            chunks = chunks.len(),
            "Indexed documents"
        );

        return Ok(DocumentIndex::new(chunks, embedder));
    }
}
