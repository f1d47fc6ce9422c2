#[cfg(test)]
#[path = "document_index_test.rs"]
mod tests;

use std::cmp::Ordering;

use super::BackendError;
use super::EmbedderBox;

/// Number of chunks retrieved for every question.
pub const RETRIEVAL_K: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentChunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// In-memory nearest neighbour index over embedded document chunks. The
/// embedder that produced the chunk vectors is kept so questions are embedded
/// into the same space.
pub struct DocumentIndex {
    chunks: Vec<DocumentChunk>,
    embedder: EmbedderBox,
}

impl DocumentIndex {
    pub fn new(chunks: Vec<DocumentChunk>, embedder: EmbedderBox) -> DocumentIndex {
        return DocumentIndex { chunks, embedder };
    }

    pub fn chunks(&self) -> &[DocumentChunk] {
        return &self.chunks;
    }

    pub fn len(&self) -> usize {
        return self.chunks.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.chunks.is_empty();
    }

    /// Returns at most `k` chunks ordered from most to least similar.
    pub fn nearest(&self, embedding: &[f32], k: usize) -> Vec<&DocumentChunk> {
        let mut scores = self
            .chunks
            .iter()
            .enumerate()
            .map(|(idx, chunk)| {
                return (idx, cosine_similarity(&chunk.embedding, embedding));
            })
            .collect::<Vec<(usize, f32)>>();

        scores.sort_by(|a, b| return b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scores.truncate(k);

        return scores
            .into_iter()
            .map(|(idx, _)| return &self.chunks[idx])
            .collect();
    }

    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<&DocumentChunk>, BackendError> {
        let embeddings = self.embedder.embed(&[text.to_string()]).await?;
        let embedding = match embeddings.first() {
            Some(embedding) => embedding,
            None => return Ok(vec![]),
        };

        let res = self.nearest(embedding, k);
        tracing::debug!(k = k, found = res.len(), "Queried document index");

        return Ok(res);
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| return x * y).sum();
    let norm_a: f32 = a.iter().map(|x| return x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| return x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    return dot / (norm_a * norm_b);
}
