use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::EmbeddingResult;

/// Dimension of [`HashEmbedder`] vectors.
pub const HASH_EMBEDDING_DIM: usize = 256;

/// Text embedding capability.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Map text to a fixed-length vector.
    async fn encode(&self, text: &str) -> EmbeddingResult<Vec<f32>>;
}

/// Deterministic pseudo-embedding derived from token hashes.
///
/// Each lowercase alphanumeric token is hashed with SHA-256; the digest picks a
/// bucket and a sign. The bag-of-tokens vector is L2-normalized, so texts that share
/// vocabulary land closer together than unrelated ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEmbedder;

impl HashEmbedder {
    /// Embed synchronously. Never fails.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; HASH_EMBEDDING_DIM];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let bucket =
                u16::from_be_bytes([digest[0], digest[1]]) as usize % HASH_EMBEDDING_DIM;
            let sign = if digest[2] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn encode(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.embed(text))
    }
}

/// Cosine similarity of two vectors.
///
/// Mismatched lengths compare over the shared prefix; a zero-norm vector yields `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let len = a.len().min(b.len());
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);

    for i in 0..len {
        let (x, y) = (f64::from(a[i]), f64::from(b[i]));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
