//! Concept name embeddings.

use crate::text::stem;

const DEFAULT_DIMENSIONS: usize = 256;
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Maps a concept name to a fixed-width vector.
pub trait NameEmbedder {
    fn embed(&self, name: &str) -> Vec<f32>;

    /// Stable identifier of the embedding scheme.
    fn model_version(&self) -> &'static str {
        "unknown"
    }
}

/// Hashed character-trigram embedder over the stemmed name.
///
/// Names that share most trigrams after stemming land close together, which
/// is enough to catch spelling and inflection variants without a model.
#[derive(Debug, Clone, Copy)]
pub struct NgramEmbedder {
    dimensions: usize,
}

impl NgramEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for NgramEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl NameEmbedder for NgramEmbedder {
    fn embed(&self, name: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];
        let padded: Vec<char> = format!("#{}#", stem(name)).chars().collect();
        for window in padded.windows(3) {
            let bucket = (fnv1a(window) % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }

    fn model_version(&self) -> &'static str {
        "char-trigram-fnv1a"
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for ch in chars {
        let mut buf = [0_u8; 4];
        for byte in ch.encode_utf8(&mut buf).bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// Cosine similarity; `0.0` for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::{cosine_similarity, NameEmbedder, NgramEmbedder};

    #[test]
    fn inflection_variants_embed_identically() {
        let embedder = NgramEmbedder::default();
        let a = embedder.embed("Insertion");
        let b = embedder.embed("insert");
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn unrelated_names_are_far_apart() {
        let embedder = NgramEmbedder::default();
        let a = embedder.embed("Queue");
        let b = embedder.embed("Time Complexity");
        assert!(cosine_similarity(&a, &b) < 0.5);
    }

    #[test]
    fn cosine_handles_degenerate_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
