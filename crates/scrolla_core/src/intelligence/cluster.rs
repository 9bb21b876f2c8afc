//! Average-linkage agglomerative clustering under cosine distance.

use super::embed::cosine_similarity;

/// Clusters merge only while their average distance stays below this.
// Why: a name behind one leading qualifier ("Singly Linked List") lands 0.2 to
// 0.3 from the bare name, while a topic and its compounds ("Stack Push") stay
// above 0.4 and must remain separate concepts.
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 0.35;

/// Groups `embeddings` by index.
///
/// Repeatedly merges the closest pair of clusters (average pairwise cosine
/// distance) while that distance is below `threshold`. Earlier pairs win
/// ties. Members are sorted by index and clusters by their first member.
pub fn cluster_by_distance(embeddings: &[Vec<f32>], threshold: f32) -> Vec<Vec<usize>> {
    let count = embeddings.len();
    let mut distance = vec![vec![0.0_f32; count]; count];
    for i in 0..count {
        for j in (i + 1)..count {
            let d = 1.0 - cosine_similarity(&embeddings[i], &embeddings[j]);
            distance[i][j] = d;
            distance[j][i] = d;
        }
    }

    let mut clusters: Vec<Vec<usize>> = (0..count).map(|index| vec![index]).collect();
    loop {
        let mut closest: Option<(usize, usize, f32)> = None;
        for a in 0..clusters.len() {
            for b in (a + 1)..clusters.len() {
                let d = average_linkage(&clusters[a], &clusters[b], &distance);
                if closest.map_or(true, |(_, _, best)| d < best) {
                    closest = Some((a, b, d));
                }
            }
        }

        match closest {
            Some((a, b, d)) if d < threshold => {
                let absorbed = clusters.remove(b);
                clusters[a].extend(absorbed);
                clusters[a].sort_unstable();
            }
            _ => break,
        }
    }

    clusters.sort_by_key(|members| members[0]);
    clusters
}

fn average_linkage(a: &[usize], b: &[usize], distance: &[Vec<f32>]) -> f32 {
    let total: f32 = a
        .iter()
        .flat_map(|&i| b.iter().map(move |&j| distance[i][j]))
        .sum();
    total / (a.len() * b.len()) as f32
}

#[cfg(test)]
mod tests {
    use super::{cluster_by_distance, DEFAULT_DISTANCE_THRESHOLD};
    use crate::intelligence::embed::{cosine_similarity, NameEmbedder, NgramEmbedder};

    #[test]
    fn close_vectors_merge_and_far_ones_stay_apart() {
        let embeddings = vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.99, 0.05],
        ];
        let clusters = cluster_by_distance(&embeddings, DEFAULT_DISTANCE_THRESHOLD);
        assert_eq!(clusters, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn empty_input_yields_no_clusters() {
        assert!(cluster_by_distance(&[], DEFAULT_DISTANCE_THRESHOLD).is_empty());
    }

    #[test]
    fn qualified_name_merges_with_its_bare_form_but_compounds_stay_apart() {
        let embedder = NgramEmbedder::default();
        let names = ["Linked List", "Stack", "Singly Linked List", "Stack Push"];
        let embeddings: Vec<Vec<f32>> = names.iter().map(|name| embedder.embed(name)).collect();

        let qualified = 1.0 - cosine_similarity(&embeddings[0], &embeddings[2]);
        assert!(qualified < DEFAULT_DISTANCE_THRESHOLD, "distance {qualified}");
        let compound = 1.0 - cosine_similarity(&embeddings[1], &embeddings[3]);
        assert!(compound > DEFAULT_DISTANCE_THRESHOLD, "distance {compound}");

        let clusters = cluster_by_distance(&embeddings, DEFAULT_DISTANCE_THRESHOLD);
        assert_eq!(clusters, vec![vec![0, 2], vec![1], vec![3]]);
    }
}
