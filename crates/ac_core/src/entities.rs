use std::collections::HashMap;

use crate::types::{Article, EntityCount};

pub const DEFAULT_ENTITY_LIMIT: usize = 10;

/// Count every occurrence of each article's entities (or topics when it has
/// no entities), returning the `limit` most frequent. Ties sort by name.
pub fn rank_entities<'a, I>(articles: I, limit: usize) -> Vec<EntityCount>
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for article in articles {
        for term in article.ranked_terms() {
            let term = term.trim();
            if !term.is_empty() {
                *counts.entry(term).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<EntityCount> = counts
        .into_iter()
        .map(|(entity, count)| EntityCount {
            entity: entity.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.entity.cmp(&b.entity)));
    ranked.truncate(limit);
    ranked
}

/// Cosine similarity of two vectors; 0.0 when either is empty or zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for i in 0..len {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
