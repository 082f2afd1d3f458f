//! Answer cache keyed by SHA-256 fingerprints.
//!
//! Two key families share one map: `query:` keys hash the trimmed query
//! text and are checked before planning, `plan:` keys hash the canonical
//! form of a plan so paraphrased questions resolving to the same plan hit.
//! Nothing is ever evicted.

use dashmap::DashMap;
use serde_json::json;
use sha2::{Digest, Sha256};

use ac_core::Plan;

pub const CACHE_PREFIX: &str = "🤖 (from cache)\n\n";

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, String>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn query_key(query: &str) -> String {
    format!("query:{}", sha256_hex(query.trim().as_bytes()))
}

/// Fingerprint of `{intent, sorted targets, parameters}`. The question text
/// is not part of the key.
pub fn plan_key(plan: &Plan) -> String {
    let mut targets: Vec<&str> = plan.target_urls().collect();
    targets.sort_unstable();
    let canonical = json!({
        "intent": plan.intent.as_str(),
        "targets": targets,
        "parameters": plan.parameters,
    });
    format!("plan:{}", sha256_hex(canonical.to_string().as_bytes()))
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
