pub mod deadline;
pub mod entities;
pub mod error;
pub mod fetch;
pub mod models;
pub mod storage;
pub mod types;

pub use deadline::{guarded, Timeouts};
pub use entities::{cosine_similarity, rank_entities, DEFAULT_ENTITY_LIMIT};
pub use error::{Error, ErrorKind, PlanStage, Result};
pub use fetch::{ContentFetcher, FetchedContent};
pub use models::{EmbeddingModel, Generation, GenerativeModel};
pub use storage::{ArticleStore, VectorIndex};
pub use types::{Article, EntityCount, Intent, Plan};

pub use tokio_util::sync::CancellationToken;

pub mod prelude {
    pub use super::{
        Article, ArticleStore, CancellationToken, EntityCount, Error, GenerativeModel, Intent,
        Plan, Result, VectorIndex,
    };
}
