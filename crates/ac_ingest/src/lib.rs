pub mod analyzer;
pub mod extract;
pub mod facade;
pub mod fetcher;
pub mod seed;

pub use analyzer::{Analysis, Analyzer};
pub use extract::extract_content;
pub use facade::IngestionFacade;
pub use fetcher::HttpFetcher;
pub use seed::{ingest_seed_urls, spawn_seed_ingestion, SeedReport};

pub mod prelude {
    pub use super::{Analyzer, HttpFetcher, IngestionFacade};
    pub use ac_core::{Article, Error, Result};
}
