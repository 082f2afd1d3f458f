use std::sync::Arc;
use tokio::task::JoinHandle;

use ac_core::{CancellationToken, Error};

use crate::facade::IngestionFacade;

/// Outcome counts of a seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub ingested: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Ingest `urls` one after another. Already-stored URLs are skipped quietly.
pub async fn ingest_seed_urls(
    facade: &IngestionFacade,
    urls: &[String],
    cancel: &CancellationToken,
) -> SeedReport {
    let mut report = SeedReport::default();
    for (done, url) in urls.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!(remaining = urls.len() - done, "seed ingestion cancelled");
            break;
        }
        match facade.add_new_article(url, cancel).await {
            Ok(article) => {
                report.ingested += 1;
                tracing::info!(%url, title = %article.title, "seed article ingested");
            }
            Err(Error::Duplicate(_)) => {
                report.skipped += 1;
                tracing::debug!(%url, "seed article already exists");
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!(%url, error = %e, "seed article failed");
            }
        }
    }
    tracing::info!(
        ingested = report.ingested,
        skipped = report.skipped,
        failed = report.failed,
        "seed ingestion finished"
    );
    report
}

/// Run [`ingest_seed_urls`] on a background task.
pub fn spawn_seed_ingestion(
    facade: Arc<IngestionFacade>,
    urls: Vec<String>,
    cancel: CancellationToken,
) -> JoinHandle<SeedReport> {
    tokio::spawn(async move { ingest_seed_urls(&facade, &urls, &cancel).await })
}
