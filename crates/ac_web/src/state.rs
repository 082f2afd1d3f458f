use std::sync::Arc;

use ac_core::Timeouts;
use ac_ingest::IngestionFacade;
use ac_query::{ArticleService, ChatService};

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub ingestion: Arc<IngestionFacade>,
    pub timeouts: Timeouts,
}

impl AppState {
    pub fn new(chat: Arc<ChatService>, ingestion: Arc<IngestionFacade>, timeouts: Timeouts) -> Self {
        Self {
            chat,
            ingestion,
            timeouts,
        }
    }

    pub fn articles(&self) -> &ArticleService {
        self.chat.articles()
    }
}
