//! Question answering over stored articles: planning, strategy dispatch
//! and the response cache.

pub mod cache;
pub mod chat;
pub mod executor;
pub mod planner;
pub mod service;
pub mod strategies;

pub use cache::{plan_key, query_key, ResponseCache, CACHE_PREFIX};
pub use chat::{ChatAnswer, ChatService};
pub use executor::Executor;
pub use planner::Planner;
pub use service::ArticleService;
pub use strategies::{ExecutionContext, Strategy, StrategyStep, TemplateStrategy};

pub mod prelude {
    pub use super::{ArticleService, ChatAnswer, ChatService, Executor, Planner, ResponseCache};
}
