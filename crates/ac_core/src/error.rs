use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::types::Intent;

/// Where in plan creation a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStage {
    Context,
    Prompt,
    Generate,
    Parse,
}

impl fmt::Display for PlanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            PlanStage::Context => "context retrieval",
            PlanStage::Prompt => "prompt construction",
            PlanStage::Generate => "model call",
            PlanStage::Parse => "plan parsing",
        };
        f.write_str(stage)
    }
}

/// Coarse classification used at the HTTP boundary and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Duplicate,
    Upstream,
    Persistence,
    Degraded,
    Cancelled,
    Internal,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Article from URL {0} already exists")]
    Duplicate(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Degraded: {0}")]
    Degraded(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Planning failed during {stage}: {message}")]
    Planning { stage: PlanStage, message: String },

    #[error("Strategy {intent} failed: {source}")]
    Strategy {
        intent: Intent,
        #[source]
        source: Box<Error>,
    },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("{op} timed out after {after:?}")]
    Timeout { op: String, after: Duration },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn planning(stage: PlanStage, message: impl fmt::Display) -> Self {
        Error::Planning {
            stage,
            message: message.to_string(),
        }
    }

    pub fn strategy(intent: Intent, source: Error) -> Self {
        Error::Strategy {
            intent,
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Duplicate(_) => ErrorKind::Duplicate,
            Error::Fetch(_) | Error::Upstream(_) | Error::Http(_) | Error::Timeout { .. } => {
                ErrorKind::Upstream
            }
            Error::Planning { .. } => ErrorKind::Upstream,
            Error::Persistence(_) => ErrorKind::Persistence,
            Error::Degraded(_) => ErrorKind::Degraded,
            Error::Cancelled(_) => ErrorKind::Cancelled,
            Error::Strategy { source, .. } => source.kind(),
            Error::Io(_) | Error::Serialization(_) | Error::Prompt(_) | Error::External(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_duplicate(&self) -> bool {
        self.kind() == ErrorKind::Duplicate
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_errors_report_their_source_kind() {
        let err = Error::strategy(Intent::Summarize, Error::NotFound("x".into()));
        assert!(err.is_not_found());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("SUMMARIZE"));
    }

    #[test]
    fn planning_errors_name_their_stage() {
        let prompt = Error::planning(PlanStage::Prompt, "no template");
        let parse = Error::planning(PlanStage::Parse, "expected value");
        assert!(prompt.to_string().contains("prompt construction"));
        assert!(parse.to_string().contains("plan parsing"));
        assert_ne!(prompt.to_string(), parse.to_string());
    }

    #[test]
    fn duplicate_message_mentions_url() {
        let err = Error::Duplicate("https://a.test/x".into());
        assert!(err.is_duplicate());
        assert_eq!(
            err.to_string(),
            "Article from URL https://a.test/x already exists"
        );
    }
}
