use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use ac_core::Timeouts;

/// Settings read from the optional TOML file. Command-line flags win over
/// anything set here.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Articles ingested in the background when the server starts.
    pub seed_urls: Vec<String>,
    pub timeouts: Timeouts,
    /// Directory of `<name>.txt` prompt overrides.
    pub prompts_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Per-call timeout overrides given on the command line, in seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeoutOverrides {
    pub generation: Option<u64>,
    pub store: Option<u64>,
    pub fetch: Option<u64>,
    pub request: Option<u64>,
}

impl TimeoutOverrides {
    pub fn apply(self, mut timeouts: Timeouts) -> Timeouts {
        if let Some(secs) = self.generation {
            timeouts.generation_secs = secs;
        }
        if let Some(secs) = self.store {
            timeouts.store_secs = secs;
        }
        if let Some(secs) = self.fetch {
            timeouts.fetch_secs = secs;
        }
        if let Some(secs) = self.request {
            timeouts.request_secs = secs;
        }
        timeouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.timeouts.generation_secs, 60);
    }

    #[test]
    fn partial_timeouts_keep_other_defaults() {
        let config = FileConfig::parse(
            r#"
            seed_urls = ["https://news.test/a", "https://news.test/b"]

            [timeouts]
            generation_secs = 15
            "#,
        )
        .unwrap();
        assert_eq!(config.seed_urls.len(), 2);
        assert_eq!(config.timeouts.generation_secs, 15);
        assert_eq!(config.timeouts.store_secs, 10);
        assert_eq!(config.timeouts.request_secs, 120);
    }

    #[test]
    fn flags_override_file_values() {
        let file = Timeouts {
            generation_secs: 15,
            ..Timeouts::default()
        };
        let merged = TimeoutOverrides {
            generation: Some(5),
            request: Some(30),
            ..TimeoutOverrides::default()
        }
        .apply(file);
        assert_eq!(merged.generation_secs, 5);
        assert_eq!(merged.request_secs, 30);
        assert_eq!(merged.fetch_secs, 30);
    }

    #[test]
    fn loads_from_disk_and_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("ac.toml");
        std::fs::File::create(&good)
            .unwrap()
            .write_all(b"seed_urls = [\"https://news.test/a\"]\n")
            .unwrap();
        assert_eq!(FileConfig::load(&good).unwrap().seed_urls, vec!["https://news.test/a"]);

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "seed_urls = 3").unwrap();
        let err = FileConfig::load(&bad).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));

        assert!(FileConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
