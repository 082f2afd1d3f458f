use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ac_core::{Article, ArticleStore, EntityCount, Error, Result};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        url TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        excerpt TEXT NOT NULL DEFAULT '',
        full_text TEXT NOT NULL DEFAULT '',
        summary TEXT,
        sentiment TEXT,
        topics TEXT NOT NULL DEFAULT '[]',
        entities TEXT NOT NULL DEFAULT '[]',
        processed_at TEXT NOT NULL
    )
    "#,
];

const TOP_ENTITIES: &str = r#"
    SELECT trim(t.value) AS entity, COUNT(*) AS count
    FROM articles a, json_each(
        CASE WHEN EXISTS (SELECT 1 FROM json_each(a.entities) e WHERE trim(e.value) <> '')
             THEN a.entities ELSE a.topics END
    ) t
    WHERE trim(t.value) <> ''
      AND (?1 = 0 OR a.url IN (SELECT value FROM json_each(?2)))
    GROUP BY trim(t.value)
    ORDER BY count DESC, entity ASC
    LIMIT ?3
"#;

fn persistence(context: &str, e: impl std::fmt::Display) -> Error {
    Error::Persistence(format!("{context}: {e}"))
}

pub struct SqliteStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database behind `database_url`, which is
    /// either `sqlite:<path>` or a bare file path.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let path = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);
        Self::new_with_path(Path::new(path)).await
    }

    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(|e| persistence("invalid database path", e))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| persistence("failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| persistence(&format!("failed to run migration {i}"), e))?;
        }
        tracing::info!(path = %db_path.display(), "sqlite store ready");

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let decode = |e: sqlx::Error| persistence("failed to decode article row", e);
    let topics: String = row.try_get("topics").map_err(decode)?;
    let entities: String = row.try_get("entities").map_err(decode)?;
    let processed_at: DateTime<Utc> = row.try_get("processed_at").map_err(decode)?;
    Ok(Article {
        url: row.try_get("url").map_err(decode)?,
        title: row.try_get("title").map_err(decode)?,
        excerpt: row.try_get("excerpt").map_err(decode)?,
        full_text: row.try_get("full_text").map_err(decode)?,
        summary: row.try_get("summary").map_err(decode)?,
        sentiment: row.try_get("sentiment").map_err(decode)?,
        topics: serde_json::from_str(&topics)?,
        entities: serde_json::from_str(&entities)?,
        processed_at,
    })
}

#[async_trait]
impl ArticleStore for SqliteStore {
    async fn save(&self, article: &Article) -> Result<()> {
        let topics = serde_json::to_string(&article.topics)?;
        let entities = serde_json::to_string(&article.entities)?;

        let result = sqlx::query(
            r#"
            INSERT INTO articles
            (url, title, excerpt, full_text, summary, sentiment, topics, entities, processed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.excerpt)
        .bind(&article.full_text)
        .bind(article.summary.as_deref())
        .bind(article.sentiment.as_deref())
        .bind(topics)
        .bind(entities)
        .bind(article.processed_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(Error::Duplicate(article.url.clone()))
            }
            Err(e) => Err(persistence("failed to store article", e)),
        }
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| persistence("failed to look up article", e))?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY processed_at ASC, url ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| persistence("failed to list articles", e))?;
        rows.iter().map(article_from_row).collect()
    }

    async fn find_top_entities(&self, urls: &[String], limit: usize) -> Result<Vec<EntityCount>> {
        let url_filter = serde_json::to_string(urls)?;
        let rows = sqlx::query(TOP_ENTITIES)
            .bind(urls.len() as i64)
            .bind(url_filter)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| persistence("failed to rank entities", e))?;

        rows.iter()
            .map(|row| {
                let count: i64 = row
                    .try_get("count")
                    .map_err(|e| persistence("failed to decode entity count", e))?;
                Ok(EntityCount {
                    entity: row
                        .try_get("entity")
                        .map_err(|e| persistence("failed to decode entity", e))?,
                    count: count.max(0) as u64,
                })
            })
            .collect()
    }
}
