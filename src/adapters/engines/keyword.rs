//! Keyword engine backed by a SQLite FTS5 index.
//!
//! Results are ordered by FTS5's built-in BM25 ranking. Raw BM25 values are
//! not comparable across queries, so each hit is scored by its rank instead:
//! `1 / (rank + 1)`.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::adapters::sqlite::parse_json_or_default;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EngineKind, Metadata, SearchHit};
use crate::domain::ports::{DocumentIndexer, RetrievalEngine};

#[derive(Clone)]
pub struct SqliteKeywordEngine {
    pool: SqlitePool,
}

impl SqliteKeywordEngine {
    /// Wrap a pool whose database has the `documents_fts` table migrated.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn unavailable(err: impl std::fmt::Display) -> DomainError {
        DomainError::unavailable(EngineKind::Keyword, err.to_string())
    }
}

#[async_trait]
impl RetrievalEngine for SqliteKeywordEngine {
    fn name(&self) -> &'static str {
        "sqlite-fts5"
    }

    async fn search(&self, query: &str, limit: usize) -> DomainResult<Vec<SearchHit>> {
        let match_expr = sanitize_fts5_query(query);
        if match_expr.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<KeywordRow> = sqlx::query_as(
            r#"SELECT content, metadata FROM documents_fts
               WHERE documents_fts MATCH ?
               ORDER BY bm25(documents_fts)
               LIMIT ?"#
        )
        .bind(&match_expr)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(Self::unavailable)?;

        rows.into_iter()
            .enumerate()
            .map(|(rank, row)| {
                let metadata: Metadata = parse_json_or_default(row.metadata)?;
                Ok(SearchHit {
                    content: row.content,
                    metadata,
                    score: 1.0 / (rank as f64 + 1.0),
                })
            })
            .collect()
    }
}

#[async_trait]
impl DocumentIndexer for SqliteKeywordEngine {
    async fn index_documents(&self, documents: &[SearchHit]) -> DomainResult<usize> {
        let mut tx = self.pool.begin().await?;
        for doc in documents {
            let metadata_json = serde_json::to_string(&doc.metadata)?;
            sqlx::query("INSERT INTO documents_fts (content, metadata) VALUES (?, ?)")
                .bind(&doc.content)
                .bind(&metadata_json)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!(count = documents.len(), "indexed documents for keyword search");
        Ok(documents.len())
    }
}

/// Turn free text into an FTS5 MATCH expression.
///
/// Every alphanumeric token is quoted so FTS5 operators and punctuation in
/// user text are taken literally; tokens are OR-ed so partial matches still
/// rank. Returns an empty string when the text has no searchable token.
fn sanitize_fts5_query(query: &str) -> String {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(|term| format!("\"{term}\""))
        .collect();

    terms.join(" OR ")
}

#[derive(sqlx::FromRow)]
struct KeywordRow {
    content: String,
    metadata: Option<String>,
}
