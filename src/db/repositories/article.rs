//! Article repository
//!
//! Owned mutations (update, delete) run the existence check, the
//! ownership check, and the write inside a single transaction so a
//! concurrent delete cannot slip between check and write.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, SqlitePool};
use std::sync::Arc;

use crate::models::{Article, ArticlePatch, FilterCriteria, NewArticle, SearchCriteria};

/// Failure modes of owned mutations
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("article not found")]
    NotFound,
    #[error("article belongs to another creator")]
    NotOwner,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn create(&self, article: &NewArticle) -> Result<Article>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;
    async fn list(&self) -> Result<Vec<Article>>;
    /// Substring search across the supplied criteria, newest first
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Article>>;
    /// Exact-match and price-range filter
    async fn filter(&self, criteria: &FilterCriteria) -> Result<Vec<Article>>;
    /// Merge a patch into an article owned by `creator_id`
    async fn update_owned(
        &self,
        id: i64,
        creator_id: i64,
        patch: &ArticlePatch,
    ) -> Result<Article, MutationError>;
    /// Delete an article owned by `creator_id`
    async fn delete_owned(&self, id: i64, creator_id: i64) -> Result<(), MutationError>;
}

pub struct SqlxArticleRepository {
    pool: SqlitePool,
}

impl SqlxArticleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    Ok(Article {
        id: row.try_get("id").context("Missing id column")?,
        name: row.try_get("name").context("Missing name column")?,
        description: row
            .try_get("description")
            .context("Missing description column")?,
        photo_path: row
            .try_get("photo_path")
            .context("Missing photo_path column")?,
        price: row.try_get("price").context("Missing price column")?,
        reference: row
            .try_get("reference")
            .context("Missing reference column")?,
        size: row.try_get("size").context("Missing size column")?,
        color: row.try_get("color").context("Missing color column")?,
        category: row.try_get("category").context("Missing category column")?,
        creator_id: row
            .try_get("creator_id")
            .context("Missing creator_id column")?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .context("Missing created_at column")?,
    })
}

/// A criterion value counts as supplied only when non-blank after trimming.
fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Queries like "dress's" should still match "dress".
fn strip_possessive(value: &str) -> &str {
    value.strip_suffix("'s").unwrap_or(value)
}

fn push_sep(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, first: &mut bool) {
    if *first {
        builder.push(" WHERE ");
        *first = false;
    } else {
        builder.push(" AND ");
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &NewArticle) -> Result<Article> {
        let row = sqlx::query(
            "INSERT INTO articles
                (name, description, photo_path, price, reference, size, color, category, creator_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&article.name)
        .bind(&article.description)
        .bind(&article.photo_path)
        .bind(article.price)
        .bind(article.reference)
        .bind(&article.size)
        .bind(&article.color)
        .bind(&article.category)
        .bind(article.creator_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert article")?;

        row_to_article(&row)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch article")?;

        row.as_ref().map(row_to_article).transpose()
    }

    async fn list(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list articles")?;

        rows.iter().map(row_to_article).collect()
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Article>> {
        let mut builder = QueryBuilder::new("SELECT * FROM articles");
        let mut first = true;

        let terms = [
            ("category", &criteria.category),
            ("name", &criteria.name),
            ("description", &criteria.description),
            ("color", &criteria.color),
        ];

        for (column, value) in terms {
            if let Some(value) = supplied(value) {
                let term = strip_possessive(value);
                push_sep(&mut builder, &mut first);
                builder.push(column);
                builder.push(" LIKE ");
                builder.push_bind(format!("%{}%", term));
            }
        }

        builder.push(" ORDER BY created_at DESC, id DESC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to search articles")?;

        rows.iter().map(row_to_article).collect()
    }

    async fn filter(&self, criteria: &FilterCriteria) -> Result<Vec<Article>> {
        let mut builder = QueryBuilder::new("SELECT * FROM articles");
        let mut first = true;

        let exact = [
            ("size", &criteria.size),
            ("color", &criteria.color),
            ("category", &criteria.category),
        ];

        for (column, value) in exact {
            if let Some(value) = supplied(value) {
                push_sep(&mut builder, &mut first);
                builder.push("LOWER(");
                builder.push(column);
                builder.push(") = LOWER(");
                builder.push_bind(value.to_string());
                builder.push(")");
            }
        }

        if let Some(min) = criteria.price_min {
            push_sep(&mut builder, &mut first);
            builder.push("price >= ");
            builder.push_bind(min);
        }
        if let Some(max) = criteria.price_max {
            push_sep(&mut builder, &mut first);
            builder.push("price <= ");
            builder.push_bind(max);
        }

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to filter articles")?;

        rows.iter().map(row_to_article).collect()
    }

    async fn update_owned(
        &self,
        id: i64,
        creator_id: i64,
        patch: &ArticlePatch,
    ) -> Result<Article, MutationError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to fetch article")?;

        let current = match row {
            Some(row) => row_to_article(&row)?,
            None => return Err(MutationError::NotFound),
        };

        if current.creator_id != creator_id {
            return Err(MutationError::NotOwner);
        }

        let merged = current.merged(patch);

        sqlx::query(
            "UPDATE articles
             SET name = ?, description = ?, photo_path = ?, price = ?,
                 reference = ?, size = ?, color = ?, category = ?
             WHERE id = ?",
        )
        .bind(&merged.name)
        .bind(&merged.description)
        .bind(&merged.photo_path)
        .bind(merged.price)
        .bind(merged.reference)
        .bind(&merged.size)
        .bind(&merged.color)
        .bind(&merged.category)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update article")?;

        tx.commit().await.context("Failed to commit update")?;

        Ok(merged)
    }

    async fn delete_owned(&self, id: i64, creator_id: i64) -> Result<(), MutationError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let row = sqlx::query("SELECT creator_id FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to fetch article")?;

        let owner: i64 = match row {
            Some(row) => row.try_get("creator_id").context("Missing creator_id column")?,
            None => return Err(MutationError::NotFound),
        };

        if owner != creator_id {
            return Err(MutationError::NotOwner);
        }

        sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete article")?;

        tx.commit().await.context("Failed to commit delete")?;

        Ok(())
    }
}
