//! Creator repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{Creator, NewCreator};

#[async_trait]
pub trait CreatorRepository: Send + Sync {
    async fn create(&self, creator: &NewCreator) -> Result<Creator>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Creator>>;
    async fn get_by_email(&self, email: &str) -> Result<Option<Creator>>;
    async fn list(&self) -> Result<Vec<Creator>>;
    /// Whether another creator already uses this email
    async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> Result<bool>;
    /// Replace the whole row with the merged record
    async fn update(&self, creator: &Creator) -> Result<()>;
    /// Delete the creator and revoke every session in one transaction
    async fn delete_with_sessions(&self, id: i64) -> Result<()>;
}

pub struct SqlxCreatorRepository {
    pool: SqlitePool,
}

impl SqlxCreatorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn CreatorRepository> {
        Arc::new(Self::new(pool))
    }
}

fn row_to_creator(row: &SqliteRow) -> Result<Creator> {
    Ok(Creator {
        id: row.try_get("id").context("Missing id column")?,
        salutation: row
            .try_get("salutation")
            .context("Missing salutation column")?,
        last_name: row
            .try_get("last_name")
            .context("Missing last_name column")?,
        first_name: row
            .try_get("first_name")
            .context("Missing first_name column")?,
        birth_date: row
            .try_get::<NaiveDate, _>("birth_date")
            .context("Missing birth_date column")?,
        email: row.try_get("email").context("Missing email column")?,
        password_hash: row
            .try_get("password_hash")
            .context("Missing password_hash column")?,
        phone: row.try_get("phone").context("Missing phone column")?,
        street_number: row
            .try_get("street_number")
            .context("Missing street_number column")?,
        street: row.try_get("street").context("Missing street column")?,
        postal_code: row
            .try_get("postal_code")
            .context("Missing postal_code column")?,
        city: row.try_get("city").context("Missing city column")?,
        country: row.try_get("country").context("Missing country column")?,
        business_started_on: row
            .try_get::<Option<NaiveDate>, _>("business_started_on")
            .context("Missing business_started_on column")?,
        siret: row.try_get("siret").context("Missing siret column")?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .context("Missing created_at column")?,
    })
}

#[async_trait]
impl CreatorRepository for SqlxCreatorRepository {
    async fn create(&self, creator: &NewCreator) -> Result<Creator> {
        let row = sqlx::query(
            "INSERT INTO creators
                (salutation, last_name, first_name, birth_date, email, password_hash, phone,
                 street_number, street, postal_code, city, country,
                 business_started_on, siret, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&creator.salutation)
        .bind(&creator.last_name)
        .bind(&creator.first_name)
        .bind(creator.birth_date)
        .bind(&creator.email)
        .bind(&creator.password_hash)
        .bind(&creator.phone)
        .bind(&creator.street_number)
        .bind(&creator.street)
        .bind(creator.postal_code)
        .bind(&creator.city)
        .bind(&creator.country)
        .bind(creator.business_started_on)
        .bind(creator.siret)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert creator")?;

        row_to_creator(&row)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Creator>> {
        let row = sqlx::query("SELECT * FROM creators WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch creator")?;

        row.as_ref().map(row_to_creator).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Creator>> {
        let row = sqlx::query("SELECT * FROM creators WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch creator by email")?;

        row.as_ref().map(row_to_creator).transpose()
    }

    async fn list(&self) -> Result<Vec<Creator>> {
        let rows = sqlx::query("SELECT * FROM creators ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list creators")?;

        rows.iter().map(row_to_creator).collect()
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: (i64,) = match exclude_id {
            Some(id) => {
                sqlx::query_as("SELECT COUNT(*) FROM creators WHERE email = ? AND id != ?")
                    .bind(email)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM creators WHERE email = ?")
                    .bind(email)
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .context("Failed to check creator email")?;

        Ok(count.0 > 0)
    }

    async fn update(&self, creator: &Creator) -> Result<()> {
        sqlx::query(
            "UPDATE creators
             SET salutation = ?, last_name = ?, first_name = ?, birth_date = ?,
                 email = ?, password_hash = ?, phone = ?,
                 street_number = ?, street = ?, postal_code = ?, city = ?, country = ?,
                 business_started_on = ?, siret = ?
             WHERE id = ?",
        )
        .bind(&creator.salutation)
        .bind(&creator.last_name)
        .bind(&creator.first_name)
        .bind(creator.birth_date)
        .bind(&creator.email)
        .bind(&creator.password_hash)
        .bind(&creator.phone)
        .bind(&creator.street_number)
        .bind(&creator.street)
        .bind(creator.postal_code)
        .bind(&creator.city)
        .bind(&creator.country)
        .bind(creator.business_started_on)
        .bind(creator.siret)
        .bind(creator.id)
        .execute(&self.pool)
        .await
        .context("Failed to update creator")?;

        Ok(())
    }

    async fn delete_with_sessions(&self, id: i64) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM sessions WHERE principal_kind = 'creator' AND principal_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to revoke creator sessions")?;

        sqlx::query("DELETE FROM creators WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete creator")?;

        tx.commit().await.context("Failed to commit delete")?;

        Ok(())
    }
}
