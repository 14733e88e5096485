//! User repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{NewUser, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> Result<User>;
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list(&self) -> Result<Vec<User>>;
    async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> Result<bool>;
    async fn update(&self, user: &User) -> Result<()>;
    async fn delete_with_sessions(&self, id: i64) -> Result<()>;
}

pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
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
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .context("Missing created_at column")?,
    })
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let row = sqlx::query(
            "INSERT INTO users
                (salutation, last_name, first_name, birth_date, email, password_hash, phone,
                 street_number, street, postal_code, city, country, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&user.salutation)
        .bind(&user.last_name)
        .bind(&user.first_name)
        .bind(user.birth_date)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.street_number)
        .bind(&user.street)
        .bind(user.postal_code)
        .bind(&user.city)
        .bind(&user.country)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert user")?;

        row_to_user(&row)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by email")?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        rows.iter().map(row_to_user).collect()
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: (i64,) = match exclude_id {
            Some(id) => {
                sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ? AND id != ?")
                    .bind(email)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
                    .bind(email)
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .context("Failed to check user email")?;

        Ok(count.0 > 0)
    }

    async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            "UPDATE users
             SET salutation = ?, last_name = ?, first_name = ?, birth_date = ?,
                 email = ?, password_hash = ?, phone = ?,
                 street_number = ?, street = ?, postal_code = ?, city = ?, country = ?
             WHERE id = ?",
        )
        .bind(&user.salutation)
        .bind(&user.last_name)
        .bind(&user.first_name)
        .bind(user.birth_date)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.street_number)
        .bind(&user.street)
        .bind(user.postal_code)
        .bind(&user.city)
        .bind(&user.country)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .context("Failed to update user")?;

        Ok(())
    }

    async fn delete_with_sessions(&self, id: i64) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM sessions WHERE principal_kind = 'user' AND principal_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to revoke user sessions")?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete user")?;

        tx.commit().await.context("Failed to commit delete")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;

    async fn setup() -> (SqlitePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        (pool.clone(), SqlxUserRepository::new(pool))
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            salutation: "Mx".to_string(),
            last_name: "Bernard".to_string(),
            first_name: "Alex".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1995, 9, 14).unwrap(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            phone: "0605060708".to_string(),
            street_number: None,
            street: None,
            postal_code: None,
            city: None,
            country: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let (_pool, repo) = setup().await;
        let created = repo.create(&new_user("alex@example.com")).await.expect("create");

        let by_email = repo
            .get_by_email("alex@example.com")
            .await
            .expect("get")
            .expect("present");
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_email.first_name, "Alex");
    }

    #[tokio::test]
    async fn test_update_replaces_row() {
        let (_pool, repo) = setup().await;
        let mut created = repo.create(&new_user("alex@example.com")).await.expect("create");

        created.phone = "0700000000".to_string();
        repo.update(&created).await.expect("update");

        let stored = repo
            .get_by_id(created.id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(stored.phone, "0700000000");
    }

    #[tokio::test]
    async fn test_delete_revokes_sessions() {
        let (pool, repo) = setup().await;
        let created = repo.create(&new_user("alex@example.com")).await.expect("create");

        sqlx::query(
            "INSERT INTO sessions (token, principal_kind, principal_id, created_at, expires_at)
             VALUES ('tok-u', 'user', ?, datetime('now'), datetime('now', '+7 days'))",
        )
        .bind(created.id)
        .execute(&pool)
        .await
        .expect("seed session");

        repo.delete_with_sessions(created.id).await.expect("delete");

        assert!(repo.get_by_id(created.id).await.expect("get").is_none());
        let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(remaining.0, 0);
    }
}
