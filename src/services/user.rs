//! User account service
//!
//! Same lifecycle as creators, for buyers.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::UserRepository;
use crate::models::{NewUser, PrincipalKind, RegisterUser, Session, User, UserPatch, ValidationErrors};
use crate::services::password;
use crate::services::session::SessionService;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("user not found")]
    NotFound,
    #[error("email is already registered")]
    EmailTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    sessions: SessionService,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, sessions: SessionService) -> Self {
        Self { users, sessions }
    }

    pub async fn register(&self, input: &RegisterUser) -> Result<User, UserServiceError> {
        input.validate()?;

        if self.users.email_taken(&input.email, None).await? {
            return Err(UserServiceError::EmailTaken);
        }

        let new_user = NewUser {
            salutation: input.salutation.clone(),
            last_name: input.last_name.clone(),
            first_name: input.first_name.clone(),
            birth_date: input.birth_date,
            email: input.email.clone(),
            password_hash: password::hash(&input.password)?,
            phone: input.phone.clone(),
            street_number: input.street_number.clone(),
            street: input.street.clone(),
            postal_code: input.postal_code,
            city: input.city.clone(),
            country: input.country.clone(),
        };

        Ok(self.users.create(&new_user).await?)
    }

    pub async fn login(
        &self,
        email: &str,
        plain_password: &str,
    ) -> Result<(User, Session), UserServiceError> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(UserServiceError::InvalidCredentials)?;

        if !password::verify(plain_password, &user.password_hash) {
            return Err(UserServiceError::InvalidCredentials);
        }

        let session = self.sessions.issue(PrincipalKind::User, user.id).await?;

        Ok((user, session))
    }

    pub async fn get(&self, id: i64) -> Result<User, UserServiceError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or(UserServiceError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.users.list().await?)
    }

    pub async fn update(&self, id: i64, patch: &UserPatch) -> Result<User, UserServiceError> {
        patch.validate()?;

        let current = self.get(id).await?;

        if let Some(email) = patch.email.as_deref() {
            if !email.is_empty() && self.users.email_taken(email, Some(id)).await? {
                return Err(UserServiceError::EmailTaken);
            }
        }

        let password_hash = if patch.wants_password_change() {
            Some(password::hash(patch.password.as_deref().unwrap_or_default())?)
        } else {
            None
        };

        let merged = current.merged(patch, password_hash);
        self.users.update(&merged).await?;

        Ok(merged)
    }

    pub async fn delete(&self, id: i64, plain_password: &str) -> Result<(), UserServiceError> {
        let user = self.get(id).await?;

        if !password::verify(plain_password, &user.password_hash) {
            return Err(UserServiceError::InvalidCredentials);
        }

        self.users.delete_with_sessions(id).await?;
        Ok(())
    }
}
