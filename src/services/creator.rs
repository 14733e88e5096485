//! Creator account service
//!
//! Registration, login, profile updates, and account deletion for
//! sellers. Passwords are hashed before anything touches the database
//! and login failures are deliberately indistinguishable.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::CreatorRepository;
use crate::models::{
    Creator, CreatorPatch, NewCreator, PrincipalKind, RegisterCreator, Session, ValidationErrors,
};
use crate::services::password;
use crate::services::session::SessionService;

#[derive(Debug, thiserror::Error)]
pub enum CreatorServiceError {
    #[error("creator not found")]
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
pub struct CreatorService {
    creators: Arc<dyn CreatorRepository>,
    sessions: SessionService,
}

impl CreatorService {
    pub fn new(creators: Arc<dyn CreatorRepository>, sessions: SessionService) -> Self {
        Self { creators, sessions }
    }

    pub async fn register(&self, input: &RegisterCreator) -> Result<Creator, CreatorServiceError> {
        input.validate()?;

        if self.creators.email_taken(&input.email, None).await? {
            return Err(CreatorServiceError::EmailTaken);
        }

        let new_creator = NewCreator {
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
            business_started_on: input.business_started_on,
            siret: input.siret,
        };

        Ok(self.creators.create(&new_creator).await?)
    }

    /// Authenticate and open a session.
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn login(
        &self,
        email: &str,
        plain_password: &str,
    ) -> Result<(Creator, Session), CreatorServiceError> {
        let creator = self
            .creators
            .get_by_email(email)
            .await?
            .ok_or(CreatorServiceError::InvalidCredentials)?;

        if !password::verify(plain_password, &creator.password_hash) {
            return Err(CreatorServiceError::InvalidCredentials);
        }

        let session = self
            .sessions
            .issue(PrincipalKind::Creator, creator.id)
            .await?;

        Ok((creator, session))
    }

    pub async fn get(&self, id: i64) -> Result<Creator, CreatorServiceError> {
        self.creators
            .get_by_id(id)
            .await?
            .ok_or(CreatorServiceError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<Creator>, CreatorServiceError> {
        Ok(self.creators.list().await?)
    }

    /// Apply a sparse patch to a creator account.
    pub async fn update(
        &self,
        id: i64,
        patch: &CreatorPatch,
    ) -> Result<Creator, CreatorServiceError> {
        patch.validate()?;

        let current = self.get(id).await?;

        if let Some(email) = patch.email.as_deref() {
            if !email.is_empty() && self.creators.email_taken(email, Some(id)).await? {
                return Err(CreatorServiceError::EmailTaken);
            }
        }

        let password_hash = if patch.wants_password_change() {
            Some(password::hash(patch.password.as_deref().unwrap_or_default())?)
        } else {
            None
        };

        let merged = current.merged(patch, password_hash);
        self.creators.update(&merged).await?;

        Ok(merged)
    }

    /// Delete an account after re-verifying the password.
    ///
    /// Every open session of the creator is revoked in the same
    /// transaction as the row deletion.
    pub async fn delete(&self, id: i64, plain_password: &str) -> Result<(), CreatorServiceError> {
        let creator = self.get(id).await?;

        if !password::verify(plain_password, &creator.password_hash) {
            return Err(CreatorServiceError::InvalidCredentials);
        }

        self.creators.delete_with_sessions(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;
    use crate::db::repositories::{SqlxCreatorRepository, SqlxSessionRepository};
    use chrono::NaiveDate;

    async fn setup() -> (CreatorService, SessionService) {
        let pool = create_test_pool().await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        let sessions = SessionService::new(SqlxSessionRepository::boxed(pool.clone()));
        let service = CreatorService::new(SqlxCreatorRepository::boxed(pool), sessions.clone());
        (service, sessions)
    }

    fn registration(email: &str) -> RegisterCreator {
        RegisterCreator {
            salutation: "Mx".to_string(),
            last_name: "Moreau".to_string(),
            first_name: "Camille".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
            email: email.to_string(),
            password: "correct-horse".to_string(),
            phone: "0601020304".to_string(),
            street_number: None,
            street: None,
            postal_code: None,
            city: None,
            country: None,
            business_started_on: None,
            siret: 12345678901234,
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (service, _) = setup().await;
        let creator = service
            .register(&registration("camille@example.com"))
            .await
            .expect("register");

        assert_ne!(creator.password_hash, "correct-horse");
        assert!(creator.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let (service, _) = setup().await;
        service
            .register(&registration("camille@example.com"))
            .await
            .expect("register");

        let err = service
            .register(&registration("camille@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, CreatorServiceError::EmailTaken));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = setup().await;
        service
            .register(&registration("camille@example.com"))
            .await
            .expect("register");

        let unknown = service
            .login("nobody@example.com", "correct-horse")
            .await
            .unwrap_err();
        let wrong = service
            .login("camille@example.com", "wrong-password")
            .await
            .unwrap_err();

        assert!(matches!(unknown, CreatorServiceError::InvalidCredentials));
        assert!(matches!(wrong, CreatorServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_opens_resolvable_session() {
        let (service, sessions) = setup().await;
        let creator = service
            .register(&registration("camille@example.com"))
            .await
            .expect("register");

        let (logged_in, session) = service
            .login("camille@example.com", "correct-horse")
            .await
            .expect("login");
        assert_eq!(logged_in.id, creator.id);

        let resolved = sessions
            .resolve(&session.token)
            .await
            .expect("resolve")
            .expect("live");
        assert_eq!(resolved.principal_kind, PrincipalKind::Creator);
        assert_eq!(resolved.principal_id, creator.id);
    }

    #[tokio::test]
    async fn test_update_rehashes_new_password() {
        let (service, _) = setup().await;
        let creator = service
            .register(&registration("camille@example.com"))
            .await
            .expect("register");

        let patch = CreatorPatch {
            password: Some("fresh-password".to_string()),
            ..Default::default()
        };
        let updated = service.update(creator.id, &patch).await.expect("update");

        assert_ne!(updated.password_hash, creator.password_hash);
        service
            .login("camille@example.com", "fresh-password")
            .await
            .expect("login with new password");
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let (service, _) = setup().await;
        service
            .register(&registration("camille@example.com"))
            .await
            .expect("register");
        let other = service
            .register(&registration("dominique@example.com"))
            .await
            .expect("register");

        let patch = CreatorPatch {
            email: Some("camille@example.com".to_string()),
            ..Default::default()
        };
        let err = service.update(other.id, &patch).await.unwrap_err();
        assert!(matches!(err, CreatorServiceError::EmailTaken));

        // Re-submitting one's own email is not a conflict.
        let patch = CreatorPatch {
            email: Some("dominique@example.com".to_string()),
            ..Default::default()
        };
        service.update(other.id, &patch).await.expect("update");
    }

    #[tokio::test]
    async fn test_delete_requires_correct_password() {
        let (service, sessions) = setup().await;
        let creator = service
            .register(&registration("camille@example.com"))
            .await
            .expect("register");
        let (_, session) = service
            .login("camille@example.com", "correct-horse")
            .await
            .expect("login");

        let err = service.delete(creator.id, "wrong-password").await.unwrap_err();
        assert!(matches!(err, CreatorServiceError::InvalidCredentials));
        // The failed attempt left the session untouched.
        assert!(sessions
            .resolve(&session.token)
            .await
            .expect("resolve")
            .is_some());

        service
            .delete(creator.id, "correct-horse")
            .await
            .expect("delete");
        assert!(matches!(
            service.get(creator.id).await.unwrap_err(),
            CreatorServiceError::NotFound
        ));
        assert!(sessions
            .resolve(&session.token)
            .await
            .expect("resolve")
            .is_none());
    }
}
