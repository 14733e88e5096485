//! Article catalog service
//!
//! Validation happens in the model layer; this service wires validated
//! inputs to the repository and maps ownership failures to typed errors
//! the API layer can translate into status codes.

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::repositories::{ArticleRepository, CreatorRepository, MutationError};
use crate::models::{
    Article, ArticlePatch, CreatorProfile, FilterCriteria, NewArticle, SearchCriteria,
    ValidationErrors,
};

#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    #[error("article not found")]
    NotFound,
    #[error("article belongs to another creator")]
    NotOwner,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<MutationError> for ArticleServiceError {
    fn from(error: MutationError) -> Self {
        match error {
            MutationError::NotFound => ArticleServiceError::NotFound,
            MutationError::NotOwner => ArticleServiceError::NotOwner,
            MutationError::Other(error) => ArticleServiceError::Internal(error),
        }
    }
}

#[derive(Clone)]
pub struct ArticleService {
    articles: Arc<dyn ArticleRepository>,
    creators: Arc<dyn CreatorRepository>,
}

impl ArticleService {
    pub fn new(articles: Arc<dyn ArticleRepository>, creators: Arc<dyn CreatorRepository>) -> Self {
        Self { articles, creators }
    }

    /// Create an article from raw multipart fields on behalf of a creator.
    pub async fn create(
        &self,
        fields: &BTreeMap<String, String>,
        photo_path: Option<String>,
        creator_id: i64,
    ) -> Result<Article, ArticleServiceError> {
        let input = NewArticle::from_fields(fields, creator_id, photo_path)?;
        Ok(self.articles.create(&input).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Article, ArticleServiceError> {
        self.articles
            .get_by_id(id)
            .await?
            .ok_or(ArticleServiceError::NotFound)
    }

    /// Fetch an article together with its creator's public profile.
    pub async fn get_with_creator(
        &self,
        id: i64,
    ) -> Result<(Article, Option<CreatorProfile>), ArticleServiceError> {
        let article = self.get(id).await?;
        let profile = self
            .creators
            .get_by_id(article.creator_id)
            .await?
            .as_ref()
            .map(CreatorProfile::from);
        Ok((article, profile))
    }

    pub async fn list(&self) -> Result<Vec<Article>, ArticleServiceError> {
        Ok(self.articles.list().await?)
    }

    pub async fn search(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<Article>, ArticleServiceError> {
        Ok(self.articles.search(criteria).await?)
    }

    pub async fn filter(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<Article>, ArticleServiceError> {
        Ok(self.articles.filter(criteria).await?)
    }

    /// Partially update an article owned by the acting creator.
    pub async fn update(
        &self,
        id: i64,
        creator_id: i64,
        fields: &BTreeMap<String, String>,
        photo_path: Option<String>,
    ) -> Result<Article, ArticleServiceError> {
        let patch = ArticlePatch::from_fields(fields, photo_path)?;
        Ok(self.articles.update_owned(id, creator_id, &patch).await?)
    }

    /// Delete an article owned by the acting creator.
    pub async fn delete(&self, id: i64, creator_id: i64) -> Result<(), ArticleServiceError> {
        Ok(self.articles.delete_owned(id, creator_id).await?)
    }
}
