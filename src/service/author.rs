//! Author service
//!
//! Business rules on top of the author repository: every operation that
//! takes usernames resolves them first and fails with a descriptive error
//! when a user does not exist. The self-follow guard lives here as well as
//! in the repository.

use crate::data::{AuthorDto, AuthorRepository};
use crate::error::AppError;

/// Service for author-related operations
#[derive(Clone)]
pub struct AuthorService {
    authors: AuthorRepository,
}

impl AuthorService {
    pub fn new(authors: AuthorRepository) -> Self {
        Self { authors }
    }

    /// Get an author by username, `None` if absent
    pub async fn get_author_by_name(&self, username: &str) -> Result<Option<AuthorDto>, AppError> {
        self.authors.get_by_name(username).await
    }

    /// Get an author by email, `None` if absent
    pub async fn get_author_by_email(&self, email: &str) -> Result<Option<AuthorDto>, AppError> {
        self.authors.get_by_email(email).await
    }

    /// Register a new author
    ///
    /// Duplicate usernames/emails surface as storage constraint violations.
    pub async fn create_author(&self, username: &str, email: &str) -> Result<(), AppError> {
        self.authors.create(username, email).await
    }

    /// Make `current_user` follow `target_user`
    pub async fn follow_user(
        &self,
        current_user: &str,
        target_user: &str,
    ) -> Result<(), AppError> {
        let (current, target) = self.resolve_pair(current_user, target_user).await?;
        self.authors.follow(&current, &target).await
    }

    /// Make `current_user` unfollow `target_user`
    ///
    /// Succeeds even when no follow edge exists.
    pub async fn unfollow_user(
        &self,
        current_user: &str,
        target_user: &str,
    ) -> Result<(), AppError> {
        let (current, target) = self.resolve_pair(current_user, target_user).await?;
        self.authors.unfollow(&current, &target).await
    }

    /// Whether `current_user` follows `target_user`
    pub async fn is_following(
        &self,
        current_user: &str,
        target_user: &str,
    ) -> Result<bool, AppError> {
        let (current, target) = self.resolve_pair(current_user, target_user).await?;
        self.authors.is_following(&current, &target).await
    }

    /// Authors directly followed by `username`
    pub async fn get_following(&self, username: &str) -> Result<Vec<AuthorDto>, AppError> {
        let author = self.resolve(username).await?;
        self.authors.get_following(&author).await
    }

    /// Delete an author account
    ///
    /// The repository removes the author's cheeps, all bookmarks involving
    /// them (as saver or as target), follow edges in both directions, and
    /// the author row, atomically.
    pub async fn delete_author(&self, username: &str) -> Result<(), AppError> {
        let user = self.resolve(username).await?;
        self.authors.delete_author(&user).await
    }

    async fn resolve(&self, username: &str) -> Result<AuthorDto, AppError> {
        self.authors.get_by_name(username).await?.ok_or_else(|| {
            AppError::InvalidOperation(format!(
                "user with username: '{}' doesn't exist",
                username
            ))
        })
    }

    async fn resolve_pair(
        &self,
        current_user: &str,
        target_user: &str,
    ) -> Result<(AuthorDto, AuthorDto), AppError> {
        let current = self.resolve(current_user).await?;
        let target = self.resolve(target_user).await?;

        if current.author_id == target.author_id {
            return Err(AppError::InvalidOperation(
                "You cannot follow yourself".to_string(),
            ));
        }

        Ok((current, target))
    }
}
