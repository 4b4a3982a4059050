//! Author data access
//!
//! Queries and mutations for authors and follow edges. Results cross the
//! boundary as [`AuthorDto`] values; a missing row is `None`, never an
//! error. Storage errors (including uniqueness violations on create) are
//! surfaced unmodified.

use sqlx::{Pool, Sqlite};

use crate::data::models::{AuthorDto, AuthorRow, CheepRecord};
use crate::error::AppError;

/// Repository for authors and follow relationships
#[derive(Clone)]
pub struct AuthorRepository {
    pool: Pool<Sqlite>,
}

impl AuthorRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get an author by username (exact, case-sensitive)
    ///
    /// The returned DTO includes the author's cheeps, matching what the
    /// profile pages need in one lookup.
    pub async fn get_by_name(&self, username: &str) -> Result<Option<AuthorDto>, AppError> {
        let row = sqlx::query_as::<_, AuthorRow>(
            "SELECT id, username, email FROM authors WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_with_cheeps(row).await?)),
            None => Ok(None),
        }
    }

    /// Get an author by email (exact match)
    pub async fn get_by_email(&self, email: &str) -> Result<Option<AuthorDto>, AppError> {
        let row =
            sqlx::query_as::<_, AuthorRow>("SELECT id, username, email FROM authors WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(self.load_with_cheeps(row).await?)),
            None => Ok(None),
        }
    }

    async fn load_with_cheeps(&self, row: AuthorRow) -> Result<AuthorDto, AppError> {
        let cheeps = sqlx::query_as::<_, CheepRecord>(
            r#"
            SELECT c.id AS cheep_id, c.text, c.timestamp,
                   a.id AS author_id, a.username, a.email
            FROM cheeps c
            JOIN authors a ON a.id = c.author_id
            WHERE c.author_id = ?
            ORDER BY c.timestamp DESC, c.id DESC
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(AuthorDto {
            author_id: row.id,
            name: row.username,
            email: row.email,
            cheeps: cheeps.into_iter().map(CheepRecord::into_dto).collect(),
        })
    }

    /// Insert a new author
    ///
    /// Uniqueness is not pre-checked; a duplicate username or email
    /// surfaces as a storage-layer constraint violation.
    pub async fn create(&self, username: &str, email: &str) -> Result<(), AppError> {
        sqlx::query("INSERT INTO authors (username, email) VALUES (?, ?)")
            .bind(username)
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a directed follow edge from `user` to `target`
    ///
    /// # Errors
    /// `NotFound` if either author row is missing; `InvalidOperation` if
    /// both ids are the same. A duplicate edge violates the composite key
    /// and surfaces as a storage error.
    pub async fn follow(&self, user: &AuthorDto, target: &AuthorDto) -> Result<(), AppError> {
        if user.author_id == target.author_id {
            return Err(AppError::InvalidOperation(
                "an author cannot follow themselves".to_string(),
            ));
        }

        for id in [user.author_id, target.author_id] {
            let exists = sqlx::query_scalar::<_, i64>("SELECT 1 FROM authors WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            if exists.is_none() {
                return Err(AppError::NotFound);
            }
        }

        sqlx::query("INSERT INTO follows (follower_id, following_id) VALUES (?, ?)")
            .bind(user.author_id)
            .bind(target.author_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove the follow edge from `user` to `target`
    ///
    /// Succeeds as a no-op when the edge does not exist.
    pub async fn unfollow(&self, user: &AuthorDto, target: &AuthorDto) -> Result<(), AppError> {
        sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(user.author_id)
            .bind(target.author_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Whether `user` follows `target`
    ///
    /// Derived by loading the following list and scanning it
    /// (O(followee count)); the list is small in practice.
    pub async fn is_following(
        &self,
        user: &AuthorDto,
        target: &AuthorDto,
    ) -> Result<bool, AppError> {
        let following = self.get_following(user).await?;
        Ok(following
            .iter()
            .any(|author| author.author_id == target.author_id))
    }

    /// Authors directly followed by `user`
    ///
    /// Empty list when the user follows no one. Not transitive.
    pub async fn get_following(&self, user: &AuthorDto) -> Result<Vec<AuthorDto>, AppError> {
        let rows = sqlx::query_as::<_, AuthorRow>(
            r#"
            SELECT a.id, a.username, a.email
            FROM follows f
            JOIN authors a ON a.id = f.following_id
            WHERE f.follower_id = ?
            "#,
        )
        .bind(user.author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| AuthorDto {
                author_id: row.id,
                name: row.username,
                email: row.email,
                cheeps: Vec::new(),
            })
            .collect())
    }

    /// Delete an author and everything that references them
    ///
    /// Removes, in one transaction: the author's bookmarks, every bookmark
    /// targeting one of the author's cheeps, the cheeps themselves, follow
    /// edges in both directions, and finally the author row. All-or-nothing;
    /// a failure mid-sequence rolls the whole deletion back.
    pub async fn delete_author(&self, user: &AuthorDto) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM saved_cheeps WHERE author_id = ?")
            .bind(user.author_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "DELETE FROM saved_cheeps WHERE cheep_id IN (SELECT id FROM cheeps WHERE author_id = ?)",
        )
        .bind(user.author_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cheeps WHERE author_id = ?")
            .bind(user.author_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM follows WHERE follower_id = ? OR following_id = ?")
            .bind(user.author_id)
            .bind(user.author_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(user.author_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
