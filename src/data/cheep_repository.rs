//! Cheep data access
//!
//! Queries and mutations for cheeps and bookmarks: creation, timelines,
//! search, saved-cheep management, and the bulk deletes used when an
//! account is purged.

use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::data::models::{AuthorDto, CheepDto, CheepRecord, MAX_CHEEP_LENGTH};
use crate::error::AppError;

/// Repository for cheeps and saved cheeps
#[derive(Clone)]
pub struct CheepRepository {
    pool: Pool<Sqlite>,
}

impl CheepRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Persist a new cheep
    ///
    /// Text longer than 160 characters is dropped without an error; the
    /// store is left unchanged. The caller supplies the timestamp.
    pub async fn create(&self, cheep: &CheepDto) -> Result<(), AppError> {
        if cheep.text.chars().count() > MAX_CHEEP_LENGTH {
            tracing::warn!(
                author = %cheep.author.name,
                length = cheep.text.chars().count(),
                "Dropping cheep over the 160 character limit"
            );
            return Ok(());
        }

        sqlx::query("INSERT INTO cheeps (author_id, text, timestamp) VALUES (?, ?, ?)")
            .bind(cheep.author.author_id)
            .bind(&cheep.text)
            .bind(cheep.timestamp)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Bookmark a cheep for a user
    ///
    /// The save timestamp is the current wall-clock time; any timestamp on
    /// the input cheep is ignored.
    ///
    /// # Errors
    /// `Validation` if the cheep has no id (not persisted yet).
    pub async fn save(&self, user: &AuthorDto, cheep: &CheepDto) -> Result<(), AppError> {
        let cheep_id = cheep
            .cheep_id
            .ok_or_else(|| AppError::Validation("cheep has no id".to_string()))?;

        sqlx::query("INSERT INTO saved_cheeps (author_id, cheep_id, timestamp) VALUES (?, ?, ?)")
            .bind(user.author_id)
            .bind(cheep_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove a bookmark
    ///
    /// Succeeds as a no-op when no matching bookmark exists.
    pub async fn remove_saved_cheep(
        &self,
        user: &AuthorDto,
        cheep: &CheepDto,
    ) -> Result<(), AppError> {
        let Some(cheep_id) = cheep.cheep_id else {
            return Ok(());
        };

        sqlx::query("DELETE FROM saved_cheeps WHERE author_id = ? AND cheep_id = ?")
            .bind(user.author_id)
            .bind(cheep_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Read cheeps, optionally filtered by author username
    ///
    /// Ordered by timestamp descending (id descending as tiebreaker so
    /// pagination is stable), paginated by skip/take.
    pub async fn read_cheeps(
        &self,
        username: Option<&str>,
        offset: i64,
        count: i64,
    ) -> Result<Vec<CheepDto>, AppError> {
        let records = sqlx::query_as::<_, CheepRecord>(
            r#"
            SELECT c.id AS cheep_id, c.text, c.timestamp,
                   a.id AS author_id, a.username, a.email
            FROM cheeps c
            JOIN authors a ON a.id = c.author_id
            WHERE (? IS NULL OR a.username = ?)
            ORDER BY c.timestamp DESC, c.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(username)
        .bind(username)
        .bind(count)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(CheepRecord::into_dto).collect())
    }

    /// Read the cheeps a user has bookmarked, newest bookmark first
    pub async fn read_saved_cheeps(
        &self,
        author_id: i64,
        offset: i64,
        count: i64,
    ) -> Result<Vec<CheepDto>, AppError> {
        let records = sqlx::query_as::<_, CheepRecord>(
            r#"
            SELECT c.id AS cheep_id, c.text, c.timestamp,
                   a.id AS author_id, a.username, a.email
            FROM saved_cheeps s
            JOIN cheeps c ON c.id = s.cheep_id
            JOIN authors a ON a.id = c.author_id
            WHERE s.author_id = ?
            ORDER BY s.timestamp DESC, s.cheep_id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(author_id)
        .bind(count)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(CheepRecord::into_dto).collect())
    }

    /// Read cheeps with a case-sensitive substring filter on the text
    ///
    /// An empty search string matches everything. Uses `instr()` rather
    /// than `LIKE` because SQLite's `LIKE` is case-insensitive for ASCII.
    pub async fn read_cheeps_with_search(
        &self,
        username: Option<&str>,
        search: &str,
        offset: i64,
        count: i64,
    ) -> Result<Vec<CheepDto>, AppError> {
        let records = sqlx::query_as::<_, CheepRecord>(
            r#"
            SELECT c.id AS cheep_id, c.text, c.timestamp,
                   a.id AS author_id, a.username, a.email
            FROM cheeps c
            JOIN authors a ON a.id = c.author_id
            WHERE (? IS NULL OR a.username = ?)
              AND (? = '' OR instr(c.text, ?) > 0)
            ORDER BY c.timestamp DESC, c.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(username)
        .bind(username)
        .bind(search)
        .bind(search)
        .bind(count)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(CheepRecord::into_dto).collect())
    }

    /// Read cheeps authored by any of the given usernames, newest first
    ///
    /// Backs the own-timeline view (self plus followed authors).
    pub async fn read_cheeps_from_followers(
        &self,
        usernames: &[String],
        offset: i64,
        count: i64,
    ) -> Result<Vec<CheepDto>, AppError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = usernames.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            r#"
            SELECT c.id AS cheep_id, c.text, c.timestamp,
                   a.id AS author_id, a.username, a.email
            FROM cheeps c
            JOIN authors a ON a.id = c.author_id
            WHERE a.username IN ({})
            ORDER BY c.timestamp DESC, c.id DESC
            LIMIT ? OFFSET ?
            "#,
            placeholders
        );

        let mut query_builder = sqlx::query_as::<_, CheepRecord>(&query);
        for username in usernames {
            query_builder = query_builder.bind(username);
        }
        let records = query_builder
            .bind(count)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(CheepRecord::into_dto).collect())
    }

    /// Get a single cheep by id
    pub async fn get_cheep_by_id(&self, cheep_id: i64) -> Result<Option<CheepDto>, AppError> {
        let record = sqlx::query_as::<_, CheepRecord>(
            r#"
            SELECT c.id AS cheep_id, c.text, c.timestamp,
                   a.id AS author_id, a.username, a.email
            FROM cheeps c
            JOIN authors a ON a.id = c.author_id
            WHERE c.id = ?
            "#,
        )
        .bind(cheep_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(CheepRecord::into_dto))
    }

    /// Delete every bookmark owned by a user
    pub async fn delete_saved_cheeps(&self, username: &str) -> Result<(), AppError> {
        sqlx::query(
            "DELETE FROM saved_cheeps WHERE author_id IN (SELECT id FROM authors WHERE username = ?)",
        )
        .bind(username)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete every cheep authored by a user
    ///
    /// Bookmarks anywhere in the system that target those cheeps are
    /// removed first, in the same transaction, so no dangling references
    /// are left behind.
    pub async fn delete_cheeps(&self, username: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM saved_cheeps WHERE cheep_id IN (
                SELECT c.id FROM cheeps c
                JOIN authors a ON a.id = c.author_id
                WHERE a.username = ?
            )
            "#,
        )
        .bind(username)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM cheeps WHERE author_id IN (SELECT id FROM authors WHERE username = ?)",
        )
        .bind(username)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Whether a user has bookmarked a cheep
    pub async fn is_saved(&self, user: &AuthorDto, cheep: &CheepDto) -> Result<bool, AppError> {
        let Some(cheep_id) = cheep.cheep_id else {
            return Ok(false);
        };

        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM saved_cheeps WHERE author_id = ? AND cheep_id = ?",
        )
        .bind(user.author_id)
        .bind(cheep_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exists.is_some())
    }
}
