//! Data models
//!
//! Row types mapped by sqlx and the DTOs handed across layer boundaries.
//! Authors and cheeps use integer autoincrement ids; follows and saved
//! cheeps are join rows with composite keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Rows
// =============================================================================

/// An authors table row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthorRow {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// A cheep joined with its author
///
/// Flat shape produced by the repository queries; converted to
/// [`CheepDto`] before leaving the data layer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheepRecord {
    pub cheep_id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub author_id: i64,
    pub username: String,
    pub email: String,
}

impl CheepRecord {
    pub fn into_dto(self) -> CheepDto {
        CheepDto {
            cheep_id: Some(self.cheep_id),
            text: self.text,
            timestamp: self.timestamp,
            author: AuthorDto {
                author_id: self.author_id,
                name: self.username,
                email: self.email,
                cheeps: Vec::new(),
            },
        }
    }
}

// =============================================================================
// DTOs
// =============================================================================

/// Author data crossing the repository boundary
///
/// `cheeps` is populated by the by-name/by-email lookups and left empty
/// when the author appears nested inside a [`CheepDto`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorDto {
    pub author_id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cheeps: Vec<CheepDto>,
}

/// Cheep data crossing the repository boundary
///
/// `cheep_id` is `None` only for cheeps that have not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheepDto {
    pub cheep_id: Option<i64>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub author: AuthorDto,
}

/// Maximum cheep text length in characters
pub const MAX_CHEEP_LENGTH: usize = 160;
