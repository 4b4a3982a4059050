//! Cheep service
//!
//! Timeline assembly and cheep/bookmark flows on top of the cheep
//! repository. Adds the fixed page size and resolves usernames and cheep
//! ids before delegating, failing descriptively when either is absent.

use chrono::Utc;

use crate::data::{AuthorDto, CheepDto, CheepRepository};
use crate::error::AppError;
use crate::service::AuthorService;

/// Number of cheeps displayed per page
const CHEEPS_PER_PAGE: i64 = 32;

/// Service for cheep-related operations
#[derive(Clone)]
pub struct CheepService {
    cheeps: CheepRepository,
    authors: AuthorService,
}

impl CheepService {
    pub fn new(cheeps: CheepRepository, authors: AuthorService) -> Self {
        Self { cheeps, authors }
    }

    fn page_offset(page_number: i64) -> i64 {
        (page_number.max(1) - 1) * CHEEPS_PER_PAGE
    }

    /// Public timeline page, optionally filtered by a search query
    pub async fn get_public_cheeps(
        &self,
        page_number: i64,
        search_query: Option<&str>,
    ) -> Result<Vec<CheepDto>, AppError> {
        let offset = Self::page_offset(page_number);

        match search_query {
            Some(search) => {
                self.cheeps
                    .read_cheeps_with_search(None, search, offset, CHEEPS_PER_PAGE)
                    .await
            }
            None => self.cheeps.read_cheeps(None, offset, CHEEPS_PER_PAGE).await,
        }
    }

    /// The `amount` most recent cheeps, optionally for one user
    ///
    /// Used by the simulator API, which paginates with `no=` instead of
    /// page numbers.
    pub async fn get_n_latest_cheeps(
        &self,
        username: Option<&str>,
        amount: i64,
    ) -> Result<Vec<CheepDto>, AppError> {
        self.cheeps.read_cheeps(username, 0, amount).await
    }

    /// Timeline page for a user profile
    ///
    /// Viewing someone else's profile shows only that person's cheeps;
    /// viewing your own profile shows your cheeps plus the cheeps of
    /// everyone you follow.
    pub async fn get_user_timeline_cheeps(
        &self,
        viewer: &str,
        profile_owner: &str,
        page_number: i64,
    ) -> Result<Vec<CheepDto>, AppError> {
        let mut usernames = Vec::new();

        if viewer == profile_owner {
            usernames.push(viewer.to_string());
            for author in self.authors.get_following(viewer).await? {
                usernames.push(author.name);
            }
        } else {
            usernames.push(profile_owner.to_string());
        }

        self.cheeps
            .read_cheeps_from_followers(&usernames, Self::page_offset(page_number), CHEEPS_PER_PAGE)
            .await
    }

    /// Saved-cheeps page for a user, newest bookmark first
    pub async fn get_saved_cheeps(
        &self,
        username: &str,
        page_number: i64,
    ) -> Result<Vec<CheepDto>, AppError> {
        let author = self.resolve_author(username).await?;
        self.cheeps
            .read_saved_cheeps(author.author_id, Self::page_offset(page_number), CHEEPS_PER_PAGE)
            .await
    }

    /// Post a new cheep
    ///
    /// The timestamp is the current wall-clock time. Oversized text is
    /// dropped by the repository without an error.
    pub async fn create_cheep_for_user(&self, username: &str, text: &str) -> Result<(), AppError> {
        let author = self.resolve_author(username).await?;

        let cheep = CheepDto {
            cheep_id: None,
            text: text.to_string(),
            timestamp: Utc::now(),
            author,
        };

        self.cheeps.create(&cheep).await
    }

    /// Bookmark a cheep for a user
    pub async fn save_cheep_for_user(&self, username: &str, cheep_id: i64) -> Result<(), AppError> {
        let author = self.resolve_author(username).await?;
        let cheep = self.resolve_cheep(cheep_id).await?;
        self.cheeps.save(&author, &cheep).await
    }

    /// Remove a bookmark for a user
    pub async fn remove_saved_cheep_for_user(
        &self,
        username: &str,
        cheep_id: i64,
    ) -> Result<(), AppError> {
        let author = self.resolve_author(username).await?;
        let cheep = self.resolve_cheep(cheep_id).await?;
        self.cheeps.remove_saved_cheep(&author, &cheep).await
    }

    /// Whether a user has bookmarked a cheep
    pub async fn is_cheep_saved_by_user(
        &self,
        username: &str,
        cheep_id: i64,
    ) -> Result<bool, AppError> {
        let author = self.resolve_author(username).await?;
        let cheep = self.resolve_cheep(cheep_id).await?;
        self.cheeps.is_saved(&author, &cheep).await
    }

    /// Delete every bookmark owned by a user
    pub async fn delete_all_saved_cheeps_for_user(&self, username: &str) -> Result<(), AppError> {
        self.resolve_author(username).await?;
        self.cheeps.delete_saved_cheeps(username).await
    }

    /// Delete every cheep authored by a user, including bookmarks on them
    pub async fn delete_all_cheeps_for_user(&self, username: &str) -> Result<(), AppError> {
        self.resolve_author(username).await?;
        self.cheeps.delete_cheeps(username).await
    }

    async fn resolve_author(&self, username: &str) -> Result<AuthorDto, AppError> {
        self.authors
            .get_author_by_name(username)
            .await?
            .ok_or_else(|| {
                AppError::InvalidOperation(format!(
                    "user with username: '{}' doesn't exist",
                    username
                ))
            })
    }

    async fn resolve_cheep(&self, cheep_id: i64) -> Result<CheepDto, AppError> {
        self.cheeps.get_cheep_by_id(cheep_id).await?.ok_or_else(|| {
            AppError::InvalidOperation(format!("Cheep with id {} doesn't exist", cheep_id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Database;
    use tempfile::TempDir;

    async fn create_test_services() -> (CheepService, AuthorService, Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-cheep.db");
        let db = Database::connect(&db_path).await.unwrap();
        let authors = AuthorService::new(db.authors());
        let cheeps = CheepService::new(db.cheeps(), authors.clone());
        (cheeps, authors, db, temp_dir)
    }

    #[tokio::test]
    async fn public_timeline_respects_page_size() {
        let (service, authors, _db, _temp_dir) = create_test_services().await;
        authors.create_author("alice", "alice@example.com").await.unwrap();

        for i in 0..40 {
            service
                .create_cheep_for_user("alice", &format!("cheep {}", i))
                .await
                .unwrap();
        }

        let page1 = service.get_public_cheeps(1, None).await.unwrap();
        let page2 = service.get_public_cheeps(2, None).await.unwrap();
        assert_eq!(page1.len(), 32);
        assert_eq!(page2.len(), 8);

        let page1_ids: Vec<_> = page1.iter().map(|c| c.cheep_id).collect();
        for cheep in &page2 {
            assert!(!page1_ids.contains(&cheep.cheep_id));
        }
    }

    #[tokio::test]
    async fn public_timeline_search_path_filters() {
        let (service, authors, _db, _temp_dir) = create_test_services().await;
        authors.create_author("alice", "alice@example.com").await.unwrap();

        service.create_cheep_for_user("alice", "rust is nice").await.unwrap();
        service.create_cheep_for_user("alice", "unrelated").await.unwrap();

        let hits = service.get_public_cheeps(1, Some("rust")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "rust is nice");

        let all = service.get_public_cheeps(1, Some("")).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn own_timeline_includes_followed_authors() {
        let (service, authors, _db, _temp_dir) = create_test_services().await;
        authors.create_author("alice", "alice@example.com").await.unwrap();
        authors.create_author("bob", "bob@example.com").await.unwrap();
        authors.create_author("carol", "carol@example.com").await.unwrap();

        service.create_cheep_for_user("alice", "from alice").await.unwrap();
        service.create_cheep_for_user("bob", "from bob").await.unwrap();
        service.create_cheep_for_user("carol", "from carol").await.unwrap();

        authors.follow_user("alice", "bob").await.unwrap();

        // Own profile: self plus followed
        let own = service
            .get_user_timeline_cheeps("alice", "alice", 1)
            .await
            .unwrap();
        let texts: Vec<_> = own.iter().map(|c| c.text.as_str()).collect();
        assert!(texts.contains(&"from alice"));
        assert!(texts.contains(&"from bob"));
        assert!(!texts.contains(&"from carol"));

        // Someone else's profile: only theirs
        let theirs = service
            .get_user_timeline_cheeps("alice", "carol", 1)
            .await
            .unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].text, "from carol");
    }

    #[tokio::test]
    async fn save_and_unsave_flow() {
        let (service, authors, _db, _temp_dir) = create_test_services().await;
        authors.create_author("alice", "alice@example.com").await.unwrap();
        authors.create_author("bob", "bob@example.com").await.unwrap();

        service.create_cheep_for_user("bob", "bookmark me").await.unwrap();
        let cheep_id = service.get_public_cheeps(1, None).await.unwrap()[0]
            .cheep_id
            .unwrap();

        service.save_cheep_for_user("alice", cheep_id).await.unwrap();
        assert!(service
            .is_cheep_saved_by_user("alice", cheep_id)
            .await
            .unwrap());

        let saved = service.get_saved_cheeps("alice", 1).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].text, "bookmark me");

        service
            .remove_saved_cheep_for_user("alice", cheep_id)
            .await
            .unwrap();
        assert!(!service
            .is_cheep_saved_by_user("alice", cheep_id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn save_unknown_cheep_fails_descriptively() {
        let (service, authors, _db, _temp_dir) = create_test_services().await;
        authors.create_author("alice", "alice@example.com").await.unwrap();

        let error = service.save_cheep_for_user("alice", 4242).await.unwrap_err();
        assert!(matches!(
            error,
            AppError::InvalidOperation(message) if message.contains("Cheep with id 4242")
        ));

        let error = service.save_cheep_for_user("ghost", 1).await.unwrap_err();
        assert!(matches!(
            error,
            AppError::InvalidOperation(message) if message.contains("'ghost' doesn't exist")
        ));
    }

    #[tokio::test]
    async fn oversized_cheep_is_dropped_without_error() {
        let (service, authors, _db, _temp_dir) = create_test_services().await;
        authors.create_author("alice", "alice@example.com").await.unwrap();

        let long_text = "x".repeat(161);
        service.create_cheep_for_user("alice", &long_text).await.unwrap();

        assert!(service.get_public_cheeps(1, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_deletes_remove_cheeps_and_bookmarks() {
        let (service, authors, _db, _temp_dir) = create_test_services().await;
        authors.create_author("alice", "alice@example.com").await.unwrap();
        authors.create_author("bob", "bob@example.com").await.unwrap();

        service.create_cheep_for_user("alice", "alice's cheep").await.unwrap();
        service.create_cheep_for_user("bob", "bob's cheep").await.unwrap();

        let bob_cheep_id = service.get_public_cheeps(1, Some("bob's")).await.unwrap()[0]
            .cheep_id
            .unwrap();
        service.save_cheep_for_user("alice", bob_cheep_id).await.unwrap();

        service.delete_all_saved_cheeps_for_user("alice").await.unwrap();
        assert!(service.get_saved_cheeps("alice", 1).await.unwrap().is_empty());

        service.delete_all_cheeps_for_user("alice").await.unwrap();
        let remaining = service.get_public_cheeps(1, None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].author.name, "bob");

        let error = service.delete_all_cheeps_for_user("ghost").await.unwrap_err();
        assert!(matches!(error, AppError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn public_timeline_contains_seeded_fixture_cheep() {
        let (service, authors, db, _temp_dir) = create_test_services().await;
        authors.create_author("Helge", "ropf@itu.dk").await.unwrap();
        let helge = authors.get_author_by_name("Helge").await.unwrap().unwrap();

        // Seed a cheep with a known id, as the production fixture does
        sqlx::query("INSERT INTO cheeps (id, author_id, text, timestamp) VALUES (?, ?, ?, ?)")
            .bind(142_i64)
            .bind(helge.author_id)
            .bind("Hello, BDSA students!")
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();

        let cheeps = service.get_public_cheeps(1, None).await.unwrap();
        assert!(cheeps.iter().any(|c| c.cheep_id == Some(142)));
    }
}
