//! Common test utilities for E2E tests

use chirp::{config, AppState};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Authorization header value matching the test simulator credentials
pub const SIMULATOR_AUTH: &str = "Basic c2ltdWxhdG9yOnN1cGVyX3NhZmUh";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Idempotent; repeated registration across tests is skipped
        chirp::metrics::init_metrics();

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            database: config::DatabaseConfig { path: db_path },
            simulator: config::SimulatorConfig {
                username: "simulator".to_string(),
                password: "super_safe!".to_string(),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = chirp::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register a user through the simulator API
    pub async fn register_user(&self, username: &str, email: &str) {
        let response = self
            .client
            .post(self.url("/register"))
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "pwd": "secret",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204, "registering {} failed", username);
    }

    /// Post a message for a user through the simulator API
    pub async fn post_message(&self, username: &str, content: &str) {
        let response = self
            .client
            .post(self.url(&format!("/msgs/{}", username)))
            .header("Authorization", SIMULATOR_AUTH)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204, "posting for {} failed", username);
    }
}
