//! TestServer - True end-to-end test harness
//!
//! Spawns the actual arenad binary on a random port with on-disk SQLite.
//! Each instance gets its own temporary directory, and the complete binary
//! is exercised including CLI parsing and config loading.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Method};
use serde_json::Value;
use tempfile::TempDir;

use super::client::TestClient;
use super::world::{TestUser, TestWorld};

/// Fixed spawn at (20,20) so scenarios can reason about coordinates
pub const FIXED_SPAWN_CONFIG: &str = r#"
[session]
spawn = { kind = "fixed", x = 20, y = 20 }
"#;

/// Handle to a running arenad process
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    child: Child,
    /// Temp directory for database and config (cleaned up on drop)
    _temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestServer {
    /// Start a server with default settings
    pub async fn start() -> Result<Self> {
        Self::start_with_config("").await
    }

    /// Start a server whose spawn cell is always (20,20) when free
    pub async fn start_fixed_spawn() -> Result<Self> {
        Self::start_with_config(FIXED_SPAWN_CONFIG).await
    }

    /// Start a server with `config_toml` as its config file
    pub async fn start_with_config(config_toml: &str) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test.db");
        let config_path = temp_dir.path().join("arenad.toml");
        std::fs::write(&config_path, config_toml)?;

        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let binary_path = PathBuf::from(env!("CARGO_BIN_EXE_arenad"));
        let child = Command::new(&binary_path)
            .arg("--bind")
            .arg(addr.to_string())
            .arg("--database")
            .arg(db_path.to_string_lossy().as_ref())
            .arg("--config")
            .arg(&config_path)
            .env_remove("RUST_LOG")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to spawn arenad at {:?}: {}", binary_path, e))?;

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        let mut server = Self {
            addr,
            client,
            child,
            _temp_dir: temp_dir,
            db_path,
        };

        // Poll until server is ready (max 5 seconds to handle resource contention)
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if server.get("/health").await.is_ok() {
                return Ok(server);
            }
        }

        let _ = server.child.kill();
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket URL for the server
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Make a request under `/api/v1`, optionally authenticated and with a
    /// JSON body
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .request(method, format!("{}/api/v1{}", self.base_url(), path));
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Sign up and sign in, returning the user id and a token
    pub async fn create_user(&self, username: &str, admin: bool) -> Result<TestUser> {
        let kind = if admin { "admin" } else { "user" };
        let creds = serde_json::json!({
            "username": username,
            "password": "test123",
            "type": kind,
        });

        let resp = self.post("/api/v1/signup", &creds).await?;
        anyhow::ensure!(resp.status().is_success(), "signup failed: {}", resp.status());
        let body: Value = resp.json().await?;
        let id = body["userId"].as_str().unwrap_or_default().to_string();

        let resp = self.post("/api/v1/signin", &creds).await?;
        anyhow::ensure!(resp.status().is_success(), "signin failed: {}", resp.status());
        let body: Value = resp.json().await?;
        let token = body["token"].as_str().unwrap_or_default().to_string();

        Ok(TestUser { id, token })
    }

    /// Build the standard test world
    pub async fn world(&self) -> Result<TestWorld> {
        TestWorld::create(self).await
    }

    /// Open a WebSocket connection
    pub async fn connect(&self) -> Result<TestClient> {
        TestClient::connect(&self.ws_url()).await
    }

    /// Open several WebSocket connections
    pub async fn connect_many(&self, count: usize) -> Result<Vec<TestClient>> {
        let mut clients = Vec::with_capacity(count);
        for _ in 0..count {
            clients.push(self.connect().await?);
        }
        Ok(clients)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Kill the server process
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
