//! Integration Test Harness
//!
//! - `TestServer` - Spawns the real arenad binary on a random port with an
//!   on-disk SQLite database in a temp directory
//! - `TestClient` - WebSocket client speaking the presence protocol
//! - `TestWorld` - Admin, user, catalog and a 100x200 space built over REST
//!
//! # Example
//!
//! ```rust,ignore
//! use harness::TestServer;
//!
//! #[tokio::test]
//! async fn test_join() {
//!     let server = TestServer::start().await.unwrap();
//!     let world = server.world().await.unwrap();
//!
//!     let mut client = server.connect().await.unwrap();
//!     client.join(&world.space_id, &world.user.token).await.unwrap();
//!     let joined = client.expect("space-joined").await.unwrap();
//!     assert_eq!(joined["payload"]["users"].as_array().unwrap().len(), 0);
//! }
//! ```

#![allow(dead_code)]

mod client;
mod server;
mod world;

pub use client::TestClient;
pub use server::TestServer;
pub use world::{TestUser, TestWorld};
