//! TestWorld - Pre-built accounts, catalog and space
//!
//! Everything is created through the REST API, the way a real client would:
//! - an admin and a regular user
//! - two static 1x1 elements
//! - a 100x200 map with the elements at (20,20) and (18,20)
//! - a space owned by the user, created from that map

use anyhow::{ensure, Result};
use reqwest::Method;
use serde_json::{json, Value};

use super::server::TestServer;

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct TestWorld {
    pub admin: TestUser,
    pub user: TestUser,
    pub element_ids: Vec<String>,
    pub map_id: String,
    pub space_id: String,
}

async fn ok_json(resp: reqwest::Response) -> Result<Value> {
    ensure!(resp.status().is_success(), "request failed: {}", resp.status());
    Ok(resp.json().await?)
}

impl TestWorld {
    pub async fn create(server: &TestServer) -> Result<Self> {
        let admin = server.create_user("world-admin", true).await?;
        let user = server.create_user("world-user", false).await?;

        let mut element_ids = Vec::new();
        for _ in 0..2 {
            let body = ok_json(
                server
                    .request(
                        Method::POST,
                        "/admin/element",
                        Some(&admin.token),
                        Some(&json!({
                            "imageUrl": "https://encrypted-tbn0.gstatic.com/images?q=chair",
                            "width": 1,
                            "height": 1,
                            "static": true
                        })),
                    )
                    .await?,
            )
            .await?;
            element_ids.push(body["id"].as_str().unwrap_or_default().to_string());
        }

        let body = ok_json(
            server
                .request(
                    Method::POST,
                    "/admin/map",
                    Some(&admin.token),
                    Some(&json!({
                        "thumbnail": "https://thumbnail.com/a.png",
                        "dimensions": "100x200",
                        "name": "100 person interview room",
                        "defaultElements": [
                            { "elementId": element_ids[0], "x": 20, "y": 20 },
                            { "elementId": element_ids[1], "x": 18, "y": 20 }
                        ]
                    })),
                )
                .await?,
        )
        .await?;
        let map_id = body["id"].as_str().unwrap_or_default().to_string();

        let body = ok_json(
            server
                .request(
                    Method::POST,
                    "/space",
                    Some(&user.token),
                    Some(&json!({
                        "name": "Test",
                        "dimensions": "100x200",
                        "mapId": map_id
                    })),
                )
                .await?,
        )
        .await?;
        let space_id = body["spaceId"].as_str().unwrap_or_default().to_string();

        Ok(Self {
            admin,
            user,
            element_ids,
            map_id,
            space_id,
        })
    }
}
