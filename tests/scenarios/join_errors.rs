//! Join failure and malformed frame scenario tests

use reqwest::Method;
use serde_json::json;

use crate::harness::TestServer;

#[tokio::test]
async fn test_bad_token_closes_with_4001() {
    let server = TestServer::start().await.unwrap();
    let world = server.world().await.unwrap();

    let mut client = server.connect().await.unwrap();
    client.join(&world.space_id, "not-a-token").await.unwrap();
    assert_eq!(client.expect_close().await.unwrap(), Some(4001));
}

#[tokio::test]
async fn test_unknown_space_closes_with_4004() {
    let server = TestServer::start().await.unwrap();
    let world = server.world().await.unwrap();

    let mut client = server.connect().await.unwrap();
    client.join("no-such-space", &world.user.token).await.unwrap();
    assert_eq!(client.expect_close().await.unwrap(), Some(4004));
}

#[tokio::test]
async fn test_full_space_closes_with_4009() {
    let server = TestServer::start().await.unwrap();
    let world = server.world().await.unwrap();

    let resp = server
        .request(
            Method::POST,
            "/space",
            Some(&world.user.token),
            Some(&json!({ "name": "Closet", "dimensions": "1x1" })),
        )
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let closet = body["spaceId"].as_str().unwrap().to_string();

    let mut first = server.connect().await.unwrap();
    first.join_and_wait(&closet, &world.user.token).await.unwrap();

    let mut second = server.connect().await.unwrap();
    second.join(&closet, &world.admin.token).await.unwrap();
    assert_eq!(second.expect_close().await.unwrap(), Some(4009));

    // The occupant never saw the failed arrival
    first.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_malformed_frames_are_dropped() {
    let server = TestServer::start().await.unwrap();
    let world = server.world().await.unwrap();

    let mut client = server.connect().await.unwrap();
    for frame in [
        "not json",
        r#"{"type":"dance","payload":{}}"#,
        r#"{"type":"movement","payload":{"x":"east"}}"#,
        r#"{"type":"join","payload":{"spaceId":42}}"#,
    ] {
        client.send_text(frame).await.unwrap();
    }
    client.expect_silence().await.unwrap();

    let joined = client
        .join_and_wait(&world.space_id, &world.user.token)
        .await
        .unwrap();
    assert!(joined["payload"]["users"].as_array().unwrap().is_empty());
}
