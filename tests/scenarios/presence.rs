//! Presence scenario tests

use reqwest::Method;
use serde_json::json;

use crate::harness::TestServer;

#[tokio::test]
async fn test_sequential_joins_see_earlier_members() {
    let server = TestServer::start().await.expect("Failed to start server");
    let world = server.world().await.expect("Failed to build world");
    let third = server.create_user("third", false).await.unwrap();

    let tokens = [&world.admin.token, &world.user.token, &third.token];
    let mut clients = server.connect_many(tokens.len()).await.unwrap();

    let mut others_total = 0;
    for (i, token) in tokens.iter().enumerate() {
        let joined = clients[i].join_and_wait(&world.space_id, token).await.unwrap();
        let users = joined["payload"]["users"].as_array().unwrap();
        assert_eq!(users.len(), i, "join #{i} should see {i} others");
        others_total += users.len();

        let spawn = &joined["payload"]["spawn"];
        let (x, y) = (spawn["x"].as_i64().unwrap(), spawn["y"].as_i64().unwrap());
        assert!((0..100).contains(&x) && (0..200).contains(&y));

        // Everyone already inside hears about the newcomer at its spawn
        for earlier in clients.iter_mut().take(i) {
            let msg = earlier.expect("user-joined").await.unwrap();
            assert_eq!(msg["payload"]["x"], x);
            assert_eq!(msg["payload"]["y"], y);
        }
    }
    assert_eq!(others_total, 3);
}

#[tokio::test]
async fn test_two_joins_others_sum_to_one() {
    let server = TestServer::start().await.unwrap();
    let world = server.world().await.unwrap();
    let mut clients = server.connect_many(2).await.unwrap();

    let first = clients[0]
        .join_and_wait(&world.space_id, &world.admin.token)
        .await
        .unwrap();
    let second = clients[1]
        .join_and_wait(&world.space_id, &world.user.token)
        .await
        .unwrap();

    let first_users = first["payload"]["users"].as_array().unwrap();
    let second_users = second["payload"]["users"].as_array().unwrap();
    assert_eq!(first_users.len() + second_users.len(), 1);
    assert_eq!(second_users[0]["userId"], world.admin.id.as_str());

    let joined = clients[0].expect("user-joined").await.unwrap();
    assert_eq!(joined["payload"]["userId"], world.user.id.as_str());
}

#[tokio::test]
async fn test_spaces_are_independent() {
    let server = TestServer::start().await.unwrap();
    let world = server.world().await.unwrap();

    let resp = server
        .request(
            Method::POST,
            "/space",
            Some(&world.admin.token),
            Some(&json!({ "name": "Other", "dimensions": "10x10" })),
        )
        .await
        .unwrap();
    let other_space: serde_json::Value = resp.json().await.unwrap();
    let other_space = other_space["spaceId"].as_str().unwrap().to_string();

    let mut clients = server.connect_many(2).await.unwrap();
    clients[0]
        .join_and_wait(&world.space_id, &world.user.token)
        .await
        .unwrap();
    let joined = clients[1]
        .join_and_wait(&other_space, &world.admin.token)
        .await
        .unwrap();

    assert!(joined["payload"]["users"].as_array().unwrap().is_empty());
    clients[0].expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_rejoin_switches_rooms() {
    let server = TestServer::start().await.unwrap();
    let world = server.world().await.unwrap();

    let resp = server
        .request(
            Method::POST,
            "/space",
            Some(&world.user.token),
            Some(&json!({ "name": "Lobby", "dimensions": "10x10" })),
        )
        .await
        .unwrap();
    let lobby: serde_json::Value = resp.json().await.unwrap();
    let lobby = lobby["spaceId"].as_str().unwrap().to_string();

    let mut clients = server.connect_many(2).await.unwrap();
    clients[0]
        .join_and_wait(&world.space_id, &world.admin.token)
        .await
        .unwrap();
    clients[1]
        .join_and_wait(&world.space_id, &world.user.token)
        .await
        .unwrap();
    clients[0].expect("user-joined").await.unwrap();

    // Second client hops to the lobby; the first sees it leave
    let joined = clients[1].join_and_wait(&lobby, &world.user.token).await.unwrap();
    assert!(joined["payload"]["users"].as_array().unwrap().is_empty());

    let left = clients[0].expect("user-left").await.unwrap();
    assert_eq!(left["payload"]["userId"], world.user.id.as_str());
}
