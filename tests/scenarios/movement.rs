//! Movement scenario tests
//!
//! Servers here spawn the first arrival at (20,20) in the 100x200 world
//! space; the second arrival falls back to (0,0).

use crate::harness::{TestClient, TestServer, TestWorld};

/// Join A then B and consume the join traffic
async fn two_in_room(server: &TestServer, world: &TestWorld) -> (TestClient, TestClient) {
    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();

    let joined = a.join_and_wait(&world.space_id, &world.user.token).await.unwrap();
    assert_eq!(joined["payload"]["spawn"]["x"], 20);
    assert_eq!(joined["payload"]["spawn"]["y"], 20);

    let joined = b.join_and_wait(&world.space_id, &world.admin.token).await.unwrap();
    assert_eq!(joined["payload"]["spawn"]["x"], 0);
    assert_eq!(joined["payload"]["spawn"]["y"], 0);
    a.expect("user-joined").await.unwrap();

    (a, b)
}

#[tokio::test]
async fn test_two_cell_move_rejected() {
    let server = TestServer::start_fixed_spawn().await.unwrap();
    let world = server.world().await.unwrap();
    let (mut a, mut b) = two_in_room(&server, &world).await;

    a.move_to(22, 20).await.unwrap();
    let rejected = a.expect("movement-rejected").await.unwrap();
    assert_eq!(rejected["payload"]["x"], 20);
    assert_eq!(rejected["payload"]["y"], 20);

    // Rejections go to the mover only
    b.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_single_step_broadcast_to_everyone() {
    let server = TestServer::start_fixed_spawn().await.unwrap();
    let world = server.world().await.unwrap();
    let (mut a, mut b) = two_in_room(&server, &world).await;

    a.move_to(22, 20).await.unwrap();
    a.expect("movement-rejected").await.unwrap();

    a.move_to(21, 20).await.unwrap();
    for client in [&mut a, &mut b] {
        let moved = client.expect("movement").await.unwrap();
        assert_eq!(moved["payload"]["x"], 21);
        assert_eq!(moved["payload"]["y"], 20);
        assert_eq!(moved["payload"]["userId"], world.user.id.as_str());
    }

    // The stored position moved: one more step east is legal from (21,20)
    a.move_to(22, 20).await.unwrap();
    let moved = a.expect("movement").await.unwrap();
    assert_eq!(moved["payload"]["x"], 22);
}

#[tokio::test]
async fn test_out_of_bounds_and_diagonal_rejected() {
    let server = TestServer::start_fixed_spawn().await.unwrap();
    let world = server.world().await.unwrap();
    let (mut a, mut b) = two_in_room(&server, &world).await;

    b.move_to(-1, 0).await.unwrap();
    let rejected = b.expect("movement-rejected").await.unwrap();
    assert_eq!(rejected["payload"]["x"], 0);
    assert_eq!(rejected["payload"]["y"], 0);

    b.move_to(1, 1).await.unwrap();
    b.expect("movement-rejected").await.unwrap();

    // Staying put is not a step either
    b.move_to(0, 0).await.unwrap();
    b.expect("movement-rejected").await.unwrap();

    a.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_movement_before_join_is_dropped() {
    let server = TestServer::start_fixed_spawn().await.unwrap();
    let world = server.world().await.unwrap();

    let mut client = server.connect().await.unwrap();
    client.move_to(1, 0).await.unwrap();
    client.expect_silence().await.unwrap();

    // The connection is still usable
    let joined = client
        .join_and_wait(&world.space_id, &world.user.token)
        .await
        .unwrap();
    assert_eq!(joined["payload"]["spawn"]["x"], 20);
}

#[tokio::test]
async fn test_diagonal_step_rule() {
    let server = TestServer::start_with_config(
        r#"
        [session]
        step_rule = "diagonal"
        spawn = { kind = "fixed", x = 20, y = 20 }
        "#,
    )
    .await
    .unwrap();
    let world = server.world().await.unwrap();

    let mut a = server.connect().await.unwrap();
    a.join_and_wait(&world.space_id, &world.user.token).await.unwrap();

    a.move_to(21, 21).await.unwrap();
    let moved = a.expect("movement").await.unwrap();
    assert_eq!(moved["payload"]["x"], 21);
    assert_eq!(moved["payload"]["y"], 21);

    a.move_to(23, 21).await.unwrap();
    a.expect("movement-rejected").await.unwrap();
}

#[tokio::test]
async fn test_static_elements_block_when_enabled() {
    let server = TestServer::start_with_config(
        r#"
        [session]
        block_static_elements = true
        spawn = { kind = "fixed", x = 19, y = 20 }
        "#,
    )
    .await
    .unwrap();
    let world = server.world().await.unwrap();

    let mut a = server.connect().await.unwrap();
    a.join_and_wait(&world.space_id, &world.user.token).await.unwrap();

    // Static elements sit at (20,20) and (18,20)
    for (x, y) in [(20, 20), (18, 20)] {
        a.move_to(x, y).await.unwrap();
        let rejected = a.expect("movement-rejected").await.unwrap();
        assert_eq!(rejected["payload"]["x"], 19);
    }

    a.move_to(19, 21).await.unwrap();
    a.expect("movement").await.unwrap();
}
