//! E2E tests for the page endpoints

mod common;

use common::TestServer;

#[tokio::test]
async fn test_public_timeline_lists_cheeps_newest_first() {
    let server = TestServer::new().await;

    server.register_user("alice", "alice@example.com").await;
    server.post_message("alice", "first").await;
    server.post_message("alice", "second").await;

    let response = server
        .client
        .get(&server.url("/public"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["page"], 1);
    let cheeps = body["cheeps"].as_array().unwrap();
    assert_eq!(cheeps.len(), 2);
    assert_eq!(cheeps[0]["text"], "second");
    assert_eq!(cheeps[1]["text"], "first");
    assert_eq!(cheeps[0]["author"]["name"], "alice");
}

#[tokio::test]
async fn test_public_timeline_search_is_case_sensitive() {
    let server = TestServer::new().await;

    server.register_user("alice", "alice@example.com").await;
    server.post_message("alice", "Rust all the way").await;
    server.post_message("alice", "rust all the way").await;

    let response = server
        .client
        .get(&server.url("/public?search=Rust"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let cheeps = body["cheeps"].as_array().unwrap();
    assert_eq!(cheeps.len(), 1);
    assert_eq!(cheeps[0]["text"], "Rust all the way");
}

#[tokio::test]
async fn test_user_timeline_unknown_user_is_404() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/user/ghost"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_own_timeline_includes_followed_authors() {
    let server = TestServer::new().await;

    server.register_user("alice", "alice@example.com").await;
    server.register_user("bob", "bob@example.com").await;
    server.post_message("alice", "from alice").await;
    server.post_message("bob", "from bob").await;

    let response = server
        .client
        .post(server.url("/follow"))
        .json(&serde_json::json!({ "username": "alice", "target": "bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // Alice looking at her own profile sees bob's cheeps too
    let response = server
        .client
        .get(&server.url("/user/alice?viewer=alice"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let texts: Vec<&str> = body["cheeps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap())
        .collect();
    assert!(texts.contains(&"from alice"));
    assert!(texts.contains(&"from bob"));

    // Bob looking at alice's profile sees only alice's cheeps
    let response = server
        .client
        .get(&server.url("/user/alice?viewer=bob"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let texts: Vec<&str> = body["cheeps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["from alice"]);
}

#[tokio::test]
async fn test_following_page_lists_followed_names() {
    let server = TestServer::new().await;

    server.register_user("alice", "alice@example.com").await;
    server.register_user("bob", "bob@example.com").await;

    server
        .client
        .post(server.url("/follow"))
        .json(&serde_json::json!({ "username": "alice", "target": "bob" }))
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .get(&server.url("/user/alice/following"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["following"], serde_json::json!(["bob"]));

    // Unfollow removes the entry
    server
        .client
        .post(server.url("/unfollow"))
        .json(&serde_json::json!({ "username": "alice", "target": "bob" }))
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .get(&server.url("/user/alice/following"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["following"], serde_json::json!([]));
}

#[tokio::test]
async fn test_self_follow_is_rejected() {
    let server = TestServer::new().await;

    server.register_user("alice", "alice@example.com").await;

    let response = server
        .client
        .post(server.url("/follow"))
        .json(&serde_json::json!({ "username": "alice", "target": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error_msg"], "You cannot follow yourself");
}

#[tokio::test]
async fn test_post_cheep_via_page_endpoint() {
    let server = TestServer::new().await;

    server.register_user("alice", "alice@example.com").await;

    let response = server
        .client
        .post(server.url("/cheep"))
        .json(&serde_json::json!({ "username": "alice", "text": "posted via page" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = server
        .client
        .get(&server.url("/public"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["cheeps"][0]["text"], "posted via page");
}

#[tokio::test]
async fn test_save_unsave_and_saved_state() {
    let server = TestServer::new().await;

    server.register_user("alice", "alice@example.com").await;
    server.register_user("bob", "bob@example.com").await;
    server.post_message("bob", "bookmark me").await;

    let response = server
        .client
        .get(&server.url("/public"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let cheep_id = body["cheeps"][0]["cheep_id"].as_i64().unwrap();

    let response = server
        .client
        .post(server.url("/save"))
        .json(&serde_json::json!({ "username": "alice", "cheep_id": cheep_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = server
        .client
        .get(&server.url(&format!(
            "/saved-state?username=alice&cheep_id={}",
            cheep_id
        )))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["saved"], true);

    let response = server
        .client
        .get(&server.url("/user/alice/saved"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["cheeps"][0]["text"], "bookmark me");

    let response = server
        .client
        .post(server.url("/unsave"))
        .json(&serde_json::json!({ "username": "alice", "cheep_id": cheep_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = server
        .client
        .get(&server.url(&format!(
            "/saved-state?username=alice&cheep_id={}",
            cheep_id
        )))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["saved"], false);
}

#[tokio::test]
async fn test_save_unknown_cheep_is_400() {
    let server = TestServer::new().await;

    server.register_user("alice", "alice@example.com").await;

    let response = server
        .client
        .post(server.url("/save"))
        .json(&serde_json::json!({ "username": "alice", "cheep_id": 4242 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_delete_user_removes_everything() {
    let server = TestServer::new().await;

    server.register_user("alice", "alice@example.com").await;
    server.register_user("bob", "bob@example.com").await;
    server.post_message("alice", "soon gone").await;
    server.post_message("bob", "still here").await;

    // Bob follows alice and bookmarks her cheep
    server
        .client
        .post(server.url("/follow"))
        .json(&serde_json::json!({ "username": "bob", "target": "alice" }))
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .get(&server.url("/public"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let alice_cheep_id = body["cheeps"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["author"]["name"] == "alice")
        .unwrap()["cheep_id"]
        .as_i64()
        .unwrap();
    server
        .client
        .post(server.url("/save"))
        .json(&serde_json::json!({ "username": "bob", "cheep_id": alice_cheep_id }))
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .delete(server.url("/user/alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // Profile is gone
    let response = server
        .client
        .get(&server.url("/user/alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Her cheeps are gone from the public timeline, bob's remain
    let response = server
        .client
        .get(&server.url("/public"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let cheeps = body["cheeps"].as_array().unwrap();
    assert_eq!(cheeps.len(), 1);
    assert_eq!(cheeps[0]["author"]["name"], "bob");

    // Bob's bookmark of her cheep is gone too
    let response = server
        .client
        .get(&server.url("/user/bob/saved"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["cheeps"].as_array().unwrap().is_empty());

    // The username can be registered again
    server.register_user("alice", "alice2@example.com").await;
}

#[tokio::test]
async fn test_pagination_second_page() {
    let server = TestServer::new().await;

    server.register_user("alice", "alice@example.com").await;
    for i in 0..35 {
        server.post_message("alice", &format!("cheep {}", i)).await;
    }

    let response = server
        .client
        .get(&server.url("/public?pageIndex=1"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["cheeps"].as_array().unwrap().len(), 32);

    let response = server
        .client
        .get(&server.url("/public?pageIndex=2"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["page"], 2);
    assert_eq!(body["cheeps"].as_array().unwrap().len(), 3);
}
