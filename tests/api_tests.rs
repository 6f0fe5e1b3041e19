//! API integration tests
//!
//! These run against a live server with a seeded database:
//! `cargo test -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Log in as the seeded admin and return an access token
async fn admin_token(client: &Client) -> String {
    login(client, "admin", "Admin@1234").await
}

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["access_token"]
        .as_str()
        .expect("No access token in response")
        .to_string()
}

/// Register a member account and return (username, access token)
async fn register_member(client: &Client, tag: &str) -> (String, String) {
    let username = format!("member_{}", tag);
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "full_name": "Test Member",
            "password": "member-password-1"
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    let token = login(client, &username, "member-password-1").await;
    (username, token)
}

/// Create a book as admin and return its id
async fn create_book(client: &Client, token: &str, isbn: &str, copies: i64) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "isbn": isbn,
            "title": "Integration Testing in Practice",
            "author": "Jane Doe",
            "total_copies": copies,
            "available_copies": copies
        }))
        .send()
        .await
        .expect("Failed to send create book request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse book response");
    body["id"].as_i64().expect("No id in book response")
}

async fn get_book(client: &Client, token: &str, book_id: i64) -> Value {
    client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send get book request")
        .json()
        .await
        .expect("Failed to parse book response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_returns_token_pair() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "Admin@1234"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["token_type"], "bearer");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_request_without_credentials_is_unauthenticated() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_refresh_token_rejected_as_bearer_credential() {
    let client = Client::new();

    let body: Value = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "Admin@1234"
        }))
        .send()
        .await
        .expect("Failed to send login request")
        .json()
        .await
        .expect("Failed to parse login response");

    let refresh_token = body["refresh_token"].as_str().expect("No refresh token");

    // A refresh token must never grant resource access
    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", refresh_token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], "admin");
    assert!(body["password_hash"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_create_books() {
    let client = Client::new();
    let (_, member) = register_member(&client, "no_create").await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({
            "isbn": "978-0000000001",
            "title": "Forbidden",
            "author": "Nobody"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_borrow_last_copy_then_conflict_then_return() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, member_a) = register_member(&client, "borrower_a").await;
    let (_, member_b) = register_member(&client, "borrower_b").await;

    let book_id = create_book(&client, &admin, "978-1111111111", 1).await;

    // Member A takes the only copy
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", member_a))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);

    let borrow: Value = response.json().await.expect("Failed to parse borrow");
    assert_eq!(borrow["status"], "active");
    assert!(borrow["returned_at"].is_null());

    let book = get_book(&client, &admin, book_id).await;
    assert_eq!(book["available_copies"], 0);

    // Member B finds no copies left
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", member_b))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 409);

    // Member A returns it
    let borrow_id = borrow["id"].as_i64().unwrap();
    let response = client
        .post(format!("{}/borrows/{}/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", member_a))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);

    let returned: Value = response.json().await.expect("Failed to parse return");
    assert_eq!(returned["status"], "returned");
    assert!(returned["returned_at"].is_string());

    let book = get_book(&client, &admin, book_id).await;
    assert_eq!(book["available_copies"], 1);
}

#[tokio::test]
#[ignore]
async fn test_double_return_is_idempotent() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, member) = register_member(&client, "double_return").await;

    let book_id = create_book(&client, &admin, "978-2222222222", 1).await;

    let borrow: Value = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request")
        .json()
        .await
        .expect("Failed to parse borrow");
    let borrow_id = borrow["id"].as_i64().unwrap();

    let first: Value = client
        .post(format!("{}/borrows/{}/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send return request")
        .json()
        .await
        .expect("Failed to parse return");

    let second: Value = client
        .post(format!("{}/borrows/{}/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send return request")
        .json()
        .await
        .expect("Failed to parse return");

    // Same terminal state, no double increment
    assert_eq!(first["status"], "returned");
    assert_eq!(second["status"], "returned");
    assert_eq!(first["returned_at"], second["returned_at"]);

    let book = get_book(&client, &admin, book_id).await;
    assert_eq!(book["available_copies"], 1);
}

#[tokio::test]
#[ignore]
async fn test_member_supplied_user_id_is_ignored() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, member) = register_member(&client, "own_borrow").await;

    let book_id = create_book(&client, &admin, "978-3333333333", 2).await;

    let me: Value = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .send()
        .await
        .expect("Failed to send me request")
        .json()
        .await
        .expect("Failed to parse me response");
    let member_id = me["id"].as_i64().unwrap();

    // A member trying to borrow on someone else's behalf borrows for
    // themselves instead
    let borrow: Value = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", member))
        .json(&json!({ "book_id": book_id, "user_id": 1 }))
        .send()
        .await
        .expect("Failed to send borrow request")
        .json()
        .await
        .expect("Failed to parse borrow");

    assert_eq!(borrow["user_id"].as_i64().unwrap(), member_id);
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_return_anothers_borrow() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, member_a) = register_member(&client, "owner").await;
    let (_, member_b) = register_member(&client, "intruder").await;

    let book_id = create_book(&client, &admin, "978-4444444444", 1).await;

    let borrow: Value = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", member_a))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request")
        .json()
        .await
        .expect("Failed to parse borrow");
    let borrow_id = borrow["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/borrows/{}/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", member_b))
        .send()
        .await
        .expect("Failed to send return request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_api_key_lifecycle() {
    let client = Client::new();
    let admin = admin_token(&client).await;

    // Issue a key; the raw value appears exactly once
    let created: Value = client
        .post(format!("{}/api-keys", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "name": "ci-key" }))
        .send()
        .await
        .expect("Failed to send create key request")
        .json()
        .await
        .expect("Failed to parse key response");

    let raw_key = created["key"].as_str().expect("No raw key in response");
    assert!(raw_key.starts_with("lms_"));
    let key_id = created["api_key"]["id"].as_i64().unwrap();

    // The key authenticates requests on its own
    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("X-API-Key", raw_key)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Listings never include the raw key or its hash
    let keys: Value = client
        .get(format!("{}/api-keys", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send list request")
        .json()
        .await
        .expect("Failed to parse key list");
    let listed = keys
        .as_array()
        .unwrap()
        .iter()
        .find(|k| k["id"].as_i64() == Some(key_id))
        .expect("Created key not listed");
    assert!(listed["key_hash"].is_null());

    // Revoked keys stop authenticating
    let response = client
        .delete(format!("{}/api-keys/{}", BASE_URL, key_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send revoke request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("X-API-Key", raw_key)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_api_key_with_wrong_prefix_is_rejected() {
    let client = Client::new();

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("X-API-Key", "badprefix_0123456789abcdef")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
