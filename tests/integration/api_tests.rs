//! API integration tests
//!
//! These run against a live server with a fresh database:
//! `cargo test -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn unique_login(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .subsec_nanos();
    format!("{}_{}", prefix, nanos)
}

/// Register an account and return (token, account id)
async fn register_and_login(client: &Client, prefix: &str) -> (String, i64) {
    let login = unique_login(prefix);

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "login": login,
            "password": "correct-horse-battery",
            "display_name": prefix,
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": login,
            "password": "correct-horse-battery"
        }))
        .send()
        .await
        .expect("Failed to send login request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    let account_id = body["account"]["id"].as_i64().expect("No account id");
    (token, account_id)
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
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (_token, _id) = register_and_login(&client, "badpw").await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": unique_login("nosuch"),
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_login_rate_limited_after_five_attempts() {
    let client = Client::new();
    let login = unique_login("throttle");

    // 5 failed attempts fill the window, the 6th is throttled
    for _ in 0..5 {
        let response = client
            .post(format!("{}/auth/login", BASE_URL))
            .json(&json!({ "login": login, "password": "wrong" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 401);
    }

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "login": login, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 429);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["retry_after_seconds"].as_i64().unwrap_or(0) > 0);
}

/// The whole lifecycle: request, approve, waiver, pickup, return, rating
#[tokio::test]
#[ignore]
async fn test_borrow_lifecycle_end_to_end() {
    let client = Client::new();
    let (lender_token, _lender_id) = register_and_login(&client, "lender").await;
    let (borrower_token, borrower_id) = register_and_login(&client, "borrower").await;

    // Lender lists a tool
    let response = client
        .post(format!("{}/tools", BASE_URL))
        .header("Authorization", format!("Bearer {}", lender_token))
        .json(&json!({
            "name": "Cordless drill",
            "category": "power",
            "rental_fee": "2.50",
            "deposit": "20.00"
        }))
        .send()
        .await
        .expect("Failed to create tool");
    assert_eq!(response.status(), 201);
    let tool: Value = response.json().await.unwrap();
    let tool_id = tool["id"].as_i64().unwrap();

    // Borrower requests it
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({ "tool_id": tool_id, "message": "Weekend project" }))
        .send()
        .await
        .expect("Failed to request borrow");
    assert_eq!(response.status(), 201);
    let borrow: Value = response.json().await.unwrap();
    let borrow_id = borrow["id"].as_i64().unwrap();
    assert_eq!(borrow["status"], "requested");

    // A second request for the same tool conflicts
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({ "tool_id": tool_id }))
        .send()
        .await
        .expect("Failed to send duplicate request");
    assert_eq!(response.status(), 409);

    // Lender approves and receives the pickup code
    let response = client
        .post(format!("{}/borrows/{}/approve", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", lender_token))
        .send()
        .await
        .expect("Failed to approve");
    assert!(response.status().is_success());
    let approval: Value = response.json().await.unwrap();
    let pickup_code = approval["pickup_code"].as_str().unwrap().to_string();
    assert_eq!(approval["borrow"]["status"], "approved");

    // Pickup verification without a waiver is refused
    let response = client
        .post(format!("{}/borrows/{}/handover/pickup/verify", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({ "code": pickup_code }))
        .send()
        .await
        .expect("Failed to verify pickup");
    assert_eq!(response.status(), 422);

    // Borrower signs the waiver
    let response = client
        .post(format!("{}/borrows/{}/waiver", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({
            "acknowledgment": "I accept liability for the tool while borrowed",
            "condition_ack": true
        }))
        .send()
        .await
        .expect("Failed to sign waiver");
    assert_eq!(response.status(), 201);

    // A wrong code fails without consuming the real one
    let response = client
        .post(format!("{}/borrows/{}/handover/pickup/verify", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({ "code": "WRONGCOD" }))
        .send()
        .await
        .expect("Failed to send wrong code");
    assert_eq!(response.status(), 400);

    // Borrower verifies pickup with the correct code
    let response = client
        .post(format!("{}/borrows/{}/handover/pickup/verify", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({ "code": pickup_code }))
        .send()
        .await
        .expect("Failed to verify pickup");
    assert!(response.status().is_success());
    let verified: Value = response.json().await.unwrap();
    assert_eq!(verified["borrow"]["status"], "active");

    // Cancel is rejected once active
    let response = client
        .post(format!("{}/borrows/{}/cancel", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .send()
        .await
        .expect("Failed to send cancel");
    assert_eq!(response.status(), 409);

    // Borrower regenerates the return code for the exchange
    let response = client
        .post(format!("{}/borrows/{}/handover/return/code", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .send()
        .await
        .expect("Failed to generate return code");
    assert_eq!(response.status(), 201);
    let issued: Value = response.json().await.unwrap();
    let return_code = issued["code"].as_str().unwrap().to_string();

    // Lender verifies the return
    let response = client
        .post(format!("{}/borrows/{}/handover/return/verify", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", lender_token))
        .json(&json!({ "code": return_code, "condition_notes": "Returned clean" }))
        .send()
        .await
        .expect("Failed to verify return");
    assert!(response.status().is_success());
    let verified: Value = response.json().await.unwrap();
    assert_eq!(verified["borrow"]["status"], "returned");

    // Approving a returned borrow is a state conflict
    let response = client
        .post(format!("{}/borrows/{}/approve", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", lender_token))
        .send()
        .await
        .expect("Failed to send approve");
    assert_eq!(response.status(), 409);

    // Both parties rate each other
    let response = client
        .post(format!("{}/borrows/{}/rating", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({ "score": 5, "comment": "Great tool" }))
        .send()
        .await
        .expect("Failed to rate");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/borrows/{}/rating", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", lender_token))
        .json(&json!({ "score": 4 }))
        .send()
        .await
        .expect("Failed to rate");
    assert_eq!(response.status(), 201);

    // A second rating from the same party conflicts
    let response = client
        .post(format!("{}/borrows/{}/rating", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", lender_token))
        .json(&json!({ "score": 1 }))
        .send()
        .await
        .expect("Failed to send duplicate rating");
    assert_eq!(response.status(), 409);

    // The borrower's summary shows the lender's score
    let response = client
        .get(format!("{}/accounts/{}/ratings", BASE_URL, borrower_id))
        .header("Authorization", format!("Bearer {}", lender_token))
        .send()
        .await
        .expect("Failed to fetch ratings");
    assert!(response.status().is_success());
    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["nb_ratings"].as_i64().unwrap(), 1);
}

#[tokio::test]
#[ignore]
async fn test_cannot_borrow_own_tool() {
    let client = Client::new();
    let (token, _id) = register_and_login(&client, "selfborrow").await;

    let response = client
        .post(format!("{}/tools", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": "Ladder" }))
        .send()
        .await
        .expect("Failed to create tool");
    assert_eq!(response.status(), 201);
    let tool: Value = response.json().await.unwrap();

    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "tool_id": tool["id"].as_i64().unwrap() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_deny_then_tool_is_free_again() {
    let client = Client::new();
    let (lender_token, _) = register_and_login(&client, "denier").await;
    let (borrower_token, _) = register_and_login(&client, "denied").await;

    let response = client
        .post(format!("{}/tools", BASE_URL))
        .header("Authorization", format!("Bearer {}", lender_token))
        .json(&json!({ "name": "Tile cutter" }))
        .send()
        .await
        .expect("Failed to create tool");
    let tool: Value = response.json().await.unwrap();
    let tool_id = tool["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({ "tool_id": tool_id }))
        .send()
        .await
        .expect("Failed to request");
    let borrow: Value = response.json().await.unwrap();
    let borrow_id = borrow["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/borrows/{}/deny", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", lender_token))
        .send()
        .await
        .expect("Failed to deny");
    assert!(response.status().is_success());

    // Denial is terminal, the tool accepts a fresh request
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({ "tool_id": tool_id }))
        .send()
        .await
        .expect("Failed to re-request");
    assert_eq!(response.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_only_counterparty_verifies_handover() {
    let client = Client::new();
    let (lender_token, _) = register_and_login(&client, "wrongrole_l").await;
    let (borrower_token, _) = register_and_login(&client, "wrongrole_b").await;

    let response = client
        .post(format!("{}/tools", BASE_URL))
        .header("Authorization", format!("Bearer {}", lender_token))
        .json(&json!({ "name": "Angle grinder" }))
        .send()
        .await
        .expect("Failed to create tool");
    let tool: Value = response.json().await.unwrap();

    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({ "tool_id": tool["id"].as_i64().unwrap() }))
        .send()
        .await
        .expect("Failed to request");
    let borrow: Value = response.json().await.unwrap();
    let borrow_id = borrow["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/borrows/{}/approve", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", lender_token))
        .send()
        .await
        .expect("Failed to approve");
    let approval: Value = response.json().await.unwrap();
    let pickup_code = approval["pickup_code"].as_str().unwrap();

    // The lender generated the code, so the lender cannot verify it
    let response = client
        .post(format!("{}/borrows/{}/handover/pickup/verify", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", lender_token))
        .json(&json!({ "code": pickup_code }))
        .send()
        .await
        .expect("Failed to send verify");
    assert_eq!(response.status(), 403);
}
