//! API integration tests against a running server with a migrated database

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Seeded librarian: password is the date of birth (15/05/1985)
const LIBRARIAN_ID: &str = "TT001";
const LIBRARIAN_PASSWORD: &str = "15051985";

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn librarian_token(client: &Client) -> String {
    login(client, LIBRARIAN_ID, LIBRARIAN_PASSWORD).await
}

async fn create_reader(client: &Client, token: &str, birth_date: &str) -> Value {
    let response = client
        .post(format!("{}/readers", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "name": "Integration Reader",
            "phone": "0900000000",
            "date_of_birth": birth_date,
            "gender": "female"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

async fn create_book(client: &Client, token: &str, quantity: i32) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "name": "Integration Test Book",
            "category": "Integration Tests",
            "author": "Test Author",
            "publisher": "Test Publisher",
            "publish_year": 2020,
            "quantity": quantity
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

async fn borrow(client: &Client, token: &str, book_id: &str, reader_id: &str) -> reqwest::Response {
    client
        .post(format!("{}/lending/records", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "book_id": book_id, "reader_id": reader_id }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored --test-threads=1
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
async fn test_login_with_birth_date() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": LIBRARIAN_ID, "password": LIBRARIAN_PASSWORD }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "librarian");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": LIBRARIAN_ID, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let token = librarian_token(&client).await;

    let response = client
        .get(format!("{}/books?per_page=5&sort=name&order=desc", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert_eq!(body["per_page"], 5);
}

#[tokio::test]
#[ignore]
async fn test_invalid_book_rejected() {
    let client = Client::new();
    let token = librarian_token(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "name": "",
            "category": "Fiction",
            "author": "A",
            "publisher": "P",
            "publish_year": 99,
            "quantity": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_lending_flow() {
    let client = Client::new();
    let token = librarian_token(&client).await;

    let reader = create_reader(&client, &token, "2001-01-02").await;
    let reader_id = reader["id"].as_str().unwrap().to_string();
    assert!(reader_id.starts_with("BD"));

    let book = create_book(&client, &token, 1).await;
    let book_id = book["id"].as_str().unwrap().to_string();
    assert_eq!(book["available"], 1);

    // Borrow the only copy
    let response = borrow(&client, &token, &book_id, &reader_id).await;
    assert_eq!(response.status(), 201);
    let record: Value = response.json().await.unwrap();
    assert_eq!(record["status"], "active");
    assert_eq!(record["librarian_id"], LIBRARIAN_ID);
    let record_id = record["id"].as_i64().unwrap();

    // No copy left
    let response = borrow(&client, &token, &book_id, &reader_id).await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "NotAvailable");

    // Book with a copy on loan cannot be deleted
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // The reader got a borrow notification
    let reader_token = login(&client, &reader_id, "02012001").await;
    let response = client
        .get(format!("{}/notifications?user_id={}", BASE_URL, reader_id))
        .bearer_auth(&reader_token)
        .send()
        .await
        .unwrap();
    let notifications: Value = response.json().await.unwrap();
    assert_eq!(notifications[0]["type"], "new_borrow");

    // Readers only see their own records
    let response = client
        .get(format!("{}/lending/records", BASE_URL))
        .bearer_auth(&reader_token)
        .send()
        .await
        .unwrap();
    let records: Value = response.json().await.unwrap();
    assert!(records
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["reader_id"] == reader_id.as_str()));

    // Return, then return again
    let response = client
        .put(format!("{}/lending/records/{}", BASE_URL, record_id))
        .bearer_auth(&token)
        .json(&json!({ "action": "return" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let returned: Value = response.json().await.unwrap();
    assert_eq!(returned["status"], "returned");

    let response = client
        .put(format!("{}/lending/records/{}/return", BASE_URL, record_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // Cleanup: both deletions are allowed once everything is back
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .delete(format!("{}/readers/{}", BASE_URL, reader_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_borrow_limit() {
    let client = Client::new();
    let token = librarian_token(&client).await;

    let reader = create_reader(&client, &token, "1999-12-31").await;
    let reader_id = reader["id"].as_str().unwrap().to_string();
    let book = create_book(&client, &token, 10).await;
    let book_id = book["id"].as_str().unwrap().to_string();

    let mut record_ids = Vec::new();
    for _ in 0..3 {
        let response = borrow(&client, &token, &book_id, &reader_id).await;
        assert_eq!(response.status(), 201);
        let record: Value = response.json().await.unwrap();
        record_ids.push(record["id"].as_i64().unwrap());
    }

    let response = borrow(&client, &token, &book_id, &reader_id).await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "BorrowLimitReached");

    // Reader with active borrowings cannot be deleted
    let response = client
        .delete(format!("{}/readers/{}", BASE_URL, reader_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    for id in record_ids {
        client
            .put(format!("{}/lending/records/{}/return", BASE_URL, id))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
    }
    client
        .delete(format!("{}/readers/{}", BASE_URL, reader_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
}

#[tokio::test]
#[ignore]
async fn test_notification_deduplication() {
    let client = Client::new();
    let token = librarian_token(&client).await;

    let reader = create_reader(&client, &token, "1995-06-15").await;
    let reader_id = reader["id"].as_str().unwrap().to_string();

    let payload = json!({
        "user_id": reader_id,
        "message": "Library closes early on Friday",
        "type": "announcement"
    });

    let first = client
        .post(format!("{}/notifications", BASE_URL))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 201);
    let first: Value = first.json().await.unwrap();
    // Unknown types are stored as general
    assert_eq!(first["type"], "general");

    let second = client
        .post(format!("{}/notifications", BASE_URL))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 200);
    let second: Value = second.json().await.unwrap();
    assert_eq!(first["id"], second["id"]);

    let response = client
        .put(format!("{}/notifications/mark-read", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "user_id": reader_id, "mark_all": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/notifications/unread-count?user_id={}", BASE_URL, reader_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["unread_count"], 0);

    client
        .delete(format!("{}/readers/{}", BASE_URL, reader_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
}

#[tokio::test]
#[ignore]
async fn test_quantity_cannot_drop_below_borrowed() {
    let client = Client::new();
    let token = librarian_token(&client).await;

    let reader = create_reader(&client, &token, "1990-04-20").await;
    let reader_id = reader["id"].as_str().unwrap().to_string();
    let book = create_book(&client, &token, 2).await;
    let book_id = book["id"].as_str().unwrap().to_string();

    let mut record_ids = Vec::new();
    for _ in 0..2 {
        let response = borrow(&client, &token, &book_id, &reader_id).await;
        assert_eq!(response.status(), 201);
        let record: Value = response.json().await.unwrap();
        record_ids.push(record["id"].as_i64().unwrap());
    }

    let update = |quantity: i32| {
        json!({
            "name": "Integration Test Book",
            "category": "Integration Tests",
            "author": "Test Author",
            "publisher": "Test Publisher",
            "publish_year": 2020,
            "quantity": quantity,
            "origin": "Donation"
        })
    };

    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .json(&update(1))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    // Matching the copies on loan is allowed
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .json(&update(2))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["available"], 0);
    assert_eq!(updated["origin"], "Donation");

    for id in record_ids {
        client
            .put(format!("{}/lending/records/{}/return", BASE_URL, id))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
    }
    client
        .delete(format!("{}/readers/{}", BASE_URL, reader_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
}

async fn overdue_scan(client: &Client, token: &str) -> i64 {
    let response = client
        .post(format!("{}/notifications/overdue-scan", BASE_URL))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["created"].as_i64().expect("No created count in response")
}

#[tokio::test]
#[ignore]
async fn test_overdue_scan_notifies_once() {
    let client = Client::new();
    let token = librarian_token(&client).await;

    let first = overdue_scan(&client, &token).await;
    assert!(first >= 0);

    // Every overdue record now has an unread overdue notification
    assert_eq!(overdue_scan(&client, &token).await, 0);
}

fn id_number(reader: &Value) -> u64 {
    reader["id"]
        .as_str()
        .and_then(|id| id.strip_prefix("BD"))
        .and_then(|n| n.parse().ok())
        .expect("Reader ID should be BD followed by digits")
}

#[tokio::test]
#[ignore]
async fn test_reader_ids_are_sequential() {
    let client = Client::new();
    let token = librarian_token(&client).await;

    let mut readers = Vec::new();
    for _ in 0..3 {
        readers.push(create_reader(&client, &token, "1988-08-08").await);
    }

    let numbers: Vec<u64> = readers.iter().map(id_number).collect();
    assert_eq!(numbers[1], numbers[0] + 1);
    assert_eq!(numbers[2], numbers[1] + 1);

    for reader in &readers {
        client
            .delete(format!("{}/readers/{}", BASE_URL, reader["id"].as_str().unwrap()))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
    }
}

#[tokio::test]
#[ignore]
async fn test_concurrent_reader_creation_gets_distinct_ids() {
    let client = Client::new();
    let token = librarian_token(&client).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            let token = token.clone();
            tokio::spawn(async move { create_reader(&client, &token, "1977-07-07").await })
        })
        .collect();

    let mut readers = Vec::new();
    for handle in handles {
        readers.push(handle.await.expect("Reader creation task panicked"));
    }

    let mut numbers: Vec<u64> = readers.iter().map(id_number).collect();
    numbers.sort_unstable();
    numbers.dedup();
    assert_eq!(numbers.len(), 8);
    // No gaps: the IDs form one consecutive block
    assert_eq!(numbers[7] - numbers[0], 7);

    for reader in &readers {
        client
            .delete(format!("{}/readers/{}", BASE_URL, reader["id"].as_str().unwrap()))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
    }
}
