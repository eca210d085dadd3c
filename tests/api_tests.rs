//! API integration tests
//!
//! These run against a live server with a seeded database:
//!   cargo run --bin seed && cargo run &
//!   cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Log in and return a Bearer token
async fn get_token(client: &Client, username: &str, password: &str) -> String {
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
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    get_token(client, "admin", "adminpass").await
}

async fn user_token(client: &Client) -> String {
    get_token(client, "user01", "password").await
}

/// Create a book as admin and return its id
async fn create_book(client: &Client, token: &str, title: &str, stock: i32) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": title,
            "isbn": "978-0-00-000000-0",
            "author": "Tester",
            "stock_count": stock
        }))
        .send()
        .await
        .expect("Failed to create book");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book ID")
}

async fn borrow(client: &Client, token: &str, book_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send borrow request")
}

async fn return_loan(client: &Client, token: &str, loan_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request")
}

async fn get_stock(client: &Client, book_id: i64) -> i64 {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to fetch book");
    let body: Value = response.json().await.expect("Failed to parse book");
    body["stock_count"].as_i64().expect("No stock_count")
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
async fn test_search_with_quote_character() {
    let client = Client::new();

    // Quote and wildcard characters are literal data, never SQL syntax
    for query in ["O'Reilly", "100%", "under_score"] {
        let response = client
            .get(format!("{}/books", BASE_URL))
            .query(&[("q", query)])
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success(), "query {:?} failed", query);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert!(body.is_array());
    }
}

#[tokio::test]
#[ignore]
async fn test_create_book_requires_admin() {
    let client = Client::new();
    let token = user_token(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Not Allowed",
            "isbn": "978-0-00-000001-7"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_create_book_validates_required_fields() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "",
            "isbn": "978-0-00-000002-4"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_round_trip() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let user = user_token(&client).await;

    let book_id = create_book(&client, &admin, "Round Trip", 2).await;
    assert_eq!(get_stock(&client, book_id).await, 2);

    let response = borrow(&client, &user, book_id).await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["loan_id"].as_i64().expect("No loan ID");
    assert!(body["return_deadline"].is_string());

    // Stock reflects the active loan
    assert_eq!(get_stock(&client, book_id).await, 1);

    let response = return_loan(&client, &user, loan_id).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "returned");

    assert_eq!(get_stock(&client, book_id).await, 2);
}

#[tokio::test]
#[ignore]
async fn test_borrow_last_copy_then_out_of_stock() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let user = user_token(&client).await;

    let book_id = create_book(&client, &admin, "Single Copy", 1).await;

    let response = borrow(&client, &user, book_id).await;
    assert_eq!(response.status(), 201);

    let response = borrow(&client, &user, book_id).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_loan_limit_is_inclusive() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let token = get_token(&client, "user02", "password").await;

    // Borrow up to the limit of 5, then the 6th must fail
    let mut loans = Vec::new();
    for i in 0..5 {
        let book_id = create_book(&client, &admin, &format!("Limit {}", i), 1).await;
        let response = borrow(&client, &token, book_id).await;
        assert_eq!(response.status(), 201, "borrow {} should succeed", i + 1);
        let body: Value = response.json().await.unwrap();
        loans.push(body["loan_id"].as_i64().unwrap());
    }

    let book_id = create_book(&client, &admin, "One Too Many", 1).await;
    let response = borrow(&client, &token, book_id).await;
    assert_eq!(response.status(), 422);

    // Cleanup: return everything
    for loan_id in loans {
        let response = return_loan(&client, &token, loan_id).await;
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
#[ignore]
async fn test_return_succeeds_when_stock_is_zero() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let user = user_token(&client).await;

    let book_id = create_book(&client, &admin, "Stock Correction", 1).await;

    let response = borrow(&client, &user, book_id).await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan_id"].as_i64().unwrap();

    // Admin corrects stock down to zero while the loan is active
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "stock_count": 0 }))
        .send()
        .await
        .expect("Failed to update book");
    assert_eq!(response.status(), 200);

    // Returning must still succeed and raise stock to 1
    let response = return_loan(&client, &user, loan_id).await;
    assert_eq!(response.status(), 200);
    assert_eq!(get_stock(&client, book_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_return_twice_is_a_noop() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let user = user_token(&client).await;

    let book_id = create_book(&client, &admin, "Double Return", 1).await;

    let response = borrow(&client, &user, book_id).await;
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan_id"].as_i64().unwrap();

    let response = return_loan(&client, &user, loan_id).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "returned");
    let first_return_date = body["loan"]["return_date"].clone();

    let response = return_loan(&client, &user, loan_id).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "already_returned");
    assert_eq!(body["loan"]["return_date"], first_return_date);

    // Stock unchanged by the second return
    assert_eq!(get_stock(&client, book_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_return_other_users_loan_is_forbidden() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let user = user_token(&client).await;

    let book_id = create_book(&client, &admin, "Wrong Owner", 1).await;

    let response = borrow(&client, &user, book_id).await;
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan_id"].as_i64().unwrap();

    // Even the admin cannot return someone else's loan
    let response = return_loan(&client, &admin, loan_id).await;
    assert_eq!(response.status(), 403);

    let response = return_loan(&client, &user, loan_id).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore]
async fn test_delete_blocked_by_active_loan() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let user = user_token(&client).await;

    let book_id = create_book(&client, &admin, "Delete Me Later", 1).await;

    let response = borrow(&client, &user, book_id).await;
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan_id"].as_i64().unwrap();

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), 409);

    let response = return_loan(&client, &user, loan_id).await;
    assert_eq!(response.status(), 200);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), 204);

    // Gone from the catalog
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to fetch book");
    assert_eq!(response.status(), 404);

    // But the returned loan still resolves the book title
    let me: Value = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let user_id = me["id"].as_i64().unwrap();

    let loans: Value = client
        .get(format!("{}/users/{}/loans", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let found = loans
        .as_array()
        .unwrap()
        .iter()
        .any(|l| l["id"].as_i64() == Some(loan_id) && l["book_title"] == "Delete Me Later");
    assert!(found, "loan history lost after logical delete");
}

#[tokio::test]
#[ignore]
async fn test_list_other_users_loans_requires_admin() {
    let client = Client::new();
    let user = user_token(&client).await;

    // user01 is id 2 in the seed; user02 is id 3
    let response = client
        .get(format!("{}/users/3/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let admin = admin_token(&client).await;
    let response = client
        .get(format!("{}/users/3/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_borrow() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books/1/borrow", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
