//! Helper functions for tests.

use std::time::Duration;

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;

use crate::{
    build_router, models::UserProfile, routes::endpoints, state::AdvisorSettings, AppState,
};

/// Create an [AppState] backed by an in-memory database, with no simulated
/// payment latency and no advisor key.
pub fn test_state() -> AppState {
    let db_connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(
        db_connection,
        "42",
        Duration::ZERO,
        AdvisorSettings {
            endpoint: "http://localhost:9/generate".to_string(),
            api_key: None,
        },
    )
    .expect("Could not initialize app state.")
}

/// Create a [TestServer] running the full router over [test_state].
pub fn test_server() -> (TestServer, AppState) {
    let state = test_state();
    let server =
        TestServer::new(build_router(state.clone())).expect("Could not create test server.");

    (server, state)
}

/// Register a user and return their profile and bearer token.
pub async fn register_user(server: &TestServer, name: &str, email: &str) -> (UserProfile, String) {
    let response = server
        .post(endpoints::REGISTER)
        .content_type("application/json")
        .json(&json!({
            "name": name,
            "email": email,
            "password": "hunter2!",
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);

    let body = response.json::<serde_json::Value>();
    let user = serde_json::from_value(body["user"].clone()).expect("Could not parse user profile.");
    let token = body["token"]
        .as_str()
        .expect("The response should carry a token.")
        .to_string();

    (user, token)
}

/// Create a test server with one registered user, returning the server, the
/// user's profile and their bearer token.
pub async fn server_with_user() -> (TestServer, AppState, UserProfile, String) {
    let (server, state) = test_server();
    let (user, token) = register_user(&server, "Test User", "test@test.com").await;

    (server, state, user, token)
}
