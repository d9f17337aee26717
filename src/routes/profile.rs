//! Anonymous guest profiles, identified only by a chosen username.
//!
//! These endpoints are deliberately unauthenticated: the anonymity is the
//! product feature, not an oversight. A guest authenticates follow-up
//! requests with either the returned bearer token or the raw
//! [x-guest-id](crate::auth::GUEST_ID_HEADER) header.

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::{
    auth::issue_token,
    db::{self, Insert, SelectBy},
    models::{NewUser, User, UserProfile},
    routes::auth::AuthResponse,
    AppState, Error,
};

/// The data for creating a guest profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileData {
    /// The guest's chosen username.
    pub username: String,
}

/// Build a synthetic, unique email for a guest profile so the unique email
/// constraint holds for anonymous accounts too.
fn guest_email(username: &str) -> EmailAddress {
    let local_part: String = username
        .chars()
        .filter(|character| character.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    let local_part = if local_part.is_empty() {
        "guest".to_string()
    } else {
        local_part
    };

    let raw = format!("{}_{}@guest.local", local_part, Utc::now().timestamp_millis());

    // The local part is sanitized to alphanumerics, so this always parses.
    EmailAddress::from_str(&raw).expect("synthetic guest emails are always valid")
}

/// A route handler for creating an anonymous guest profile.
///
/// If a profile with the given username already exists it is returned
/// instead of creating a new one; either way the response carries a bearer
/// token for the profile.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn create_profile(
    State(state): State<AppState>,
    Json(data): Json<ProfileData>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    let username = data.username.trim();

    if username.is_empty() {
        return Err(Error::InvalidInput("Username is required".to_string()));
    }

    let connection = state.db_connection().lock().unwrap();

    let (status, user) = match User::select(username, &connection) {
        Ok(existing) => (StatusCode::OK, existing),
        Err(Error::NotFound) => {
            let created = NewUser {
                name: username.to_owned(),
                email: guest_email(username),
                password_hash: None,
                fayda_id: None,
            }
            .insert(&connection)?;

            (StatusCode::CREATED, created)
        }
        Err(error) => return Err(error),
    };

    let issued = issue_token(user.id(), state.encoding_key())?;
    db::insert_session(&connection, &issued.session_id, user.id(), issued.expires_at)?;

    Ok((
        status,
        Json(AuthResponse {
            user: UserProfile::from(&user),
            token: issued.token,
        }),
    ))
}

/// A route handler for looking up a guest profile by username.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>, Error> {
    let connection = state.db_connection().lock().unwrap();

    let user = User::select(username.as_str(), &connection)?;

    Ok(Json(UserProfile::from(&user)))
}

#[cfg(test)]
mod profile_tests {
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use serde_json::json;

    use crate::{
        auth::GUEST_ID_HEADER,
        routes::{auth::AuthResponse, endpoints},
        test_utils::test_server,
    };

    #[tokio::test]
    async fn create_profile_returns_existing_profile_on_repeat() {
        let (server, _) = test_server();

        let first = server
            .post(endpoints::PROFILES)
            .content_type("application/json")
            .json(&json!({ "username": "wanderer" }))
            .await;
        first.assert_status(StatusCode::CREATED);
        let first = first.json::<AuthResponse>();

        let second = server
            .post(endpoints::PROFILES)
            .content_type("application/json")
            .json(&json!({ "username": "wanderer" }))
            .await;
        second.assert_status_ok();
        let second = second.json::<AuthResponse>();

        assert_eq!(first.user.id, second.user.id);
    }

    #[tokio::test]
    async fn create_profile_requires_a_username() {
        let (server, _) = test_server();

        server
            .post(endpoints::PROFILES)
            .content_type("application/json")
            .json(&json!({ "username": "   " }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_profile_looks_up_by_username() {
        let (server, _) = test_server();

        let created = server
            .post(endpoints::PROFILES)
            .content_type("application/json")
            .json(&json!({ "username": "wanderer" }))
            .await
            .json::<AuthResponse>();

        let response = server.get("/profile/wanderer").await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<serde_json::Value>()["id"],
            created.user.id.as_i64()
        );

        server
            .get("/profile/nobody")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn guest_header_authenticates_protected_routes() {
        let (server, _) = test_server();

        let created = server
            .post(endpoints::PROFILES)
            .content_type("application/json")
            .json(&json!({ "username": "wanderer" }))
            .await
            .json::<AuthResponse>();

        server
            .get(endpoints::TRANSACTIONS)
            .add_header(
                HeaderName::from_static(GUEST_ID_HEADER),
                HeaderValue::from_str(&created.user.id.as_i64().to_string()).unwrap(),
            )
            .await
            .assert_status_ok();

        // An id with no user row behind it is rejected.
        server
            .get(endpoints::TRANSACTIONS)
            .add_header(
                HeaderName::from_static(GUEST_ID_HEADER),
                HeaderValue::from_static("999"),
            )
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
