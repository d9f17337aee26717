//! Registration, login and the current-user account endpoints.

use std::str::FromStr;

use axum::{extract::State, http::StatusCode, Extension, Json};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    auth::{issue_token, AuthenticatedUser},
    db::{self, Insert, SelectBy},
    models::{NewUser, PasswordHash, User, UserID, UserProfile},
    AppState, Error,
};

/// Registration requires at least this many characters of name.
const MIN_NAME_LENGTH: usize = 2;
/// Registration requires at least this many characters of password.
const MIN_PASSWORD_LENGTH: usize = 6;

/// The data for registering a new user.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterData {
    /// The new user's display name.
    pub name: String,
    /// The new user's email address.
    pub email: String,
    /// The new user's plain-text password.
    pub password: String,
}

/// The data for logging in an existing user.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogInData {
    /// The email entered during sign-in.
    pub email: String,
    /// The password entered during sign-in.
    pub password: String,
}

/// The response to a successful registration, login or guest profile
/// creation: the user's profile and a bearer token for them.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The profile of the authenticated user.
    pub user: UserProfile,
    /// A bearer token authenticating the user.
    pub token: String,
}

fn validate_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(Error::InvalidInput(format!(
            "the name must be at least {MIN_NAME_LENGTH} characters long"
        )));
    }

    Ok(name.to_owned())
}

fn validate_password(password: &str) -> Result<PasswordHash, Error> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::InvalidInput(format!(
            "the password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    PasswordHash::new(password).map_err(|error| Error::HashingError(error.to_string()))
}

fn issue_session(
    connection: &rusqlite::Connection,
    state: &AppState,
    user_id: UserID,
) -> Result<String, Error> {
    let issued = issue_token(user_id, state.encoding_key())?;

    db::insert_session(connection, &issued.session_id, user_id, issued.expires_at)?;

    Ok(issued.token)
}

/// A route handler for registering a new user.
///
/// Responds with 400 for an invalid name, email or password, and 409 when
/// the email is already registered.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn register(
    State(state): State<AppState>,
    Json(data): Json<RegisterData>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    let name = validate_name(&data.name)?;
    let email = EmailAddress::from_str(&data.email).map_err(|_| {
        Error::InvalidInput(format!("{} is not a valid email address", data.email))
    })?;
    let password_hash = validate_password(&data.password)?;

    let connection = state.db_connection().lock().unwrap();

    let user = NewUser {
        name,
        email,
        password_hash: Some(password_hash),
        fayda_id: None,
    }
    .insert(&connection)?;

    let token = issue_session(&connection, &state, user.id())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserProfile::from(&user),
            token,
        }),
    ))
}

/// A route handler for logging in an existing user.
///
/// Responds with 400 for an unknown email or a wrong password; the two are
/// deliberately indistinguishable.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn log_in(
    State(state): State<AppState>,
    Json(data): Json<LogInData>,
) -> Result<Json<AuthResponse>, Error> {
    let email = EmailAddress::from_str(&data.email).map_err(|_| Error::InvalidCredentials)?;

    let connection = state.db_connection().lock().unwrap();

    let user = User::select(&email, &connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidCredentials,
        error => error,
    })?;

    // Guest and external-identity accounts have no password to log in with.
    let password_hash = user.password_hash().ok_or(Error::InvalidCredentials)?;

    let password_is_correct = password_hash
        .verify(&data.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    let token = issue_session(&connection, &state, user.id())?;

    Ok(Json(AuthResponse {
        user: UserProfile::from(&user),
        token,
    }))
}

/// A route handler for fetching the current user's profile.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<UserProfile>, Error> {
    let connection = state.db_connection().lock().unwrap();

    let user = User::select(auth.user_id, &connection)?;

    Ok(Json(UserProfile::from(&user)))
}

/// The data for updating the current user's profile. All fields are
/// optional; absent fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateProfileData {
    /// A new display name.
    #[serde(default)]
    pub name: Option<String>,
    /// A new email address.
    #[serde(default)]
    pub email: Option<String>,
    /// A new plain-text password.
    #[serde(default)]
    pub password: Option<String>,
}

/// A route handler for updating the current user's profile.
///
/// Responds with 400 for invalid fields and 409 when the new email is
/// registered to another account.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(data): Json<UpdateProfileData>,
) -> Result<Json<UserProfile>, Error> {
    let connection = state.db_connection().lock().unwrap();

    let user = User::select(auth.user_id, &connection)?;

    let name = match data.name {
        Some(name) => validate_name(&name)?,
        None => user.name().to_owned(),
    };
    let email = match data.email {
        Some(email) => EmailAddress::from_str(&email)
            .map_err(|_| Error::InvalidInput(format!("{email} is not a valid email address")))?,
        None => user.email().clone(),
    };
    let password_hash = data
        .password
        .as_deref()
        .map(validate_password)
        .transpose()?;

    let updated =
        db::update_user(&connection, auth.user_id, &name, &email, password_hash.as_ref())?;

    Ok(Json(UserProfile::from(&updated)))
}

/// A route handler for deleting the current user's account.
///
/// The user's transactions, notifications and sessions are deleted with
/// them.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<serde_json::Value>, Error> {
    let connection = state.db_connection().lock().unwrap();

    db::delete_user(&connection, auth.user_id)?;

    Ok(Json(json!({ "message": "Account deleted" })))
}

#[cfg(test)]
mod register_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{routes::endpoints, test_utils::test_server};

    #[tokio::test]
    async fn register_returns_profile_and_token() {
        let (server, _) = test_server();

        let response = server
            .post(endpoints::REGISTER)
            .content_type("application/json")
            .json(&json!({
                "name": "Abebe",
                "email": "abebe@example.com",
                "password": "hunter2!",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["user"]["name"], "Abebe");
        assert_eq!(body["user"]["email"], "abebe@example.com");
        assert_eq!(body["user"]["walletBalance"], 0.0);
        assert!(!body["token"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn register_fails_on_duplicate_email() {
        let (server, _) = test_server();

        let payload = json!({
            "name": "Abebe",
            "email": "abebe@example.com",
            "password": "hunter2!",
        });

        server
            .post(endpoints::REGISTER)
            .content_type("application/json")
            .json(&payload)
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post(endpoints::REGISTER)
            .content_type("application/json")
            .json(&payload)
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn register_fails_on_invalid_shape() {
        let (server, _) = test_server();

        let cases = [
            json!({ "name": "A", "email": "abebe@example.com", "password": "hunter2!" }),
            json!({ "name": "Abebe", "email": "not-an-email", "password": "hunter2!" }),
            json!({ "name": "Abebe", "email": "abebe@example.com", "password": "short" }),
        ];

        for payload in cases {
            server
                .post(endpoints::REGISTER)
                .content_type("application/json")
                .json(&payload)
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }
    }
}


#[cfg(test)]
mod me_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        models::UserProfile,
        routes::endpoints,
        test_utils::server_with_user,
    };

    #[tokio::test]
    async fn get_me_returns_current_profile() {
        let (server, _, user, token) = server_with_user().await;

        let response = server
            .get(endpoints::ME)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();

        let profile = response.json::<UserProfile>();
        assert_eq!(profile.id, user.id);
        assert_eq!(profile.name, user.name);
        assert_eq!(profile.email, user.email);
    }

    #[tokio::test]
    async fn update_me_changes_name_and_keeps_login_working() {
        let (server, _, user, token) = server_with_user().await;

        let response = server
            .put(endpoints::ME)
            .authorization_bearer(&token)
            .content_type("application/json")
            .json(&json!({ "name": "Renamed User" }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<UserProfile>().name, "Renamed User");

        // The unchanged password still logs in.
        server
            .post(endpoints::LOG_IN)
            .content_type("application/json")
            .json(&json!({ "email": user.email, "password": "hunter2!" }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn update_me_fails_on_email_collision() {
        let (server, _, _, token) = server_with_user().await;

        crate::test_utils::register_user(&server, "Other User", "other@test.com").await;

        server
            .put(endpoints::ME)
            .authorization_bearer(&token)
            .content_type("application/json")
            .json(&json!({ "email": "other@test.com" }))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn delete_me_invalidates_stale_tokens() {
        let (server, _, _, token) = server_with_user().await;

        server
            .delete(endpoints::ME)
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        // The token is structurally valid but its user is gone.
        server
            .get(endpoints::ME)
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
