//! Authentication: bearer token issuance and the middleware that resolves
//! an inbound request to a user before any protected handler runs.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::SelectBy,
    models::{User, UserID},
    AppState, Error,
};

/// The header carrying a raw user id for anonymous guest profiles.
///
/// This is a deliberately weak trust boundary: the header carries no secret
/// and is accepted for any id that still resolves to a user row. The
/// anonymity is the product feature; see the guest profile endpoints.
pub const GUEST_ID_HEADER: &str = "x-guest-id";

/// How long issued tokens stay valid.
const TOKEN_VALIDITY_HOURS: i64 = 24;

/// The contents of a bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The id of the user the token was issued to.
    pub sub: i64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
    /// A unique id for the token, recorded as the session bookkeeping row.
    pub jti: String,
}

/// A freshly issued bearer token and its bookkeeping data.
#[derive(Debug)]
pub struct IssuedToken {
    /// The encoded token for the `Authorization: Bearer` header.
    pub token: String,
    /// The token's unique id, used as the session row's primary key.
    pub session_id: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

/// Create a signed bearer token for `user_id`.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token cannot be signed.
pub fn issue_token(user_id: UserID, encoding_key: &EncodingKey) -> Result<IssuedToken, Error> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(TOKEN_VALIDITY_HOURS);
    let session_id = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user_id.as_i64(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
        jti: session_id.clone(),
    };

    let token = encode(&Header::default(), &claims, encoding_key).map_err(|error| {
        tracing::error!("could not sign bearer token: {error}");
        Error::TokenCreation
    })?;

    Ok(IssuedToken {
        token,
        session_id,
        expires_at,
    })
}

/// Validate a bearer token's signature and expiry and return its claims.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if the token is malformed, has a bad
/// signature or has expired.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| Error::Unauthorized)
}

/// The identity the auth middleware resolved for a request.
///
/// Route handlers receive this via `Extension(auth): Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The id of the resolved user. The user row existed when the request
    /// was resolved.
    pub user_id: UserID,
    /// Whether the request authenticated through the guest header rather
    /// than a bearer token.
    pub is_guest: bool,
}

fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, Error> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        let claims = decode_token(bearer.token(), state.decoding_key())?;
        let user_id = UserID::new(claims.sub);

        // A structurally valid token is not enough: the user must still
        // exist, otherwise tokens for deleted accounts would keep working
        // until they expire.
        let connection = state.db_connection().lock().unwrap();
        User::select(user_id, &connection).map_err(|_| Error::Unauthorized)?;

        return Ok(AuthenticatedUser {
            user_id,
            is_guest: false,
        });
    }

    if let Some(value) = headers.get(GUEST_ID_HEADER) {
        let raw_id = value
            .to_str()
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .ok_or(Error::Unauthorized)?;
        let user_id = UserID::new(raw_id);

        let connection = state.db_connection().lock().unwrap();
        User::select(user_id, &connection).map_err(|_| Error::Unauthorized)?;

        return Ok(AuthenticatedUser {
            user_id,
            is_guest: true,
        });
    }

    Err(Error::Unauthorized)
}

/// Middleware that resolves the request's credential (bearer token or guest
/// header) to a user before the handler runs.
///
/// On success the [AuthenticatedUser] is inserted into the request's
/// extensions; requests with no usable credential are rejected with 401.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn auth_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let authenticated_user = resolve_identity(&state, request.headers())?;

    request.extensions_mut().insert(authenticated_user);

    Ok(next.run(request).await)
}
