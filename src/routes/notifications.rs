//! The current user's notification log.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::json;

use crate::{
    auth::AuthenticatedUser,
    db::{self, SelectBy},
    models::{DatabaseID, Notification},
    AppState, Error,
};

/// A route handler for listing the current user's notifications, newest
/// first.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Notification>>, Error> {
    let connection = state.db_connection().lock().unwrap();

    Notification::select(auth.user_id, &connection).map(Json)
}

/// A route handler for marking one of the current user's notifications as
/// read. Responds with 404 when the notification does not exist or belongs
/// to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn mark_as_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(notification_id): Path<DatabaseID>,
) -> Result<Json<Notification>, Error> {
    let connection = state.db_connection().lock().unwrap();

    db::mark_notification_read(&connection, notification_id, auth.user_id).map(Json)
}

/// A route handler for marking all of the current user's notifications as
/// read. Always succeeds, even when there is nothing to update.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<serde_json::Value>, Error> {
    let connection = state.db_connection().lock().unwrap();

    db::mark_all_notifications_read(&connection, auth.user_id)?;

    Ok(Json(json!({ "message": "All notifications marked as read" })))
}
