//! CRUD over the current user's transactions and the category catalog.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    auth::AuthenticatedUser,
    db::{self, Insert, SelectBy},
    models::{
        Category, DatabaseID, Money, NewTransaction, NotificationKind, TransactionRecord,
    },
    AppState, Error,
};

/// The data for creating or replacing a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    /// The amount of money involved. Must be positive.
    pub amount: Money,
    /// The id of the category to file the transaction under.
    pub category_id: DatabaseID,
    /// An optional free-text note.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the transaction originated from the mocked mobile-payment
    /// flow.
    #[serde(default)]
    pub is_mobile_payment: bool,
    /// When the transaction took place. Defaults to now.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl TransactionData {
    fn into_new_transaction(self, auth: AuthenticatedUser) -> Result<NewTransaction, Error> {
        if !self.amount.is_positive() {
            return Err(Error::InvalidAmount);
        }

        Ok(NewTransaction {
            user_id: auth.user_id,
            category_id: self.category_id,
            amount: self.amount,
            description: self.description,
            date: self.date.unwrap_or_else(Utc::now),
            is_mobile_payment: self.is_mobile_payment,
        })
    }
}

/// A route handler for listing all of the current user's transactions,
/// newest first, each enriched with its category's name, type and icon.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_transactions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<TransactionRecord>>, Error> {
    let connection = state.db_connection().lock().unwrap();

    TransactionRecord::select(auth.user_id, &connection).map(Json)
}

/// A route handler for the fixed category catalog, alphabetical by name.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state.db_connection().lock().unwrap();

    db::select_categories(&connection).map(Json)
}

/// A route handler for creating a new transaction.
///
/// Responds with 422 when the amount is not positive or the category id
/// does not refer to a category. On success a notification is recorded on a
/// best-effort basis.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(data): Json<TransactionData>,
) -> Result<(StatusCode, Json<TransactionRecord>), Error> {
    let new_transaction = data.into_new_transaction(auth)?;

    let connection = state.db_connection().lock().unwrap();

    let record = new_transaction.insert(&connection)?;

    db::notify(
        &connection,
        auth.user_id,
        &format!("New transaction of {} ETB added.", record.amount()),
        NotificationKind::Success,
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// A route handler for replacing one of the current user's transactions.
///
/// The update predicate matches both the transaction id and the owning
/// user, so updating another user's transaction responds with 404 rather
/// than a silent no-op.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<DatabaseID>,
    Json(data): Json<TransactionData>,
) -> Result<Json<TransactionRecord>, Error> {
    let new_transaction = data.into_new_transaction(auth)?;

    let connection = state.db_connection().lock().unwrap();

    db::update_transaction(&connection, transaction_id, new_transaction).map(Json)
}

/// A route handler for deleting one of the current user's transactions.
///
/// Responds with 404 when the transaction does not exist or belongs to
/// another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<Json<serde_json::Value>, Error> {
    let connection = state.db_connection().lock().unwrap();

    db::delete_transaction(&connection, transaction_id, auth.user_id)?;

    Ok(Json(json!({ "message": "Transaction deleted" })))
}

#[cfg(test)]
mod category_tests {
    use crate::{models::Category, routes::endpoints, test_utils::server_with_user};

    #[tokio::test]
    async fn categories_are_listed_alphabetically() {
        let (server, _, _, token) = server_with_user().await;

        let response = server
            .get(endpoints::CATEGORIES)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();

        let categories = response.json::<Vec<Category>>();
        assert_eq!(categories.len(), 8);

        let names: Vec<&str> = categories.iter().map(|category| category.name()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
