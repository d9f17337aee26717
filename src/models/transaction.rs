//! Transactions: events where money was either spent or earned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CategoryKind, DatabaseID, Money, UserID};

/// The data for creating (or replacing) a transaction.
///
/// Callers are expected to have validated that `amount` is positive and that
/// `category_id` refers to a live category before inserting.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// The owner of the transaction.
    pub user_id: UserID,
    /// The category the transaction is filed under.
    pub category_id: DatabaseID,
    /// The amount of money involved. Always positive; direction comes from
    /// the category's kind.
    pub amount: Money,
    /// Optional free-text note.
    pub description: Option<String>,
    /// When the transaction took place.
    pub date: DateTime<Utc>,
    /// Whether the transaction originated from the mocked mobile-payment
    /// flow.
    pub is_mobile_payment: bool,
}

/// A transaction joined with its category.
///
/// The `type` field is the category's kind: it exists only through the join
/// and is never stored on the transaction row itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    id: DatabaseID,
    user_id: UserID,
    category_id: DatabaseID,
    amount: Money,
    description: Option<String>,
    transaction_date: DateTime<Utc>,
    is_mobile_payment: bool,
    category: String,
    #[serde(rename = "type")]
    kind: CategoryKind,
    icon: String,
}

impl TransactionRecord {
    /// Create a new `TransactionRecord`. Does not touch the database.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: DatabaseID,
        user_id: UserID,
        category_id: DatabaseID,
        amount: Money,
        description: Option<String>,
        transaction_date: DateTime<Utc>,
        is_mobile_payment: bool,
        category: String,
        kind: CategoryKind,
        icon: String,
    ) -> Self {
        Self {
            id,
            user_id,
            category_id,
            amount,
            description,
            transaction_date,
            is_mobile_payment,
            category,
            kind,
            icon,
        }
    }

    /// The transaction's ID in the database.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The ID of the owning user.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// The ID of the category the transaction is filed under.
    pub fn category_id(&self) -> DatabaseID {
        self.category_id
    }

    /// The amount of money involved.
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// The free-text note attached to the transaction, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// When the transaction took place.
    pub fn transaction_date(&self) -> DateTime<Utc> {
        self.transaction_date
    }

    /// Whether the transaction came from the mocked mobile-payment flow.
    pub fn is_mobile_payment(&self) -> bool {
        self.is_mobile_payment
    }

    /// The name of the transaction's category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The income/expense kind derived from the category.
    pub fn kind(&self) -> CategoryKind {
        self.kind
    }
}
