//! The data-access layer: schema migrations and the queries behind the
//! application's routes.
//!
//! The schema is applied by an explicit, versioned migration list that runs
//! exactly once at start-up (see [initialize]); request handlers never
//! modify the schema.

use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use rusqlite::{Connection, Row};

use crate::{
    models::{
        Category, CategoryKind, DatabaseID, Money, NewTransaction, NewUser, Notification,
        NotificationKind, PasswordHash, TransactionRecord, User, UserID,
    },
    Error,
};

/// The versioned migration list. Index `i` brings the schema to version
/// `i + 1`. Append-only: never edit an entry that has shipped.
const MIGRATIONS: &[&str] = &[
    // Version 1: the initial schema and the fixed category catalog.
    "CREATE TABLE user (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password TEXT,
        fayda_id TEXT,
        wallet_balance_cents INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE category (
        id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
        icon_slug TEXT NOT NULL
    );

    CREATE TABLE \"transaction\" (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        amount_cents INTEGER NOT NULL,
        description TEXT,
        transaction_date TEXT NOT NULL,
        is_mobile_payment INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE
    );

    CREATE TABLE notification (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        message TEXT NOT NULL,
        kind TEXT NOT NULL CHECK (kind IN ('info', 'success', 'warning', 'error')),
        is_read INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
    );

    CREATE TABLE session (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        expires_at TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
    );

    INSERT INTO category (name, kind, icon_slug) VALUES
        ('Food & Drinks', 'expense', 'FaUtensils'),
        ('Shopping', 'expense', 'FaShoppingBag'),
        ('Transport', 'expense', 'FaBus'),
        ('Bills', 'expense', 'FaFileInvoiceDollar'),
        ('Health', 'expense', 'FaNotesMedical'),
        ('Entertainment', 'expense', 'FaFilm'),
        ('Salary', 'income', 'FaMoneyBillWave'),
        ('Business', 'income', 'FaBriefcase');",
];

/// Bring the database up to the current schema version.
///
/// Also enables foreign key enforcement for the connection, which SQLite
/// leaves off by default and which user deletion relies on for cascading.
///
/// # Errors
///
/// Returns an [Error::SqlError] if a migration cannot be applied.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let version: i64 = connection.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    let transaction = connection.unchecked_transaction()?;

    for (index, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = index as i64 + 1;

        if migration_version > version {
            transaction.execute_batch(migration)?;
        }
    }

    transaction.pragma_update(None, "user_version", MIGRATIONS.len() as i64)?;
    transaction.commit()?;

    Ok(())
}

/// A trait for mapping a `rusqlite::Row` from the database to a concrete
/// rust type.
pub trait MapRow {
    /// The type the row is converted into.
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// **Note:** This function expects the row to contain the mapped
    /// columns in the order the implementation defines.
    ///
    /// # Errors
    ///
    /// Returns an error if a row item cannot be converted into the
    /// corresponding rust type.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// A trait for inserting a record into the application database.
pub trait Insert {
    /// The type returned after a successful insertion.
    type ResultType;

    /// Insert the object into the application database.
    ///
    /// # Errors
    ///
    /// This function will return an error if the insertion failed.
    fn insert(self, connection: &Connection) -> Result<Self::ResultType, Error>;
}

/// A trait for retrieving records from the application database by a field
/// of type `T`.
pub trait SelectBy<T> {
    /// The type returned by the query.
    type ResultType;

    /// Select records from the application database that match `field`.
    fn select(field: T, connection: &Connection) -> Result<Self::ResultType, Error>;
}

fn parse_kind(index: usize, value: String) -> Result<CategoryKind, rusqlite::Error> {
    CategoryKind::from_str(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            format!("invalid category kind: {value}").into(),
        )
    })
}

fn parse_notification_kind(
    index: usize,
    value: String,
) -> Result<NotificationKind, rusqlite::Error> {
    NotificationKind::from_str(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            format!("invalid notification kind: {value}").into(),
        )
    })
}

impl MapRow for User {
    type ReturnType = Self;

    fn map_row(row: &Row) -> Result<Self, rusqlite::Error> {
        let raw_email: String = row.get(2)?;
        let raw_password_hash: Option<String> = row.get(3)?;

        Ok(Self::new(
            UserID::new(row.get(0)?),
            row.get(1)?,
            EmailAddress::new_unchecked(raw_email),
            raw_password_hash.map(PasswordHash::new_unchecked),
            row.get(4)?,
            Money::from_cents(row.get(5)?),
            row.get(6)?,
        ))
    }
}

const USER_COLUMNS: &str = "id, name, email, password, fayda_id, wallet_balance_cents, created_at";

impl Insert for NewUser {
    type ResultType = User;

    /// Create a new user in the database.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEmail] if the email is already in use, or
    /// [Error::SqlError] for any other SQL error.
    fn insert(self, connection: &Connection) -> Result<Self::ResultType, Error> {
        let created_at = Utc::now();
        let password: Option<&str> = self.password_hash.as_ref().map(|hash| hash.as_ref());

        connection.execute(
            "INSERT INTO user (name, email, password, fayda_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &self.name,
                self.email.to_string(),
                password,
                &self.fayda_id,
                created_at,
            ),
        )?;

        let id = UserID::new(connection.last_insert_rowid());

        Ok(User::new(
            id,
            self.name,
            self.email,
            self.password_hash,
            self.fayda_id,
            Money::ZERO,
            created_at,
        ))
    }
}

impl SelectBy<UserID> for User {
    type ResultType = Self;

    /// Get the user with the given id, or [Error::NotFound] if there is no
    /// such user.
    fn select(id: UserID, connection: &Connection) -> Result<Self::ResultType, Error> {
        connection
            .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
            .query_row(&[(":id", &id.as_i64())], User::map_row)
            .map_err(|error| error.into())
    }
}

impl SelectBy<&EmailAddress> for User {
    type ResultType = Self;

    /// Get the user with the given email address, or [Error::NotFound] if
    /// there is no such user.
    fn select(email: &EmailAddress, connection: &Connection) -> Result<Self::ResultType, Error> {
        connection
            .prepare(&format!(
                "SELECT {USER_COLUMNS} FROM user WHERE email = :email"
            ))?
            .query_row(&[(":email", &email.to_string())], User::map_row)
            .map_err(|error| error.into())
    }
}

impl SelectBy<&str> for User {
    type ResultType = Self;

    /// Get the user with the given display name (used for looking up guest
    /// profiles), or [Error::NotFound] if there is no such user.
    fn select(name: &str, connection: &Connection) -> Result<Self::ResultType, Error> {
        connection
            .prepare(&format!(
                "SELECT {USER_COLUMNS} FROM user WHERE name = :name LIMIT 1"
            ))?
            .query_row(&[(":name", &name)], User::map_row)
            .map_err(|error| error.into())
    }
}

/// Overwrite a user's name, email and (when `password_hash` is given)
/// password.
///
/// # Errors
///
/// Returns [Error::NotFound] if `id` does not refer to a user, or
/// [Error::DuplicateEmail] if `email` belongs to another user.
pub fn update_user(
    connection: &Connection,
    id: UserID,
    name: &str,
    email: &EmailAddress,
    password_hash: Option<&PasswordHash>,
) -> Result<User, Error> {
    let password: Option<&str> = password_hash.map(|hash| hash.as_ref());

    let rows_changed = connection.execute(
        "UPDATE user
         SET name = ?1, email = ?2, password = COALESCE(?3, password)
         WHERE id = ?4",
        (name, email.to_string(), password, id.as_i64()),
    )?;

    if rows_changed == 0 {
        return Err(Error::NotFound);
    }

    User::select(id, connection)
}

/// Delete a user. Their transactions, notifications and sessions cascade
/// away with them.
///
/// # Errors
///
/// Returns [Error::NotFound] if `id` does not refer to a user.
pub fn delete_user(connection: &Connection, id: UserID) -> Result<(), Error> {
    let rows_changed = connection.execute("DELETE FROM user WHERE id = ?1", [id.as_i64()])?;

    if rows_changed == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Record a bookkeeping row for an issued token.
///
/// Validation of bearer tokens stays stateless; the session row exists so
/// that issued credentials are auditable and disappear with the user.
// TODO: Prune rows whose expires_at has passed, e.g. on start-up.
pub fn insert_session(
    connection: &Connection,
    id: &str,
    user_id: UserID,
    expires_at: DateTime<Utc>,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO session (id, user_id, expires_at, created_at) VALUES (?1, ?2, ?3, ?4)",
        (id, user_id.as_i64(), expires_at, Utc::now()),
    )?;

    Ok(())
}

impl MapRow for Category {
    type ReturnType = Self;

    fn map_row(row: &Row) -> Result<Self, rusqlite::Error> {
        let kind = parse_kind(2, row.get(2)?)?;

        Ok(Self::new(row.get(0)?, row.get(1)?, kind, row.get(3)?))
    }
}

/// Retrieve the full category catalog, alphabetical by name.
pub fn select_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, kind, icon_slug FROM category ORDER BY name ASC")?
        .query_map([], Category::map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// The id of an arbitrary income category, used to file mocked top-ups
/// under.
pub fn first_income_category(connection: &Connection) -> Result<Option<DatabaseID>, Error> {
    match connection.query_row(
        "SELECT id FROM category WHERE kind = 'income' ORDER BY id ASC LIMIT 1",
        [],
        |row| row.get(0),
    ) {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

const TRANSACTION_RECORD_COLUMNS: &str = "t.id, t.user_id, t.category_id, t.amount_cents, \
     t.description, t.transaction_date, t.is_mobile_payment, c.name, c.kind, c.icon_slug";

impl MapRow for TransactionRecord {
    type ReturnType = Self;

    fn map_row(row: &Row) -> Result<Self, rusqlite::Error> {
        let kind = parse_kind(8, row.get(8)?)?;

        Ok(Self::new(
            row.get(0)?,
            UserID::new(row.get(1)?),
            row.get(2)?,
            Money::from_cents(row.get(3)?),
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            kind,
            row.get(9)?,
        ))
    }
}

fn select_transaction_record(
    connection: &Connection,
    id: DatabaseID,
) -> Result<TransactionRecord, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_RECORD_COLUMNS}
             FROM \"transaction\" t
             INNER JOIN category c ON t.category_id = c.id
             WHERE t.id = :id"
        ))?
        .query_row(&[(":id", &id)], TransactionRecord::map_row)
        .map_err(|error| error.into())
}

impl Insert for NewTransaction {
    type ResultType = TransactionRecord;

    /// Create a new transaction in the database and return it joined with
    /// its category.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidCategory] if `category_id` does not refer to
    /// a category, or [Error::SqlError] for any other SQL error.
    fn insert(self, connection: &Connection) -> Result<Self::ResultType, Error> {
        connection.execute(
            "INSERT INTO \"transaction\"
                 (user_id, category_id, amount_cents, description, transaction_date, is_mobile_payment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                self.user_id.as_i64(),
                self.category_id,
                self.amount.cents(),
                &self.description,
                self.date,
                self.is_mobile_payment,
            ),
        )?;

        select_transaction_record(connection, connection.last_insert_rowid())
    }
}

impl SelectBy<UserID> for TransactionRecord {
    type ResultType = Vec<Self>;

    /// Retrieve all of a user's transactions joined with their categories,
    /// ordered by transaction date descending.
    fn select(user_id: UserID, connection: &Connection) -> Result<Self::ResultType, Error> {
        connection
            .prepare(&format!(
                "SELECT {TRANSACTION_RECORD_COLUMNS}
                 FROM \"transaction\" t
                 INNER JOIN category c ON t.category_id = c.id
                 WHERE t.user_id = :user_id
                 ORDER BY t.transaction_date DESC, t.id DESC"
            ))?
            .query_map(&[(":user_id", &user_id.as_i64())], TransactionRecord::map_row)?
            .map(|maybe_record| maybe_record.map_err(|error| error.into()))
            .collect()
    }
}

/// Overwrite a transaction owned by `user_id`.
///
/// The update predicate matches both the transaction id and the owning user
/// id, so a wrong owner is indistinguishable from a missing row.
///
/// # Errors
///
/// Returns [Error::NotFound] if no row matched, or [Error::InvalidCategory]
/// if the new category id does not refer to a category.
pub fn update_transaction(
    connection: &Connection,
    id: DatabaseID,
    data: NewTransaction,
) -> Result<TransactionRecord, Error> {
    let rows_changed = connection.execute(
        "UPDATE \"transaction\"
         SET amount_cents = ?1, description = ?2, category_id = ?3,
             transaction_date = ?4, is_mobile_payment = ?5
         WHERE id = ?6 AND user_id = ?7",
        (
            data.amount.cents(),
            &data.description,
            data.category_id,
            data.date,
            data.is_mobile_payment,
            id,
            data.user_id.as_i64(),
        ),
    )?;

    if rows_changed == 0 {
        return Err(Error::NotFound);
    }

    select_transaction_record(connection, id)
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no row matched the id and owner.
pub fn delete_transaction(
    connection: &Connection,
    id: DatabaseID,
    user_id: UserID,
) -> Result<(), Error> {
    let rows_changed = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_changed == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// A user's total income and total expense across all their transactions.
pub fn select_income_expense_totals(
    connection: &Connection,
    user_id: UserID,
) -> Result<(Money, Money), Error> {
    connection
        .prepare(
            "SELECT
                COALESCE(SUM(CASE WHEN c.kind = 'income' THEN t.amount_cents ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN c.kind = 'expense' THEN t.amount_cents ELSE 0 END), 0)
             FROM \"transaction\" t
             INNER JOIN category c ON t.category_id = c.id
             WHERE t.user_id = :user_id",
        )?
        .query_row(&[(":user_id", &user_id.as_i64())], |row| {
            Ok((
                Money::from_cents(row.get(0)?),
                Money::from_cents(row.get(1)?),
            ))
        })
        .map_err(|error| error.into())
}

/// One row of the per-category breakdown in the summary view.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CategoryTotal {
    /// The category's display name.
    pub category: String,
    /// Whether the category classifies income or expenses.
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    /// The summed amount of the user's transactions in the category.
    pub total: Money,
}

/// The per-category totals for every category the user has at least one
/// transaction in, ordered by total descending.
pub fn select_categorization(
    connection: &Connection,
    user_id: UserID,
) -> Result<Vec<CategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT c.name, c.kind, SUM(t.amount_cents) AS total
             FROM \"transaction\" t
             INNER JOIN category c ON t.category_id = c.id
             WHERE t.user_id = :user_id
             GROUP BY c.id, c.name, c.kind
             ORDER BY total DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                kind: parse_kind(1, row.get(1)?)?,
                total: Money::from_cents(row.get(2)?),
            })
        })?
        .map(|maybe_total| maybe_total.map_err(|error| error.into()))
        .collect()
}

/// The date, kind and amount of each of the user's transactions on or after
/// `start`. The monthly trend view buckets these by calendar month.
pub fn select_activity_since(
    connection: &Connection,
    user_id: UserID,
    start: DateTime<Utc>,
) -> Result<Vec<(DateTime<Utc>, CategoryKind, Money)>, Error> {
    connection
        .prepare(
            "SELECT t.transaction_date, c.kind, t.amount_cents
             FROM \"transaction\" t
             INNER JOIN category c ON t.category_id = c.id
             WHERE t.user_id = :user_id AND t.transaction_date >= :start",
        )?
        .query_map(
            rusqlite::named_params! { ":user_id": user_id.as_i64(), ":start": start },
            |row| {
                Ok((
                    row.get(0)?,
                    parse_kind(1, row.get(1)?)?,
                    Money::from_cents(row.get(2)?),
                ))
            },
        )?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// One row of the monthly report: a category's total and transaction count
/// within a calendar month.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MonthlyCategoryTotal {
    /// The category's display name.
    pub category: String,
    /// Whether the category classifies income or expenses.
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    /// The summed amount of the user's transactions in the category for the
    /// month.
    pub total: Money,
    /// How many transactions contributed to the total.
    pub count: i64,
}

/// The user's per-category totals for transactions in `[start, end)`,
/// ordered by total descending.
pub fn select_monthly_breakdown(
    connection: &Connection,
    user_id: UserID,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<MonthlyCategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT c.name, c.kind, SUM(t.amount_cents) AS total, COUNT(t.id)
             FROM \"transaction\" t
             INNER JOIN category c ON t.category_id = c.id
             WHERE t.user_id = :user_id
               AND t.transaction_date >= :start
               AND t.transaction_date < :end
             GROUP BY c.id, c.name, c.kind
             ORDER BY total DESC",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id.as_i64(),
                ":start": start,
                ":end": end,
            },
            |row| {
                Ok(MonthlyCategoryTotal {
                    category: row.get(0)?,
                    kind: parse_kind(1, row.get(1)?)?,
                    total: Money::from_cents(row.get(2)?),
                    count: row.get(3)?,
                })
            },
        )?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// The user's current mock-payment wallet balance.
pub fn select_wallet_balance(connection: &Connection, user_id: UserID) -> Result<Money, Error> {
    connection
        .prepare("SELECT wallet_balance_cents FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], |row| {
            Ok(Money::from_cents(row.get(0)?))
        })
        .map_err(|error| error.into())
}

/// Atomically add `amount` to the user's wallet balance and return the new
/// balance.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not refer to a user.
pub fn credit_wallet(
    connection: &Connection,
    user_id: UserID,
    amount: Money,
) -> Result<Money, Error> {
    connection
        .prepare(
            "UPDATE user SET wallet_balance_cents = wallet_balance_cents + :amount
             WHERE id = :id
             RETURNING wallet_balance_cents",
        )?
        .query_row(
            &[(":amount", &amount.cents()), (":id", &user_id.as_i64())],
            |row| Ok(Money::from_cents(row.get(0)?)),
        )
        .map_err(|error| error.into())
}

/// Atomically subtract `cost` from the user's wallet balance and return the
/// new balance.
///
/// The balance check and the debit are a single conditional UPDATE, so two
/// concurrent charges can never both succeed against a balance that only
/// covers one.
///
/// # Errors
///
/// Returns [Error::InsufficientFunds] if the balance does not cover `cost`,
/// or [Error::NotFound] if `user_id` does not refer to a user.
pub fn charge_wallet(
    connection: &Connection,
    user_id: UserID,
    cost: Money,
) -> Result<Money, Error> {
    let result = connection
        .prepare(
            "UPDATE user SET wallet_balance_cents = wallet_balance_cents - :cost
             WHERE id = :id AND wallet_balance_cents >= :cost
             RETURNING wallet_balance_cents",
        )?
        .query_row(
            &[(":cost", &cost.cents()), (":id", &user_id.as_i64())],
            |row| Ok(Money::from_cents(row.get(0)?)),
        );

    match result {
        Ok(balance) => Ok(balance),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            // Distinguish a missing user from a balance that cannot cover
            // the cost.
            select_wallet_balance(connection, user_id)?;

            Err(Error::InsufficientFunds)
        }
        Err(error) => Err(error.into()),
    }
}

impl MapRow for Notification {
    type ReturnType = Self;

    fn map_row(row: &Row) -> Result<Self, rusqlite::Error> {
        let kind = parse_notification_kind(3, row.get(3)?)?;

        Ok(Self::new(
            row.get(0)?,
            UserID::new(row.get(1)?),
            row.get(2)?,
            kind,
            row.get(4)?,
            row.get(5)?,
        ))
    }
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, message, kind, is_read, created_at";

/// Insert a notification for `user_id`.
///
/// Most callers want [notify], which swallows failures.
pub fn insert_notification(
    connection: &Connection,
    user_id: UserID,
    message: &str,
    kind: NotificationKind,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO notification (user_id, message, kind, created_at) VALUES (?1, ?2, ?3, ?4)",
        (user_id.as_i64(), message, kind.as_str(), Utc::now()),
    )?;

    Ok(())
}

/// Record a notification on a best-effort basis.
///
/// A failure here must never fail the business operation that triggered the
/// notification, so errors are logged and swallowed.
pub fn notify(connection: &Connection, user_id: UserID, message: &str, kind: NotificationKind) {
    if let Err(error) = insert_notification(connection, user_id, message, kind) {
        tracing::warn!("could not record notification for user {user_id}: {error}");
    }
}

impl SelectBy<UserID> for Notification {
    type ResultType = Vec<Self>;

    /// Retrieve all of a user's notifications, newest first.
    fn select(user_id: UserID, connection: &Connection) -> Result<Self::ResultType, Error> {
        connection
            .prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notification
                 WHERE user_id = :user_id
                 ORDER BY created_at DESC, id DESC"
            ))?
            .query_map(&[(":user_id", &user_id.as_i64())], Notification::map_row)?
            .map(|maybe_notification| maybe_notification.map_err(|error| error.into()))
            .collect()
    }
}

/// Mark one of the user's notifications as read and return it.
///
/// # Errors
///
/// Returns [Error::NotFound] if the notification does not exist or belongs
/// to another user.
pub fn mark_notification_read(
    connection: &Connection,
    id: DatabaseID,
    user_id: UserID,
) -> Result<Notification, Error> {
    connection
        .prepare(&format!(
            "UPDATE notification SET is_read = 1
             WHERE id = :id AND user_id = :user_id
             RETURNING {NOTIFICATION_COLUMNS}"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            Notification::map_row,
        )
        .map_err(|error| error.into())
}

/// Mark all of the user's notifications as read.
///
/// Always succeeds, even when there was nothing to update; calling it twice
/// is a no-op the second time.
pub fn mark_all_notifications_read(
    connection: &Connection,
    user_id: UserID,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE notification SET is_read = 1 WHERE user_id = ?1",
            [user_id.as_i64()],
        )
        .map_err(|error| error.into())
}

#[cfg(test)]
mod user_tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use rusqlite::Connection;

    use super::{delete_user, initialize, update_user, Insert, SelectBy};
    use crate::{
        models::{NewUser, PasswordHash, User, UserID},
        Error,
    };

    fn init_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_owned(),
            email: EmailAddress::from_str(email).unwrap(),
            password_hash: Some(PasswordHash::new_unchecked("notarealhash".to_owned())),
            fayda_id: None,
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let conn = init_db();

        let inserted = new_user("Abebe", "abebe@example.com").insert(&conn).unwrap();

        assert!(inserted.id().as_i64() > 0);
        assert_eq!(inserted.name(), "Abebe");
        assert_eq!(inserted.wallet_balance().cents(), 0);
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let conn = init_db();

        new_user("Abebe", "abebe@example.com").insert(&conn).unwrap();

        let result = new_user("Someone Else", "abebe@example.com").insert(&conn);

        assert!(matches!(result, Err(Error::DuplicateEmail)));
    }

    #[test]
    fn insert_user_without_password_succeeds() {
        let conn = init_db();

        let guest = NewUser {
            name: "wanderer".to_owned(),
            email: EmailAddress::from_str("wanderer_1@guest.local").unwrap(),
            password_hash: None,
            fayda_id: None,
        }
        .insert(&conn)
        .unwrap();

        assert!(guest.password_hash().is_none());

        let selected = User::select("wanderer", &conn).unwrap();
        assert_eq!(selected, guest);
    }

    #[test]
    fn select_user_fails_with_non_existent_email() {
        let conn = init_db();
        let email = EmailAddress::from_str("nobody@example.com").unwrap();

        assert!(matches!(User::select(&email, &conn), Err(Error::NotFound)));
    }

    #[test]
    fn update_user_keeps_password_when_not_given() {
        let conn = init_db();
        let user = new_user("Abebe", "abebe@example.com").insert(&conn).unwrap();

        let updated = update_user(
            &conn,
            user.id(),
            "Abebe Bikila",
            &EmailAddress::from_str("bikila@example.com").unwrap(),
            None,
        )
        .unwrap();

        assert_eq!(updated.name(), "Abebe Bikila");
        assert_eq!(updated.password_hash(), user.password_hash());
    }

    #[test]
    fn delete_user_cascades_and_fails_on_missing_id() {
        let conn = init_db();
        let user = new_user("Abebe", "abebe@example.com").insert(&conn).unwrap();

        delete_user(&conn, user.id()).unwrap();

        assert!(matches!(
            User::select(user.id(), &conn),
            Err(Error::NotFound)
        ));
        assert!(matches!(
            delete_user(&conn, UserID::new(999)),
            Err(Error::NotFound)
        ));
    }
}
