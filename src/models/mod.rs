//! The domain models for the application.

mod category;
mod money;
mod notification;
mod transaction;
mod user;

pub use category::{Category, CategoryKind};
pub use money::{Money, MoneyError};
pub use notification::{Notification, NotificationKind};
pub use transaction::{NewTransaction, TransactionRecord};
pub use user::{NewUser, PasswordHash, User, UserID, UserProfile};

/// An alias for the integer type used for database primary keys.
pub type DatabaseID = i64;
