//! A user of the application and its supporting types.

use std::fmt::Display;

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};
use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::models::Money;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to
/// better compile time errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserID(i64);

impl UserID {
    /// Create a user ID from the underlying integer.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The underlying integer, for SQL parameters.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A bcrypt hash of a user's password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash and salt a plain-text password.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying hashing library fails.
    pub fn new(raw_password: &str) -> Result<Self, BcryptError> {
        hash(raw_password, DEFAULT_COST).map(Self)
    }

    /// Wrap a string that is already a bcrypt hash.
    ///
    /// The caller should ensure the string comes from a trusted source such
    /// as the application's database.
    pub fn new_unchecked(raw_hash: String) -> Self {
        Self(raw_hash)
    }

    /// Check that `raw_password` matches the stored hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A user of the application.
///
/// A user may have been created through registration (password set), through
/// the external national-ID provider (`fayda_id` set), or as an anonymous
/// guest profile (neither set).
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserID,
    name: String,
    email: EmailAddress,
    password_hash: Option<PasswordHash>,
    fayda_id: Option<String>,
    wallet_balance: Money,
    created_at: DateTime<Utc>,
}

impl User {
    /// Create a new `User`. Does not add the user to the database.
    pub fn new(
        id: UserID,
        name: String,
        email: EmailAddress,
        password_hash: Option<PasswordHash>,
        fayda_id: Option<String>,
        wallet_balance: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            password_hash,
            fayda_id,
            wallet_balance,
            created_at,
        }
    }

    /// The user's ID in the database.
    pub fn id(&self) -> UserID {
        self.id
    }

    /// The user's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The email address associated with the user.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// The user's password hash, absent for guest and external-identity
    /// accounts.
    pub fn password_hash(&self) -> Option<&PasswordHash> {
        self.password_hash.as_ref()
    }

    /// The user's national-ID subject, if the account was provisioned
    /// through the external identity provider.
    pub fn fayda_id(&self) -> Option<&str> {
        self.fayda_id.as_deref()
    }

    /// The user's mock-payment wallet balance.
    ///
    /// Distinct from the income/expense-derived current balance, which is
    /// never stored.
    pub fn wallet_balance(&self) -> Money {
        self.wallet_balance
    }

    /// When the account was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// The data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The user's display name.
    pub name: String,
    /// The email address associated with the user. Must be unique.
    pub email: EmailAddress,
    /// The hash of the user's password, absent for guest and
    /// external-identity accounts.
    pub password_hash: Option<PasswordHash>,
    /// The national-ID subject for externally provisioned accounts.
    pub fayda_id: Option<String>,
}

/// The public view of a user, safe to return to clients.
///
/// Deliberately omits the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The user's ID in the database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The email address associated with the user.
    pub email: String,
    /// The user's mock-payment wallet balance.
    pub wallet_balance: Money,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_owned(),
            email: user.email().to_string(),
            wallet_balance: user.wallet_balance(),
            created_at: user.created_at(),
        }
    }
}


#[cfg(test)]
mod user_profile_tests {
    use std::str::FromStr;

    use chrono::Utc;
    use email_address::EmailAddress;

    use super::{PasswordHash, User, UserID, UserProfile};
    use crate::models::Money;

    #[test]
    fn profile_does_not_expose_password_hash() {
        let user = User::new(
            UserID::new(1),
            "Abebe".to_owned(),
            EmailAddress::from_str("abebe@example.com").unwrap(),
            Some(PasswordHash::new_unchecked("notarealhash".to_owned())),
            None,
            Money::from_cents(250),
            Utc::now(),
        );

        let profile = UserProfile::from(&user);
        let json = serde_json::to_string(&profile).unwrap();

        assert!(!json.contains("notarealhash"));
        assert!(json.contains("\"walletBalance\":2.5"));
    }
}
