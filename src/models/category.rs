//! The fixed category catalog that classifies every transaction.

use serde::{Deserialize, Serialize};

use crate::models::DatabaseID;

/// Whether a category (and therefore any transaction filed under it)
/// represents money coming in or going out.
///
/// A transaction has no type of its own: its type is always derived from its
/// category through a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Money earned, e.g. wages.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl CategoryKind {
    /// The database representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }

    /// Parse the database representation of the kind.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "income" => Some(CategoryKind::Income),
            "expense" => Some(CategoryKind::Expense),
            _ => None,
        }
    }
}

/// An entry in the fixed category catalog, e.g. 'Food & Drinks', 'Salary'.
///
/// The catalog is seeded once by the database migrations and is read-only
/// from the application's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    id: DatabaseID,
    name: String,
    #[serde(rename = "type")]
    kind: CategoryKind,
    icon_slug: String,
}

impl Category {
    /// Create a new category. Does not add the category to the database.
    pub fn new(id: DatabaseID, name: String, kind: CategoryKind, icon_slug: String) -> Self {
        Self {
            id,
            name,
            kind,
            icon_slug,
        }
    }

    /// The id of the category.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The display name of the category.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the category classifies income or expenses.
    pub fn kind(&self) -> CategoryKind {
        self.kind
    }

    /// The icon identifier the client renders next to the category.
    pub fn icon_slug(&self) -> &str {
        &self.icon_slug
    }
}

#[cfg(test)]
mod category_kind_tests {
    use super::CategoryKind;

    #[test]
    fn round_trips_through_database_representation() {
        for kind in [CategoryKind::Income, CategoryKind::Expense] {
            assert_eq!(CategoryKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn from_str_rejects_unknown_values() {
        assert_eq!(CategoryKind::from_str("transfer"), None);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CategoryKind::Income).unwrap(),
            "\"income\""
        );
    }
}
