//! The aggregated financial view over a user's transactions: totals, the
//! per-category breakdown and the six-month trend.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthenticatedUser,
    db::{self, CategoryTotal},
    models::{CategoryKind, Money, UserID},
    AppState, Error,
};

/// How many trailing calendar months the trend view covers, including the
/// current month.
const TREND_MONTHS: u32 = 6;

/// The income and expense totals for one calendar month of the trend
/// window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// The abbreviated month name, e.g. "Mar".
    pub month: String,
    /// The month's summed income.
    pub income: Money,
    /// The month's summed expenses.
    pub expense: Money,
}

/// The aggregated financial view for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The sum of all the user's income transactions.
    pub total_income: Money,
    /// The sum of all the user's expense transactions.
    pub total_expense: Money,
    /// `total_income - total_expense`. Computed on read, never stored.
    pub current_balance: Money,
    /// The user's mock-payment wallet balance.
    pub wallet_balance: Money,
    /// One row per category the user has at least one transaction in,
    /// ordered by total descending.
    pub categorization: Vec<CategoryTotal>,
    /// Exactly six entries covering the trailing six calendar months,
    /// oldest first, zero-filled for months with no activity.
    pub monthly_trends: Vec<MonthlyTrend>,
}

/// The first day of the month `date` falls in.
fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .expect("the first of the month is always a valid date")
}

/// The first days of the trailing [TREND_MONTHS] calendar months, oldest
/// first and ending with the month `now` falls in.
fn trend_month_starts(now: DateTime<Utc>) -> Vec<NaiveDate> {
    let current_month = first_of_month(now.date_naive());

    (0..TREND_MONTHS)
        .rev()
        .map(|offset| {
            current_month
                .checked_sub_months(Months::new(offset))
                .expect("subtracting a handful of months cannot underflow the calendar")
        })
        .collect()
}

/// Bucket raw transaction activity into the six-month trend.
///
/// Months are anchored to calendar boundaries, not rolling 30-day windows.
/// Activity outside the window is ignored; months with no activity get
/// zeroed totals.
fn build_monthly_trends(
    now: DateTime<Utc>,
    activity: &[(DateTime<Utc>, CategoryKind, Money)],
) -> Vec<MonthlyTrend> {
    trend_month_starts(now)
        .into_iter()
        .map(|month_start| {
            let mut income = Money::ZERO;
            let mut expense = Money::ZERO;

            for (date, kind, amount) in activity {
                if date.year() == month_start.year() && date.month() == month_start.month() {
                    match kind {
                        CategoryKind::Income => income = income + *amount,
                        CategoryKind::Expense => expense = expense + *amount,
                    }
                }
            }

            MonthlyTrend {
                month: month_start.format("%b").to_string(),
                income,
                expense,
            }
        })
        .collect()
}

/// Assemble the full summary for `user_id` as of `now`.
pub(crate) fn build_summary(
    connection: &Connection,
    user_id: UserID,
    now: DateTime<Utc>,
) -> Result<Summary, Error> {
    let (total_income, total_expense) = db::select_income_expense_totals(connection, user_id)?;
    let categorization = db::select_categorization(connection, user_id)?;
    let wallet_balance = db::select_wallet_balance(connection, user_id)?;

    let window_start = trend_month_starts(now)[0]
        .and_time(NaiveTime::MIN)
        .and_utc();
    let activity = db::select_activity_since(connection, user_id, window_start)?;

    Ok(Summary {
        total_income,
        total_expense,
        current_balance: total_income - total_expense,
        wallet_balance,
        categorization,
        monthly_trends: build_monthly_trends(now, &activity),
    })
}

/// A route handler for the current user's financial summary.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Summary>, Error> {
    let connection = state.db_connection().lock().unwrap();

    build_summary(&connection, auth.user_id, Utc::now()).map(Json)
}

#[cfg(test)]
mod trend_tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::build_monthly_trends;
    use crate::models::{CategoryKind, Money};

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn trends_cover_exactly_six_months_oldest_first() {
        let now = date(2026, 3, 15);

        let trends = build_monthly_trends(now, &[]);

        let labels: Vec<&str> = trends.iter().map(|trend| trend.month.as_str()).collect();
        assert_eq!(labels, vec!["Oct", "Nov", "Dec", "Jan", "Feb", "Mar"]);
    }

    #[test]
    fn months_without_activity_are_zero_filled() {
        let now = date(2026, 3, 15);
        let activity = vec![
            (date(2026, 1, 5), CategoryKind::Income, Money::from_cents(100_000)),
            (date(2026, 3, 1), CategoryKind::Expense, Money::from_cents(20_000)),
            (date(2026, 3, 14), CategoryKind::Expense, Money::from_cents(5_000)),
        ];

        let trends = build_monthly_trends(now, &activity);

        assert_eq!(trends.len(), 6);
        // October through December and February have no activity.
        for index in [0, 1, 2, 4] {
            assert_eq!(trends[index].income, Money::ZERO);
            assert_eq!(trends[index].expense, Money::ZERO);
        }
        // January has the income, March has both expenses summed.
        assert_eq!(trends[3].income, Money::from_cents(100_000));
        assert_eq!(trends[5].expense, Money::from_cents(25_000));
    }

    #[test]
    fn labels_do_not_repeat_within_the_window() {
        let now = date(2026, 8, 8);

        let trends = build_monthly_trends(now, &[]);

        let mut labels: Vec<&str> = trends.iter().map(|trend| trend.month.as_str()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 6);
    }

    #[test]
    fn activity_outside_the_window_is_ignored() {
        let now = date(2026, 3, 15);
        let activity = vec![(
            // The same calendar month one year earlier.
            date(2025, 3, 15),
            CategoryKind::Income,
            Money::from_cents(100_000),
        )];

        let trends = build_monthly_trends(now, &activity);

        assert!(trends
            .iter()
            .all(|trend| trend.income == Money::ZERO && trend.expense == Money::ZERO));
    }
}
