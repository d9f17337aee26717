//! The mocked mobile-money wallet: top-ups and the premium feature charge.
//!
//! No real payment network is involved. The top-up simulates provider
//! latency with a configurable delay, then credits the user's in-app
//! wallet; the premium charge debits a fixed fee with a single conditional
//! UPDATE so concurrent charges cannot overdraft the wallet.

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    db::{self, Insert},
    models::{Money, NewTransaction, NotificationKind},
    AppState, Error,
};

/// The fixed cost of unlocking premium AI insights, in birr.
pub const PREMIUM_INSIGHTS_COST: Money = Money::from_cents(5_000);

/// The data for initiating a mocked top-up.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    /// The amount to top the wallet up by.
    #[serde(default)]
    pub amount: Option<Money>,
    /// The phone number the mock provider would charge.
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// The response to a successful mocked payment.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    /// Always true; failures are reported through the error body instead.
    pub success: bool,
    /// A human-readable confirmation.
    pub message: String,
    /// A synthetic provider reference, unique per call.
    pub reference: String,
    /// The wallet balance after the payment.
    pub wallet_balance: Money,
}

/// Generate a short, human-distinguishable provider reference, e.g.
/// `TB-9F21A40C`.
fn payment_reference() -> String {
    let token = Uuid::new_v4().simple().to_string();

    format!("TB-{}", token[..8].to_uppercase())
}

/// A route handler for the mocked mobile-money top-up.
///
/// Requires a positive amount and a phone number. Simulates provider
/// latency, atomically credits the wallet, records the top-up as an income
/// transaction flagged as a mobile payment, and emits a success
/// notification.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn initiate_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(data): Json<PaymentData>,
) -> Result<Json<PaymentReceipt>, Error> {
    let amount = match data.amount {
        Some(amount) if amount.is_positive() => amount,
        _ => {
            return Err(Error::InvalidInput(
                "Amount and Phone Number required".to_string(),
            ))
        }
    };
    let phone_number = data
        .phone_number
        .filter(|phone_number| !phone_number.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput("Amount and Phone Number required".to_string()))?;

    tracing::info!("mock payment of {amount} ETB requested for {phone_number}");

    // Simulate the provider's network latency before touching any state.
    tokio::time::sleep(state.payment_delay()).await;

    let reference = payment_reference();

    let connection = state.db_connection().lock().unwrap();

    let wallet_balance = db::credit_wallet(&connection, auth.user_id, amount)?;

    // Record the top-up as an income transaction so it shows up in the
    // user's history and summary.
    match db::first_income_category(&connection)? {
        Some(category_id) => {
            NewTransaction {
                user_id: auth.user_id,
                category_id,
                amount,
                description: Some(format!("Telebirr Top-Up ({phone_number})")),
                date: Utc::now(),
                is_mobile_payment: true,
            }
            .insert(&connection)?;
        }
        None => tracing::warn!("no income category found to record the top-up under"),
    }

    db::notify(
        &connection,
        auth.user_id,
        &format!("Telebirr top-up of {amount} ETB completed."),
        NotificationKind::Success,
    );

    Ok(Json(PaymentReceipt {
        success: true,
        message: "Payment Initiated Successfully".to_string(),
        reference,
        wallet_balance,
    }))
}

/// The response to a successful premium charge.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumReceipt {
    /// Always true; failures are reported through the error body instead.
    pub success: bool,
    /// A human-readable confirmation.
    pub message: String,
    /// The wallet balance after the charge.
    pub wallet_balance: Money,
}

/// A route handler for charging the fixed premium insights fee to the
/// wallet.
///
/// The balance check and the debit are one atomic conditional UPDATE:
/// a wallet that covers only one charge can never be charged twice by
/// concurrent requests. Responds with 402 and no mutation when the balance
/// is short.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn pay_for_premium_insights(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<PremiumReceipt>, Error> {
    let connection = state.db_connection().lock().unwrap();

    let wallet_balance = db::charge_wallet(&connection, auth.user_id, PREMIUM_INSIGHTS_COST)?;

    db::notify(
        &connection,
        auth.user_id,
        &format!("Premium AI insights unlocked for {PREMIUM_INSIGHTS_COST} ETB."),
        NotificationKind::Info,
    );

    Ok(Json(PremiumReceipt {
        success: true,
        message: "Premium insights unlocked".to_string(),
        wallet_balance,
    }))
}

#[cfg(test)]
mod payment_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::PaymentReceipt;
    use crate::{
        models::{Money, TransactionRecord},
        routes::{endpoints, summary::Summary},
        test_utils::server_with_user,
    };

    #[tokio::test]
    async fn top_up_requires_amount_and_phone_number() {
        let (server, _, _, token) = server_with_user().await;

        let cases = [
            json!({}),
            json!({ "amount": 100.0 }),
            json!({ "phoneNumber": "0911223344" }),
            json!({ "amount": 0.0, "phoneNumber": "0911223344" }),
        ];

        for payload in cases {
            server
                .post(endpoints::TELEBIRR_PAY)
                .authorization_bearer(&token)
                .content_type("application/json")
                .json(&payload)
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn top_up_credits_wallet_and_records_flagged_transaction() {
        let (server, _, _, token) = server_with_user().await;

        let response = server
            .post(endpoints::TELEBIRR_PAY)
            .authorization_bearer(&token)
            .content_type("application/json")
            .json(&json!({ "amount": 100.0, "phoneNumber": "0911223344" }))
            .await;

        response.assert_status_ok();

        let receipt = response.json::<PaymentReceipt>();
        assert!(receipt.success);
        assert!(receipt.reference.starts_with("TB-"));
        assert_eq!(receipt.reference.len(), 11);
        assert_eq!(receipt.wallet_balance, Money::from_cents(10_000));

        // The top-up shows up as an income transaction flagged as a mobile
        // payment.
        let transactions = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await
            .json::<Vec<TransactionRecord>>();
        assert_eq!(transactions.len(), 1);
        assert!(transactions[0].is_mobile_payment());
        assert_eq!(
            transactions[0].description(),
            Some("Telebirr Top-Up (0911223344)")
        );

        // The summary reports the new wallet balance.
        let summary = server
            .get(endpoints::SUMMARY)
            .authorization_bearer(&token)
            .await
            .json::<Summary>();
        assert_eq!(summary.wallet_balance, Money::from_cents(10_000));
    }

    #[tokio::test]
    async fn references_are_unique_per_call() {
        let (server, _, _, token) = server_with_user().await;

        let mut references = Vec::new();
        for _ in 0..2 {
            let receipt = server
                .post(endpoints::TELEBIRR_PAY)
                .authorization_bearer(&token)
                .content_type("application/json")
                .json(&json!({ "amount": 10.0, "phoneNumber": "0911223344" }))
                .await
                .json::<PaymentReceipt>();
            references.push(receipt.reference);
        }

        assert_ne!(references[0], references[1]);
    }
}
