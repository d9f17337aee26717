//! AI-generated financial tips, relayed from an external generative-text
//! API.
//!
//! The handler aggregates the caller's financial summary, renders it into a
//! prompt and forwards it to the configured `generateContent` endpoint.
//! The call is made exactly once: an unreachable or misbehaving upstream
//! fails openly to the caller rather than being retried.

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{auth::AuthenticatedUser, routes::summary, AppState, Error};

/// The request body for the tips endpoint. The body is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TipsRequest {
    /// The language to write the tips in: "en" (default) or "am" for
    /// Amharic.
    #[serde(default)]
    pub language: Option<String>,
}

/// The relayed tips.
#[derive(Debug, Serialize, Deserialize)]
pub struct TipsResponse {
    /// Three short, actionable recommendations.
    pub tips: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Render the caller's summary into the advisor prompt.
fn build_prompt(summary: &summary::Summary, language: &str) -> String {
    let data = serde_json::json!({
        "income": summary.total_income,
        "expense": summary.total_expense,
        "balance": summary.current_balance,
        "categories": summary.categorization.iter().take(3).collect::<Vec<_>>(),
        "trends": summary.monthly_trends,
    });

    let language_instruction = if language == "am" {
        "Write the 3 recommendations in fluent Amharic."
    } else {
        "Write the 3 recommendations in English."
    };

    format!(
        "You are a highly analytical, strict financial AI. Analyze this user's financial \
         summary: {data}. Provide exactly 3 short, actionable, and brutal financial \
         recommendations to improve their wealth. {language_instruction} Your response MUST \
         be a raw JSON array of exactly 3 strings. Example format: [\"string1\", \"string2\", \
         \"string3\"]. Do NOT include markdown backticks or the word 'json'. Just return the \
         array."
    )
}

/// Parse the tips out of the model's reply, tolerating the markdown fences
/// the model adds despite being told not to.
fn parse_tips(raw_text: &str) -> Result<Vec<String>, Error> {
    let clean_text = raw_text.replace("```json", "").replace("```", "");

    let tips: Vec<String> =
        serde_json::from_str(clean_text.trim()).map_err(|_| Error::AdvisorUnavailable)?;

    if tips.is_empty() {
        return Err(Error::AdvisorUnavailable);
    }

    Ok(tips)
}

/// A route handler for AI-generated financial tips.
///
/// Responds with 503 when no advisor API key is configured, and 502 when
/// the upstream is unreachable or replies with something unusable.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_tips(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    body: Option<Json<TipsRequest>>,
) -> Result<Json<TipsResponse>, Error> {
    let api_key = state
        .advisor()
        .api_key
        .clone()
        .ok_or(Error::AdvisorNotConfigured)?;

    let language = body
        .and_then(|Json(request)| request.language)
        .unwrap_or_else(|| "en".to_string());

    // Build the summary and release the database lock before awaiting the
    // upstream call.
    let summary = {
        let connection = state.db_connection().lock().unwrap();

        summary::build_summary(&connection, auth.user_id, Utc::now())?
    };

    let request = GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: build_prompt(&summary, &language),
            }],
        }],
    };

    let response = state
        .http_client()
        .post(&state.advisor().endpoint)
        .query(&[("key", api_key)])
        .json(&request)
        .send()
        .await
        .map_err(|error| {
            tracing::error!("could not reach the advisor service: {error}");
            Error::AdvisorUnavailable
        })?;

    if !response.status().is_success() {
        tracing::error!("the advisor service replied with {}", response.status());
        return Err(Error::AdvisorUnavailable);
    }

    let reply: GenerateContentResponse = response.json().await.map_err(|error| {
        tracing::error!("could not parse the advisor reply: {error}");
        Error::AdvisorUnavailable
    })?;

    let text = reply
        .candidates
        .first()
        .and_then(|candidate| candidate.content.parts.first())
        .map(|part| part.text.as_str())
        .ok_or(Error::AdvisorUnavailable)?;

    parse_tips(text).map(|tips| Json(TipsResponse { tips }))
}

#[cfg(test)]
mod prompt_tests {
    use super::{build_prompt, parse_tips};
    use crate::{
        models::Money,
        routes::summary::{MonthlyTrend, Summary},
        Error,
    };

    fn sample_summary() -> Summary {
        Summary {
            total_income: Money::from_cents(100_000),
            total_expense: Money::from_cents(25_000),
            current_balance: Money::from_cents(75_000),
            wallet_balance: Money::from_cents(5_000),
            categorization: Vec::new(),
            monthly_trends: vec![MonthlyTrend {
                month: "Aug".to_string(),
                income: Money::from_cents(100_000),
                expense: Money::from_cents(25_000),
            }],
        }
    }

    #[test]
    fn prompt_embeds_the_summary_and_language() {
        let prompt = build_prompt(&sample_summary(), "en");

        assert!(prompt.contains("\"income\":1000.0"));
        assert!(prompt.contains("Write the 3 recommendations in English."));

        let amharic = build_prompt(&sample_summary(), "am");
        assert!(amharic.contains("Write the 3 recommendations in fluent Amharic."));
    }

    #[test]
    fn parse_tips_strips_markdown_fences() {
        let raw = "```json\n[\"Cut subscriptions\", \"Automate savings\", \"Track daily\"]\n```";

        let tips = parse_tips(raw).unwrap();

        assert_eq!(tips.len(), 3);
        assert_eq!(tips[0], "Cut subscriptions");
    }

    #[test]
    fn parse_tips_rejects_garbage() {
        assert_eq!(
            parse_tips("The market looks great!").unwrap_err(),
            Error::AdvisorUnavailable
        );
        assert_eq!(parse_tips("[]").unwrap_err(), Error::AdvisorUnavailable);
    }
}

#[cfg(test)]
mod tips_route_tests {
    use axum::http::StatusCode;

    use crate::{routes::endpoints, test_utils::server_with_user};

    #[tokio::test]
    async fn tips_fail_with_service_unavailable_when_no_key_is_configured() {
        let (server, _, _, token) = server_with_user().await;

        server
            .post(endpoints::AI_TIPS)
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}
