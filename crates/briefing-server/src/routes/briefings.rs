use axum::extract::State;
use axum::Json;
use briefing_core::briefing::extract_primary_subject;
use briefing_core::normalize::normalize;
use serde_json::json;

use crate::state::AppState;

/// GET /api/briefings — stored entries projected through the normalizer.
///
/// Entries whose payload cannot be normalized (raw-text fallbacks, junk
/// callbacks) are skipped rather than reported as errors; the raw view at
/// `/api/results` still shows them.
pub async fn list_briefings(State(app): State<AppState>) -> Json<serde_json::Value> {
    let briefings: Vec<serde_json::Value> = app
        .store
        .results()
        .into_iter()
        .filter_map(|entry| {
            let briefing = normalize(&entry.payload)?;
            let subject = extract_primary_subject(&briefing.report());
            Some(json!({
                "entryId": entry.id,
                "receivedAt": entry.received_at,
                "subject": subject,
                "briefing": briefing,
            }))
        })
        .collect();

    Json(json!({ "briefings": briefings }))
}
