use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{Extensions, HeaderMap};
use axum::Json;
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Inbound callbacks are small JSON documents; anything past this is junk.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

/// POST /api/results — accept a result callback from the external agent.
///
/// Storage is permissive: a body that fails JSON parsing is still accepted,
/// wrapped as `{ raw, parserError }`, so no callback is lost to a formatting
/// quirk. Normalization happens at read time (`/api/briefings`), not here.
pub async fn ingest_result(
    State(app): State<AppState>,
    req: Request,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(secret) = &app.config.webhook_secret {
        let presented = req
            .headers()
            .get("x-webhook-secret")
            .and_then(|v| v.to_str().ok());
        if presented != Some(secret.as_str()) {
            return Err(AppError::unauthorized("invalid x-webhook-secret header"));
        }
    }

    let source_ip = extract_ip(req.headers(), req.extensions());
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError(anyhow::anyhow!("failed to read request body: {e}")))?;

    let payload = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("result callback body is not JSON, storing raw: {err}");
            json!({
                "raw": String::from_utf8_lossy(&bytes),
                "parserError": err.to_string(),
            })
        }
    };

    let entry = app.store.add_result(payload, source_ip);
    tracing::info!(entry_id = %entry.id, "stored inbound result");

    Ok(Json(json!({ "ok": true, "entryId": entry.id })))
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// GET /api/results — current buffer, newest-first, raw payloads.
pub async fn list_results(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "results": app.store.results() }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Best-effort originating address: first `x-forwarded-for` entry, then
/// `x-real-ip`, then the socket peer when the router was built with
/// connect-info.
fn extract_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        let first = forwarded.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return Some(real_ip.to_string());
    }
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
}
