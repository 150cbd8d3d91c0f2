use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use briefing_core::BriefingError;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::AppError;
use crate::state::AppState;

/// Path the external agent posts results back to, appended to the
/// dispatching request's origin when deriving the callback URL.
const RESULTS_PATH: &str = "/api/results";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    /// Operator-submitted form fields, forwarded verbatim.
    pub form: Option<Map<String, Value>>,
    /// Per-request override of the configured entry webhook.
    #[serde(default)]
    pub entry_webhook: Option<String>,
    /// Per-request override of the derived callback URL.
    #[serde(default)]
    pub callback_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// POST /api/dispatch — forward an investigation request to the entry
/// webhook and tell the remote agent where to send the result.
///
/// Remote non-2xx becomes a 502 relaying the remote status and body;
/// failure to connect becomes a 500. Neither is retried.
pub async fn dispatch_form(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DispatchRequest>,
) -> Result<Response, AppError> {
    let form = body.form.ok_or(BriefingError::MissingForm)?;

    let entry_webhook = non_blank(body.entry_webhook.as_deref())
        .or_else(|| app.config.entry_webhook_url.clone())
        .ok_or(BriefingError::NoEntryWebhook)?;

    let callback_url = non_blank(body.callback_url.as_deref())
        .or_else(|| derive_callback_url(&headers))
        .or_else(|| app.config.results_callback_url.clone())
        .ok_or(BriefingError::NoCallbackUrl)?;

    let envelope = json!({
        "request": [form],
        "callbackUrl": callback_url,
        "requestedAt": Utc::now(),
        "ui": app.config.ui_tag,
    });

    tracing::info!(webhook = %entry_webhook, "forwarding investigation request");

    let forwarded = app
        .http
        .post(&entry_webhook)
        .json(&envelope)
        .send()
        .await
        .map_err(|e| BriefingError::Upstream(e.to_string()))?;

    let status = forwarded.status();
    let raw = forwarded
        .text()
        .await
        .map_err(|e| BriefingError::Upstream(e.to_string()))?;
    // The remote webhook may answer with plain text; relay it as-is then.
    let relayed: Value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "remote webhook rejected dispatch");
        let body = json!({
            "error": "remote webhook returned an error",
            "status": status.as_u16(),
            "body": relayed,
        });
        return Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response());
    }

    Ok(Json(json!({
        "ok": true,
        "forwardedTo": entry_webhook,
        "callbackUrl": callback_url,
        "response": relayed,
    }))
    .into_response())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_blank(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Callback URL derived from the dispatching request: scheme and host of the
/// first of `origin`, `referer`, `x-forwarded-host`, joined with the results
/// path. Bare hosts are assumed to be behind TLS.
fn derive_callback_url(headers: &HeaderMap) -> Option<String> {
    let origin = ["origin", "referer", "x-forwarded-host"]
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))?;

    let base = if origin.starts_with("http") {
        origin.to_string()
    } else {
        format!("https://{origin}")
    };

    let (scheme, rest) = base.split_once("://")?;
    let host = rest.split('/').next()?;
    if host.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{host}{RESULTS_PATH}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        map
    }

    #[test]
    fn non_blank_trims_and_rejects_empty() {
        assert_eq!(non_blank(Some("  x  ")).as_deref(), Some("x"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn callback_derives_from_origin() {
        let h = headers(&[("origin", "https://ops.example.com")]);
        assert_eq!(
            derive_callback_url(&h).as_deref(),
            Some("https://ops.example.com/api/results")
        );
    }

    #[test]
    fn referer_path_is_replaced() {
        let h = headers(&[("referer", "http://ops.example.com/some/page?x=1")]);
        assert_eq!(
            derive_callback_url(&h).as_deref(),
            Some("http://ops.example.com/api/results")
        );
    }

    #[test]
    fn bare_forwarded_host_gets_https() {
        let h = headers(&[("x-forwarded-host", "relay.example.com")]);
        assert_eq!(
            derive_callback_url(&h).as_deref(),
            Some("https://relay.example.com/api/results")
        );
    }

    #[test]
    fn origin_wins_over_forwarded_host() {
        let h = headers(&[
            ("origin", "https://a.example.com"),
            ("x-forwarded-host", "b.example.com"),
        ]);
        assert_eq!(
            derive_callback_url(&h).as_deref(),
            Some("https://a.example.com/api/results")
        );
    }

    #[test]
    fn no_origin_headers_yields_none() {
        assert_eq!(derive_callback_url(&HeaderMap::new()), None);
    }

    #[test]
    fn dispatch_request_accepts_camel_case_overrides() {
        let req: DispatchRequest = serde_json::from_value(json!({
            "form": { "Nombre de la persona": "Ana Pérez" },
            "entryWebhook": "https://hooks.example.com/entry",
            "callbackUrl": "https://ops.example.com/api/results"
        }))
        .unwrap();
        assert!(req.form.is_some());
        assert_eq!(
            req.entry_webhook.as_deref(),
            Some("https://hooks.example.com/entry")
        );
        assert_eq!(
            req.callback_url.as_deref(),
            Some("https://ops.example.com/api/results")
        );
    }
}
