use std::time::Duration;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Resolved runtime configuration, built from CLI flags / environment by the
/// server binary and handed to every handler through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret the external agent must present in `x-webhook-secret`
    /// when posting results. `None` disables the check.
    pub webhook_secret: Option<String>,
    /// Entry webhook the dispatch proxy forwards investigation requests to.
    /// There is deliberately no baked-in default: dispatching with neither
    /// this nor a per-request override fails with a clear error.
    pub entry_webhook_url: Option<String>,
    /// Fallback callback URL used when none can be derived from the
    /// dispatching request's origin headers.
    pub results_callback_url: Option<String>,
    /// Tag identifying this UI in the dispatch envelope.
    pub ui_tag: String,
    /// Maximum number of retained result entries; oldest are evicted first.
    pub result_cap: usize,
    /// Period between SSE heartbeat frames.
    pub heartbeat_period: Duration,
}

impl Config {
    pub const DEFAULT_RESULT_CAP: usize = 20;
    pub const DEFAULT_HEARTBEAT_SECS: u64 = 25;
    pub const DEFAULT_UI_TAG: &'static str = "Briefing Investigator";
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            entry_webhook_url: None,
            results_callback_url: None,
            ui_tag: Self::DEFAULT_UI_TAG.to_string(),
            result_cap: Self::DEFAULT_RESULT_CAP,
            heartbeat_period: Duration::from_secs(Self::DEFAULT_HEARTBEAT_SECS),
        }
    }
}
