use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use briefing_core::store::ResultEntry;
use tokio::time::{interval_at, Instant};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::{Stream, StreamExt as _};

use crate::state::AppState;

/// GET /api/results/stream — SSE feed of result entries.
///
/// Frame order per connection: chronological replay of the buffered history,
/// one `heartbeat: connected` marker, then live entries interleaved with
/// `heartbeat: ping` frames at the configured period. Snapshot and
/// subscription come from a single `watch()` call, so an entry landing
/// during connect shows up in exactly one of replay and live.
///
/// Teardown is drop-driven: when the client disconnects, axum drops the
/// stream, which drops the broadcast receiver and the heartbeat interval.
pub async fn stream_results(
    State(app): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (snapshot, rx) = app.store.watch();
    let heartbeat_period = app.config.heartbeat_period;

    let replay: Vec<Event> = snapshot
        .into_iter()
        .rev()
        .filter_map(|entry| entry_event(&entry))
        .chain(std::iter::once(heartbeat("connected")))
        .collect();

    let live = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(entry) => entry_event(&entry),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!("stream client lagged, skipped {skipped} entries");
            None
        }
    });

    // First tick one full period after connect; the "connected" marker
    // already covers time zero.
    let heartbeats =
        IntervalStream::new(interval_at(Instant::now() + heartbeat_period, heartbeat_period))
            .map(|_| heartbeat("ping"));

    let stream = tokio_stream::iter(replay)
        .chain(live.merge(heartbeats))
        .map(Ok::<Event, Infallible>);

    Sse::new(stream)
}

fn heartbeat(marker: &str) -> Event {
    Event::default().event("heartbeat").data(marker)
}

/// Serialize one entry into a `data:` frame. Serialization failure skips the
/// frame instead of tearing down the connection.
fn entry_event(entry: &ResultEntry) -> Option<Event> {
    match Event::default().json_data(entry) {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::warn!(entry_id = %entry.id, "skipping unserializable entry: {err}");
            None
        }
    }
}
