use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::error::AppError;
use crate::signal_store::SignalRecord;
use crate::state::{AppState, ConnectionGuard};

/// GET /api/v1/signals/stream: SSE endpoint, one `signal` event per stored outcome.
pub async fn signal_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, AppError> {
    let max_sse = state.config.limits.max_sse_subscribers;
    let current = state.sse_subscriber_count.load(Ordering::Relaxed);
    if current >= max_sse {
        tracing::warn!(current, max = max_sse, "SSE subscriber limit reached");
        return Err(AppError::Unavailable(
            "SSE subscriber limit reached".to_string(),
        ));
    }

    let guard = ConnectionGuard::new(Arc::clone(&state.sse_subscriber_count));

    let store = state.signals.read().await;
    let rx = store.subscribe();
    drop(store);

    let stream = BroadcastStream::new(rx).filter_map(move |result: Result<SignalRecord, _>| {
        let _guard = &guard;
        match result {
            Ok(record) => {
                let json = serde_json::to_string(&record).unwrap_or_default();
                Some(Ok(SseEvent::default()
                    .event("signal")
                    .data(json)
                    .id(record.id.clone())))
            },
            Err(e) => {
                tracing::warn!("SSE broadcast receive error: {e}");
                None
            },
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
