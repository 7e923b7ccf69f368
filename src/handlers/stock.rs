use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::services::consoles::CategoryStock;
use crate::{ApiResponse, ApiResult, AppState};

/// Available and total units per category
#[utoipa::path(
    get,
    path = "/api/stock",
    responses(
        (status = 200, description = "Stock per category", body = Vec<CategoryStock>)
    ),
    tag = "Stock"
)]
pub async fn stock_summary(State(state): State<AppState>) -> ApiResult<Vec<CategoryStock>> {
    let summary = state.services.consoles.stock_summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Streams unit status changes as server-sent events.
///
/// Each client gets its own subscription; it is dropped with the response
/// stream when the client goes away.
pub async fn stock_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let receiver = state.stock_feed.subscribe();
    debug!(
        subscribers = state.stock_feed.subscriber_count(),
        "stock feed subscriber joined"
    );

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(change) => match SseEvent::default().event("unit_status").json_data(&change) {
                    Ok(event) => return Some((Ok(event), receiver)),
                    Err(e) => warn!(error = %e, "failed to encode stock change"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    // clients re-sync from GET /api/stock
                    let event = SseEvent::default()
                        .event("lagged")
                        .data(skipped.to_string());
                    return Some((Ok(event), receiver));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
