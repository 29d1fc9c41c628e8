//! Push stream of broadcaster events

use async_stream::stream;
use axum::{
    Extension,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use common::error::EmitError;
use futures_util::stream::Stream;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{AppState, models::CurrentUser};

/// Establish a long-lived event stream for a signed-in staff member.
///
/// The connection is registered with the broadcaster for as long as the
/// stream lives; dropping the stream, for whatever reason, unregisters it.
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Result<Event, Infallible>>();

    let subscription = state
        .broadcaster
        .subscribe(move |name: &str, data: &str| -> Result<(), EmitError> {
            tx.send(Ok(Event::default().event(name).data(data)))
                .map_err(|_| EmitError::Closed)
        });

    debug!(
        "Event stream {} opened for user {}",
        subscription.id(),
        current.user.id
    );

    let stream = stream! {
        let _subscription = subscription;
        while let Some(event) = rx.recv().await {
            yield event;
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.config.sse_keep_alive()))
}
