//! Incremental "typing" reveal of a reply.

use async_stream::stream;
use futures_util::Stream;
use log::debug;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Every prefix of `text` that the reveal shows, shortest first: one more
/// character each.
fn frames(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.char_indices()
        .map(move |(start, c)| &text[..start + c.len_utf8()])
}

/// Yields growing prefixes of `text`, one character per `tick`.
///
/// A zero `tick` yields every frame immediately. The stream ends early,
/// without yielding the rest, once `cancel` fires.
pub fn reveal(
    text: String,
    tick: Duration,
    cancel: CancellationToken,
) -> impl Stream<Item = String> {
    stream! {
        let mut interval = (!tick.is_zero()).then(|| {
            let mut interval = time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        // The first tick of an interval completes immediately.
        if let Some(interval) = interval.as_mut() {
            interval.tick().await;
        }

        for frame in frames(&text) {
            let cancelled = match interval.as_mut() {
                Some(interval) => tokio::select! {
                    biased;
                    _ = cancel.cancelled() => true,
                    _ = interval.tick() => false,
                },
                None => cancel.is_cancelled(),
            };

            if cancelled {
                debug!("reveal cancelled before {} bytes", frame.len());
                break;
            }

            yield frame.to_owned();
        }
    }
}
