//! Background unread-count poller.
//!
//! An explicit timer task with start/stop transitions driven by visibility
//! changes, exposed as a cancellable handle. While hidden the interval is
//! torn down entirely, so no request leaves the client; becoming visible
//! again fetches immediately and restarts the clock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::debug;

use crate::infrastructure::api::LibraryApi;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Cancellable handle to a running poller. Dropping it tears the task down;
/// the task also stops on an explicit [`PollerHandle::stop`].
pub struct PollerHandle {
    unread: watch::Receiver<u64>,
    visibility: watch::Sender<Visibility>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Latest published unread count; fetch failures publish zero.
    pub fn unread(&self) -> u64 {
        *self.unread.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.unread.clone()
    }

    /// Reports a visibility transition. Repeated reports of the current
    /// state are ignored, so only real hidden/visible edges reach the task.
    pub fn set_visibility(&self, visibility: Visibility) {
        self.visibility.send_if_modified(|current| {
            if *current == visibility {
                false
            } else {
                *current = visibility;
                true
            }
        });
    }

    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

/// Spawns the poller for one authenticated identity. An identity change
/// means stopping this poller and spawning a fresh one with the new token.
pub fn spawn<A: LibraryApi + 'static>(api: Arc<A>, token: String, period: Duration) -> PollerHandle {
    let (unread_tx, unread_rx) = watch::channel(0u64);
    let (visibility_tx, visibility_rx) = watch::channel(Visibility::Visible);
    let (stop_tx, stop_rx) = watch::channel(false);

    let task = tokio::spawn(run(api, token, period, unread_tx, visibility_rx, stop_rx));

    PollerHandle {
        unread: unread_rx,
        visibility: visibility_tx,
        stop: stop_tx,
        task,
    }
}

async fn run<A: LibraryApi>(
    api: Arc<A>,
    token: String,
    period: Duration,
    unread: watch::Sender<u64>,
    mut visibility: watch::Receiver<Visibility>,
    mut stop: watch::Receiver<bool>,
) {
    // Immediate fetch on start, then ticks every period while visible.
    fetch_and_publish(&*api, &token, &unread).await;
    let mut ticker = Some(interval_at(Instant::now() + period, period));

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            changed = visibility.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *visibility.borrow_and_update();
                match current {
                    Visibility::Hidden => {
                        debug!("poller suspended while hidden");
                        ticker = None;
                    }
                    Visibility::Visible => {
                        debug!("poller resumed");
                        fetch_and_publish(&*api, &token, &unread).await;
                        ticker = Some(interval_at(Instant::now() + period, period));
                    }
                }
            }
            _ = tick(&mut ticker), if ticker.is_some() => {
                fetch_and_publish(&*api, &token, &unread).await;
            }
        }

        // Every receiver gone means nobody can observe results anymore.
        if unread.is_closed() {
            break;
        }
    }

    debug!("poller stopped");
}

async fn tick(ticker: &mut Option<tokio::time::Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn fetch_and_publish<A: LibraryApi>(api: &A, token: &str, unread: &watch::Sender<u64>) {
    let count = match api.unread_count(token).await {
        Ok(count) => count,
        Err(e) => {
            // Soft failure: a missed poll is indistinguishable from no news.
            debug!(error = %e, "unread count fetch failed");
            0
        }
    };
    let _ = unread.send(count);
}
