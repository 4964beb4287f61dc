//! The single writer task.
//!
//! Exactly one task owns the `Store` and serialises every command against it;
//! connection handlers reach it only through the ingress channel. That makes
//! the channel the linearisation point of the whole server: the observable
//! history is the order requests are received here, and no container state
//! ever needs a lock.

use crate::cmd::Command;
use crate::store::Store;
use crate::Frame;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};
use tracing::debug;

/// Interval between periodic sweeps of expired keys.
const GC_INTERVAL: Duration = Duration::from_secs(60);

/// A command in flight from a connection handler to the writer task, carrying
/// its single-use reply channel.
pub(crate) struct Request {
    pub(crate) cmd: Command,

    /// Set while replaying the append log: the command must not be
    /// re-recorded.
    pub(crate) loading: bool,

    pub(crate) reply_to: oneshot::Sender<Frame>,
}

/// Start the writer task for `store`.
///
/// The returned sender is the only way in; the task runs until every sender
/// is dropped. Each iteration serves either the expired-key sweep tick or one
/// request; a request's key is checked for a stale entry right before
/// dispatch so the operation never observes an expired value.
pub(crate) fn spawn(mut store: Store) -> (mpsc::Sender<Request>, JoinHandle<()>) {
    // Capacity 1: a handler hands its request straight to the writer and the
    // next one queues behind it.
    let (tx, mut rx) = mpsc::channel::<Request>(1);

    let handle = tokio::spawn(async move {
        let mut gc_tick = time::interval_at(Instant::now() + GC_INTERVAL, GC_INTERVAL);

        loop {
            tokio::select! {
                _ = gc_tick.tick() => store.gc(),
                request = rx.recv() => {
                    let request = match request {
                        Some(request) => request,
                        // Every handle to the database is gone.
                        None => break,
                    };

                    store.expire_preprocess(request.cmd.key());

                    debug!(cmd = request.cmd.get_name(), "dispatch");
                    let reply = request.cmd.apply(&mut store, request.loading).await;

                    // The caller may have hung up; a reply with no reader is
                    // not an error.
                    let _ = request.reply_to.send(reply);
                }
            }
        }

        debug!("executor stopped");
    });

    (tx, handle)
}
