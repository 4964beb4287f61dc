//! The database facade handed to connection handlers.
//!
//! `Db` frames a validated command line, hands it to the writer task and
//! blocks on the per-call reply channel. `DbDropGuard` owns the writer task
//! itself, so the task's lifetime is tied to one value rather than to
//! whichever clone happens to drop last.

use crate::cmd::{parse_string, Command};
use crate::executor::{self, Request};
use crate::persist::Persister;
use crate::store::Store;
use crate::utils::resp_err;
use crate::Frame;

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Owner of the writer task. `shutdown` tears the task down and waits for it;
/// merely dropping the guard closes the ingress channel, which stops the task
/// as soon as in-flight requests have drained.
pub struct DbDropGuard {
    db: Db,
    handle: JoinHandle<()>,
}

/// A cloneable handle on the database, one per connection.
#[derive(Clone)]
pub struct Db {
    tx: mpsc::Sender<Request>,
}

impl DbDropGuard {
    pub fn new(persister: Arc<Persister>) -> DbDropGuard {
        let store = Store::new(persister);
        let (tx, handle) = executor::spawn(store);

        DbDropGuard {
            db: Db { tx },
            handle,
        }
    }

    /// Get the shared database handle.
    pub fn db(&self) -> Db {
        self.db.clone()
    }

    /// Close the ingress channel and wait for the writer task to finish its
    /// in-flight work and drop the store.
    pub async fn shutdown(self) {
        let DbDropGuard { db, handle } = self;
        drop(db);
        let _ = handle.await;
    }
}

impl Db {
    /// Round-trip one command line through the writer task.
    ///
    /// A line must carry a command name and at least one argument. The name is
    /// lower-cased for lookup; a name that is not a command is answered here
    /// without dispatching anything. `None` means the writer task is gone and
    /// the caller should fall back to the unknown-error sentinel.
    pub async fn execute(&self, argv: Vec<Bytes>, loading: bool) -> Option<Frame> {
        if argv.len() < 2 {
            return Some(resp_err("ERR invalid command line"));
        }

        let name = parse_string(&argv[0]).to_lowercase();
        let cmd = match Command::from_argv(&name, &argv[1..]) {
            Some(cmd) => cmd,
            None => return Some(Frame::Error(format!("ERR unknown command '{}'", name))),
        };

        let (reply_to, reply) = oneshot::channel();
        let request = Request {
            cmd,
            loading,
            reply_to,
        };

        if self.tx.send(request).await.is_err() {
            return None;
        }

        reply.await.ok()
    }
}
