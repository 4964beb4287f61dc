//! Minimal Redis server implementation.
//!
//! Provides an async `run` function that listens for inbound connections,
//! spawning a task per connection.

use crate::config::Config;
use crate::connection;
use crate::persist::Persister;
use crate::utils::resp_unknown;
use crate::{Connection, Db, DbDropGuard, Frame, Shutdown};

use bytes::Bytes;
use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::io::AsyncReadExt;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};

/// Maximum number of concurrent connections the server will accept.
///
/// When this limit is reached, the server will stop accepting connections
/// until an active connection terminates.
const MAX_CONNECTIONS: usize = 5000;

/// Server listener state. Created in the `run` call. It includes a `run`
/// method which performs the TCP listening and initialization of
/// per-connection state.
struct Listener {
    /// Shared database handle, cloned into every connection handler.
    db: Db,

    /// TCP listener supplied by the `run` caller.
    listener: TcpListener,

    /// Limit the max number of connections.
    ///
    /// A `Semaphore` is used to limit the max number of connections. Before
    /// attempting to accept a new connection, a permit is acquired from the
    /// semaphore. If none are available, the listener waits for one.
    limit_connections: Arc<Semaphore>,

    /// Broadcasts a shutdown signal to all active connections.
    ///
    /// The initial `shutdown` trigger is provided by the `run` caller. The
    /// server is responsible for gracefully shutting down active connections.
    /// When a connection task is spawned, it is passed a broadcast receiver
    /// handle. When a graceful shutdown is initiated, a `()` value is sent via
    /// the broadcast::Sender. Each active connection receives it, reaches a
    /// safe terminal state, and completes the task.
    notify_shutdown: broadcast::Sender<()>,

    /// Used as part of the graceful shutdown process to wait for client
    /// connections to complete processing.
    ///
    /// Tokio channels are closed once all `Sender` handles go out of scope.
    /// When a channel is closed, the receiver receives `None`. This is
    /// leveraged to detect all connection handlers completing. When a
    /// connection handler is initialized, it is assigned a clone of
    /// `shutdown_complete_tx`. When the listener shuts down, it drops the
    /// sender held by this `shutdown_complete_tx` field. Once all handler
    /// tasks complete, all clones of the `Sender` are also dropped. This
    /// results in `shutdown_complete_rx.recv()` completing with `None`. At
    /// this point, it is safe to exit the server process.
    shutdown_complete_rx: mpsc::Receiver<()>,
    shutdown_complete_tx: mpsc::Sender<()>,
}

/// Per-connection handler. Reads requests from `connection` and round-trips
/// the commands through `db`.
struct Handler {
    db: Db,

    connection: Connection,

    /// Listen for shutdown notifications.
    shutdown: Shutdown,

    /// Not used directly. Instead, when `Handler` is dropped...?
    _shutdown_complete: mpsc::Sender<()>,
}

/// Run the carmine server.
///
/// Builds the persistence engine and the store's writer task, replays the
/// append log through the regular dispatch path, then accepts connections
/// from the supplied listener until the `shutdown` future completes. At that
/// point the server shuts down gracefully: connections drain first, then the
/// writer task, and last the persister with its final fsync.
pub async fn run(listener: TcpListener, config: Config, shutdown: impl Future) -> crate::Result<()> {
    let persister = Arc::new(Persister::new(&config.aof).await?);
    let db_holder = DbDropGuard::new(persister.clone());

    load_aof(&db_holder.db(), &persister).await?;

    // When the provided `shutdown` future completes, we must send a shutdown
    // message to all active connections. We use a broadcast channel for this
    // purpose. The call below ignores the receiver of the broadcast pair, and
    // when a receiver is needed, the subscribe() method on the sender is used
    // to create one.
    let (notify_shutdown, _) = broadcast::channel(1);
    let (shutdown_complete_tx, shutdown_complete_rx) = mpsc::channel(1);

    let mut server = Listener {
        listener,
        db: db_holder.db(),
        limit_connections: Arc::new(Semaphore::new(MAX_CONNECTIONS)),
        notify_shutdown,
        shutdown_complete_tx,
        shutdown_complete_rx,
    };

    tokio::select! {
        res = server.run() => {
            // If an error is received here, accepting connections from the TCP
            // listener failed multiple times and the server is giving up and
            // shutting down.
            //
            // Errors encountered when handling individual connections do not
            // bubble up to this point.
            if let Err(err) = res {
                error!(cause = %err, "failed to accept");
            }
        }
        _ = shutdown => {
            // The shutdown signal has been received.
            info!("shutting down");
        }
    }

    // Extract the `shutdown_complete` receiver and transmitter
    // explicitly drop `shutdown_transmitter`. This is important, as the
    // `.await` below would otherwise never complete.
    let Listener {
        mut shutdown_complete_rx,
        shutdown_complete_tx,
        notify_shutdown,
        ..
    } = server;

    // When `notify_shutdown` is dropped, all tasks which have `subscribe`d
    // will receive the shutdown signal and can exit
    drop(notify_shutdown);
    // Drop final `Sender` so the `Receiver` below can complete
    drop(shutdown_complete_tx);

    // Wait for all active connections to finish processing.
    let _ = shutdown_complete_rx.recv().await;

    // Connections are gone; stop the writer task, then the persister. The
    // order matters: closing the writer drops the store's handle on the
    // persister, which lets the append loop run dry and fsync one last time.
    db_holder.shutdown().await;
    if let Ok(persister) = Arc::try_unwrap(persister) {
        persister.close().await;
    }

    Ok(())
}

/// Replay the append log through the regular dispatch path, with the loading
/// flag raised so nothing gets re-recorded. Replies are discarded the same way
/// the source of the log discarded them when it first ran the commands.
async fn load_aof(db: &Db, persister: &Persister) -> crate::Result<()> {
    let mut file = match persister.reloader().await? {
        Some(file) => file,
        None => return Ok(()),
    };

    let mut contents = Vec::new();
    file.read_to_end(&mut contents).await?;

    let mut cursor = Cursor::new(&contents[..]);
    let mut replayed = 0u64;

    while (cursor.position() as usize) < contents.len() {
        let start = cursor.position();

        if let Err(err) = Frame::check(&mut cursor) {
            // A torn tail happens when the process died mid-append; anything
            // else means the log is corrupt from here on. Either way the
            // records already replayed stand.
            warn!(cause = %err, "stopping append log replay early");
            break;
        }

        cursor.set_position(start);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(cause = %err, "stopping append log replay early");
                break;
            }
        };

        if let Some(argv) = frame_to_argv(frame) {
            let _ = db.execute(argv, true).await;
            replayed += 1;
        }
    }

    if replayed > 0 {
        info!(commands = replayed, "append log replayed");
    }
    Ok(())
}

/// Flatten a request frame into its argument vector.
///
/// Requests must be arrays; within one, elements that are not bulk strings
/// are silently skipped.
fn frame_to_argv(frame: Frame) -> Option<Vec<Bytes>> {
    match frame {
        Frame::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Frame::Bulk(bytes) => Some(bytes),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

impl Listener {
    /// Run the server
    ///
    /// Listen for inbound connections. For each inbound connection, spawn a
    /// task to process that connection.
    ///
    /// # Errors
    ///
    /// Returns `Err` if accepting returns an error. This can happen for a
    /// number reasons that resolve over time. For example, if the underlying
    /// operating system has reached an internal limit for max number of
    /// sockets, accept will fail.
    ///
    /// The process is not able to detect when a transient error resolves
    /// itself. One strategy for handling this is to implement a back off
    /// strategy, which is what we do here.
    async fn run(&mut self) -> crate::Result<()> {
        info!("accepting inbound connections");

        loop {
            // Wait for a permit to become available.
            let permit = self
                .limit_connections
                .clone()
                .acquire_owned()
                .await
                .unwrap();

            // Accept a new socket. This will attempt to perform error handling.
            // The `accept` method internally attempts to recover errors, so an
            // error here is non-recoverable.
            let socket = self.accept().await?;

            // Create the necessary per-connection handler state.
            let mut handler = Handler {
                db: self.db.clone(),
                connection: Connection::new(socket),
                shutdown: Shutdown::new(self.notify_shutdown.subscribe()),
                _shutdown_complete: self.shutdown_complete_tx.clone(),
            };

            // Spawn a new task to process the connections. Tokio tasks are like
            // asynchronous green threads and are executed concurrently.
            tokio::spawn(async move {
                // Process the connection. If an error is encountered, log it.
                if let Err(err) = handler.run().await {
                    error!(cause = %err, "connection error");
                }
                // Move the permit into the task and drop it after completion.
                // This returns the permit back to the semaphore.
                drop(permit);
            });
        }
    }

    /// Accept an inbound connection.
    ///
    /// Errors are handled by backing off and retrying. An exponential backoff
    /// strategy is used. After the first failure, the task waits for 1 second.
    /// After the second failure, the task waits for 2 seconds. Each subsequent
    /// failure doubles the wait time. If accepting fails on the 6th try after
    /// waiting for 64 seconds, then this function returns with an error.
    async fn accept(&mut self) -> crate::Result<TcpStream> {
        let mut backoff = 1;

        // Try to accept a few times
        loop {
            // Perform the accept operation. If a socket is successfully
            // accepted, return it. Otherwise, save the error.
            match self.listener.accept().await {
                Ok((socket, _)) => return Ok(socket),
                Err(err) => {
                    warn!(cause = %err, "accept error");
                    if backoff > 64 {
                        // Accept has failed too many times. Return the error.
                        return Err(err.into());
                    }
                }
            }

            // Pause execution until the back off period elapses.
            time::sleep(Duration::from_secs(backoff)).await;

            // Double the back off
            backoff *= 2;
        }
    }
}

impl Handler {
    /// Process a single connection.
    ///
    /// Request frames are read from the socket and processed. Responses are
    /// written back to the socket.
    ///
    /// Pipelining is handled naturally: requests queue in the read buffer and
    /// are served one at a time, so replies always come back in request order.
    ///
    /// When the shutdown signal is received, the connection is processed until
    /// it reaches a safe state, at which point it is terminated.
    async fn run(&mut self) -> crate::Result<()> {
        // As long as the shutdown signal has not been received, try to read a
        // new request frame.
        while !self.shutdown.is_shutdown() {
            // While reading a request frame, also listen for the shutdown
            // signal.
            let res = tokio::select! {
                res = self.connection.read_frame() => res,
                _ = self.shutdown.recv() => {
                    // If a shutdown signal is received, return from `run`.
                    // This will result in the task terminating.
                    return Ok(());
                }
            };

            let maybe_frame = match res {
                Ok(maybe_frame) => maybe_frame,
                Err(connection::Error::Protocol(msg)) => {
                    // A malformed frame poisons only itself; answer with an
                    // error and keep serving the connection.
                    debug!(%msg, "request parse error");
                    self.connection
                        .write_frame(&Frame::Error(format!("ERR {}", msg)))
                        .await?;
                    continue;
                }
                Err(connection::Error::Io(err)) => return Err(err.into()),
            };

            // If `None` is returned from `read_frame()` then the peer closed
            // the socket. There is no further work to do and the task can be
            // terminated.
            let frame = match maybe_frame {
                Some(frame) => frame,
                None => return Ok(()),
            };

            debug!(?frame, "request");

            // A request must be a multi-bulk frame; anything else is logged
            // and skipped rather than dispatched.
            let argv = match frame_to_argv(frame) {
                Some(argv) => argv,
                None => {
                    warn!("request is not a multi-bulk frame");
                    continue;
                }
            };

            let reply = match self.db.execute(argv, false).await {
                Some(reply) => reply,
                // The writer task is gone; all that is left is the sentinel.
                None => resp_unknown(),
            };

            debug!(?reply, "response");

            self.connection.write_frame(&reply).await?;
        }

        Ok(())
    }
}
