//! Durability for the command stream.
//!
//! Every mutating command is recorded as its RESP multi-bulk encoding in an
//! append-only file, which is replayed through the regular dispatch path at
//! start-up. Persistence is best effort within the configured fsync policy:
//! write failures are logged, never surfaced to clients.

mod aof;

pub use aof::AofPersister;

use crate::config::AofConfig;

use bytes::Bytes;
use tokio::fs::File;

/// The persistence engine, either disabled or backed by an append-only file.
///
/// A disabled persister drops every record and reloads nothing, so the rest of
/// the system never needs to know whether durability is on.
pub enum Persister {
    Disabled,
    Aof(AofPersister),
}

impl Persister {
    pub async fn new(config: &AofConfig) -> crate::Result<Persister> {
        if !config.is_enable {
            return Ok(Persister::Disabled);
        }

        Ok(Persister::Aof(AofPersister::new(config).await?))
    }

    /// Queue one command record for the append log.
    ///
    /// Records produced while replaying the log itself (loading mode) are
    /// dropped. Returns `true` when this record crossed the configured
    /// rewrite threshold and the caller should schedule a compaction.
    pub(crate) async fn persist_cmd(&self, loading: bool, record: Vec<Bytes>) -> bool {
        match self {
            Persister::Disabled => false,
            Persister::Aof(aof) => {
                if loading {
                    return false;
                }
                aof.append(record).await
            }
        }
    }

    /// Queue a compaction carrying the minimal command set that recreates the
    /// current live state. It is written at its position in the record stream,
    /// so records that were queued before it land in the old file and records
    /// queued after it land in the new one.
    pub(crate) async fn schedule_rewrite(&self, cmds: Vec<Vec<Bytes>>) {
        if let Persister::Aof(aof) = self {
            aof.schedule_rewrite(cmds).await;
        }
    }

    /// Re-open the log for reading from the start. `None` when persistence is
    /// disabled.
    pub async fn reloader(&self) -> crate::Result<Option<File>> {
        match self {
            Persister::Disabled => Ok(None),
            Persister::Aof(aof) => Ok(Some(aof.reloader().await?)),
        }
    }

    /// Stop the append loop and wait for the final fsync.
    pub async fn close(self) {
        if let Persister::Aof(aof) = self {
            aof.close().await;
        }
    }
}
