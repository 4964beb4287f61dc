use crate::config::{AofConfig, AppendFsync};
use crate::Frame;

use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tracing::{error, info, warn};

/// Capacity of the append buffer between the executor and the writer task.
const APPEND_BUFFER_SIZE: usize = 1024;

/// What flows from the store to the writer task.
///
/// Compactions travel on the same channel as the records so the writer applies
/// them at exactly their position in the log order; a record enqueued before
/// the snapshot was taken can never end up appended after the snapshot's file.
enum AofEvent {
    Record(Vec<Bytes>),
    Rewrite(Vec<Vec<Bytes>>),
}

/// The append-only-file engine.
///
/// One writer task drains the append buffer in order. The file handle is
/// shared under a mutex with the `everysec` fsync ticker and swapped in place
/// when a compaction replaces the file.
pub struct AofPersister {
    tx: mpsc::Sender<AofEvent>,

    path: PathBuf,

    /// Records appended since the last compaction. Compaction triggers when it
    /// reaches `rewrite_after`; a value below 2 disables compaction.
    rewrite_after: i64,
    counter: AtomicI64,

    /// Dropping the sender stops the fsync ticker.
    _notify_shutdown: broadcast::Sender<()>,

    handle: JoinHandle<()>,
}

impl AofPersister {
    pub(crate) async fn new(config: &AofConfig) -> crate::Result<AofPersister> {
        let path = PathBuf::from(&config.filename);
        let file = open_append(&path).await?;
        let file = Arc::new(Mutex::new(file));

        let (tx, rx) = mpsc::channel(APPEND_BUFFER_SIZE);
        let (notify_shutdown, _) = broadcast::channel(1);

        if config.append_fsync == AppendFsync::Everysec {
            tokio::spawn(fsync_every_second(
                file.clone(),
                notify_shutdown.subscribe(),
            ));
        }

        let handle = tokio::spawn(run(rx, file, path.clone(), config.append_fsync));

        let rewrite_after = if config.is_rewrite && config.aof_rewrite_interval > 1 {
            config.aof_rewrite_interval
        } else {
            0
        };

        Ok(AofPersister {
            tx,
            path,
            rewrite_after,
            counter: AtomicI64::new(0),
            _notify_shutdown: notify_shutdown,
            handle,
        })
    }

    /// Queue one record. Returns `true` when the rewrite threshold was crossed
    /// by this record.
    pub(crate) async fn append(&self, record: Vec<Bytes>) -> bool {
        if self.tx.send(AofEvent::Record(record)).await.is_err() {
            // Writer is gone; nothing left to count either.
            return false;
        }

        if self.rewrite_after < 2 {
            return false;
        }

        let ticked = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        if ticked < self.rewrite_after {
            return false;
        }

        // Threshold reached: pay it down and ask the caller for a snapshot.
        self.counter.fetch_sub(self.rewrite_after, Ordering::Relaxed);
        true
    }

    pub(crate) async fn schedule_rewrite(&self, cmds: Vec<Vec<Bytes>>) {
        if self.tx.send(AofEvent::Rewrite(cmds)).await.is_err() {
            warn!("aof writer gone, dropping rewrite");
        }
    }

    pub(crate) async fn reloader(&self) -> crate::Result<File> {
        let file = File::open(&self.path).await?;
        Ok(file)
    }

    /// Close the append channel and wait for the writer's final fsync.
    pub(crate) async fn close(self) {
        let AofPersister { tx, handle, .. } = self;
        drop(tx);
        if let Err(e) = handle.await {
            error!(cause = %e, "aof writer task failed");
        }
        info!("aof persister closed");
    }
}

async fn open_append(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.append(true).create(true).read(true);

    #[cfg(unix)]
    options.mode(0o600);

    options.open(path).await
}

/// The writer task: drain the buffer in order until the channel closes, then
/// fsync one last time.
async fn run(
    mut rx: mpsc::Receiver<AofEvent>,
    file: Arc<Mutex<File>>,
    path: PathBuf,
    policy: AppendFsync,
) {
    while let Some(event) = rx.recv().await {
        match event {
            AofEvent::Record(record) => write_record(&file, &record, policy).await,
            AofEvent::Rewrite(cmds) => {
                if let Err(e) = rewrite(&file, &path, cmds).await {
                    error!(cause = %e, "aof rewrite failed");
                }
            }
        }
    }

    if let Err(e) = file.lock().await.sync_all().await {
        error!(cause = %e, "final aof fsync failed");
    }
}

async fn write_record(file: &Arc<Mutex<File>>, record: &[Bytes], policy: AppendFsync) {
    let encoded = encode_record(record);

    let mut file = file.lock().await;
    if let Err(e) = file.write_all(&encoded).await {
        error!(cause = %e, "aof append failed");
        return;
    }

    if policy != AppendFsync::Always {
        return;
    }

    if let Err(e) = file.sync_all().await {
        error!(cause = %e, "aof fsync failed");
    }
}

async fn fsync_every_second(file: Arc<Mutex<File>>, mut shutdown: broadcast::Receiver<()>) {
    let mut interval = time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = shutdown.recv() => return,
            _ = interval.tick() => {
                if let Err(e) = file.lock().await.sync_all().await {
                    error!(cause = %e, "aof fsync failed");
                }
            }
        }
    }
}

/// Replace the log with the minimal command set recreating live state.
///
/// The snapshot is written to a sibling temp file and fsynced before an atomic
/// `rename` over the live path; the shared handle is swapped under the mutex,
/// so concurrent fsyncs keep hitting a valid file on every path out of here.
async fn rewrite(
    file: &Arc<Mutex<File>>,
    path: &Path,
    cmds: Vec<Vec<Bytes>>,
) -> std::io::Result<()> {
    let tmp_path = path.with_extension("rewrite");

    let result = write_snapshot(&tmp_path, &cmds).await;
    if let Err(e) = result {
        // Do not leave a half-written snapshot behind.
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }

    let mut guard = file.lock().await;
    tokio::fs::rename(&tmp_path, path).await?;
    *guard = open_append(path).await?;

    info!(commands = cmds.len(), "aof rewritten");
    Ok(())
}

async fn write_snapshot(tmp_path: &Path, cmds: &[Vec<Bytes>]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    options.mode(0o600);

    let mut tmp = options.open(tmp_path).await?;

    for cmd in cmds {
        tmp.write_all(&encode_record(cmd)).await?;
    }

    tmp.sync_all().await
}

/// RESP multi-bulk encoding of one `[name, arg1, …]` record, the unit the log
/// file is a concatenation of.
fn encode_record(record: &[Bytes]) -> Vec<u8> {
    let mut frame = Frame::array();
    for arg in record {
        frame.push_bulk(arg.clone());
    }
    frame.encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AofConfig;

    fn test_config(dir: &tempfile::TempDir, fsync: AppendFsync) -> AofConfig {
        AofConfig {
            is_enable: true,
            filename: dir
                .path()
                .join("test.aof")
                .to_string_lossy()
                .into_owned(),
            append_fsync: fsync,
            is_rewrite: false,
            aof_rewrite_interval: 0,
        }
    }

    fn record(args: &[&'static str]) -> Vec<Bytes> {
        args.iter()
            .map(|a| Bytes::from_static(a.as_bytes()))
            .collect()
    }

    #[test]
    fn record_encoding_is_resp_multi_bulk() {
        let encoded = encode_record(&record(&["set", "foo", "bar"]));
        assert_eq!(
            encoded,
            b"*3\r\n$3\r\nset\r\n$3\r\nfoo\r\n$3\r\nbar\r\n".to_vec()
        );
    }

    #[tokio::test]
    async fn append_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let aof = AofPersister::new(&test_config(&dir, AppendFsync::Always))
            .await
            .unwrap();

        assert!(!aof.append(record(&["set", "foo", "bar"])).await);
        assert!(!aof.append(record(&["lpush", "ls", "1", "2"])).await);
        aof.close().await;

        let contents = tokio::fs::read(dir.path().join("test.aof")).await.unwrap();
        let expected = [
            encode_record(&record(&["set", "foo", "bar"])),
            encode_record(&record(&["lpush", "ls", "1", "2"])),
        ]
        .concat();
        assert_eq!(contents, expected);
    }

    #[tokio::test]
    async fn rewrite_replaces_log_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir, AppendFsync::No);
        config.is_rewrite = true;
        config.aof_rewrite_interval = 2;
        let aof = AofPersister::new(&config).await.unwrap();

        assert!(!aof.append(record(&["set", "a", "1"])).await);
        // Second record crosses the threshold.
        assert!(aof.append(record(&["set", "a", "2"])).await);
        aof.schedule_rewrite(vec![record(&["set", "a", "2"])]).await;
        aof.close().await;

        let contents = tokio::fs::read(dir.path().join("test.aof")).await.unwrap();
        assert_eq!(contents, encode_record(&record(&["set", "a", "2"])));
    }
}
