//! Key expiry: the lazy per-dispatch check, the periodic sweep, and the two
//! expiry commands.
//!
//! The wheel indexes expiry unix-seconds → key, so the sweep is a single
//! range scan of `[0, now]` instead of a walk over the whole key space.

use crate::store::Store;
use crate::utils::{
    now_timestamp_in_seconds, resp_invalid_expire_err, resp_ok, resp_syntax_err,
    timestamp_from_seconds,
};
use crate::Frame;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};

impl Store {
    /// Drop every key whose expiry has passed. Driven by the executor's
    /// one-minute tick.
    pub(crate) fn gc(&mut self) {
        let now = now_timestamp_in_seconds();
        for key in self.expire_wheel.range(0, now) {
            self.expire_process(&key);
        }
    }

    /// Called right before a command is dispatched: if its key holds an
    /// expired entry, delete it so the operation never observes it.
    pub(crate) fn expire_preprocess(&mut self, key: &str) {
        match self.expire_at.get(key) {
            None => return,
            Some(at) if *at > Utc::now() => return,
            Some(_) => {}
        }

        self.expire_process(key);
    }

    /// Remove `key` and both of its expiry index rows.
    pub(crate) fn expire_process(&mut self, key: &str) {
        self.expire_at.remove(key);
        self.data.remove(key);
        self.expire_wheel.rem(key);
    }

    /// `EXPIRE key seconds`: a relative ttl, persisted in its absolute form so
    /// replay is independent of when it runs.
    pub(crate) async fn expire(&mut self, key: &str, ttl: i64, loading: bool) -> Frame {
        if ttl <= 0 {
            return resp_invalid_expire_err();
        }

        let at = Utc::now() + Duration::seconds(ttl);
        self.expire_at_absolute(key, at, loading).await
    }

    /// `EXPIREAT key unix-seconds`. A time already in the past is an error,
    /// except while replaying the log: there it means the key expired before
    /// the log was cut, so it is dropped on the spot.
    pub(crate) async fn expire_at(&mut self, key: &str, at_secs: i64, loading: bool) -> Frame {
        let at = match timestamp_from_seconds(at_secs) {
            Some(at) => at,
            None => return resp_syntax_err(),
        };

        if at < Utc::now() {
            if loading {
                self.expire_process(key);
                return resp_ok();
            }
            return resp_invalid_expire_err();
        }

        self.expire_at_absolute(key, at, loading).await
    }

    async fn expire_at_absolute(&mut self, key: &str, at: DateTime<Utc>, loading: bool) -> Frame {
        self.apply_expire(key, at);

        let record = vec![
            Bytes::from_static(b"expireat"),
            Bytes::copy_from_slice(key.as_bytes()),
            Bytes::from(at.timestamp().to_string()),
        ];
        self.persist(loading, record).await;

        resp_ok()
    }

    /// Index `key` for expiry at `at`. A missing key is left untouched so the
    /// indices never point at non-existent data.
    pub(crate) fn apply_expire(&mut self, key: &str, at: DateTime<Utc>) {
        if !self.data.contains_key(key) {
            return;
        }

        self.expire_at.insert(key.to_string(), at);
        self.expire_wheel.add(at.timestamp(), key);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::empty_store;
    use super::*;

    async fn store_with_key(key: &str) -> Store {
        let mut store = empty_store();
        store
            .set(key, Bytes::from_static(b"v"), false, None, vec![], false)
            .await;
        store
    }

    #[tokio::test]
    async fn expire_indexes_live_keys_coherently() {
        let mut store = store_with_key("k").await;
        let reply = store.expire("k", 100, false).await;
        assert_eq!(reply, resp_ok());

        let at = store.expire_at["k"];
        assert_eq!(
            store.expire_wheel.range(at.timestamp(), at.timestamp()),
            vec!["k"]
        );
    }

    #[tokio::test]
    async fn expire_missing_key_is_ok_but_unindexed() {
        let mut store = empty_store();
        assert_eq!(store.expire("ghost", 100, false).await, resp_ok());
        assert!(store.expire_at.is_empty());
        assert!(store.expire_wheel.range(0, i64::MAX).is_empty());
    }

    #[tokio::test]
    async fn non_positive_ttl_is_rejected() {
        let mut store = store_with_key("k").await;
        assert_eq!(store.expire("k", 0, false).await, resp_invalid_expire_err());
        assert_eq!(store.expire("k", -5, false).await, resp_invalid_expire_err());
    }

    #[tokio::test]
    async fn past_expireat_rejected_live_but_deletes_while_loading() {
        let past = Utc::now().timestamp() - 10;

        let mut store = store_with_key("k").await;
        assert_eq!(
            store.expire_at("k", past, false).await,
            resp_invalid_expire_err()
        );
        assert_ne!(store.get("k"), Frame::Null);

        assert_eq!(store.expire_at("k", past, true).await, resp_ok());
        assert_eq!(store.get("k"), Frame::Null);
    }

    #[tokio::test]
    async fn preprocess_drops_expired_entry() {
        let mut store = store_with_key("k").await;
        let past = Utc::now() - Duration::seconds(5);
        store.expire_at.insert("k".to_string(), past);
        store.expire_wheel.add(past.timestamp(), "k");

        store.expire_preprocess("k");
        assert_eq!(store.get("k"), Frame::Null);
        assert!(store.expire_at.is_empty());
        assert!(store.expire_wheel.range(0, i64::MAX).is_empty());
    }

    #[tokio::test]
    async fn gc_sweeps_expired_keys() {
        let mut store = store_with_key("old").await;
        store
            .set("fresh", Bytes::from_static(b"v"), false, None, vec![], false)
            .await;

        let past = Utc::now() - Duration::seconds(5);
        store.expire_at.insert("old".to_string(), past);
        store.expire_wheel.add(past.timestamp(), "old");
        store.expire("fresh", 1000, false).await;

        store.gc();
        assert_eq!(store.get("old"), Frame::Null);
        assert_ne!(store.get("fresh"), Frame::Null);
    }
}
