use crate::ds::{StringEntity, Value};
use crate::store::Store;
use crate::utils::{resp_invalid_expire_err, resp_ok};
use crate::Frame;

use bytes::Bytes;
use chrono::{Duration, Utc};

impl Store {
    pub(crate) fn get(&self, key: &str) -> Frame {
        match self.get_str(key) {
            Err(reply) => reply,
            Ok(None) => Frame::Null,
            Ok(Some(s)) => Frame::Bulk(s.bytes()),
        }
    }

    /// Missing keys are reported as the literal bulk `(nil)`, keeping one
    /// reply element per requested key.
    pub(crate) fn mget(&self, keys: &[String]) -> Frame {
        let mut reply = Frame::array();
        for key in keys {
            match self.get_str(key) {
                Err(err) => return err,
                Ok(None) => reply.push_bulk(Bytes::from_static(b"(nil)")),
                Ok(Some(s)) => reply.push_bulk(s.bytes()),
            }
        }
        reply
    }

    /// Plain `SET` replies `+OK`; with `NX` it reports the insert count and
    /// replies nil when the key was already present. A `SET … EX` is recorded
    /// as two log records, the `SET` followed by its `EXPIREAT`, so replay is
    /// independent of when it runs.
    pub(crate) async fn set(
        &mut self,
        key: &str,
        value: Bytes,
        nx: bool,
        expire_secs: Option<i64>,
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        if let Some(ttl) = expire_secs {
            if ttl <= 0 {
                return resp_invalid_expire_err();
            }
        }

        let affected = self.put(key, value, nx);
        if affected == 0 {
            return Frame::Null;
        }

        self.persist(loading, record).await;

        if let Some(ttl) = expire_secs {
            let at = Utc::now() + Duration::seconds(ttl);
            let expire_record = vec![
                Bytes::from_static(b"expireat"),
                Bytes::copy_from_slice(key.as_bytes()),
                Bytes::from(at.timestamp().to_string()),
            ];
            self.apply_expire(key, at);
            self.persist(loading, expire_record).await;
        }

        if nx {
            Frame::Integer(affected)
        } else {
            resp_ok()
        }
    }

    pub(crate) async fn mset(
        &mut self,
        pairs: &[(String, Bytes)],
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        for (key, value) in pairs {
            self.put(key, value.clone(), false);
        }

        self.persist(loading, record).await;
        Frame::Integer(pairs.len() as i64)
    }

    /// Bind `key` to a string value, replacing whatever it held. With
    /// `insert_only` an existing key (of any kind) is left untouched.
    fn put(&mut self, key: &str, value: Bytes, insert_only: bool) -> i64 {
        if insert_only && self.data.contains_key(key) {
            return 0;
        }

        self.data
            .insert(key.to_string(), Value::Str(StringEntity::new(key, value)));
        1
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::empty_store;
    use super::*;
    use crate::utils::resp_wrong_type_err;

    fn set_record(key: &str, value: &str) -> Vec<Bytes> {
        vec![
            Bytes::from_static(b"set"),
            Bytes::copy_from_slice(key.as_bytes()),
            Bytes::copy_from_slice(value.as_bytes()),
        ]
    }

    #[tokio::test]
    async fn set_then_get() {
        let mut store = empty_store();
        let reply = store
            .set("foo", Bytes::from_static(b"bar"), false, None, set_record("foo", "bar"), false)
            .await;
        assert_eq!(reply, resp_ok());
        assert_eq!(store.get("foo"), Frame::Bulk(Bytes::from_static(b"bar")));
    }

    #[tokio::test]
    async fn set_nx_reports_insert_and_nil() {
        let mut store = empty_store();
        let first = store
            .set("foo", Bytes::from_static(b"bar"), true, None, set_record("foo", "bar"), false)
            .await;
        let second = store
            .set("foo", Bytes::from_static(b"baz"), true, None, set_record("foo", "baz"), false)
            .await;

        assert_eq!(first, Frame::Integer(1));
        assert_eq!(second, Frame::Null);
        assert_eq!(store.get("foo"), Frame::Bulk(Bytes::from_static(b"bar")));
    }

    #[tokio::test]
    async fn set_rejects_non_positive_ttl() {
        let mut store = empty_store();
        let reply = store
            .set("foo", Bytes::from_static(b"bar"), false, Some(0), set_record("foo", "bar"), false)
            .await;
        assert_eq!(reply, resp_invalid_expire_err());
        assert_eq!(store.get("foo"), Frame::Null);
    }

    #[tokio::test]
    async fn mget_marks_missing_keys() {
        let mut store = empty_store();
        store
            .set("a", Bytes::from_static(b"1"), false, None, set_record("a", "1"), false)
            .await;

        let reply = store.mget(&["a".to_string(), "b".to_string()]);
        assert_eq!(
            reply,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from_static(b"1")),
                Frame::Bulk(Bytes::from_static(b"(nil)")),
            ])
        );
    }

    #[tokio::test]
    async fn get_on_other_container_is_wrong_type() {
        let mut store = empty_store();
        store
            .lpush("ls", &[Bytes::from_static(b"a")], vec![], false)
            .await;
        assert_eq!(store.get("ls"), resp_wrong_type_err());
    }
}
