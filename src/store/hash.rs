use crate::store::Store;
use crate::Frame;

use bytes::Bytes;

impl Store {
    pub(crate) async fn hset(
        &mut self,
        key: &str,
        pairs: &[(String, Bytes)],
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        match self.open_hash(key) {
            Err(err) => return err,
            Ok(hash) => {
                for (field, value) in pairs {
                    hash.put(field, value.clone());
                }
            }
        }

        self.persist(loading, record).await;
        Frame::Integer(pairs.len() as i64)
    }

    pub(crate) fn hget(&self, key: &str, field: &str) -> Frame {
        let hash = match self.get_hash(key) {
            Err(err) => return err,
            Ok(None) => return Frame::Null,
            Ok(Some(hash)) => hash,
        };

        match hash.get(field) {
            Some(value) => Frame::Bulk(value),
            None => Frame::Null,
        }
    }

    pub(crate) async fn hdel(
        &mut self,
        key: &str,
        fields: &[String],
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        let removed = match self.get_hash_mut(key) {
            Err(err) => return err,
            Ok(None) => return Frame::Integer(0),
            Ok(Some(hash)) => fields.iter().map(|field| hash.del(field)).sum::<i64>(),
        };

        if removed > 0 {
            self.persist(loading, record).await;
        }
        Frame::Integer(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::empty_store;
    use super::*;

    fn pairs(kv: &[(&str, &'static str)]) -> Vec<(String, Bytes)> {
        kv.iter()
            .map(|(f, v)| (f.to_string(), Bytes::from_static(v.as_bytes())))
            .collect()
    }

    #[tokio::test]
    async fn hset_hget_hdel() {
        let mut store = empty_store();
        let reply = store
            .hset("h", &pairs(&[("a", "1"), ("b", "2")]), vec![], false)
            .await;
        assert_eq!(reply, Frame::Integer(2));

        assert_eq!(store.hget("h", "b"), Frame::Bulk(Bytes::from_static(b"2")));
        assert_eq!(store.hget("h", "missing"), Frame::Null);
        assert_eq!(store.hget("missing", "a"), Frame::Null);

        let reply = store
            .hdel("h", &["a".to_string(), "b".to_string(), "c".to_string()], vec![], false)
            .await;
        assert_eq!(reply, Frame::Integer(2));
        assert_eq!(store.hget("h", "a"), Frame::Null);
    }

    #[tokio::test]
    async fn hdel_missing_hash_is_zero() {
        let mut store = empty_store();
        let reply = store.hdel("h", &["a".to_string()], vec![], false).await;
        assert_eq!(reply, Frame::Integer(0));
    }
}
