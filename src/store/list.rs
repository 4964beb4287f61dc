use crate::store::Store;
use crate::Frame;

use bytes::Bytes;

impl Store {
    pub(crate) async fn lpush(
        &mut self,
        key: &str,
        values: &[Bytes],
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        let len = match self.open_list(key) {
            Err(err) => return err,
            Ok(list) => {
                for value in values {
                    list.lpush(value.clone());
                }
                list.len()
            }
        };

        self.persist(loading, record).await;
        Frame::Integer(len)
    }

    pub(crate) async fn rpush(
        &mut self,
        key: &str,
        values: &[Bytes],
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        let len = match self.open_list(key) {
            Err(err) => return err,
            Ok(list) => {
                for value in values {
                    list.rpush(value.clone());
                }
                list.len()
            }
        };

        self.persist(loading, record).await;
        Frame::Integer(len)
    }

    pub(crate) async fn lpop(
        &mut self,
        key: &str,
        count: i64,
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        let popped = match self.get_list(key) {
            Err(err) => return err,
            Ok(None) => return Frame::Null,
            Ok(Some(list)) => list.lpop(count),
        };

        self.reply_popped(popped, record, loading).await
    }

    pub(crate) async fn rpop(
        &mut self,
        key: &str,
        count: i64,
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        let popped = match self.get_list(key) {
            Err(err) => return err,
            Ok(None) => return Frame::Null,
            Ok(Some(list)) => list.rpop(count),
        };

        self.reply_popped(popped, record, loading).await
    }

    /// Pops are persisted only when they removed something; a refused pop
    /// (fewer elements than asked for) replies nil and leaves the log alone.
    async fn reply_popped(
        &mut self,
        popped: Option<Vec<Bytes>>,
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        let mut popped = match popped {
            None => return Frame::Null,
            Some(popped) => popped,
        };

        self.persist(loading, record).await;

        if popped.len() == 1 {
            return Frame::Bulk(popped.remove(0));
        }

        let mut reply = Frame::array();
        for value in popped {
            reply.push_bulk(value);
        }
        reply
    }

    pub(crate) fn lrange(&self, key: &str, start: i64, stop: i64) -> Frame {
        let list = match self.get_list_ref(key) {
            Err(err) => return err,
            Ok(None) => return Frame::Null,
            Ok(Some(list)) => list,
        };

        match list.range(start, stop) {
            None => Frame::Null,
            Some(values) => {
                let mut reply = Frame::array();
                for value in values {
                    reply.push_bulk(value);
                }
                reply
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::empty_store;
    use super::*;

    fn b(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[tokio::test]
    async fn lpush_then_lrange_reverses() {
        let mut store = empty_store();
        let reply = store.lpush("ls", &[b("1"), b("2"), b("3")], vec![], false).await;
        assert_eq!(reply, Frame::Integer(3));

        assert_eq!(
            store.lrange("ls", 0, -1),
            Frame::Array(vec![
                Frame::Bulk(b("3")),
                Frame::Bulk(b("2")),
                Frame::Bulk(b("1")),
            ])
        );
    }

    #[tokio::test]
    async fn rpush_keeps_order() {
        let mut store = empty_store();
        store.rpush("ls", &[b("a"), b("b")], vec![], false).await;

        assert_eq!(
            store.lrange("ls", 0, -1),
            Frame::Array(vec![Frame::Bulk(b("a")), Frame::Bulk(b("b"))])
        );
    }

    #[tokio::test]
    async fn pop_single_is_bulk_and_partial_is_nil() {
        let mut store = empty_store();
        store.rpush("ls", &[b("a"), b("b")], vec![], false).await;

        assert_eq!(store.lpop("ls", 1, vec![], false).await, Frame::Bulk(b("a")));
        assert_eq!(store.lpop("ls", 5, vec![], false).await, Frame::Null);
        assert_eq!(store.lpop("missing", 1, vec![], false).await, Frame::Null);
    }

    #[tokio::test]
    async fn lrange_out_of_range_is_nil() {
        let mut store = empty_store();
        store.rpush("ls", &[b("a")], vec![], false).await;

        assert_eq!(store.lrange("ls", 0, 5), Frame::Null);
        assert_eq!(store.lrange("missing", 0, -1), Frame::Null);
    }
}
