use crate::store::Store;
use crate::Frame;

use bytes::Bytes;

impl Store {
    pub(crate) async fn sadd(
        &mut self,
        key: &str,
        members: &[String],
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        let added = match self.open_set(key) {
            Err(err) => return err,
            Ok(set) => members.iter().map(|member| set.add(member)).sum::<i64>(),
        };

        self.persist(loading, record).await;
        Frame::Integer(added)
    }

    pub(crate) fn sismember(&self, key: &str, member: &str) -> Frame {
        match self.get_set(key) {
            Err(err) => err,
            Ok(None) => Frame::Integer(0),
            Ok(Some(set)) => Frame::Integer(set.exist(member)),
        }
    }

    pub(crate) async fn srem(
        &mut self,
        key: &str,
        members: &[String],
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        let removed = match self.get_set_mut(key) {
            Err(err) => return err,
            Ok(None) => return Frame::Integer(0),
            Ok(Some(set)) => members.iter().map(|member| set.rem(member)).sum::<i64>(),
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

    use crate::Frame;

    fn members(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn add_is_idempotent_per_member() {
        let mut store = empty_store();
        assert_eq!(
            store.sadd("s", &members(&["x"]), vec![], false).await,
            Frame::Integer(1)
        );
        assert_eq!(
            store.sadd("s", &members(&["x", "y"]), vec![], false).await,
            Frame::Integer(1)
        );
    }

    #[tokio::test]
    async fn membership_round_trip() {
        let mut store = empty_store();
        store.sadd("s", &members(&["x"]), vec![], false).await;

        assert_eq!(store.sismember("s", "x"), Frame::Integer(1));
        assert_eq!(store.sismember("s", "y"), Frame::Integer(0));
        assert_eq!(store.sismember("missing", "x"), Frame::Integer(0));

        assert_eq!(
            store.srem("s", &members(&["x"]), vec![], false).await,
            Frame::Integer(1)
        );
        assert_eq!(store.sismember("s", "x"), Frame::Integer(0));
        assert_eq!(
            store.srem("s", &members(&["x"]), vec![], false).await,
            Frame::Integer(0)
        );
    }
}
