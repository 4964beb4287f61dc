use crate::store::Store;
use crate::Frame;

use bytes::Bytes;

impl Store {
    pub(crate) async fn zadd(
        &mut self,
        key: &str,
        entries: &[(i64, String)],
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        match self.open_zset(key) {
            Err(err) => return err,
            Ok(zset) => {
                for (score, member) in entries {
                    zset.add(*score, member);
                }
            }
        }

        self.persist(loading, record).await;
        Frame::Integer(entries.len() as i64)
    }

    /// Members with a score in the inclusive `[min, max]` range, in score
    /// order. An absent key or an empty range replies nil.
    pub(crate) fn zrangebyscore(&self, key: &str, min: i64, max: i64) -> Frame {
        let zset = match self.get_zset(key) {
            Err(err) => return err,
            Ok(None) => return Frame::Null,
            Ok(Some(zset)) => zset,
        };

        let members = zset.range(min, max);
        if members.is_empty() {
            return Frame::Null;
        }

        let mut reply = Frame::array();
        for member in members {
            reply.push_bulk(Bytes::from(member));
        }
        reply
    }

    pub(crate) async fn zrem(
        &mut self,
        key: &str,
        members: &[String],
        record: Vec<Bytes>,
        loading: bool,
    ) -> Frame {
        let removed = match self.get_zset_mut(key) {
            Err(err) => return err,
            Ok(None) => return Frame::Integer(0),
            Ok(Some(zset)) => members.iter().map(|member| zset.rem(member)).sum::<i64>(),
        };

        if removed > 0 {
            self.persist(loading, record).await;
        }
        Frame::Integer(removed)
    }
}
