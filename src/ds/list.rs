use bytes::Bytes;
use std::collections::VecDeque;

/// An ordered sequence of byte strings.
///
/// Pops are all-or-nothing: asking for more elements than the list holds
/// yields nothing rather than a partial batch.
#[derive(Debug)]
pub(crate) struct ListEntity {
    key: String,
    data: VecDeque<Bytes>,
}

impl ListEntity {
    pub(crate) fn new(key: &str) -> ListEntity {
        ListEntity {
            key: key.to_string(),
            data: VecDeque::new(),
        }
    }

    pub(crate) fn lpush(&mut self, value: Bytes) {
        self.data.push_front(value);
    }

    pub(crate) fn rpush(&mut self, value: Bytes) {
        self.data.push_back(value);
    }

    pub(crate) fn lpop(&mut self, cnt: i64) -> Option<Vec<Bytes>> {
        if (self.data.len() as i64) < cnt {
            return None;
        }

        Some(self.data.drain(..cnt as usize).collect())
    }

    pub(crate) fn rpop(&mut self, cnt: i64) -> Option<Vec<Bytes>> {
        if (self.data.len() as i64) < cnt {
            return None;
        }

        // The popped tail keeps its list order.
        Some(self.data.split_off(self.data.len() - cnt as usize).into())
    }

    pub(crate) fn len(&self) -> i64 {
        self.data.len() as i64
    }

    /// Inclusive `[start, stop]` slice; `stop == -1` addresses the last
    /// element. Any index outside the list yields `None`.
    pub(crate) fn range(&self, start: i64, stop: i64) -> Option<Vec<Bytes>> {
        let len = self.data.len() as i64;

        let stop = if stop == -1 { len - 1 } else { stop };

        if start < 0 || start >= len {
            return None;
        }

        if stop < 0 || stop >= len || stop < start {
            return None;
        }

        Some(
            self.data
                .iter()
                .skip(start as usize)
                .take((stop - start + 1) as usize)
                .cloned()
                .collect(),
        )
    }

    pub(crate) fn to_cmd(&self) -> Vec<Bytes> {
        let mut args = Vec::with_capacity(2 + self.data.len());
        args.push(Bytes::from_static(b"rpush"));
        args.push(Bytes::copy_from_slice(self.key.as_bytes()));
        args.extend(self.data.iter().cloned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&'static str]) -> ListEntity {
        let mut l = ListEntity::new("ls");
        for item in items {
            l.rpush(Bytes::from_static(item.as_bytes()));
        }
        l
    }

    #[test]
    fn push_order() {
        let mut l = ListEntity::new("ls");
        l.lpush(Bytes::from_static(b"a"));
        l.lpush(Bytes::from_static(b"b"));
        l.rpush(Bytes::from_static(b"c"));
        assert_eq!(l.range(0, -1).unwrap(), vec!["b", "a", "c"]);
    }

    #[test]
    fn pop_refuses_partial_batches() {
        let mut l = list(&["a", "b"]);
        assert!(l.lpop(3).is_none());
        assert_eq!(l.len(), 2);
        assert_eq!(l.lpop(2).unwrap(), vec!["a", "b"]);
        assert_eq!(l.len(), 0);
    }

    #[test]
    fn rpop_keeps_tail_order() {
        let mut l = list(&["a", "b", "c"]);
        assert_eq!(l.rpop(2).unwrap(), vec!["b", "c"]);
        assert_eq!(l.range(0, -1).unwrap(), vec!["a"]);
    }

    #[test]
    fn range_bounds() {
        let l = list(&["a", "b", "c"]);
        assert_eq!(l.range(1, 2).unwrap(), vec!["b", "c"]);
        assert!(l.range(0, 3).is_none());
        assert!(l.range(3, -1).is_none());
        assert!(l.range(2, 1).is_none());
    }
}
