use bytes::Bytes;
use std::collections::HashSet;

/// An unordered set of string members. Mutations report `{0, 1}` per member.
#[derive(Debug)]
pub(crate) struct SetEntity {
    key: String,
    container: HashSet<String>,
}

impl SetEntity {
    pub(crate) fn new(key: &str) -> SetEntity {
        SetEntity {
            key: key.to_string(),
            container: HashSet::new(),
        }
    }

    pub(crate) fn add(&mut self, member: &str) -> i64 {
        if self.container.insert(member.to_string()) {
            1
        } else {
            0
        }
    }

    pub(crate) fn exist(&self, member: &str) -> i64 {
        if self.container.contains(member) {
            1
        } else {
            0
        }
    }

    pub(crate) fn rem(&mut self, member: &str) -> i64 {
        if self.container.remove(member) {
            1
        } else {
            0
        }
    }

    pub(crate) fn to_cmd(&self) -> Vec<Bytes> {
        let mut args = Vec::with_capacity(2 + self.container.len());
        args.push(Bytes::from_static(b"sadd"));
        args.push(Bytes::copy_from_slice(self.key.as_bytes()));
        for member in &self.container {
            args.push(Bytes::copy_from_slice(member.as_bytes()));
        }
        args
    }
}
