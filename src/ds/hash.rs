use bytes::Bytes;
use std::collections::HashMap;

/// A field → byte-string mapping.
#[derive(Debug)]
pub(crate) struct HashEntity {
    key: String,
    data: HashMap<String, Bytes>,
}

impl HashEntity {
    pub(crate) fn new(key: &str) -> HashEntity {
        HashEntity {
            key: key.to_string(),
            data: HashMap::new(),
        }
    }

    pub(crate) fn put(&mut self, field: &str, value: Bytes) {
        self.data.insert(field.to_string(), value);
    }

    pub(crate) fn get(&self, field: &str) -> Option<Bytes> {
        self.data.get(field).cloned()
    }

    pub(crate) fn del(&mut self, field: &str) -> i64 {
        match self.data.remove(field) {
            Some(_) => 1,
            None => 0,
        }
    }

    pub(crate) fn to_cmd(&self) -> Vec<Bytes> {
        let mut args = Vec::with_capacity(2 + 2 * self.data.len());
        args.push(Bytes::from_static(b"hset"));
        args.push(Bytes::copy_from_slice(self.key.as_bytes()));
        for (field, value) in &self.data {
            args.push(Bytes::copy_from_slice(field.as_bytes()));
            args.push(value.clone());
        }
        args
    }
}
