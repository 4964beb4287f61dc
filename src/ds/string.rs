use bytes::Bytes;

/// A plain byte-string value.
#[derive(Debug)]
pub(crate) struct StringEntity {
    key: String,
    value: Bytes,
}

impl StringEntity {
    pub(crate) fn new(key: &str, value: Bytes) -> StringEntity {
        StringEntity {
            key: key.to_string(),
            value,
        }
    }

    pub(crate) fn bytes(&self) -> Bytes {
        self.value.clone()
    }

    pub(crate) fn to_cmd(&self) -> Vec<Bytes> {
        vec![
            Bytes::from_static(b"set"),
            Bytes::copy_from_slice(self.key.as_bytes()),
            self.value.clone(),
        ]
    }
}
