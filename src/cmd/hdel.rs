use crate::cmd::{parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Delete one or more hash fields, replying with how many were present.
#[derive(Debug)]
pub struct Hdel {
    key: String,
    fields: Vec<String>,

    valid: bool,
}

impl Hdel {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Hdel> {
        if argv.is_empty() {
            return Ok(Hdel::new_invalid());
        }

        Ok(Hdel {
            key: parse_string(&argv[0]),
            fields: argv[1..].iter().map(parse_string).collect(),
            valid: true,
        })
    }

    pub(crate) async fn execute(&self, store: &mut Store, loading: bool) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store
            .hdel(&self.key, &self.fields, self.to_record(), loading)
            .await
    }

    fn to_record(&self) -> Vec<Bytes> {
        let mut record = Vec::with_capacity(2 + self.fields.len());
        record.push(Bytes::from_static(b"hdel"));
        record.push(Bytes::copy_from_slice(self.key.as_bytes()));
        record.extend(self.fields.iter().map(|f| Bytes::copy_from_slice(f.as_bytes())));
        record
    }
}

impl Invalid for Hdel {
    fn new_invalid() -> Hdel {
        Hdel {
            key: "".to_owned(),
            fields: vec![],
            valid: false,
        }
    }
}
