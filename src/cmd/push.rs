use crate::cmd::{parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Prepend (`LPUSH`) or append (`RPUSH`) one or more values to a list,
/// creating it when absent. Replies with the resulting length.
#[derive(Debug)]
pub struct Push {
    key: String,

    values: Vec<Bytes>,

    valid: bool,
}

impl Push {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Push> {
        if argv.is_empty() {
            return Ok(Push::new_invalid());
        }

        Ok(Push {
            key: parse_string(&argv[0]),
            values: argv[1..].to_vec(),
            valid: true,
        })
    }

    pub(crate) async fn execute(&self, store: &mut Store, front: bool, loading: bool) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        let record = self.to_record(front);
        if front {
            store.lpush(&self.key, &self.values, record, loading).await
        } else {
            store.rpush(&self.key, &self.values, record, loading).await
        }
    }

    fn to_record(&self, front: bool) -> Vec<Bytes> {
        let name = if front { "lpush" } else { "rpush" };

        let mut record = Vec::with_capacity(2 + self.values.len());
        record.push(Bytes::copy_from_slice(name.as_bytes()));
        record.push(Bytes::copy_from_slice(self.key.as_bytes()));
        record.extend(self.values.iter().cloned());
        record
    }
}

impl Invalid for Push {
    fn new_invalid() -> Push {
        Push {
            key: "".to_owned(),
            values: vec![],
            valid: false,
        }
    }
}
