use crate::cmd::{parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Add members to a set, creating it when absent. Replies with how many were
/// newly added.
#[derive(Debug)]
pub struct Sadd {
    key: String,
    members: Vec<String>,

    valid: bool,
}

impl Sadd {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Sadd> {
        if argv.is_empty() {
            return Ok(Sadd::new_invalid());
        }

        Ok(Sadd {
            key: parse_string(&argv[0]),
            members: argv[1..].iter().map(parse_string).collect(),
            valid: true,
        })
    }

    pub(crate) async fn execute(&self, store: &mut Store, loading: bool) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store
            .sadd(&self.key, &self.members, self.to_record(), loading)
            .await
    }

    fn to_record(&self) -> Vec<Bytes> {
        let mut record = Vec::with_capacity(2 + self.members.len());
        record.push(Bytes::from_static(b"sadd"));
        record.push(Bytes::copy_from_slice(self.key.as_bytes()));
        record.extend(self.members.iter().map(|m| Bytes::copy_from_slice(m.as_bytes())));
        record
    }
}

impl Invalid for Sadd {
    fn new_invalid() -> Sadd {
        Sadd {
            key: "".to_owned(),
            members: vec![],
            valid: false,
        }
    }
}
