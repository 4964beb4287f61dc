use crate::cmd::{parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Remove members from a sorted set, replying with how many were present. The
/// key itself is not a member argument.
#[derive(Debug)]
pub struct Zrem {
    key: String,
    members: Vec<String>,

    valid: bool,
}

impl Zrem {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Zrem> {
        if argv.is_empty() {
            return Ok(Zrem::new_invalid());
        }

        Ok(Zrem {
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
            .zrem(&self.key, &self.members, self.to_record(), loading)
            .await
    }

    fn to_record(&self) -> Vec<Bytes> {
        let mut record = Vec::with_capacity(2 + self.members.len());
        record.push(Bytes::from_static(b"zrem"));
        record.push(Bytes::copy_from_slice(self.key.as_bytes()));
        record.extend(self.members.iter().map(|m| Bytes::copy_from_slice(m.as_bytes())));
        record
    }
}

impl Invalid for Zrem {
    fn new_invalid() -> Zrem {
        Zrem {
            key: "".to_owned(),
            members: vec![],
            valid: false,
        }
    }
}
