use crate::cmd::{parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Report whether `member` is in the set at `key`: 1 when present, 0 when
/// absent or when the key does not exist.
#[derive(Debug)]
pub struct Sismember {
    key: String,
    member: String,

    valid: bool,
}

impl Sismember {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Sismember> {
        if argv.len() != 2 {
            return Ok(Sismember::new_invalid());
        }

        Ok(Sismember {
            key: parse_string(&argv[0]),
            member: parse_string(&argv[1]),
            valid: true,
        })
    }

    pub(crate) fn execute(&self, store: &Store) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store.sismember(&self.key, &self.member)
    }
}

impl Invalid for Sismember {
    fn new_invalid() -> Sismember {
        Sismember {
            key: "".to_owned(),
            member: "".to_owned(),
            valid: false,
        }
    }
}
