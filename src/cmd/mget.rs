use crate::cmd::{parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Get the values of all specified keys, one reply element per key.
#[derive(Debug)]
pub struct Mget {
    keys: Vec<String>,

    valid: bool,
}

impl Mget {
    pub fn key(&self) -> &str {
        &self.keys[0]
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Mget> {
        if argv.is_empty() {
            return Ok(Mget::new_invalid());
        }

        Ok(Mget {
            keys: argv.iter().map(parse_string).collect(),
            valid: true,
        })
    }

    pub(crate) fn execute(&self, store: &Store) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store.mget(&self.keys)
    }
}

impl Invalid for Mget {
    fn new_invalid() -> Mget {
        Mget {
            keys: vec!["".to_owned()],
            valid: false,
        }
    }
}
