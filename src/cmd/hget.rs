use crate::cmd::{parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Get the value of one hash field; nil when the key or the field is absent.
#[derive(Debug)]
pub struct Hget {
    key: String,
    field: String,

    valid: bool,
}

impl Hget {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Hget> {
        if argv.len() < 2 {
            return Ok(Hget::new_invalid());
        }

        Ok(Hget {
            key: parse_string(&argv[0]),
            field: parse_string(&argv[1]),
            valid: true,
        })
    }

    pub(crate) fn execute(&self, store: &Store) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store.hget(&self.key, &self.field)
    }
}

impl Invalid for Hget {
    fn new_invalid() -> Hget {
        Hget {
            key: "".to_owned(),
            field: "".to_owned(),
            valid: false,
        }
    }
}
