use crate::cmd::{parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Get the value of key.
///
/// If the key does not exist the special value nil is returned. An error is
/// returned if the value stored at key is not a string, because GET only
/// handles string values.
#[derive(Debug)]
pub struct Get {
    /// Name of the key to get
    key: String,

    valid: bool,
}

impl Get {
    /// Get the key
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Get> {
        if argv.is_empty() {
            return Ok(Get::new_invalid());
        }

        Ok(Get {
            key: parse_string(&argv[0]),
            valid: true,
        })
    }

    pub(crate) fn execute(&self, store: &Store) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store.get(&self.key)
    }
}

impl Invalid for Get {
    fn new_invalid() -> Get {
        Get {
            key: "".to_owned(),
            valid: false,
        }
    }
}
