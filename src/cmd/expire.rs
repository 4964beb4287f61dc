use crate::cmd::{parse_int, parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Set a time-to-live on a key.
///
/// Backs both `EXPIRE` (relative seconds) and `EXPIREAT` (absolute unix
/// seconds); which one executes is decided by the dispatcher. Either way the
/// log records the absolute form, so replay does not depend on when it runs.
#[derive(Debug)]
pub struct Expire {
    key: String,

    /// Relative seconds for `EXPIRE`, absolute unix seconds for `EXPIREAT`.
    value: i64,

    valid: bool,
}

impl Expire {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Expire> {
        if argv.len() < 2 {
            return Ok(Expire::new_invalid());
        }

        let value = match parse_int(&argv[1]) {
            Ok(value) => value,
            Err(_) => return Ok(Expire::new_invalid()),
        };

        Ok(Expire {
            key: parse_string(&argv[0]),
            value,
            valid: true,
        })
    }

    pub(crate) async fn execute(&self, store: &mut Store, at: bool, loading: bool) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        if at {
            store.expire_at(&self.key, self.value, loading).await
        } else {
            store.expire(&self.key, self.value, loading).await
        }
    }
}

impl Invalid for Expire {
    fn new_invalid() -> Expire {
        Expire {
            key: "".to_owned(),
            value: 0,
            valid: false,
        }
    }
}
