use crate::cmd::{parse_int, parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Return the members whose score lies in the inclusive `[min, max]` range,
/// in score order. An absent key or an empty range replies nil.
#[derive(Debug)]
pub struct Zrangebyscore {
    key: String,
    min: i64,
    max: i64,

    valid: bool,
}

impl Zrangebyscore {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Zrangebyscore> {
        if argv.len() < 3 {
            return Ok(Zrangebyscore::new_invalid());
        }

        let (min, max) = match (parse_int(&argv[1]), parse_int(&argv[2])) {
            (Ok(min), Ok(max)) => (min, max),
            _ => return Ok(Zrangebyscore::new_invalid()),
        };

        Ok(Zrangebyscore {
            key: parse_string(&argv[0]),
            min,
            max,
            valid: true,
        })
    }

    pub(crate) fn execute(&self, store: &Store) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store.zrangebyscore(&self.key, self.min, self.max)
    }
}

impl Invalid for Zrangebyscore {
    fn new_invalid() -> Zrangebyscore {
        Zrangebyscore {
            key: "".to_owned(),
            min: 0,
            max: 0,
            valid: false,
        }
    }
}
