use crate::cmd::{parse_int, parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Return the inclusive `[start, stop]` slice of a list; `stop = -1` addresses
/// the last element. An absent key or an out-of-range slice replies nil.
#[derive(Debug)]
pub struct Lrange {
    key: String,
    start: i64,
    stop: i64,

    valid: bool,
}

impl Lrange {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Lrange> {
        if argv.len() != 3 {
            return Ok(Lrange::new_invalid());
        }

        let (start, stop) = match (parse_int(&argv[1]), parse_int(&argv[2])) {
            (Ok(start), Ok(stop)) => (start, stop),
            _ => return Ok(Lrange::new_invalid()),
        };

        Ok(Lrange {
            key: parse_string(&argv[0]),
            start,
            stop,
            valid: true,
        })
    }

    pub(crate) fn execute(&self, store: &Store) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store.lrange(&self.key, self.start, self.stop)
    }
}

impl Invalid for Lrange {
    fn new_invalid() -> Lrange {
        Lrange {
            key: "".to_owned(),
            start: 0,
            stop: 0,
            valid: false,
        }
    }
}
