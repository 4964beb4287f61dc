use crate::cmd::{parse_int, parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Pop from the front (`LPOP`) or back (`RPOP`) of a list.
///
/// The optional count must be at least 1 and defaults to 1. When the list
/// holds fewer elements than asked for, nothing is popped and the reply is
/// nil.
#[derive(Debug)]
pub struct Pop {
    key: String,

    /// `None` when the client did not pass a count.
    count: Option<i64>,

    valid: bool,
}

impl Pop {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Pop> {
        if argv.is_empty() {
            return Ok(Pop::new_invalid());
        }

        let mut count = None;
        if argv.len() > 1 {
            match parse_int(&argv[1]) {
                Ok(cnt) if cnt >= 1 => count = Some(cnt),
                _ => return Ok(Pop::new_invalid()),
            }
        }

        Ok(Pop {
            key: parse_string(&argv[0]),
            count,
            valid: true,
        })
    }

    pub(crate) async fn execute(&self, store: &mut Store, front: bool, loading: bool) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        let count = self.count.unwrap_or(1);
        let record = self.to_record(front);
        if front {
            store.lpop(&self.key, count, record, loading).await
        } else {
            store.rpop(&self.key, count, record, loading).await
        }
    }

    fn to_record(&self, front: bool) -> Vec<Bytes> {
        let name = if front { "lpop" } else { "rpop" };

        let mut record = vec![
            Bytes::copy_from_slice(name.as_bytes()),
            Bytes::copy_from_slice(self.key.as_bytes()),
        ];
        if let Some(count) = self.count {
            record.push(Bytes::from(count.to_string()));
        }
        record
    }
}

impl Invalid for Pop {
    fn new_invalid() -> Pop {
        Pop {
            key: "".to_owned(),
            count: None,
            valid: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&'static str]) -> Vec<Bytes> {
        args.iter()
            .map(|a| Bytes::from_static(a.as_bytes()))
            .collect()
    }

    #[test]
    fn count_must_be_positive() {
        assert!(Pop::parse_argv(&argv(&["k"])).unwrap().valid);
        assert!(Pop::parse_argv(&argv(&["k", "2"])).unwrap().valid);
        assert!(!Pop::parse_argv(&argv(&["k", "0"])).unwrap().valid);
        assert!(!Pop::parse_argv(&argv(&["k", "-1"])).unwrap().valid);
        assert!(!Pop::parse_argv(&argv(&["k", "two"])).unwrap().valid);
    }
}
