use crate::cmd::{parse_int, parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Add score/member pairs to a sorted set, creating it when absent. A member
/// that is already present gets its score replaced. Scores are signed 64-bit
/// integers. Replies with the number of pairs in the request.
#[derive(Debug)]
pub struct Zadd {
    key: String,

    entries: Vec<(i64, String)>,

    valid: bool,
}

impl Zadd {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Zadd> {
        // a key plus whole score/member pairs
        if argv.len() % 2 != 1 {
            return Ok(Zadd::new_invalid());
        }

        let mut entries = Vec::with_capacity(argv.len() / 2);
        for pair in argv[1..].chunks(2) {
            match parse_int(&pair[0]) {
                Ok(score) => entries.push((score, parse_string(&pair[1]))),
                Err(_) => return Ok(Zadd::new_invalid()),
            }
        }

        Ok(Zadd {
            key: parse_string(&argv[0]),
            entries,
            valid: true,
        })
    }

    pub(crate) async fn execute(&self, store: &mut Store, loading: bool) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store
            .zadd(&self.key, &self.entries, self.to_record(), loading)
            .await
    }

    fn to_record(&self) -> Vec<Bytes> {
        let mut record = Vec::with_capacity(2 + 2 * self.entries.len());
        record.push(Bytes::from_static(b"zadd"));
        record.push(Bytes::copy_from_slice(self.key.as_bytes()));
        for (score, member) in &self.entries {
            record.push(Bytes::from(score.to_string()));
            record.push(Bytes::copy_from_slice(member.as_bytes()));
        }
        record
    }
}

impl Invalid for Zadd {
    fn new_invalid() -> Zadd {
        Zadd {
            key: "".to_owned(),
            entries: vec![],
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
    fn scores_must_be_integers() {
        assert!(Zadd::parse_argv(&argv(&["z", "1", "x", "-2", "y"])).unwrap().valid);
        assert!(!Zadd::parse_argv(&argv(&["z", "one", "x"])).unwrap().valid);
        assert!(!Zadd::parse_argv(&argv(&["z", "1"])).unwrap().valid);
    }
}
