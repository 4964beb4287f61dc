use crate::cmd::{parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Set one or more field/value pairs on a hash, creating it when absent.
/// Replies with the number of pairs written.
#[derive(Debug)]
pub struct Hset {
    key: String,

    pairs: Vec<(String, Bytes)>,

    valid: bool,
}

impl Hset {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Hset> {
        // a key plus whole field/value pairs
        if argv.len() % 2 != 1 {
            return Ok(Hset::new_invalid());
        }

        let pairs = argv[1..]
            .chunks(2)
            .map(|pair| (parse_string(&pair[0]), pair[1].clone()))
            .collect();

        Ok(Hset {
            key: parse_string(&argv[0]),
            pairs,
            valid: true,
        })
    }

    pub(crate) async fn execute(&self, store: &mut Store, loading: bool) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store
            .hset(&self.key, &self.pairs, self.to_record(), loading)
            .await
    }

    fn to_record(&self) -> Vec<Bytes> {
        let mut record = Vec::with_capacity(2 + 2 * self.pairs.len());
        record.push(Bytes::from_static(b"hset"));
        record.push(Bytes::copy_from_slice(self.key.as_bytes()));
        for (field, value) in &self.pairs {
            record.push(Bytes::copy_from_slice(field.as_bytes()));
            record.push(value.clone());
        }
        record
    }
}

impl Invalid for Hset {
    fn new_invalid() -> Hset {
        Hset {
            key: "".to_owned(),
            pairs: vec![],
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
    fn arity_requires_whole_pairs() {
        assert!(Hset::parse_argv(&argv(&["h", "f", "v"])).unwrap().valid);
        assert!(Hset::parse_argv(&argv(&["h", "a", "1", "b", "2"])).unwrap().valid);
        assert!(!Hset::parse_argv(&argv(&["h", "f"])).unwrap().valid);
    }
}
