use crate::cmd::{parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Set the given keys to their respective values, unconditionally. Replies
/// with the number of pairs written.
#[derive(Debug)]
pub struct Mset {
    pairs: Vec<(String, Bytes)>,

    valid: bool,
}

impl Mset {
    pub fn key(&self) -> &str {
        &self.pairs[0].0
    }

    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Mset> {
        // key/value pairs only
        if argv.is_empty() || argv.len() % 2 == 1 {
            return Ok(Mset::new_invalid());
        }

        let pairs = argv
            .chunks(2)
            .map(|pair| (parse_string(&pair[0]), pair[1].clone()))
            .collect();

        Ok(Mset { pairs, valid: true })
    }

    pub(crate) async fn execute(&self, store: &mut Store, loading: bool) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store.mset(&self.pairs, self.to_record(), loading).await
    }

    fn to_record(&self) -> Vec<Bytes> {
        let mut record = Vec::with_capacity(1 + 2 * self.pairs.len());
        record.push(Bytes::from_static(b"mset"));
        for (key, value) in &self.pairs {
            record.push(Bytes::copy_from_slice(key.as_bytes()));
            record.push(value.clone());
        }
        record
    }
}

impl Invalid for Mset {
    fn new_invalid() -> Mset {
        Mset {
            pairs: vec![("".to_owned(), Bytes::new())],
            valid: false,
        }
    }
}
