use crate::cmd::{parse_int, parse_string, Invalid};
use crate::store::Store;
use crate::utils::resp_syntax_err;
use crate::Frame;

use bytes::Bytes;

/// Set `key` to hold the string `value`.
///
/// If `key` already holds a value, it is overwritten, regardless of its kind.
///
/// # Options
///
/// Currently, the following options are supported, in any order after the
/// value:
///
/// * NX -- Only set the key if it does not already exist.
/// * EX `seconds` -- Set the specified expire time, in seconds.
#[derive(Debug)]
pub struct Set {
    /// the lookup key
    key: String,

    /// the value to be stored
    value: Bytes,

    /// When to expire the key, in seconds from now. Validated against zero at
    /// execution, where the failure is a domain error rather than a syntax
    /// one.
    expire_secs: Option<i64>,

    /// Set if key is not present
    nx: bool,

    valid: bool,
}

impl Set {
    /// Get the key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Parse a `Set` instance from the request's argument tail.
    ///
    /// # Format
    ///
    /// ```text
    /// SET key value [NX] [EX seconds]
    /// ```
    ///
    /// A repeated `EX`, an `EX` without its argument, a non-numeric `EX`
    /// argument and any unrecognised flag are syntax errors.
    pub(crate) fn parse_argv(argv: &[Bytes]) -> crate::Result<Set> {
        if argv.len() < 2 {
            return Ok(Set::new_invalid());
        }

        let key = parse_string(&argv[0]);
        let value = argv[1].clone();

        let mut expire_secs = None;
        let mut nx = false;

        let mut idx = 2;
        while idx < argv.len() {
            let flag = parse_string(&argv[idx]).to_lowercase();
            match flag.as_str() {
                "nx" => {
                    nx = true;
                }
                "ex" => {
                    if expire_secs.is_some() {
                        return Ok(Set::new_invalid());
                    }
                    if idx == argv.len() - 1 {
                        return Ok(Set::new_invalid());
                    }

                    idx += 1;
                    match parse_int(&argv[idx]) {
                        Ok(secs) => expire_secs = Some(secs),
                        Err(_) => return Ok(Set::new_invalid()),
                    }
                }
                _ => return Ok(Set::new_invalid()),
            }

            idx += 1;
        }

        Ok(Set {
            key,
            value,
            expire_secs,
            nx,
            valid: true,
        })
    }

    pub(crate) async fn execute(&self, store: &mut Store, loading: bool) -> Frame {
        if !self.valid {
            return resp_syntax_err();
        }

        store
            .set(
                &self.key,
                self.value.clone(),
                self.nx,
                self.expire_secs,
                self.to_record(),
                loading,
            )
            .await
    }

    /// The log record: the `EX` pair is stripped because the expiry is
    /// recorded separately in its absolute form.
    fn to_record(&self) -> Vec<Bytes> {
        let mut record = vec![
            Bytes::from_static(b"set"),
            Bytes::copy_from_slice(self.key.as_bytes()),
            self.value.clone(),
        ];
        if self.nx {
            record.push(Bytes::from_static(b"nx"));
        }
        record
    }
}

impl Invalid for Set {
    fn new_invalid() -> Set {
        Set {
            key: "".to_owned(),
            value: Bytes::new(),
            expire_secs: None,
            nx: false,
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
    fn flags_in_any_order() {
        let cmd = Set::parse_argv(&argv(&["k", "v", "EX", "10", "NX"])).unwrap();
        assert!(cmd.valid);
        assert!(cmd.nx);
        assert_eq!(cmd.expire_secs, Some(10));

        let cmd = Set::parse_argv(&argv(&["k", "v", "nx", "ex", "10"])).unwrap();
        assert!(cmd.valid);
        assert!(cmd.nx);
        assert_eq!(cmd.expire_secs, Some(10));
    }

    #[test]
    fn malformed_flags_are_invalid() {
        // duplicate ex
        assert!(!Set::parse_argv(&argv(&["k", "v", "ex", "1", "ex", "2"])).unwrap().valid);
        // ex without argument
        assert!(!Set::parse_argv(&argv(&["k", "v", "ex"])).unwrap().valid);
        // non-numeric ttl
        assert!(!Set::parse_argv(&argv(&["k", "v", "ex", "ten"])).unwrap().valid);
        // unknown flag
        assert!(!Set::parse_argv(&argv(&["k", "v", "xx"])).unwrap().valid);
        // missing value
        assert!(!Set::parse_argv(&argv(&["k"])).unwrap().valid);
    }

    #[test]
    fn record_strips_the_ex_pair() {
        let cmd = Set::parse_argv(&argv(&["k", "v", "ex", "10", "nx"])).unwrap();
        assert_eq!(cmd.to_record(), argv(&["set", "k", "v", "nx"]));
    }
}
