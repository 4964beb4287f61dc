mod get;
pub use get::Get;

mod mget;
pub use mget::Mget;

mod set;
pub use set::Set;

mod mset;
pub use mset::Mset;

mod expire;
pub use expire::Expire;

mod push;
pub use push::Push;

mod pop;
pub use pop::Pop;

mod lrange;
pub use lrange::Lrange;

mod hset;
pub use hset::Hset;

mod hget;
pub use hget::Hget;

mod hdel;
pub use hdel::Hdel;

mod sadd;
pub use sadd::Sadd;

mod sismember;
pub use sismember::Sismember;

mod srem;
pub use srem::Srem;

mod zadd;
pub use zadd::Zadd;

mod zrangebyscore;
pub use zrangebyscore::Zrangebyscore;

mod zrem;
pub use zrem::Zrem;

use crate::store::Store;
use crate::Frame;

use bytes::Bytes;

/// Enumeration of supported commands.
///
/// A `Command` is built from the argument tail of a request line (the name has
/// already been consumed and lower-cased) and is executed by the single writer
/// task against its `Store`. Malformed argument tails never fail construction;
/// they produce a command in its invalid state, which executes to the syntax
/// error reply. That keeps all argument validation local without tearing down
/// the connection.
#[derive(Debug)]
pub enum Command {
    Get(Get),
    Mget(Mget),
    Set(Set),
    Mset(Mset),

    Expire(Expire),
    ExpireAt(Expire),

    // list
    Lpush(Push),
    Rpush(Push),
    Lpop(Pop),
    Rpop(Pop),
    Lrange(Lrange),

    // hash
    Hset(Hset),
    Hget(Hget),
    Hdel(Hdel),

    // set
    Sadd(Sadd),
    Sismember(Sismember),
    Srem(Srem),

    // sorted set
    Zadd(Zadd),
    Zrangebyscore(Zrangebyscore),
    Zrem(Zrem),
}

impl Command {
    /// Build a command from a lower-cased name and its argument tail. `None`
    /// means the name is not a command at all — the caller answers with the
    /// unknown-command error and nothing is dispatched.
    pub fn from_argv(name: &str, argv: &[Bytes]) -> Option<Command> {
        let command = match name {
            "get" => Command::Get(transform_parse(Get::parse_argv(argv))),
            "mget" => Command::Mget(transform_parse(Mget::parse_argv(argv))),
            "set" => Command::Set(transform_parse(Set::parse_argv(argv))),
            "mset" => Command::Mset(transform_parse(Mset::parse_argv(argv))),
            "expire" => Command::Expire(transform_parse(Expire::parse_argv(argv))),
            "expireat" => Command::ExpireAt(transform_parse(Expire::parse_argv(argv))),
            "lpush" => Command::Lpush(transform_parse(Push::parse_argv(argv))),
            "rpush" => Command::Rpush(transform_parse(Push::parse_argv(argv))),
            "lpop" => Command::Lpop(transform_parse(Pop::parse_argv(argv))),
            "rpop" => Command::Rpop(transform_parse(Pop::parse_argv(argv))),
            "lrange" => Command::Lrange(transform_parse(Lrange::parse_argv(argv))),
            "hset" => Command::Hset(transform_parse(Hset::parse_argv(argv))),
            "hget" => Command::Hget(transform_parse(Hget::parse_argv(argv))),
            "hdel" => Command::Hdel(transform_parse(Hdel::parse_argv(argv))),
            "sadd" => Command::Sadd(transform_parse(Sadd::parse_argv(argv))),
            "sismember" => Command::Sismember(transform_parse(Sismember::parse_argv(argv))),
            "srem" => Command::Srem(transform_parse(Srem::parse_argv(argv))),
            "zadd" => Command::Zadd(transform_parse(Zadd::parse_argv(argv))),
            "zrangebyscore" => {
                Command::Zrangebyscore(transform_parse(Zrangebyscore::parse_argv(argv)))
            }
            "zrem" => Command::Zrem(transform_parse(Zrem::parse_argv(argv))),
            _ => return None,
        };

        Some(command)
    }

    /// Apply the command to the specified `Store` instance, returning the
    /// reply frame. `loading` marks commands replayed from the append log,
    /// which must not be re-recorded.
    pub(crate) async fn apply(self, store: &mut Store, loading: bool) -> Frame {
        use Command::*;

        match self {
            Get(cmd) => cmd.execute(store),
            Mget(cmd) => cmd.execute(store),
            Set(cmd) => cmd.execute(store, loading).await,
            Mset(cmd) => cmd.execute(store, loading).await,
            Expire(cmd) => cmd.execute(store, false, loading).await,
            ExpireAt(cmd) => cmd.execute(store, true, loading).await,
            Lpush(cmd) => cmd.execute(store, true, loading).await,
            Rpush(cmd) => cmd.execute(store, false, loading).await,
            Lpop(cmd) => cmd.execute(store, true, loading).await,
            Rpop(cmd) => cmd.execute(store, false, loading).await,
            Lrange(cmd) => cmd.execute(store),
            Hset(cmd) => cmd.execute(store, loading).await,
            Hget(cmd) => cmd.execute(store),
            Hdel(cmd) => cmd.execute(store, loading).await,
            Sadd(cmd) => cmd.execute(store, loading).await,
            Sismember(cmd) => cmd.execute(store),
            Srem(cmd) => cmd.execute(store, loading).await,
            Zadd(cmd) => cmd.execute(store, loading).await,
            Zrangebyscore(cmd) => cmd.execute(store),
            Zrem(cmd) => cmd.execute(store, loading).await,
        }
    }

    /// The key the command addresses, fed to the expired-entry check that runs
    /// before dispatch. Multi-key commands report their first key.
    pub(crate) fn key(&self) -> &str {
        use Command::*;

        match self {
            Get(cmd) => cmd.key(),
            Mget(cmd) => cmd.key(),
            Set(cmd) => cmd.key(),
            Mset(cmd) => cmd.key(),
            Expire(cmd) | ExpireAt(cmd) => cmd.key(),
            Lpush(cmd) | Rpush(cmd) => cmd.key(),
            Lpop(cmd) | Rpop(cmd) => cmd.key(),
            Lrange(cmd) => cmd.key(),
            Hset(cmd) => cmd.key(),
            Hget(cmd) => cmd.key(),
            Hdel(cmd) => cmd.key(),
            Sadd(cmd) => cmd.key(),
            Sismember(cmd) => cmd.key(),
            Srem(cmd) => cmd.key(),
            Zadd(cmd) => cmd.key(),
            Zrangebyscore(cmd) => cmd.key(),
            Zrem(cmd) => cmd.key(),
        }
    }

    /// Returns the command name
    pub(crate) fn get_name(&self) -> &str {
        match self {
            Command::Get(_) => "get",
            Command::Mget(_) => "mget",
            Command::Set(_) => "set",
            Command::Mset(_) => "mset",
            Command::Expire(_) => "expire",
            Command::ExpireAt(_) => "expireat",
            Command::Lpush(_) => "lpush",
            Command::Rpush(_) => "rpush",
            Command::Lpop(_) => "lpop",
            Command::Rpop(_) => "rpop",
            Command::Lrange(_) => "lrange",
            Command::Hset(_) => "hset",
            Command::Hget(_) => "hget",
            Command::Hdel(_) => "hdel",
            Command::Sadd(_) => "sadd",
            Command::Sismember(_) => "sismember",
            Command::Srem(_) => "srem",
            Command::Zadd(_) => "zadd",
            Command::Zrangebyscore(_) => "zrangebyscore",
            Command::Zrem(_) => "zrem",
        }
    }
}

/// All commands should implement new_invalid() for the invalid check
pub trait Invalid {
    fn new_invalid() -> Self;
}

fn transform_parse<T: Invalid>(parse_res: crate::Result<T>) -> T {
    match parse_res {
        Ok(cmd) => cmd,
        Err(_) => T::new_invalid(),
    }
}

/// Argument bytes as a lossy UTF-8 string.
pub(crate) fn parse_string(arg: &Bytes) -> String {
    String::from_utf8_lossy(arg).to_string()
}

/// Argument bytes as a signed decimal. The whole argument must be a number;
/// trailing garbage is an error.
pub(crate) fn parse_int(arg: &Bytes) -> crate::Result<i64> {
    let s = std::str::from_utf8(arg)?;
    Ok(s.parse::<i64>()?)
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
    fn unknown_name_is_rejected() {
        assert!(Command::from_argv("flushall", &argv(&["x"])).is_none());
    }

    #[test]
    fn known_names_construct() {
        let cmd = Command::from_argv("get", &argv(&["foo"])).unwrap();
        assert_eq!(cmd.get_name(), "get");
        assert_eq!(cmd.key(), "foo");

        let cmd = Command::from_argv("zrangebyscore", &argv(&["z", "1", "2"])).unwrap();
        assert_eq!(cmd.get_name(), "zrangebyscore");
    }

    #[test]
    fn int_arguments_reject_garbage() {
        assert!(parse_int(&Bytes::from_static(b"12")).is_ok());
        assert!(parse_int(&Bytes::from_static(b"-3")).is_ok());
        assert!(parse_int(&Bytes::from_static(b"12abc")).is_err());
        assert!(parse_int(&Bytes::from_static(b"")).is_err());
    }
}
