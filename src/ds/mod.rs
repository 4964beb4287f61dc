//! The five value containers a key may hold.
//!
//! Each container knows its own key and can serialise itself back into the one
//! command that recreates its current state, which is what the append-only log
//! compaction is built on.

mod string;
pub(crate) use string::StringEntity;

mod list;
pub(crate) use list::ListEntity;

mod hash;
pub(crate) use hash::HashEntity;

mod set;
pub(crate) use set::SetEntity;

mod zset;
pub(crate) use zset::SortedSet;

use bytes::Bytes;

/// A value stored under a key.
///
/// Typed operations against a key holding a different variant are answered
/// with `WRONGTYPE`; the variant of a live key never changes without the key
/// being deleted first.
#[derive(Debug)]
pub(crate) enum Value {
    Str(StringEntity),
    List(ListEntity),
    Hash(HashEntity),
    Set(SetEntity),
    Zset(SortedSet),
}

impl Value {
    /// The single command that recreates this value under its key.
    pub(crate) fn to_cmd(&self) -> Vec<Bytes> {
        match self {
            Value::Str(s) => s.to_cmd(),
            Value::List(l) => l.to_cmd(),
            Value::Hash(h) => h.to_cmd(),
            Value::Set(s) => s.to_cmd(),
            Value::Zset(z) => z.to_cmd(),
        }
    }
}
