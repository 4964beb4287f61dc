//! The in-memory key space and the expiry index over it.
//!
//! A `Store` is owned by exactly one task (the executor); nothing in here is
//! synchronised. Mutating methods queue their recreating command on the
//! persister before replying, so the append log order is the execution order.

mod expire;
mod hash;
mod list;
mod set;
mod string;
mod zset;

use crate::ds::{HashEntity, ListEntity, SetEntity, SortedSet, StringEntity, Value};
use crate::persist::Persister;
use crate::utils::resp_wrong_type_err;
use crate::Frame;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct Store {
    data: HashMap<String, Value>,

    /// Absolute expiry per key, kept in lockstep with `expire_wheel`: a key is
    /// in one exactly when it is in the other, and the wheel score equals the
    /// expiry's unix seconds. Only live keys carry an expiry.
    expire_at: HashMap<String, DateTime<Utc>>,
    expire_wheel: SortedSet,

    persister: Arc<Persister>,
}

impl Store {
    pub(crate) fn new(persister: Arc<Persister>) -> Store {
        Store {
            data: HashMap::new(),
            expire_at: HashMap::new(),
            expire_wheel: SortedSet::new("expire-wheel"),
            persister,
        }
    }

    /// Enumerate live entries with their optional absolute expiry.
    pub(crate) fn for_each(&self, mut f: impl FnMut(&str, &Value, Option<&DateTime<Utc>>)) {
        let now = Utc::now();
        for (key, value) in &self.data {
            match self.expire_at.get(key) {
                Some(at) if *at <= now => continue,
                expire_at => f(key, value, expire_at),
            }
        }
    }

    /// Queue `record` on the append log and, when it crossed the rewrite
    /// threshold, follow it with a compaction snapshot of the live state.
    pub(crate) async fn persist(&self, loading: bool, record: Vec<Bytes>) {
        if self.persister.persist_cmd(loading, record).await {
            self.persister.schedule_rewrite(self.rewrite_snapshot()).await;
        }
    }

    /// The minimal command sequence that recreates the current live state:
    /// one recreating command per value, plus an `EXPIREAT` for every expiry
    /// still in the future.
    fn rewrite_snapshot(&self) -> Vec<Vec<Bytes>> {
        let now = Utc::now();
        let mut cmds = Vec::with_capacity(self.data.len());

        self.for_each(|key, value, expire_at| {
            cmds.push(value.to_cmd());
            if let Some(at) = expire_at {
                if *at > now {
                    cmds.push(vec![
                        Bytes::from_static(b"expireat"),
                        Bytes::copy_from_slice(key.as_bytes()),
                        Bytes::from(at.timestamp().to_string()),
                    ]);
                }
            }
        });

        cmds
    }

    // Typed access to `data`. A key holding another container kind yields the
    // `WRONGTYPE` reply; the `open_*` variants create an empty container on a
    // vacant key.

    fn get_str(&self, key: &str) -> Result<Option<&StringEntity>, Frame> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s)),
            Some(_) => Err(resp_wrong_type_err()),
        }
    }

    fn get_list(&mut self, key: &str) -> Result<Option<&mut ListEntity>, Frame> {
        match self.data.get_mut(key) {
            None => Ok(None),
            Some(Value::List(list)) => Ok(Some(list)),
            Some(_) => Err(resp_wrong_type_err()),
        }
    }

    fn get_list_ref(&self, key: &str) -> Result<Option<&ListEntity>, Frame> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::List(list)) => Ok(Some(list)),
            Some(_) => Err(resp_wrong_type_err()),
        }
    }

    fn open_list(&mut self, key: &str) -> Result<&mut ListEntity, Frame> {
        let value = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::List(ListEntity::new(key)));
        match value {
            Value::List(list) => Ok(list),
            _ => Err(resp_wrong_type_err()),
        }
    }

    fn get_hash(&self, key: &str) -> Result<Option<&HashEntity>, Frame> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(Some(hash)),
            Some(_) => Err(resp_wrong_type_err()),
        }
    }

    fn get_hash_mut(&mut self, key: &str) -> Result<Option<&mut HashEntity>, Frame> {
        match self.data.get_mut(key) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(Some(hash)),
            Some(_) => Err(resp_wrong_type_err()),
        }
    }

    fn open_hash(&mut self, key: &str) -> Result<&mut HashEntity, Frame> {
        let value = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashEntity::new(key)));
        match value {
            Value::Hash(hash) => Ok(hash),
            _ => Err(resp_wrong_type_err()),
        }
    }

    fn get_set(&self, key: &str) -> Result<Option<&SetEntity>, Frame> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::Set(set)) => Ok(Some(set)),
            Some(_) => Err(resp_wrong_type_err()),
        }
    }

    fn get_set_mut(&mut self, key: &str) -> Result<Option<&mut SetEntity>, Frame> {
        match self.data.get_mut(key) {
            None => Ok(None),
            Some(Value::Set(set)) => Ok(Some(set)),
            Some(_) => Err(resp_wrong_type_err()),
        }
    }

    fn open_set(&mut self, key: &str) -> Result<&mut SetEntity, Frame> {
        let value = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(SetEntity::new(key)));
        match value {
            Value::Set(set) => Ok(set),
            _ => Err(resp_wrong_type_err()),
        }
    }

    fn get_zset(&self, key: &str) -> Result<Option<&SortedSet>, Frame> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::Zset(zset)) => Ok(Some(zset)),
            Some(_) => Err(resp_wrong_type_err()),
        }
    }

    fn get_zset_mut(&mut self, key: &str) -> Result<Option<&mut SortedSet>, Frame> {
        match self.data.get_mut(key) {
            None => Ok(None),
            Some(Value::Zset(zset)) => Ok(Some(zset)),
            Some(_) => Err(resp_wrong_type_err()),
        }
    }

    fn open_zset(&mut self, key: &str) -> Result<&mut SortedSet, Frame> {
        let value = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Zset(SortedSet::new(key)));
        match value {
            Value::Zset(zset) => Ok(zset),
            _ => Err(resp_wrong_type_err()),
        }
    }
}
