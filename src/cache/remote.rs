//! Remote cache tier.
//!
//! Open question (§9): the source provides only a placeholder remote tier.
//! Rather than invent network semantics that were never specified, the
//! `remote`/`hybrid` strategies are accepted at the config layer but return
//! `Error::NotImplemented` the first time a remote-backed operation would
//! actually run.

use crate::error::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};

pub trait RemoteCache: Send + Sync {
    fn get_raw(&self, key: &str) -> Result<Option<(serde_json::Value, u64)>>;
    fn set_raw(&self, key: &str, value: serde_json::Value, ttl_seconds: u64) -> Result<()>;
    fn delete(&self, key: &str) -> Result<bool>;
}

pub struct UnimplementedRemoteCache;

impl RemoteCache for UnimplementedRemoteCache {
    fn get_raw(&self, _key: &str) -> Result<Option<(serde_json::Value, u64)>> {
        Err(Error::NotImplemented("remote cache tier".to_string()))
    }

    fn set_raw(&self, _key: &str, _value: serde_json::Value, _ttl_seconds: u64) -> Result<()> {
        Err(Error::NotImplemented("remote cache tier".to_string()))
    }

    fn delete(&self, _key: &str) -> Result<bool> {
        Err(Error::NotImplemented("remote cache tier".to_string()))
    }
}

pub fn get<T: DeserializeOwned>(remote: &dyn RemoteCache, key: &str) -> Result<Option<(T, u64)>> {
    match remote.get_raw(key)? {
        Some((value, ttl)) => Ok(serde_json::from_value(value).ok().map(|v| (v, ttl))),
        None => Ok(None),
    }
}

pub fn set<T: Serialize>(remote: &dyn RemoteCache, key: &str, value: &T, ttl_seconds: u64) -> Result<()> {
    let json = serde_json::to_value(value).map_err(Error::from)?;
    remote.set_raw(key, json, ttl_seconds)
}
