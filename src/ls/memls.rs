//! Ephemeral in-memory locksystem.
//!
//! One mutex guards the whole table, so the conflict check and the
//! insert of `acquire` happen under a single critical section, as do
//! lookup and removal in `release`. Expired locks are purged lazily on
//! every table access.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use log::debug;
use parking_lot::Mutex;
use uuid::Uuid;
use xmltree::Element;

use crate::davpath::DavPath;
use crate::ls::*;

#[derive(Debug)]
pub struct MemLs {
    // key: canonical path of the locked resource.
    table: Mutex<HashMap<String, Vec<DavLock>>>,
}

impl MemLs {
    /// Create a new in-memory locksystem.
    pub fn new() -> Arc<MemLs> {
        Arc::new(MemLs {
            table: Mutex::new(HashMap::new()),
        })
    }
}

fn purge_expired(table: &mut HashMap<String, Vec<DavLock>>, now: SystemTime) {
    table.retain(|_, locks| {
        locks.retain(|l| !l.expired(now));
        !locks.is_empty()
    });
}

// All locks that cover `path`: locks on the path itself plus deep
// locks on any ancestor.
fn covering<'a>(
    table: &'a HashMap<String, Vec<DavLock>>,
    path: &DavPath,
) -> impl Iterator<Item = &'a DavLock> {
    let key = path.key().to_string();
    table.values().flatten().filter(move |lock| {
        let lock_key = lock.path.key();
        lock_key == key
            || (lock.deep
                && (lock_key == "/"
                    || (key.starts_with(lock_key)
                        && key.as_bytes().get(lock_key.len()) == Some(&b'/'))))
    })
}

impl DavLockSystem for MemLs {
    fn acquire(
        &self,
        path: &DavPath,
        scope: LockScope,
        ltype: LockType,
        deep: bool,
        timeout: Duration,
        owner: Option<Element>,
    ) -> Option<DavLock> {
        let mut table = self.table.lock();
        let now = SystemTime::now();
        purge_expired(&mut table, now);

        for lock in covering(&table, path) {
            if lock.scope == LockScope::Exclusive || scope == LockScope::Exclusive {
                debug!("acquire {path}: conflict with {}", lock.token);
                return None;
            }
        }

        let lock = DavLock {
            token: format!("opaquelocktoken:{}", Uuid::new_v4()),
            path: path.clone(),
            scope,
            ltype,
            deep,
            timeout,
            issued: now,
            owner,
        };
        debug!("acquire {path}: granted {}", lock.token);
        table
            .entry(path.key().to_string())
            .or_default()
            .push(lock.clone());
        Some(lock)
    }

    fn release(&self, token: &str) -> bool {
        let mut table = self.table.lock();
        purge_expired(&mut table, SystemTime::now());
        let mut found = false;
        table.retain(|_, locks| {
            let before = locks.len();
            locks.retain(|l| l.token != token);
            found |= locks.len() != before;
            !locks.is_empty()
        });
        debug!("release {token}: {}", if found { "ok" } else { "unknown" });
        found
    }

    fn delete_locks(&self, path: &DavPath) {
        let mut table = self.table.lock();
        let key = path.key().to_string();
        table.retain(|lock_key, _| {
            !(lock_key == &key
                || key == "/"
                || (lock_key.starts_with(&key)
                    && lock_key.as_bytes().get(key.len()) == Some(&b'/')))
        });
    }

    fn discover(&self, path: &DavPath) -> Vec<DavLock> {
        let mut table = self.table.lock();
        purge_expired(&mut table, SystemTime::now());
        covering(&table, path).cloned().collect()
    }
}
