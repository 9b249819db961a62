//! Ephemeral in-memory storage backend.
//!
//! The whole tree lives in one `BTreeMap` keyed by canonical path, which
//! makes descendant enumeration naturally deterministic (lexicographic,
//! parents before children). Used by the test suite, and useful as a
//! scratch share.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use futures_util::FutureExt;
use parking_lot::Mutex;

use crate::davheaders::Depth;
use crate::davpath::DavPath;
use crate::fs::*;

pub struct MemFs {
    inner: Mutex<Inner>,
}

struct Inner {
    nodes: BTreeMap<String, MemNode>,
    serial: u64,
}

#[derive(Clone)]
struct MemNode {
    kind: ResourceKind,
    data: Bytes,
    modified: SystemTime,
    created: SystemTime,
    etag: String,
}

impl MemFs {
    /// Create an empty in-memory tree with just the root collection.
    pub fn new() -> Arc<MemFs> {
        let mut nodes = BTreeMap::new();
        let now = SystemTime::now();
        nodes.insert(
            "/".to_string(),
            MemNode {
                kind: ResourceKind::Collection,
                data: Bytes::new(),
                modified: now,
                created: now,
                etag: "0-0".to_string(),
            },
        );
        Arc::new(MemFs {
            inner: Mutex::new(Inner { nodes, serial: 1 }),
        })
    }
}

impl Inner {
    fn next_etag(&mut self, len: u64) -> String {
        self.serial += 1;
        format!("{:x}-{:x}", self.serial, len)
    }

    fn touch(&mut self, key: &str) {
        let etag = self.next_etag(0);
        if let Some(node) = self.nodes.get_mut(key) {
            node.modified = SystemTime::now();
            node.etag = etag;
        }
    }

    fn snapshot(&self, path: &DavPath, key: &str) -> DavResource {
        match self.nodes.get(key) {
            None => DavResource::absent(path.clone()),
            Some(node) => DavResource::present(
                DavPath::from_key(key, path.prefix(), node.kind == ResourceKind::Collection),
                ResourceMeta {
                    kind: node.kind,
                    len: node.data.len() as u64,
                    modified: node.modified,
                    created: Some(node.created),
                    etag: node.etag.clone(),
                },
            ),
        }
    }

    // keys strictly below `key`, cloned out so the lock can be dropped.
    fn keys_under(&self, key: &str) -> Vec<String> {
        let prefix = if key == "/" {
            "/".to_string()
        } else {
            format!("{key}/")
        };
        self.nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn parent_is_collection(&self, key: &str) -> bool {
        if key == "/" {
            return false;
        }
        let idx = key.rfind('/').unwrap_or(0);
        let parent = if idx == 0 { "/" } else { &key[..idx] };
        matches!(
            self.nodes.get(parent),
            Some(MemNode {
                kind: ResourceKind::Collection,
                ..
            })
        )
    }
}

// map a key below `from` to the corresponding key below `to`.
fn rekey(key: &str, from: &str, to: &str) -> String {
    if key == from {
        to.to_string()
    } else {
        format!("{}{}", to, &key[from.len()..])
    }
}

impl DavResourceStore for MemFs {
    fn resolve<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, DavResource> {
        async move {
            let inner = self.inner.lock();
            Ok(inner.snapshot(path, path.key()))
        }
        .boxed()
    }

    fn descendants<'a>(
        &'a self,
        path: &'a DavPath,
        depth: Depth,
        include_self: bool,
    ) -> FsFuture<'a, Vec<DavResource>> {
        async move {
            let inner = self.inner.lock();
            let key = path.key();
            if !inner.nodes.contains_key(key) {
                return Err(FsError::NotFound);
            }
            let mut out = Vec::new();
            if include_self {
                out.push(inner.snapshot(path, key));
            }
            if depth == Depth::Zero {
                return Ok(out);
            }
            let prefix_len = if key == "/" { 1 } else { key.len() + 1 };
            for child in inner.keys_under(key) {
                // depth 1: immediate children only.
                if depth == Depth::One && child[prefix_len..].contains('/') {
                    continue;
                }
                out.push(inner.snapshot(path, &child));
            }
            Ok(out)
        }
        .boxed()
    }

    fn read<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Bytes> {
        async move {
            let inner = self.inner.lock();
            match inner.nodes.get(path.key()) {
                None => Err(FsError::NotFound),
                Some(node) if node.kind == ResourceKind::Collection => Err(FsError::Forbidden),
                Some(node) => Ok(node.data.clone()),
            }
        }
        .boxed()
    }

    fn write<'a>(&'a self, path: &'a DavPath, data: Bytes) -> FsFuture<'a, ()> {
        async move {
            let mut inner = self.inner.lock();
            let key = path.key().to_string();
            if !inner.parent_is_collection(&key) {
                return Err(FsError::NotFound);
            }
            match inner.nodes.get(&key) {
                Some(node) if node.kind == ResourceKind::Collection => {
                    return Err(FsError::Forbidden)
                }
                _ => {}
            }
            let now = SystemTime::now();
            let etag = inner.next_etag(data.len() as u64);
            let created = inner.nodes.get(&key).map(|n| n.created).unwrap_or(now);
            inner.nodes.insert(
                key,
                MemNode {
                    kind: ResourceKind::Object,
                    data,
                    modified: now,
                    created,
                    etag,
                },
            );
            Ok(())
        }
        .boxed()
    }

    fn create_collection<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        async move {
            let mut inner = self.inner.lock();
            let key = path.key().to_string();
            if inner.nodes.contains_key(&key) {
                return Err(FsError::Exists);
            }
            if !inner.parent_is_collection(&key) {
                return Err(FsError::NotFound);
            }
            let now = SystemTime::now();
            let etag = inner.next_etag(0);
            inner.nodes.insert(
                key,
                MemNode {
                    kind: ResourceKind::Collection,
                    data: Bytes::new(),
                    modified: now,
                    created: now,
                    etag,
                },
            );
            Ok(())
        }
        .boxed()
    }

    fn delete<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        async move {
            let mut inner = self.inner.lock();
            let key = path.key().to_string();
            if key == "/" {
                return Err(FsError::Forbidden);
            }
            if inner.nodes.remove(&key).is_none() {
                return Err(FsError::NotFound);
            }
            for child in inner.keys_under(&key) {
                inner.nodes.remove(&child);
            }
            Ok(())
        }
        .boxed()
    }

    fn copy<'a>(
        &'a self,
        from: &'a DavPath,
        to: &'a DavPath,
        depth: Depth,
    ) -> FsFuture<'a, Vec<(DavPath, FsError)>> {
        async move {
            let mut inner = self.inner.lock();
            let (from_key, to_key) = (from.key().to_string(), to.key().to_string());
            let node = match inner.nodes.get(&from_key) {
                None => return Err(FsError::NotFound),
                Some(n) => n.clone(),
            };
            if !inner.parent_is_collection(&to_key) {
                return Err(FsError::NotFound);
            }
            let now = SystemTime::now();
            let mut insert = |inner: &mut Inner, key: String, node: MemNode| {
                let etag = inner.next_etag(node.data.len() as u64);
                inner.nodes.insert(
                    key,
                    MemNode {
                        modified: now,
                        created: now,
                        etag,
                        ..node
                    },
                );
            };
            let is_collection = node.kind == ResourceKind::Collection;
            insert(&mut inner, to_key.clone(), node);
            if is_collection && depth == Depth::Infinity {
                for child in inner.keys_under(&from_key) {
                    let node = inner.nodes[&child].clone();
                    insert(&mut inner, rekey(&child, &from_key, &to_key), node);
                }
            }
            // re-number the whole destination chain.
            inner.touch(&to_key);
            Ok(Vec::new())
        }
        .boxed()
    }

    fn mv<'a>(
        &'a self,
        from: &'a DavPath,
        to: &'a DavPath,
    ) -> FsFuture<'a, Vec<(DavPath, FsError)>> {
        async move {
            let mut inner = self.inner.lock();
            let (from_key, to_key) = (from.key().to_string(), to.key().to_string());
            if !inner.nodes.contains_key(&from_key) {
                return Err(FsError::NotFound);
            }
            if !inner.parent_is_collection(&to_key) {
                return Err(FsError::NotFound);
            }
            let mut keys = vec![from_key.clone()];
            keys.extend(inner.keys_under(&from_key));
            for key in keys {
                if let Some(node) = inner.nodes.remove(&key) {
                    inner.nodes.insert(rekey(&key, &from_key, &to_key), node);
                }
            }
            inner.touch(&to_key);
            Ok(Vec::new())
        }
        .boxed()
    }
}
