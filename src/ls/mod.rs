//! The locksystem trait and lock types.
//!
//! Note that the methods DO NOT return futures, they are synchronous.
//! The only included locksystem, `MemLs`, does no I/O and all methods
//! return instantly. If ever a locksystem gets built that does I/O
//! (a database, the network) this will need to be revisited.

use std::fmt::Debug;
use std::time::{Duration, SystemTime};

use xmltree::Element;

use crate::davpath::DavPath;

pub mod memls;
pub use self::memls::MemLs;

/// Scope of a webdav lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScope {
    Exclusive,
    Shared,
}

impl LockScope {
    /// The `DAV:` element name inside `lockscope`.
    pub fn as_xml_name(&self) -> &'static str {
        match self {
            LockScope::Exclusive => "exclusive",
            LockScope::Shared => "shared",
        }
    }
}

/// Type of a webdav lock. RFC 4918 only defines write locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    Write,
}

impl LockType {
    pub fn as_xml_name(&self) -> &'static str {
        "write"
    }
}

/// An active lock, as stored by a locksystem and serialized into
/// `D:activelock` responses.
#[derive(Debug, Clone)]
pub struct DavLock {
    /// `opaquelocktoken:<uuid>`.
    pub token: String,
    /// Path the lock was taken on.
    pub path: DavPath,
    pub scope: LockScope,
    pub ltype: LockType,
    /// Depth infinity: the lock also covers descendants.
    pub deep: bool,
    pub timeout: Duration,
    /// When the lock was issued; expiry is `issued + timeout`.
    pub issued: SystemTime,
    /// Optional owner element from the LOCK request body.
    pub owner: Option<Element>,
}

impl DavLock {
    pub fn expired(&self, now: SystemTime) -> bool {
        now >= self.issued + self.timeout
    }
}

/// A lock manager: shared mutable state across concurrent requests.
///
/// Implementations must make the conflict-check-then-insert of `acquire`
/// and the lookup-then-remove of `release` atomic with respect to each
/// other.
pub trait DavLockSystem: Debug + Send + Sync {
    /// Try to take a lock on `path`. Returns `None` on conflict
    /// (an exclusive lock already covers the path, or any lock covers
    /// it while an exclusive one is requested).
    fn acquire(
        &self,
        path: &DavPath,
        scope: LockScope,
        ltype: LockType,
        deep: bool,
        timeout: Duration,
        owner: Option<Element>,
    ) -> Option<DavLock>;

    /// Release the lock with this token. `false` if no such lock.
    fn release(&self, token: &str) -> bool;

    /// Unconditionally drop every lock on `path` and below. Used before
    /// DELETE and before an overwriting COPY/MOVE destroys a subtree.
    fn delete_locks(&self, path: &DavPath);

    /// All active locks covering `path` (on the path itself, or deep
    /// locks on an ancestor).
    fn discover(&self, path: &DavPath) -> Vec<DavLock>;
}
