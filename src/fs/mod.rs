//! The storage contract the engine consumes.
//!
//! A backend implements [`DavResourceStore`]. Resources are handed to the
//! engine as immutable [`DavResource`] snapshots, produced by
//! [`resolve`](DavResourceStore::resolve); after a mutating operation the
//! engine re-resolves instead of patching a stale snapshot.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::SystemTime;

use bytes::Bytes;

use crate::davheaders::Depth;
use crate::davpath::DavPath;

#[cfg(feature = "localfs")]
pub mod localfs;
#[cfg(feature = "memfs")]
pub mod memfs;

#[cfg(feature = "localfs")]
pub use self::localfs::LocalFs;
#[cfg(feature = "memfs")]
pub use self::memfs::MemFs;

/// Errors a backend can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    NotFound,
    Forbidden,
    Exists,
    GeneralFailure,
    NotImplemented,
}

pub type FsResult<T> = Result<T, FsError>;
pub type FsFuture<'a, T> = Pin<Box<dyn Future<Output = FsResult<T>> + Send + 'a>>;

impl FsError {
    pub fn statuscode(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            FsError::NotFound => StatusCode::NOT_FOUND,
            FsError::Forbidden => StatusCode::FORBIDDEN,
            FsError::Exists => StatusCode::METHOD_NOT_ALLOWED,
            FsError::GeneralFailure => StatusCode::INTERNAL_SERVER_ERROR,
            FsError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for FsError {}

impl From<io::Error> for FsError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => FsError::NotFound,
            io::ErrorKind::PermissionDenied => FsError::Forbidden,
            io::ErrorKind::AlreadyExists => FsError::Exists,
            _ => FsError::GeneralFailure,
        }
    }
}

/// What kind of node a resource is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Collection,
    Object,
}

/// Content metadata of an existing resource.
#[derive(Debug, Clone)]
pub struct ResourceMeta {
    pub kind: ResourceKind,
    /// Content length; zero for collections.
    pub len: u64,
    pub modified: SystemTime,
    pub created: Option<SystemTime>,
    /// Opaque strong identity of the current content.
    pub etag: String,
}

/// An immutable snapshot of one node in the resource tree.
///
/// A snapshot of a non-existent path carries no metadata at all, so
/// `is_collection`/`is_object` can never both hold and absent resources
/// never expose content metadata.
#[derive(Debug, Clone)]
pub struct DavResource {
    path: DavPath,
    meta: Option<ResourceMeta>,
}

impl DavResource {
    /// Snapshot of a path that does not exist.
    pub fn absent(path: DavPath) -> DavResource {
        DavResource { path, meta: None }
    }

    /// Snapshot of an existing resource.
    pub fn present(path: DavPath, meta: ResourceMeta) -> DavResource {
        DavResource {
            path,
            meta: Some(meta),
        }
    }

    pub fn path(&self) -> &DavPath {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.meta.is_some()
    }

    pub fn is_collection(&self) -> bool {
        matches!(
            self.meta,
            Some(ResourceMeta {
                kind: ResourceKind::Collection,
                ..
            })
        )
    }

    pub fn is_object(&self) -> bool {
        matches!(
            self.meta,
            Some(ResourceMeta {
                kind: ResourceKind::Object,
                ..
            })
        )
    }

    /// Content metadata, if the resource exists.
    pub fn meta(&self) -> Option<&ResourceMeta> {
        self.meta.as_ref()
    }

    pub fn etag(&self) -> Option<&str> {
        self.meta.as_ref().map(|m| m.etag.as_str())
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.meta.as_ref().map(|m| m.modified)
    }

    pub fn len(&self) -> Option<u64> {
        self.meta.as_ref().map(|m| m.len)
    }
}

/// The capability set the engine requires from a storage backend.
///
/// All operations are keyed by path. `resolve` never fails for a missing
/// path; it returns an absent snapshot. The recursive operations return
/// per-path error lists that the engine turns into multi-status
/// responses; an empty list means full success.
pub trait DavResourceStore: Send + Sync {
    /// Take a fresh snapshot of the node at `path`.
    fn resolve<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, DavResource>;

    /// Snapshot `path` and its descendants, bounded by `depth`.
    ///
    /// The result is in deterministic pre-order (lexicographic by path),
    /// which keeps PROPFIND output stable across runs.
    fn descendants<'a>(
        &'a self,
        path: &'a DavPath,
        depth: Depth,
        include_self: bool,
    ) -> FsFuture<'a, Vec<DavResource>>;

    /// Read the full content of an object.
    fn read<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Bytes>;

    /// Create or replace an object's content. The engine checks for a
    /// missing parent first.
    fn write<'a>(&'a self, path: &'a DavPath, data: Bytes) -> FsFuture<'a, ()>;

    /// Create an empty collection.
    fn create_collection<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()>;

    /// Remove the node, recursively for collections.
    fn delete<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()>;

    /// Copy `from` to `to`. `depth` is `Zero` (the node only) or
    /// `Infinity` (full subtree); the engine rejects `One`.
    fn copy<'a>(
        &'a self,
        from: &'a DavPath,
        to: &'a DavPath,
        depth: Depth,
    ) -> FsFuture<'a, Vec<(DavPath, FsError)>>;

    /// Move `from` to `to`, subtree included.
    fn mv<'a>(&'a self, from: &'a DavPath, to: &'a DavPath)
        -> FsFuture<'a, Vec<(DavPath, FsError)>>;
}
