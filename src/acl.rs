//! Access control.
//!
//! An [`DavAcl`] is computed per request for the path the request
//! addresses, and never persisted. The handler consults one capability
//! per method (read for GET on objects, list for PROPFIND and
//! collection listings, and so on).
//!
//! Caller identity is ambient: an evaluator that cares about users
//! should capture the principal when it is constructed, one instance
//! per authenticated connection.

use crate::davpath::DavPath;

/// Permission set for one path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DavAcl {
    pub read: bool,
    pub write: bool,
    pub delete: bool,
    pub create: bool,
    pub relocate: bool,
    pub list: bool,
}

impl DavAcl {
    /// Read and list, nothing else. The default policy.
    pub fn read_only() -> DavAcl {
        DavAcl {
            read: true,
            list: true,
            ..Default::default()
        }
    }

    /// All permissions granted.
    pub fn full() -> DavAcl {
        DavAcl {
            read: true,
            write: true,
            delete: true,
            create: true,
            relocate: true,
            list: true,
        }
    }
}

/// Computes the permission set for a path.
///
/// Evaluation must be a pure function of the path (and whatever identity
/// the implementation captured at construction); it must not do I/O.
pub trait DavAclEvaluator: Send + Sync {
    fn evaluate(&self, path: &DavPath) -> DavAcl;
}

/// The default evaluator: read-only with listing enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyAcl;

impl DavAclEvaluator for ReadOnlyAcl {
    fn evaluate(&self, _path: &DavPath) -> DavAcl {
        DavAcl::read_only()
    }
}

/// Grants everything. For tests and trusted deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullAcl;

impl DavAclEvaluator for FullAcl {
    fn evaluate(&self, _path: &DavPath) -> DavAcl {
        DavAcl::full()
    }
}
