//! ## Generic async Webdav protocol engine
//!
//! Webdav (RFC4918) is defined as
//! HTTP (GET/HEAD/PUT/DELETE) plus a bunch of extension methods (PROPFIND, etc).
//! These extension methods are used to manage collections (like unix directories),
//! get information on collections, rename and copy items, lock/unlock items, etc.
//!
//! This library is a `handler`: it takes a `http::Request`, processes it, and
//! generates a `http::Response`. Everything protocol-side lives here; storage
//! and policy are injected:
//!
//! - the library contains a [HTTP handler][DavHandler].
//! - you supply a [resource store][fs::DavResourceStore] for backend storage.
//! - you can supply a [locksystem][ls::DavLockSystem] that handles webdav locks.
//! - you can supply an [access evaluator][acl::DavAclEvaluator]; the default
//!   allows reading and listing only.
//!
//! The handler works with the standard http types from the `http` and
//! `http_body` crates, so it plugs into http libraries / frameworks that
//! also work with those types.
//!
//! Included are two resource stores, [`LocalFs`](fs::LocalFs) (a directory on
//! the local filesystem) and [`MemFs`](fs::MemFs) (ephemeral, in-memory), and
//! one locksystem, [`MemLs`](ls::MemLs).
//!
//! ## Conditional request semantics.
//!
//! The conditional header evaluation deliberately reproduces the legacy
//! engine this library replaces rather than RFC 7232: `If-Match` fails the
//! precondition when the etag *matches*, and the RFC 4918 `If` header is
//! parsed but not evaluated.
//!
//! ## Example.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dav_engine::{acl::FullAcl, body::Body, fs::MemFs, ls::MemLs, DavHandler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let dav = DavHandler::builder(MemFs::new())
//!         .locksystem(MemLs::new())
//!         .acl(Arc::new(FullAcl))
//!         .build();
//!
//!     let req = http::Request::builder()
//!         .method("PROPFIND")
//!         .uri("/")
//!         .header("depth", "1")
//!         .body(Body::empty())
//!         .unwrap();
//!     let resp = dav.handle(req).await;
//!     println!("{}", resp.status());
//! }
//! ```

mod conditional;
mod davhandler;
mod errors;
mod multierror;
mod util;
mod xmltree_ext;

pub mod acl;
pub mod body;
pub mod davheaders;
pub mod davpath;
pub mod fs;
pub mod ls;

pub use crate::davhandler::{DavBuilder, DavHandler};
pub use crate::errors::{DavError, DavResult};
pub use crate::util::{DavMethod, DavMethodSet};
