//! Conditional request handling (If-Match, If-None-Match,
//! If-Modified-Since, If-Unmodified-Since).
//!
//! The evaluation order matters: a pending not-modified verdict from
//! If-Modified-Since is cancelled when If-None-Match is present.
//!
//! Two deliberate deviations from RFC 7232, kept for parity with the
//! behavior this engine replaces (see README/DESIGN notes):
//!
//! * If-Match fails the precondition when the etag *does* match (or `*`
//!   is given), the inverse of the RFC's intent.
//! * The general `If` header (lock-token conditionals, RFC 4918 §10.4)
//!   is parsed but never evaluated.

use std::time::SystemTime;

use headers::{ETag, HeaderMapExt, IfMatch, IfModifiedSince, IfNoneMatch, IfUnmodifiedSince};
use http::Request;
use log::debug;

use crate::davheaders::parse_if_header;
use crate::fs::DavResource;
use crate::util::DavMethod;

/// Outcome of conditional-header evaluation. Anything but `Proceed`
/// short-circuits the method handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Proceed,
    NotModified,
    PreconditionFailed,
}

/// Evaluate the conditional headers of `req` against a resource
/// snapshot. A no-op for resources that do not exist.
pub fn evaluate_conditions(
    req: &Request<()>,
    res: &DavResource,
    method: DavMethod,
) -> Condition {
    let (etag, mtime) = match res.meta() {
        None => return Condition::Proceed,
        Some(meta) => (meta.etag.as_str(), meta.modified),
    };
    let etag: Option<ETag> = format!("\"{etag}\"").parse().ok();

    if let Some(if_match) = req.headers().typed_get::<IfMatch>() {
        // Legacy semantics: fail when `*` is present or the etag matches.
        let matches = match &etag {
            Some(etag) => if_match.precondition_passes(etag),
            None => if_match.is_any(),
        };
        if matches {
            return Condition::PreconditionFailed;
        }
    }

    // Evaluate, but don't return yet: this verdict can be cancelled by
    // an If-None-Match header below.
    let mut pending_not_modified = req
        .headers()
        .typed_get::<IfModifiedSince>()
        .map(|ims| SystemTime::from(ims) > mtime)
        .unwrap_or(false);

    if let Some(inm) = req.headers().typed_get::<IfNoneMatch>() {
        let matches = match &etag {
            Some(etag) => !inm.precondition_passes(etag),
            None => false,
        };
        if matches {
            if matches!(method, DavMethod::Get | DavMethod::Head) {
                return Condition::NotModified;
            }
            return Condition::PreconditionFailed;
        }
        // If-None-Match takes precedence over If-Modified-Since.
        pending_not_modified = false;
    }

    if let Some(ius) = req.headers().typed_get::<IfUnmodifiedSince>() {
        if SystemTime::from(ius) <= mtime {
            return Condition::PreconditionFailed;
        }
    }

    if pending_not_modified {
        return Condition::NotModified;
    }

    // The general `If` header: tokenized only, never evaluated.
    if let Some(raw) = req.headers().get("if").and_then(|v| v.to_str().ok()) {
        debug!("if header present (not evaluated): {:?}", parse_if_header(raw));
    }

    Condition::Proceed
}
