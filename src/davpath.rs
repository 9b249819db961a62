//! Canonical request paths.
//!
//! A [`DavPath`] is the decoded, normalized, slash-separated path of the
//! resource a request addresses, together with the URL prefix that was
//! stripped off when routing the request to the handler. A trailing slash
//! is significant: it marks the path as addressing a collection.

use std::path::PathBuf;

use percent_encoding::{percent_decode, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::errors::DavError;
use crate::DavResult;

// Encode everything that is not valid in an URL path segment.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%');

/// A decoded and normalized URL path, plus the routing prefix.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DavPath {
    path: String,
    prefix: String,
}

impl std::fmt::Display for DavPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl std::fmt::Debug for DavPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.path)
    }
}

// Decode and normalize a raw url path. Rejects escapes of '/' and NUL,
// relative segments, and anything that doesn't start with a slash.
fn normalize(rawpath: &str) -> Result<String, DavError> {
    if rawpath == "*" {
        return Ok("*".to_string());
    }
    if !rawpath.starts_with('/') {
        return Err(DavError::InvalidPath);
    }
    let decoded = percent_decode(rawpath.as_bytes())
        .decode_utf8()
        .map_err(|_| DavError::InvalidPath)?;
    if decoded.contains('\0') {
        return Err(DavError::InvalidPath);
    }
    let is_collection = decoded.ends_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                // don't let the path escape upwards.
                if segments.pop().is_none() {
                    return Err(DavError::IllegalPath);
                }
            }
            s => segments.push(s),
        }
    }
    let mut path = String::from("/");
    path.push_str(&segments.join("/"));
    if is_collection && path.len() > 1 {
        path.push('/');
    }
    Ok(path)
}

impl DavPath {
    /// Build a `DavPath` from a request URI and the configured prefix.
    pub fn from_uri_and_prefix(uri: &http::Uri, prefix: &str) -> DavResult<DavPath> {
        DavPath::from_str_and_prefix(uri.path(), prefix)
    }

    /// Build a `DavPath` from a raw url path and the configured prefix.
    pub fn from_str_and_prefix(rawpath: &str, prefix: &str) -> DavResult<DavPath> {
        let prefix = prefix.trim_end_matches('/');
        let rest = if prefix.is_empty() {
            rawpath
        } else {
            match rawpath.strip_prefix(prefix) {
                Some("") => "/",
                Some(r) if r.starts_with('/') => r,
                _ => return Err(DavError::IllegalPath),
            }
        };
        Ok(DavPath {
            path: normalize(rest)?,
            prefix: prefix.to_string(),
        })
    }

    /// The decoded path, without the prefix.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// The prefix that was stripped off.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Percent-encoded url string, without the prefix.
    pub fn as_url_string(&self) -> String {
        utf8_percent_encode(&self.path, PATH_ENCODE_SET).to_string()
    }

    /// Percent-encoded url string, with the prefix put back on.
    pub fn as_url_string_with_prefix(&self) -> String {
        format!("{}{}", self.prefix, self.as_url_string())
    }

    /// Was this an `OPTIONS *` request path.
    pub fn is_star(&self) -> bool {
        self.path == "*"
    }

    /// Is this the root collection.
    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// Does the path have a trailing slash (i.e. address a collection).
    pub fn is_collection(&self) -> bool {
        self.path.ends_with('/')
    }

    /// Add a trailing slash if there is none.
    pub fn add_slash(&mut self) {
        if !self.is_collection() {
            self.path.push('/');
        }
    }

    /// Remove the trailing slash, if any (the root keeps its slash).
    pub fn remove_slash(&mut self) {
        while self.path.len() > 1 && self.path.ends_with('/') {
            self.path.pop();
        }
    }

    /// Canonical form used as a key in lock tables and backends:
    /// no trailing slash, except for the root itself.
    pub fn key(&self) -> &str {
        if self.path.len() > 1 {
            self.path.trim_end_matches('/')
        } else {
            &self.path
        }
    }

    /// The last path segment.
    pub fn file_name(&self) -> &str {
        self.key().rsplit('/').next().unwrap_or("")
    }

    /// The parent path (always marked as a collection).
    pub fn parent(&self) -> DavPath {
        let key = self.key();
        let idx = key.rfind('/').unwrap_or(0);
        let mut path = key[..idx].to_string();
        path.push('/');
        DavPath {
            path,
            prefix: self.prefix.clone(),
        }
    }

    /// The path relative to the root, for filesystem backends.
    pub fn as_rel_ospath(&self) -> PathBuf {
        PathBuf::from(self.key().trim_start_matches('/'))
    }

    /// True if `self` equals `other` or lies below it.
    pub fn is_under(&self, other: &DavPath) -> bool {
        let (a, b) = (self.key(), other.key());
        a == b || b == "/" || (a.starts_with(b) && a.as_bytes().get(b.len()) == Some(&b'/'))
    }

    // Build a path straight from a canonical key. Used by backends
    // when they enumerate descendants.
    pub(crate) fn from_key(key: &str, prefix: &str, collection: bool) -> DavPath {
        let mut path = key.to_string();
        if collection && !path.ends_with('/') {
            path.push('/');
        }
        DavPath {
            path,
            prefix: prefix.to_string(),
        }
    }

    /// A child of this path (which must be a collection path).
    pub fn child(&self, name: &str) -> DavPath {
        let mut path = self.key().to_string();
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(name);
        DavPath {
            path,
            prefix: self.prefix.clone(),
        }
    }
}
