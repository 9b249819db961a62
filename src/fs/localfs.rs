//! Local filesystem backend.
//!
//! Stateless: every operation translates the request path under the
//! configured base directory and goes straight to `tokio::fs`. Etags are
//! derived from inode-independent metadata (length + mtime), close to
//! the default apache scheme.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use futures_util::FutureExt;
use log::{debug, trace};

use crate::davheaders::Depth;
use crate::davpath::DavPath;
use crate::fs::*;

pub struct LocalFs {
    basedir: PathBuf,
}

impl LocalFs {
    /// Serve the directory at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Arc<LocalFs> {
        Arc::new(LocalFs {
            basedir: base.into(),
        })
    }

    fn abs_path(&self, path: &DavPath) -> PathBuf {
        let mut pathbuf = self.basedir.clone();
        pathbuf.push(path.as_rel_ospath());
        pathbuf
    }
}

fn meta_to_resource(path: DavPath, meta: &std::fs::Metadata) -> DavResource {
    let modified = meta.modified().unwrap_or(UNIX_EPOCH);
    let t = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() * 1_000_000 + d.subsec_nanos() as u64 / 1000)
        .unwrap_or(0);
    let (kind, len, etag) = if meta.is_dir() {
        (ResourceKind::Collection, 0, format!("{t:x}"))
    } else {
        (ResourceKind::Object, meta.len(), format!("{:x}-{t:x}", meta.len()))
    };
    let mut path = path;
    if kind == ResourceKind::Collection {
        path.add_slash();
    } else {
        path.remove_slash();
    }
    DavResource::present(
        path,
        ResourceMeta {
            kind,
            len,
            modified,
            created: meta.created().ok(),
            etag,
        },
    )
}

// One directory level, entries sorted by name for stable output.
async fn read_dir_sorted(abs: &Path) -> FsResult<Vec<(String, std::fs::Metadata)>> {
    let mut rd = tokio::fs::read_dir(abs).await?;
    let mut entries = Vec::new();
    while let Some(entry) = rd.next_entry().await? {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => {
                debug!("skipping non-utf8 entry in {abs:?}");
                continue;
            }
        };
        match entry.metadata().await {
            Ok(meta) => entries.push((name, meta)),
            Err(e) => debug!("metadata error on {name}: {e}"),
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

impl LocalFs {
    fn walk<'a>(
        &'a self,
        path: &'a DavPath,
        depth: Depth,
        out: &'a mut Vec<DavResource>,
    ) -> FsFuture<'a, ()> {
        async move {
            for (name, meta) in read_dir_sorted(&self.abs_path(path)).await? {
                let child = path.child(&name);
                let is_dir = meta.is_dir();
                out.push(meta_to_resource(child.clone(), &meta));
                if is_dir && depth == Depth::Infinity {
                    // ignore subtrees we cannot read.
                    let _ = self.walk(&child, depth, out).await;
                }
            }
            Ok(())
        }
        .boxed()
    }

    fn copy_tree<'a>(
        &'a self,
        from: &'a DavPath,
        to: &'a DavPath,
        errors: &'a mut Vec<(DavPath, FsError)>,
    ) -> FsFuture<'a, ()> {
        async move {
            let entries = match read_dir_sorted(&self.abs_path(from)).await {
                Ok(entries) => entries,
                Err(e) => {
                    errors.push((from.clone(), e));
                    return Ok(());
                }
            };
            for (name, meta) in entries {
                let src = from.child(&name);
                let dst = to.child(&name);
                if meta.is_dir() {
                    if let Err(e) = tokio::fs::create_dir(self.abs_path(&dst)).await {
                        let e = FsError::from(e);
                        if e != FsError::Exists {
                            errors.push((dst.clone(), e));
                            continue;
                        }
                    }
                    self.copy_tree(&src, &dst, errors).await?;
                } else if let Err(e) =
                    tokio::fs::copy(self.abs_path(&src), self.abs_path(&dst)).await
                {
                    errors.push((dst, e.into()));
                }
            }
            Ok(())
        }
        .boxed()
    }
}

impl DavResourceStore for LocalFs {
    fn resolve<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, DavResource> {
        async move {
            match tokio::fs::metadata(self.abs_path(path)).await {
                Ok(meta) => Ok(meta_to_resource(path.clone(), &meta)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Ok(DavResource::absent(path.clone()))
                }
                Err(e) => Err(e.into()),
            }
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
            let meta = tokio::fs::metadata(self.abs_path(path)).await?;
            let mut out = Vec::new();
            if include_self {
                out.push(meta_to_resource(path.clone(), &meta));
            }
            if meta.is_dir() && depth != Depth::Zero {
                let walk_depth = match depth {
                    Depth::One => Depth::Zero,
                    d => d,
                };
                self.walk(path, walk_depth, &mut out).await?;
            }
            Ok(out)
        }
        .boxed()
    }

    fn read<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Bytes> {
        async move {
            trace!("FS: read {path:?}");
            Ok(Bytes::from(tokio::fs::read(self.abs_path(path)).await?))
        }
        .boxed()
    }

    fn write<'a>(&'a self, path: &'a DavPath, data: Bytes) -> FsFuture<'a, ()> {
        async move {
            trace!("FS: write {path:?}");
            Ok(tokio::fs::write(self.abs_path(path), &data).await?)
        }
        .boxed()
    }

    fn create_collection<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        async move {
            trace!("FS: create_collection {path:?}");
            Ok(tokio::fs::create_dir(self.abs_path(path)).await?)
        }
        .boxed()
    }

    fn delete<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        async move {
            trace!("FS: delete {path:?}");
            let abs = self.abs_path(path);
            let meta = tokio::fs::metadata(&abs).await?;
            if meta.is_dir() {
                Ok(tokio::fs::remove_dir_all(abs).await?)
            } else {
                Ok(tokio::fs::remove_file(abs).await?)
            }
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
            trace!("FS: copy {from:?} {to:?}");
            let meta = tokio::fs::metadata(self.abs_path(from)).await?;
            let mut errors = Vec::new();
            if meta.is_dir() {
                if let Err(e) = tokio::fs::create_dir(self.abs_path(to)).await {
                    let e = FsError::from(e);
                    if e != FsError::Exists {
                        return Err(e);
                    }
                }
                if depth == Depth::Infinity {
                    self.copy_tree(from, to, &mut errors).await?;
                }
            } else {
                tokio::fs::copy(self.abs_path(from), self.abs_path(to)).await?;
            }
            Ok(errors)
        }
        .boxed()
    }

    fn mv<'a>(
        &'a self,
        from: &'a DavPath,
        to: &'a DavPath,
    ) -> FsFuture<'a, Vec<(DavPath, FsError)>> {
        async move {
            trace!("FS: rename {from:?} {to:?}");
            tokio::fs::rename(self.abs_path(from), self.abs_path(to)).await?;
            Ok(Vec::new())
        }
        .boxed()
    }
}
