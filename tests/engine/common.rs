#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use http::{Request, Response};

use dav_engine::acl::FullAcl;
use dav_engine::body::Body;
use dav_engine::davheaders::Depth;
use dav_engine::davpath::DavPath;
use dav_engine::fs::{DavResource, DavResourceStore, FsError, FsFuture, MemFs};
use dav_engine::ls::MemLs;
use dav_engine::DavHandler;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Handler over an empty MemFs with locks and full access.
pub fn empty() -> DavHandler {
    init_logging();
    DavHandler::builder(MemFs::new())
        .locksystem(MemLs::new())
        .acl(Arc::new(FullAcl))
        .build()
}

/// Fill a store with the standard test tree:
///
///   /file.txt      "hello"
///   /col/
///   /col/a.txt     "aaa"
pub async fn seed(fs: &MemFs) {
    let p = |s| DavPath::from_str_and_prefix(s, "").unwrap();
    fs.create_collection(&p("/col")).await.unwrap();
    fs.write(&p("/file.txt"), Bytes::from("hello")).await.unwrap();
    fs.write(&p("/col/a.txt"), Bytes::from("aaa")).await.unwrap();
}

/// Handler over a seeded MemFs with locks and full access.
pub async fn seeded() -> DavHandler {
    init_logging();
    let fs = MemFs::new();
    seed(&fs).await;
    DavHandler::builder(fs)
        .locksystem(MemLs::new())
        .acl(Arc::new(FullAcl))
        .build()
}

/// A store that performs mutations on the wrapped MemFs but reports
/// them as failed, for exercising the partial-failure paths.
pub struct FailingFs {
    pub inner: Arc<MemFs>,
    pub fail_delete: bool,
    pub fail_mv: bool,
}

impl DavResourceStore for FailingFs {
    fn resolve<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, DavResource> {
        self.inner.resolve(path)
    }

    fn descendants<'a>(
        &'a self,
        path: &'a DavPath,
        depth: Depth,
        include_self: bool,
    ) -> FsFuture<'a, Vec<DavResource>> {
        self.inner.descendants(path, depth, include_self)
    }

    fn read<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Bytes> {
        self.inner.read(path)
    }

    fn write<'a>(&'a self, path: &'a DavPath, data: Bytes) -> FsFuture<'a, ()> {
        self.inner.write(path, data)
    }

    fn create_collection<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        self.inner.create_collection(path)
    }

    fn delete<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        if self.fail_delete {
            return Box::pin(async { Err(FsError::GeneralFailure) });
        }
        self.inner.delete(path)
    }

    fn copy<'a>(
        &'a self,
        from: &'a DavPath,
        to: &'a DavPath,
        depth: Depth,
    ) -> FsFuture<'a, Vec<(DavPath, FsError)>> {
        self.inner.copy(from, to, depth)
    }

    fn mv<'a>(
        &'a self,
        from: &'a DavPath,
        to: &'a DavPath,
    ) -> FsFuture<'a, Vec<(DavPath, FsError)>> {
        if self.fail_mv {
            return Box::pin(async move {
                let mut errors = self.inner.mv(from, to).await?;
                errors.push((from.clone(), FsError::GeneralFailure));
                Ok(errors)
            });
        }
        self.inner.mv(from, to)
    }
}

pub fn request(method: &str, uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    request_with_body(method, uri, headers, "")
}

pub fn request_with_body(
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
        b = b.header(*k, *v);
    }
    let body = if body.is_empty() {
        Body::empty()
    } else {
        Body::from(body.to_string())
    };
    b.body(body).unwrap()
}

pub async fn body_string(resp: &mut Response<Body>) -> String {
    let mut data = Vec::new();
    while let Some(chunk) = resp.body_mut().next().await {
        data.extend_from_slice(&chunk.unwrap());
    }
    String::from_utf8(data).unwrap()
}

pub fn header<'a>(resp: &'a Response<Body>, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}
