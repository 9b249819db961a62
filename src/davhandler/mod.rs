//
// This module contains the main entry point of the library,
// DavHandler.
//
use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::{buf::Buf, Bytes};
use headers::HeaderMapExt;
use http::{Request, Response, StatusCode};
use http_body::Body as HttpBody;
use log::debug;

use crate::acl::{DavAcl, DavAclEvaluator, ReadOnlyAcl};
use crate::body::Body;
use crate::conditional::{evaluate_conditions, Condition};
use crate::davheaders;
use crate::davpath::DavPath;
use crate::errors::DavError;
use crate::fs::{DavResource, DavResourceStore};
use crate::ls::DavLockSystem;
use crate::util::{dav_method, DavMethod, DavMethodSet};
use crate::DavResult;

pub mod handle_copymove;
pub mod handle_delete;
pub mod handle_gethead;
pub mod handle_lock;
pub mod handle_mkcol;
pub mod handle_options;
pub mod handle_props;
pub mod handle_put;

// Upper bound on the bodies we buffer for the xml-carrying methods.
const MAX_XML_BODY: usize = 65536;

/// Configuration of the handler.
#[derive(Clone)]
pub struct DavBuilder {
    /// Prefix to be stripped off when handling requests.
    prefix: String,
    /// Storage backend.
    store: Arc<dyn DavResourceStore>,
    /// Locksystem backend.
    ls: Option<Arc<dyn DavLockSystem>>,
    /// Access control evaluator (defaults to read-only).
    acl: Arc<dyn DavAclEvaluator>,
    /// Set of enabled methods (defaults to all).
    allow: DavMethodSet,
}

impl DavBuilder {
    /// Create a new configuration builder.
    pub fn new(store: Arc<dyn DavResourceStore>) -> DavBuilder {
        Self {
            prefix: String::new(),
            store,
            ls: None,
            acl: Arc::new(ReadOnlyAcl),
            allow: DavMethodSet::all(),
        }
    }

    /// Use the configuration that was built to create a handler.
    pub fn build(self) -> DavHandler {
        self.into()
    }

    /// Prefix to be stripped off before translating the rest of
    /// the request path to a storage path.
    pub fn strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the locksystem to use. Without one, LOCK and UNLOCK
    /// answer 405.
    pub fn locksystem(mut self, ls: Arc<dyn DavLockSystem>) -> Self {
        self.ls = Some(ls);
        self
    }

    /// Set the access control evaluator.
    pub fn acl(mut self, acl: Arc<dyn DavAclEvaluator>) -> Self {
        self.acl = acl;
        self
    }

    /// Which methods to enable (default is all methods).
    pub fn methods(mut self, allow: DavMethodSet) -> Self {
        self.allow = allow;
        self
    }
}

/// The webdav handler.
///
/// For each request: resolve the target resource, check access,
/// evaluate the conditional headers, consult the lock manager,
/// perform the storage operation, build the response.
#[derive(Clone)]
pub struct DavHandler {
    pub(crate) prefix: Arc<String>,
    pub(crate) store: Arc<dyn DavResourceStore>,
    pub(crate) ls: Option<Arc<dyn DavLockSystem>>,
    pub(crate) acl: Arc<dyn DavAclEvaluator>,
    pub(crate) allow: DavMethodSet,
}

impl From<DavBuilder> for DavHandler {
    fn from(cfg: DavBuilder) -> Self {
        Self {
            prefix: Arc::new(cfg.prefix),
            store: cfg.store,
            ls: cfg.ls,
            acl: cfg.acl,
            allow: cfg.allow,
        }
    }
}

impl DavHandler {
    /// Return a configuration builder.
    pub fn builder(store: Arc<dyn DavResourceStore>) -> DavBuilder {
        DavBuilder::new(store)
    }

    /// Handle a webdav request.
    pub async fn handle<ReqBody, ReqData, ReqError>(&self, req: Request<ReqBody>) -> Response<Body>
    where
        ReqData: Buf + Send + 'static,
        ReqError: StdError + Send + Sync + 'static,
        ReqBody: HttpBody<Data = ReqData, Error = ReqError>,
    {
        self.handle_inner(req).await
    }
}

impl DavHandler {
    // helper. The path has been validated before dispatch.
    pub(crate) fn path(&self, req: &Request<()>) -> DavPath {
        DavPath::from_uri_and_prefix(req.uri(), &self.prefix).unwrap()
    }

    // helper: fresh snapshot of the node at `path`.
    pub(crate) async fn resolve(&self, path: &DavPath) -> DavResult<DavResource> {
        Ok(self.store.resolve(path).await?)
    }

    // helper.
    pub(crate) async fn has_parent(&self, path: &DavPath) -> DavResult<bool> {
        Ok(self.resolve(&path.parent()).await?.is_collection())
    }

    // helper.
    pub(crate) fn acl(&self, path: &DavPath) -> DavAcl {
        self.acl.evaluate(path)
    }

    // helper: map a denied capability to 403.
    pub(crate) fn require(&self, allowed: bool) -> DavResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(DavError::Status(StatusCode::FORBIDDEN))
        }
    }

    // helper: parsed Depth header, or `default` when absent.
    // A malformed value is a 400.
    pub(crate) fn depth(
        &self,
        req: &Request<()>,
        default: davheaders::Depth,
    ) -> DavResult<davheaders::Depth> {
        match req.headers().typed_try_get::<davheaders::Depth>() {
            Ok(Some(d)) => Ok(d),
            Ok(None) => Ok(default),
            Err(_) => Err(DavError::Status(StatusCode::BAD_REQUEST)),
        }
    }

    // helper: run the conditional evaluator and short-circuit on a
    // non-proceed outcome.
    pub(crate) fn check_conditions(
        &self,
        req: &Request<()>,
        res: &DavResource,
        method: DavMethod,
    ) -> DavResult<()> {
        match evaluate_conditions(req, res, method) {
            Condition::Proceed => Ok(()),
            Condition::NotModified => Err(DavError::Status(StatusCode::NOT_MODIFIED)),
            Condition::PreconditionFailed => {
                Err(DavError::Status(StatusCode::PRECONDITION_FAILED))
            }
        }
    }

    // The method set advertised in `Allow`, for the resource as it
    // currently exists. NotFound when neither the resource nor a
    // parent collection exists.
    pub(crate) async fn allowed_methods(&self, path: &DavPath) -> DavResult<Vec<&'static str>> {
        let mut v = vec!["OPTIONS"];
        let mut add = |m: DavMethod| {
            let has_ls = !matches!(m, DavMethod::Lock | DavMethod::Unlock) || self.ls.is_some();
            if self.allow.contains_method(m) && has_ls {
                v.push(m.as_str());
            }
        };
        let res = self.resolve(path).await?;
        if !res.exists() {
            if !self.has_parent(path).await? {
                return Err(DavError::Status(StatusCode::NOT_FOUND));
            }
            add(DavMethod::Put);
            add(DavMethod::MkCol);
            return Ok(v);
        }
        add(DavMethod::Head);
        add(DavMethod::Get);
        add(DavMethod::Delete);
        add(DavMethod::PropFind);
        add(DavMethod::PropPatch);
        add(DavMethod::Copy);
        add(DavMethod::Move);
        add(DavMethod::Lock);
        add(DavMethod::Unlock);
        if res.is_object() {
            add(DavMethod::Put);
        }
        Ok(v)
    }

    // drain the request body and return it.
    pub(crate) async fn read_request<ReqBody, ReqData, ReqError>(
        &self,
        body: ReqBody,
        max_size: usize,
    ) -> DavResult<Vec<u8>>
    where
        ReqBody: HttpBody<Data = ReqData, Error = ReqError>,
        ReqData: Buf + Send + 'static,
        ReqError: StdError + Send + Sync + 'static,
    {
        let mut data = Vec::new();
        pin_utils::pin_mut!(body);
        while let Some(res) = body.data().await {
            let mut buf = res.map_err(|_| {
                DavError::IoError(io::Error::new(io::ErrorKind::UnexpectedEof, "UnexpectedEof"))
            })?;
            while buf.has_remaining() {
                if data.len() + buf.remaining() > max_size {
                    return Err(StatusCode::PAYLOAD_TOO_LARGE.into());
                }
                let b = buf.chunk();
                let l = b.len();
                data.extend_from_slice(b);
                buf.advance(l);
            }
        }
        Ok(data)
    }

    // internal dispatcher.
    async fn handle_inner<ReqBody, ReqData, ReqError>(&self, req: Request<ReqBody>) -> Response<Body>
    where
        ReqBody: HttpBody<Data = ReqData, Error = ReqError>,
        ReqData: Buf + Send + 'static,
        ReqError: StdError + Send + Sync + 'static,
    {
        let path = DavPath::from_uri_and_prefix(req.uri(), &self.prefix).ok();

        // Turn any DavError results into a HTTP error response.
        let mut resp = match self.handle2(req).await {
            Ok(resp) => {
                debug!("== END REQUEST result OK");
                resp
            }
            Err(err) => {
                debug!("== END REQUEST result {err:?}");
                let mut resp = Response::builder()
                    .header("content-length", "0")
                    .status(err.statuscode());
                if err.must_close() {
                    resp = resp.header("connection", "close");
                }
                resp.body(Body::empty()).unwrap()
            }
        };

        // Every response carries Date and, best effort, Allow.
        if resp.headers().typed_get::<headers::Date>().is_none() {
            resp.headers_mut()
                .typed_insert(headers::Date::from(SystemTime::now()));
        }
        if !resp.headers().contains_key("allow") {
            if let Some(path) = path.filter(|p| !p.is_star()) {
                if let Ok(methods) = self.allowed_methods(&path).await {
                    if let Ok(value) = methods.join(", ").parse() {
                        resp.headers_mut().insert("allow", value);
                    }
                }
            }
        }
        resp
    }

    // internal dispatcher part 2.
    async fn handle2<ReqBody, ReqData, ReqError>(
        &self,
        req: Request<ReqBody>,
    ) -> DavResult<Response<Body>>
    where
        ReqBody: HttpBody<Data = ReqData, Error = ReqError>,
        ReqData: Buf + Send + 'static,
        ReqError: StdError + Send + Sync + 'static,
    {
        let (req, body) = {
            let (parts, body) = req.into_parts();
            (Request::from_parts(parts, ()), body)
        };

        // translate HTTP method to Webdav method.
        let method = match dav_method(req.method()) {
            Ok(m) => m,
            Err(e) => {
                debug!("refusing method {} request {}", req.method(), req.uri());
                return Err(e);
            }
        };

        // see if method is enabled.
        if !self.allow.contains_method(method)
            || (matches!(method, DavMethod::Lock | DavMethod::Unlock) && self.ls.is_none())
        {
            debug!("method {} not allowed on request {}", req.method(), req.uri());
            return Err(DavError::StatusClose(StatusCode::METHOD_NOT_ALLOWED));
        }

        // make sure the request path is valid.
        let path = DavPath::from_uri_and_prefix(req.uri(), &self.prefix)?;

        // the body size limit applies to everything but PUT.
        let max_size = match method {
            DavMethod::Put => usize::MAX,
            _ => MAX_XML_BODY,
        };
        let body_data = self.read_request(body, max_size).await?;

        // Not all methods accept a body.
        match method {
            DavMethod::Put | DavMethod::PropFind | DavMethod::PropPatch | DavMethod::Lock => {}
            _ => {
                if !body_data.is_empty() {
                    return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE.into());
                }
            }
        }

        debug!("== START REQUEST {method:?} {path}");

        match method {
            DavMethod::Options => self.handle_options(&req).await,
            DavMethod::Get => self.handle_gethead(&req, false).await,
            DavMethod::Head => self.handle_gethead(&req, true).await,
            DavMethod::Put => self.handle_put(&req, Bytes::from(body_data)).await,
            DavMethod::MkCol => self.handle_mkcol(&req).await,
            DavMethod::Delete => self.handle_delete(&req).await,
            DavMethod::Copy => self.handle_copymove(&req, false).await,
            DavMethod::Move => self.handle_copymove(&req, true).await,
            DavMethod::Lock => self.handle_lock(&req, &body_data).await,
            DavMethod::Unlock => self.handle_unlock(&req).await,
            DavMethod::PropFind => self.handle_propfind(&req, &body_data).await,
            DavMethod::PropPatch => self.handle_proppatch(&req, &body_data).await,
        }
    }
}
