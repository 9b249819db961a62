use headers::HeaderMapExt;
use http::{Request, Response, StatusCode};
use log::debug;

use crate::body::Body;
use crate::davheaders::{self, Depth};
use crate::davpath::DavPath;
use crate::errors::DavError;
use crate::multierror::multi_error;
use crate::DavResult;

impl crate::DavHandler {
    // Turn the Destination header into a DavPath. Absolute URLs must
    // point at the same scheme and authority as the request itself.
    fn destination(&self, req: &Request<()>) -> DavResult<DavPath> {
        let dest = req
            .headers()
            .typed_get::<davheaders::Destination>()
            .ok_or(DavError::Status(StatusCode::BAD_REQUEST))?;

        let rawpath = if dest.0.contains("://") {
            let url = url::Url::parse(&dest.0)
                .map_err(|_| DavError::Status(StatusCode::BAD_REQUEST))?;
            let req_scheme = req.uri().scheme_str().unwrap_or("http");
            let req_host = req
                .headers()
                .get("host")
                .and_then(|h| h.to_str().ok())
                .or_else(|| req.uri().authority().map(|a| a.as_str()));
            let dest_host = url.host_str().map(|h| match url.port() {
                Some(p) => format!("{h}:{p}"),
                None => h.to_string(),
            });
            match (req_host, dest_host) {
                (Some(a), Some(b)) if a == b && url.scheme() == req_scheme => {}
                _ => return Err(DavError::Status(StatusCode::BAD_GATEWAY)),
            }
            url.path().to_string()
        } else {
            dest.0.clone()
        };

        DavPath::from_str_and_prefix(&rawpath, &self.prefix)
            .map_err(|_| DavError::Status(StatusCode::BAD_REQUEST))
    }

    pub(crate) async fn handle_copymove(
        &self,
        req: &Request<()>,
        is_move: bool,
    ) -> DavResult<Response<Body>> {
        let path = self.path(req);
        let resource = self.resolve(&path).await?;
        if !resource.exists() {
            return Err(DavError::Status(StatusCode::NOT_FOUND));
        }

        self.require(self.acl(&path).relocate)?;

        let dest = self.destination(req)?;
        if dest.key() == path.key() {
            return Err(DavError::Status(StatusCode::FORBIDDEN));
        }
        if is_move && dest.is_under(&path) {
            return Err(DavError::Status(StatusCode::FORBIDDEN));
        }

        let dest_resource = self.resolve(&dest).await?;
        if !self.has_parent(&dest).await? {
            return Err(DavError::Status(StatusCode::CONFLICT));
        }

        let overwrite = match req.headers().typed_try_get::<davheaders::Overwrite>() {
            Ok(Some(o)) => o.0,
            Ok(None) => true,
            Err(_) => return Err(DavError::Status(StatusCode::BAD_REQUEST)),
        };
        if !overwrite && dest_resource.exists() {
            return Err(DavError::Status(StatusCode::PRECONDITION_FAILED));
        }

        // MOVE is always deep; COPY can be limited to the node itself.
        let depth = self.depth(req, Depth::Infinity)?;
        match (is_move, depth) {
            (true, Depth::Infinity) => {}
            (true, _) => return Err(DavError::Status(StatusCode::BAD_REQUEST)),
            (false, Depth::One) => return Err(DavError::Status(StatusCode::BAD_REQUEST)),
            (false, _) => {}
        }

        let dest_existed = dest_resource.exists();
        if dest_existed {
            if let Some(ls) = &self.ls {
                ls.delete_locks(&path);
                ls.delete_locks(&dest);
            }
            self.store.delete(&dest).await?;
        }

        debug!(
            "{} {path} -> {dest} (overwrite: {overwrite})",
            if is_move { "move" } else { "copy" }
        );
        let errors = if is_move {
            self.store.mv(&path, &dest).await?
        } else {
            self.store.copy(&path, &dest, depth).await?
        };
        // Locks on the source are gone even when the move was only
        // partially successful.
        if is_move {
            if let Some(ls) = &self.ls {
                ls.delete_locks(&path);
            }
        }

        if !errors.is_empty() {
            return multi_error(errors);
        }

        let status = if dest_existed {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::CREATED
        };
        let resp = Response::builder()
            .status(status)
            .header("content-length", "0")
            .body(Body::empty())
            .unwrap();
        Ok(resp)
    }
}
