use bytes::Bytes;
use http::{Request, Response, StatusCode};

use crate::body::Body;
use crate::errors::DavError;
use crate::util::DavMethod;
use crate::DavResult;

impl crate::DavHandler {
    pub(crate) async fn handle_put(
        &self,
        req: &Request<()>,
        data: Bytes,
    ) -> DavResult<Response<Body>> {
        let path = self.path(req);
        let resource = self.resolve(&path).await?;

        // Can't PUT on top of a collection, or to a collection url.
        if resource.is_collection() || path.is_collection() {
            return Err(DavError::Status(StatusCode::METHOD_NOT_ALLOWED));
        }
        if !self.has_parent(&path).await? {
            return Err(DavError::Status(StatusCode::NOT_FOUND));
        }

        self.require(self.acl(&path).write)?;
        self.check_conditions(req, &resource, DavMethod::Put)?;

        let created = !resource.exists();
        self.store.write(&path, data).await?;

        let status = if created {
            StatusCode::CREATED
        } else {
            StatusCode::NO_CONTENT
        };
        let resp = Response::builder()
            .status(status)
            .header("content-length", "0")
            .body(Body::empty())
            .unwrap();
        Ok(resp)
    }
}
