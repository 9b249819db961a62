use http::{Request, Response, StatusCode};

use crate::body::Body;
use crate::errors::DavError;
use crate::DavResult;

impl crate::DavHandler {
    pub(crate) async fn handle_mkcol(&self, req: &Request<()>) -> DavResult<Response<Body>> {
        let path = self.path(req);
        let resource = self.resolve(&path).await?;

        if resource.exists() {
            return Err(DavError::Status(StatusCode::METHOD_NOT_ALLOWED));
        }
        if !self.has_parent(&path).await? {
            return Err(DavError::Status(StatusCode::CONFLICT));
        }

        self.require(self.acl(&path).create)?;
        self.store.create_collection(&path).await?;

        let resp = Response::builder()
            .status(StatusCode::CREATED)
            .header("content-length", "0")
            .body(Body::empty())
            .unwrap();
        Ok(resp)
    }
}
