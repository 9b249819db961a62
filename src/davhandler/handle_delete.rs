use http::{Request, Response, StatusCode};

use crate::body::Body;
use crate::errors::DavError;
use crate::util::DavMethod;
use crate::DavResult;

impl crate::DavHandler {
    pub(crate) async fn handle_delete(&self, req: &Request<()>) -> DavResult<Response<Body>> {
        let path = self.path(req);
        let resource = self.resolve(&path).await?;

        if !resource.exists() {
            return Err(DavError::Status(StatusCode::NOT_FOUND));
        }

        self.require(self.acl(&path).delete)?;
        self.check_conditions(req, &resource, DavMethod::Delete)?;

        // Locks on the subtree go before the nodes do.
        if let Some(ls) = &self.ls {
            ls.delete_locks(&path);
        }

        self.store.delete(&path).await?;

        let resp = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("content-length", "0")
            .body(Body::empty())
            .unwrap();
        Ok(resp)
    }
}
