use headers::HeaderMapExt;
use http::{Request, Response};

use crate::body::Body;
use crate::DavResult;

impl crate::DavHandler {
    pub(crate) async fn handle_options(&self, req: &Request<()>) -> DavResult<Response<Body>> {
        let mut res = Response::new(Body::empty());

        let h = res.headers_mut();

        // We advertise class 2 support even when no locksystem is
        // configured here, since there might be LOCK/UNLOCK support
        // in another part of the URL space.
        h.insert("dav", "1,2".parse().unwrap());
        h.typed_insert(headers::ContentLength(0));

        let path = self.path(req);

        // A server-wide OPTIONS gets the bare capability reply.
        if path.is_star() || path.is_root() {
            return Ok(res);
        }

        let resource = self.resolve(&path).await?;
        let methods = self.allowed_methods(&path).await?;
        let h = res.headers_mut();
        h.insert("allow", methods.join(", ").parse().unwrap());
        if resource.is_object() {
            h.insert("allow-ranges", "bytes".parse().unwrap());
        }

        Ok(res)
    }
}
