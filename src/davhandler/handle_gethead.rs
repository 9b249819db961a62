use headers::HeaderMapExt;
use http::{Request, Response, StatusCode};

use crate::body::Body;
use crate::davheaders::Depth;
use crate::errors::DavError;
use crate::util::DavMethod;
use crate::DavResult;

impl crate::DavHandler {
    pub(crate) async fn handle_gethead(
        &self,
        req: &Request<()>,
        head: bool,
    ) -> DavResult<Response<Body>> {
        let mut path = self.path(req);
        let resource = self.resolve(&path).await?;
        if !resource.exists() {
            return Err(DavError::Status(StatusCode::NOT_FOUND));
        }

        // Redirect to the canonical form of the url when the trailing
        // slash does not match the resource type.
        if resource.is_collection() != path.is_collection() {
            if resource.is_collection() {
                path.add_slash();
            } else {
                path.remove_slash();
            }
            let resp = Response::builder()
                .status(StatusCode::PERMANENT_REDIRECT)
                .header("location", path.as_url_string_with_prefix())
                .header("content-length", "0")
                .body(Body::empty())
                .unwrap();
            return Ok(resp);
        }

        let acl = self.acl(&path);
        let method = if head { DavMethod::Head } else { DavMethod::Get };

        if resource.is_collection() {
            self.require(acl.list)?;
            self.check_conditions(req, &resource, method)?;

            // A plain text listing of the direct children.
            let mut listing = String::new();
            let children = self.store.descendants(&path, Depth::One, false).await?;
            for child in &children {
                listing.push_str(child.path().file_name());
                if child.is_collection() {
                    listing.push('/');
                }
                listing.push('\n');
            }

            let mut resp = Response::new(Body::empty());
            let h = resp.headers_mut();
            h.typed_insert(headers::ContentType::text_utf8());
            h.typed_insert(headers::ContentLength(listing.len() as u64));
            if let Some(m) = resource.modified() {
                h.typed_insert(headers::LastModified::from(m));
            }
            if !head {
                *resp.body_mut() = Body::from(listing);
            }
            return Ok(resp);
        }

        self.require(acl.read)?;
        self.check_conditions(req, &resource, method)?;

        let mut resp = Response::new(Body::empty());
        let h = resp.headers_mut();
        let meta = resource
            .meta()
            .ok_or(DavError::Status(StatusCode::NOT_FOUND))?;
        if let Ok(etag) = format!("\"{}\"", meta.etag).parse::<headers::ETag>() {
            h.typed_insert(etag);
        }
        h.typed_insert(headers::LastModified::from(meta.modified));
        h.typed_insert(headers::ContentLength(meta.len));
        let ctype = mime_guess::from_path(path.file_name()).first_or_octet_stream();
        h.typed_insert(headers::ContentType::from(ctype));

        if !head {
            let data = self.store.read(&path).await?;
            *resp.body_mut() = Body::from(data);
        }
        Ok(resp)
    }
}
