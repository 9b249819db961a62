//! Multi-status (207) bodies for partial failures of recursive
//! COPY/MOVE operations.

use http::{Response, StatusCode};
use xml::writer::XmlEvent as XmlWEvent;
use xmltree::Element;

use crate::body::Body;
use crate::davpath::DavPath;
use crate::fs::FsError;
use crate::util::MemBuffer;
use crate::xmltree_ext::{emitter, ElementExt, NS_DAV_URI};
use crate::DavResult;

fn status_line(status: StatusCode) -> String {
    format!("HTTP/1.1 {status}")
}

/// Build a 207 response listing one `D:response` per failed path.
pub fn multi_error(errors: Vec<(DavPath, FsError)>) -> DavResult<Response<Body>> {
    let mut buf = MemBuffer::new();
    let mut em = emitter(&mut buf)?;
    em.write(XmlWEvent::start_element("D:multistatus").ns("D", NS_DAV_URI))?;
    for (path, err) in errors {
        Element::new2("D:response")
            .push(Element::new2("D:href").text(path.as_url_string_with_prefix()))
            .push(Element::new2("D:status").text(status_line(err.statuscode())))
            .write_ev(&mut em)?;
    }
    em.write(XmlWEvent::end_element())?;

    let mut res = Response::new(Body::from(buf.take()));
    *res.status_mut() = StatusCode::MULTI_STATUS;
    res.headers_mut().insert(
        "content-type",
        "application/xml; charset=utf-8".parse().unwrap(),
    );
    Ok(res)
}
