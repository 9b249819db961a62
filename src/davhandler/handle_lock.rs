use std::time::Duration;

use headers::HeaderMapExt;
use http::{Request, Response, StatusCode};
use xml::writer::XmlEvent as XmlWEvent;
use xmltree::Element;

use crate::body::Body;
use crate::davheaders::{self, Depth};
use crate::errors::DavError;
use crate::ls::{DavLock, LockScope, LockType};
use crate::util::MemBuffer;
use crate::xmltree_ext::{emitter, ElementExt, NS_DAV_URI};
use crate::DavResult;

// Default lock timeout when the client sends none.
const DEFAULT_TIMEOUT_SECS: u32 = 600;

// The children of a D:activelock element, shared with the
// lockdiscovery property.
pub(crate) fn activelock_children(lock: &DavLock) -> Vec<Element> {
    let mut v = vec![
        Element::new2("D:locktype").push(Element::new2(&format!("D:{}", lock.ltype.as_xml_name()))),
        Element::new2("D:lockscope")
            .push(Element::new2(&format!("D:{}", lock.scope.as_xml_name()))),
        Element::new2("D:depth").text(if lock.deep { "infinity" } else { "0" }),
        Element::new2("D:timeout")
            .text(davheaders::DavTimeout(lock.timeout.as_secs() as u32).as_response_string()),
        Element::new2("D:locktoken").push(Element::new2("D:href").text(lock.token.clone())),
    ];
    if let Some(owner) = &lock.owner {
        // Re-emit the client supplied owner element in our namespace.
        let mut owner = owner.clone();
        owner.prefix = Some("D".to_string());
        owner.namespace = Some(NS_DAV_URI.to_string());
        v.push(owner);
    }
    v
}

impl crate::DavHandler {
    pub(crate) async fn handle_lock(
        &self,
        req: &Request<()>,
        xmldata: &[u8],
    ) -> DavResult<Response<Body>> {
        let ls = match &self.ls {
            Some(ls) => ls,
            None => return Err(DavError::Status(StatusCode::METHOD_NOT_ALLOWED)),
        };

        let path = self.path(req);
        self.require(self.acl(&path).write)?;

        // A lock refresh without a body is not supported; the request
        // must carry a lockinfo document.
        if xmldata.is_empty() {
            return Err(DavError::Status(StatusCode::BAD_REQUEST));
        }

        let deep = match self.depth(req, Depth::Infinity)? {
            Depth::Zero => false,
            Depth::Infinity => true,
            Depth::One => return Err(DavError::Status(StatusCode::BAD_REQUEST)),
        };

        let timeout = match req.headers().typed_try_get::<davheaders::DavTimeout>() {
            Ok(Some(t)) => t.0,
            Ok(None) => DEFAULT_TIMEOUT_SECS,
            Err(_) => return Err(DavError::Status(StatusCode::BAD_REQUEST)),
        };

        let lockinfo = Element::parse(xmldata)?;
        let scope = match lockinfo
            .get_child("lockscope")
            .and_then(|s| s.children.iter().filter_map(|n| n.as_element()).next())
            .map(|e| e.name.as_str())
        {
            Some("exclusive") => LockScope::Exclusive,
            Some("shared") => LockScope::Shared,
            _ => return Err(DavError::Status(StatusCode::BAD_REQUEST)),
        };
        match lockinfo
            .get_child("locktype")
            .and_then(|t| t.children.iter().filter_map(|n| n.as_element()).next())
            .map(|e| e.name.as_str())
        {
            Some("write") => {}
            _ => return Err(DavError::Status(StatusCode::BAD_REQUEST)),
        }
        let owner = lockinfo.get_child("owner").cloned();

        let lock = match ls.acquire(
            &path,
            scope,
            LockType::Write,
            deep,
            Duration::from_secs(timeout as u64),
            owner,
        ) {
            Some(lock) => lock,
            None => return Err(DavError::Status(StatusCode::LOCKED)),
        };

        let mut buf = MemBuffer::new();
        let mut em = emitter(&mut buf)?;
        em.write(XmlWEvent::start_element("D:activelock").ns("D", NS_DAV_URI))?;
        for child in activelock_children(&lock) {
            child.write_ev(&mut em)?;
        }
        em.write(XmlWEvent::end_element())?;

        let mut resp = Response::new(Body::from(buf.take()));
        resp.headers_mut().insert(
            "content-type",
            "application/xml; charset=utf-8".parse().unwrap(),
        );
        Ok(resp)
    }

    pub(crate) async fn handle_unlock(&self, req: &Request<()>) -> DavResult<Response<Body>> {
        let ls = match &self.ls {
            Some(ls) => ls,
            None => return Err(DavError::Status(StatusCode::METHOD_NOT_ALLOWED)),
        };

        let path = self.path(req);
        self.require(self.acl(&path).write)?;

        let token = req
            .headers()
            .typed_get::<davheaders::LockToken>()
            .ok_or(DavError::Status(StatusCode::BAD_REQUEST))?;

        if !ls.release(&token.0) {
            return Err(DavError::Status(StatusCode::FORBIDDEN));
        }

        let resp = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("content-length", "0")
            .body(Body::empty())
            .unwrap();
        Ok(resp)
    }
}
