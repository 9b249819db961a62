use std::collections::BTreeMap;

use http::{Request, Response, StatusCode};
use xml::writer::XmlEvent as XmlWEvent;
use xmltree::Element;

use crate::body::Body;
use crate::davhandler::handle_lock::activelock_children;
use crate::davheaders::Depth;
use crate::errors::DavError;
use crate::fs::DavResource;
use crate::util::{systemtime_to_httpdate, systemtime_to_rfc3339, DavMethod, MemBuffer};
use crate::xmltree_ext::{emitter, ElementExt, NS_DAV_URI};
use crate::DavResult;

// The properties reported for allprop, and their order.
const ALLPROP_NAMES: &[&str] = &[
    "creationdate",
    "displayname",
    "getcontentlength",
    "getcontenttype",
    "getetag",
    "getlastmodified",
    "resourcetype",
    "supportedlock",
    "lockdiscovery",
];

// DAV: live properties a client cannot set or remove.
const PROTECTED: &[&str] = &[
    "creationdate",
    "getcontentlength",
    "getetag",
    "getlastmodified",
    "resourcetype",
    "supportedlock",
    "lockdiscovery",
];

enum PropfindMode {
    AllProp,
    PropName,
    Prop(Vec<Element>),
}

// D:propstat groups of one D:response, keyed by status for a
// deterministic group order.
#[derive(Default)]
struct PropStats {
    groups: BTreeMap<u16, Vec<Element>>,
}

impl PropStats {
    fn add(&mut self, status: StatusCode, prop: Element) {
        self.groups.entry(status.as_u16()).or_default().push(prop);
    }

    // Consume into a D:response element for `href`.
    fn into_response(self, href: String) -> Element {
        let mut response = Element::new2("D:response").push(Element::new2("D:href").text(href));
        for (status, props) in self.groups {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let mut prop = Element::new2("D:prop");
            for p in props {
                prop = prop.push(p);
            }
            let propstat = Element::new2("D:propstat")
                .push(prop)
                .push(Element::new2("D:status").text(format!("HTTP/1.1 {status}")));
            response = response.push(propstat);
        }
        response
    }
}

impl crate::DavHandler {
    // A valueless element echoing a requested property, keeping the
    // client's namespace if it was not `DAV:`.
    fn echo_prop(requested: &Element) -> Element {
        let mut e = Element::new(&requested.name);
        match requested.namespace.as_deref() {
            Some(NS_DAV_URI) | None => {
                e.prefix = Some("D".to_string());
                e.namespace = Some(NS_DAV_URI.to_string());
            }
            Some(ns) => {
                e.attributes.insert("xmlns".to_string(), ns.to_string());
            }
        }
        e
    }

    // Build the value of a DAV: property for a resource snapshot.
    // `None` means the property is unknown or not applicable.
    fn build_prop(&self, name: &str, res: &DavResource) -> Option<Element> {
        let meta = res.meta()?;
        let elem = match name {
            "creationdate" => {
                Element::new2("D:creationdate").text(systemtime_to_rfc3339(meta.created?))
            }
            "displayname" => Element::new2("D:displayname").text(res.path().file_name()),
            "getcontentlength" => {
                if !res.is_object() {
                    return None;
                }
                Element::new2("D:getcontentlength").text(meta.len.to_string())
            }
            "getcontenttype" => {
                let ctype = if res.is_collection() {
                    "httpd/unix-directory".to_string()
                } else {
                    mime_guess::from_path(res.path().file_name())
                        .first_or_octet_stream()
                        .to_string()
                };
                Element::new2("D:getcontenttype").text(ctype)
            }
            "getetag" => Element::new2("D:getetag").text(format!("\"{}\"", meta.etag)),
            "getlastmodified" => {
                Element::new2("D:getlastmodified").text(systemtime_to_httpdate(meta.modified))
            }
            "resourcetype" => {
                let mut rt = Element::new2("D:resourcetype");
                if res.is_collection() {
                    rt = rt.push(Element::new2("D:collection"));
                }
                rt
            }
            "supportedlock" => {
                let entry = |scope| {
                    Element::new2("D:lockentry")
                        .push(Element::new2("D:lockscope").push(Element::new2(scope)))
                        .push(Element::new2("D:locktype").push(Element::new2("D:write")))
                };
                Element::new2("D:supportedlock")
                    .push(entry("D:exclusive"))
                    .push(entry("D:shared"))
            }
            "lockdiscovery" => {
                let mut ld = Element::new2("D:lockdiscovery");
                if let Some(ls) = &self.ls {
                    for lock in ls.discover(res.path()) {
                        let mut al = Element::new2("D:activelock");
                        for child in activelock_children(&lock) {
                            al = al.push(child);
                        }
                        ld = ld.push(al);
                    }
                }
                ld
            }
            _ => return None,
        };
        Some(elem)
    }

    // One D:response worth of propstat groups for a resource.
    fn propfind_response(&self, mode: &PropfindMode, res: &DavResource) -> Element {
        let mut stats = PropStats::default();
        match mode {
            PropfindMode::AllProp => {
                for name in ALLPROP_NAMES {
                    if let Some(prop) = self.build_prop(name, res) {
                        stats.add(StatusCode::OK, prop);
                    }
                }
            }
            PropfindMode::PropName => {
                for name in ALLPROP_NAMES {
                    if self.build_prop(name, res).is_some() {
                        stats.add(StatusCode::OK, Element::new2(&format!("D:{name}")));
                    }
                }
            }
            PropfindMode::Prop(requested) => {
                for want in requested {
                    let is_dav = matches!(want.namespace.as_deref(), Some(NS_DAV_URI) | None);
                    match is_dav.then(|| self.build_prop(&want.name, res)).flatten() {
                        Some(prop) => stats.add(StatusCode::OK, prop),
                        None => stats.add(StatusCode::NOT_FOUND, Self::echo_prop(want)),
                    }
                }
            }
        }
        stats.into_response(res.path().as_url_string_with_prefix())
    }

    pub(crate) async fn handle_propfind(
        &self,
        req: &Request<()>,
        xmldata: &[u8],
    ) -> DavResult<Response<Body>> {
        let path = self.path(req);
        let resource = self.resolve(&path).await?;
        if !resource.exists() {
            return Err(DavError::Status(StatusCode::NOT_FOUND));
        }
        self.require(self.acl(&path).list)?;
        self.check_conditions(req, &resource, DavMethod::PropFind)?;

        let depth = self.depth(req, Depth::Infinity)?;

        // An empty body means allprop; otherwise the propfind element
        // must carry exactly one of prop, allprop, propname.
        let mode = if xmldata.is_empty() {
            PropfindMode::AllProp
        } else {
            let root = Element::parse(xmldata)?;
            let mut selectors = root
                .children
                .iter()
                .filter_map(|n| n.as_element())
                .filter(|e| matches!(e.name.as_str(), "prop" | "allprop" | "propname"));
            match (selectors.next(), selectors.next()) {
                (Some(sel), None) => match sel.name.as_str() {
                    "allprop" => PropfindMode::AllProp,
                    "propname" => PropfindMode::PropName,
                    _ => PropfindMode::Prop(
                        sel.children
                            .iter()
                            .filter_map(|n| n.as_element())
                            .cloned()
                            .collect(),
                    ),
                },
                _ => return Err(DavError::Status(StatusCode::BAD_REQUEST)),
            }
        };

        let resources = self.store.descendants(&path, depth, true).await?;

        let mut buf = MemBuffer::new();
        let mut em = emitter(&mut buf)?;
        em.write(XmlWEvent::start_element("D:multistatus").ns("D", NS_DAV_URI))?;
        for res in &resources {
            self.propfind_response(&mode, res).write_ev(&mut em)?;
        }
        em.write(XmlWEvent::end_element())?;

        Ok(multistatus_response(buf.take()))
    }

    pub(crate) async fn handle_proppatch(
        &self,
        req: &Request<()>,
        xmldata: &[u8],
    ) -> DavResult<Response<Body>> {
        let path = self.path(req);
        let resource = self.resolve(&path).await?;
        if !resource.exists() {
            return Err(DavError::Status(StatusCode::NOT_FOUND));
        }
        if self.depth(req, Depth::Zero)? != Depth::Zero {
            return Err(DavError::Status(StatusCode::BAD_REQUEST));
        }
        self.require(self.acl(&path).write)?;

        let root = Element::parse(xmldata)?;

        // Validate and acknowledge; property storage is not supported,
        // so protected live properties fail and the rest is accepted
        // without being persisted.
        let mut stats = PropStats::default();
        for op in root
            .children
            .iter()
            .filter_map(|n| n.as_element())
            .filter(|e| matches!(e.name.as_str(), "set" | "remove"))
        {
            let Some(prop) = op.get_child("prop") else {
                return Err(DavError::Status(StatusCode::BAD_REQUEST));
            };
            for want in prop.children.iter().filter_map(|n| n.as_element()) {
                let is_dav = matches!(want.namespace.as_deref(), Some(NS_DAV_URI) | None);
                let status = if is_dav && PROTECTED.contains(&want.name.as_str()) {
                    StatusCode::FORBIDDEN
                } else {
                    StatusCode::OK
                };
                stats.add(status, Self::echo_prop(want));
            }
        }

        let mut buf = MemBuffer::new();
        let mut em = emitter(&mut buf)?;
        em.write(XmlWEvent::start_element("D:multistatus").ns("D", NS_DAV_URI))?;
        stats
            .into_response(path.as_url_string_with_prefix())
            .write_ev(&mut em)?;
        em.write(XmlWEvent::end_element())?;

        Ok(multistatus_response(buf.take()))
    }
}

fn multistatus_response(body: bytes::Bytes) -> Response<Body> {
    let mut res = Response::new(Body::from(body));
    *res.status_mut() = StatusCode::MULTI_STATUS;
    res.headers_mut().insert(
        "content-type",
        "application/xml; charset=utf-8".parse().unwrap(),
    );
    res
}
