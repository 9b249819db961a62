use http::StatusCode;

use crate::common::*;

#[tokio::test]
async fn propfind_allprop_without_body() {
    let dav = seeded().await;
    let mut resp = dav
        .handle(request("PROPFIND", "/col", &[("depth", "1")]))
        .await;
    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);
    assert!(header(&resp, "content-type").unwrap().contains("application/xml"));
    let body = body_string(&mut resp).await;
    assert!(body.contains("<D:href>/col/</D:href>"));
    assert!(body.contains("<D:href>/col/a.txt</D:href>"));
    assert!(body.contains("<D:resourcetype><D:collection></D:collection></D:resourcetype>"));
    assert!(body.contains("<D:getcontentlength>3</D:getcontentlength>"));
    assert!(body.contains("<D:getcontenttype>httpd/unix-directory</D:getcontenttype>"));
    assert!(body.contains("<D:supportedlock>"));
    assert!(body.contains("HTTP/1.1 200 OK"));
}

#[tokio::test]
async fn propfind_depth_zero_is_only_self() {
    let dav = seeded().await;
    let mut resp = dav
        .handle(request("PROPFIND", "/col", &[("depth", "0")]))
        .await;
    let body = body_string(&mut resp).await;
    assert!(body.contains("<D:href>/col/</D:href>"));
    assert!(!body.contains("a.txt"));
}

#[tokio::test]
async fn propfind_default_depth_is_infinity() {
    let dav = seeded().await;
    let mut resp = dav.handle(request("PROPFIND", "/", &[])).await;
    let body = body_string(&mut resp).await;
    assert!(body.contains("<D:href>/</D:href>"));
    assert!(body.contains("<D:href>/col/a.txt</D:href>"));
}

#[tokio::test]
async fn propfind_named_props_split_by_status() {
    let dav = seeded().await;
    let reqbody = r#"<?xml version="1.0"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:getcontentlength/>
    <D:doesnotexist/>
  </D:prop>
</D:propfind>"#;
    let mut resp = dav
        .handle(request_with_body(
            "PROPFIND",
            "/file.txt",
            &[("depth", "0")],
            reqbody,
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);
    let body = body_string(&mut resp).await;
    assert!(body.contains("<D:getcontentlength>5</D:getcontentlength>"));
    assert!(body.contains("<D:doesnotexist>"));
    assert!(body.contains("HTTP/1.1 200 OK"));
    assert!(body.contains("HTTP/1.1 404 Not Found"));
}

#[tokio::test]
async fn propfind_propname_is_valueless() {
    let dav = seeded().await;
    let reqbody = r#"<?xml version="1.0"?>
<D:propfind xmlns:D="DAV:"><D:propname/></D:propfind>"#;
    let mut resp = dav
        .handle(request_with_body(
            "PROPFIND",
            "/file.txt",
            &[("depth", "0")],
            reqbody,
        ))
        .await;
    let body = body_string(&mut resp).await;
    assert!(body.contains("<D:getetag></D:getetag>"));
    assert!(!body.contains("<D:getcontentlength>5"));
}

#[tokio::test]
async fn propfind_with_two_selectors_is_400() {
    let dav = seeded().await;
    let reqbody = r#"<?xml version="1.0"?>
<D:propfind xmlns:D="DAV:"><D:allprop/><D:propname/></D:propfind>"#;
    let resp = dav
        .handle(request_with_body("PROPFIND", "/file.txt", &[], reqbody))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn propfind_on_missing_is_404() {
    let dav = seeded().await;
    let resp = dav.handle(request("PROPFIND", "/missing", &[])).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn propfind_evaluates_conditional_headers() {
    let dav = seeded().await;
    let resp = dav.handle(request("GET", "/file.txt", &[])).await;
    let etag = header(&resp, "etag").unwrap().to_string();
    let resp = dav
        .handle(request(
            "PROPFIND",
            "/file.txt",
            &[("depth", "0"), ("if-none-match", &etag)],
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn lockdiscovery_reports_active_locks() {
    let dav = seeded().await;
    let lockinfo = r#"<?xml version="1.0"?>
<D:lockinfo xmlns:D="DAV:">
  <D:lockscope><D:exclusive/></D:lockscope>
  <D:locktype><D:write/></D:locktype>
</D:lockinfo>"#;
    let resp = dav
        .handle(request_with_body("LOCK", "/file.txt", &[], lockinfo))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let reqbody = r#"<?xml version="1.0"?>
<D:propfind xmlns:D="DAV:"><D:prop><D:lockdiscovery/></D:prop></D:propfind>"#;
    let mut resp = dav
        .handle(request_with_body(
            "PROPFIND",
            "/file.txt",
            &[("depth", "0")],
            reqbody,
        ))
        .await;
    let body = body_string(&mut resp).await;
    assert!(body.contains("<D:lockdiscovery><D:activelock>"));
    assert!(body.contains("opaquelocktoken:"));
}

#[tokio::test]
async fn proppatch_rejects_protected_props() {
    let dav = seeded().await;
    let reqbody = r#"<?xml version="1.0"?>
<D:propertyupdate xmlns:D="DAV:">
  <D:set>
    <D:prop>
      <D:getetag>xyzzy</D:getetag>
      <D:displayname>new name</D:displayname>
    </D:prop>
  </D:set>
</D:propertyupdate>"#;
    let mut resp = dav
        .handle(request_with_body("PROPPATCH", "/file.txt", &[], reqbody))
        .await;
    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);
    let body = body_string(&mut resp).await;
    assert!(body.contains("<D:href>/file.txt</D:href>"));
    assert!(body.contains("HTTP/1.1 200 OK"));
    assert!(body.contains("HTTP/1.1 403 Forbidden"));
    assert!(body.contains("<D:getetag>"));
    assert!(body.contains("<D:displayname>"));
}

#[tokio::test]
async fn proppatch_with_depth_is_400() {
    let dav = seeded().await;
    let reqbody = r#"<?xml version="1.0"?>
<D:propertyupdate xmlns:D="DAV:">
  <D:remove><D:prop><D:displayname/></D:prop></D:remove>
</D:propertyupdate>"#;
    let resp = dav
        .handle(request_with_body(
            "PROPPATCH",
            "/file.txt",
            &[("depth", "infinity")],
            reqbody,
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn proppatch_on_missing_is_404() {
    let dav = seeded().await;
    let reqbody = r#"<?xml version="1.0"?>
<D:propertyupdate xmlns:D="DAV:">
  <D:set><D:prop><D:displayname>x</D:displayname></D:prop></D:set>
</D:propertyupdate>"#;
    let resp = dav
        .handle(request_with_body("PROPPATCH", "/missing", &[], reqbody))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn propfind_honors_url_prefix() {
    use dav_engine::acl::FullAcl;
    use dav_engine::fs::MemFs;
    use dav_engine::DavHandler;
    use std::sync::Arc;

    let dav = DavHandler::builder(MemFs::new())
        .strip_prefix("/dav")
        .acl(Arc::new(FullAcl))
        .build();
    let resp = dav
        .handle(request_with_body("PUT", "/dav/x.txt", &[], "x"))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let mut resp = dav
        .handle(request("PROPFIND", "/dav/", &[("depth", "1")]))
        .await;
    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);
    let body = body_string(&mut resp).await;
    assert!(body.contains("<D:href>/dav/</D:href>"));
    assert!(body.contains("<D:href>/dav/x.txt</D:href>"));
}
