use http::StatusCode;

use crate::common::*;

#[tokio::test]
async fn get_object_returns_content_and_validators() {
    let dav = seeded().await;
    let mut resp = dav.handle(request("GET", "/file.txt", &[])).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "content-length"), Some("5"));
    assert_eq!(header(&resp, "content-type"), Some("text/plain"));
    assert!(header(&resp, "last-modified").is_some());
    assert!(header(&resp, "date").is_some());
    let etag = header(&resp, "etag").unwrap().to_string();
    assert!(etag.starts_with('"') && etag.ends_with('"'));
    // Range requests are not supported, so GET must not advertise them.
    assert_eq!(header(&resp, "accept-ranges"), None);
    assert_eq!(body_string(&mut resp).await, "hello");
}

#[tokio::test]
async fn head_has_headers_but_no_body() {
    let dav = seeded().await;
    let mut resp = dav.handle(request("HEAD", "/file.txt", &[])).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "content-length"), Some("5"));
    assert_eq!(body_string(&mut resp).await, "");
}

#[tokio::test]
async fn get_missing_is_404() {
    let dav = seeded().await;
    let resp = dav.handle(request("GET", "/missing.txt", &[])).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn collection_url_without_slash_redirects() {
    let dav = seeded().await;
    let resp = dav.handle(request("GET", "/col", &[])).await;
    assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(header(&resp, "location"), Some("/col/"));
}

#[tokio::test]
async fn object_url_with_slash_redirects() {
    let dav = seeded().await;
    let resp = dav.handle(request("GET", "/file.txt/", &[])).await;
    assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(header(&resp, "location"), Some("/file.txt"));
}

#[tokio::test]
async fn collection_get_lists_children() {
    let dav = seeded().await;
    let mut resp = dav.handle(request("GET", "/col/", &[])).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header(&resp, "content-type").unwrap().starts_with("text/plain"));
    assert_eq!(body_string(&mut resp).await, "a.txt\n");
}

#[tokio::test]
async fn if_none_match_gives_304() {
    let dav = seeded().await;
    let resp = dav.handle(request("GET", "/file.txt", &[])).await;
    let etag = header(&resp, "etag").unwrap().to_string();
    let resp = dav
        .handle(request("GET", "/file.txt", &[("if-none-match", &etag)]))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
}

// The engine keeps the legacy inverted If-Match behavior: a *matching*
// etag (or `*`) fails the precondition.
#[tokio::test]
async fn if_match_star_gives_412() {
    let dav = seeded().await;
    let resp = dav
        .handle(request("GET", "/file.txt", &[("if-match", "*")]))
        .await;
    assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);
}
