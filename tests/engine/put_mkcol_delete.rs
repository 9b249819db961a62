use http::StatusCode;

use crate::common::*;

#[tokio::test]
async fn put_creates_then_overwrites() {
    let dav = seeded().await;
    let resp = dav
        .handle(request_with_body("PUT", "/new.txt", &[], "one"))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = dav
        .handle(request_with_body("PUT", "/new.txt", &[], "two"))
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let mut resp = dav.handle(request("GET", "/new.txt", &[])).await;
    assert_eq!(body_string(&mut resp).await, "two");
}

#[tokio::test]
async fn put_with_missing_parent_is_404() {
    let dav = seeded().await;
    let resp = dav
        .handle(request_with_body("PUT", "/no/new.txt", &[], "x"))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_on_collection_is_405() {
    let dav = seeded().await;
    let resp = dav.handle(request_with_body("PUT", "/col", &[], "x")).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn mkcol_creates_collection() {
    let dav = seeded().await;
    let resp = dav.handle(request("MKCOL", "/newcol", &[])).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = dav.handle(request("GET", "/newcol/", &[])).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn mkcol_on_existing_is_405() {
    let dav = seeded().await;
    let resp = dav.handle(request("MKCOL", "/col", &[])).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    let resp = dav.handle(request("MKCOL", "/file.txt", &[])).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn mkcol_with_missing_parent_is_409() {
    let dav = seeded().await;
    let resp = dav.handle(request("MKCOL", "/no/col", &[])).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn mkcol_with_body_is_415() {
    let dav = seeded().await;
    let resp = dav
        .handle(request_with_body("MKCOL", "/newcol", &[], "<x/>"))
        .await;
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn delete_removes_subtree() {
    let dav = seeded().await;
    let resp = dav.handle(request("DELETE", "/col", &[])).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = dav.handle(request("GET", "/col/a.txt", &[])).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = dav.handle(request("DELETE", "/col", &[])).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn default_acl_is_read_only() {
    use dav_engine::fs::MemFs;
    use dav_engine::DavHandler;

    // no .acl(): writes are refused, reads pass.
    let dav = DavHandler::builder(MemFs::new()).build();
    let resp = dav.handle(request_with_body("PUT", "/x", &[], "data")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = dav.handle(request("MKCOL", "/c", &[])).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = dav.handle(request("GET", "/", &[])).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
