use http::StatusCode;

use crate::common::*;

const LOCKINFO: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:lockinfo xmlns:D="DAV:">
  <D:lockscope><D:exclusive/></D:lockscope>
  <D:locktype><D:write/></D:locktype>
  <D:owner>test-suite</D:owner>
</D:lockinfo>"#;

const SHARED_LOCKINFO: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:lockinfo xmlns:D="DAV:">
  <D:lockscope><D:shared/></D:lockscope>
  <D:locktype><D:write/></D:locktype>
</D:lockinfo>"#;

// pull the lock token out of an activelock body.
fn token_of(body: &str) -> String {
    let start = body.find("opaquelocktoken:").unwrap();
    let end = body[start..].find('<').unwrap();
    body[start..start + end].to_string()
}

#[tokio::test]
async fn lock_grants_a_token() {
    let dav = seeded().await;
    let mut resp = dav
        .handle(request_with_body("LOCK", "/file.txt", &[], LOCKINFO))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header(&resp, "content-type").unwrap().contains("application/xml"));
    let body = body_string(&mut resp).await;
    assert!(body.contains("<D:activelock"));
    assert!(body.contains("<D:exclusive>"));
    assert!(body.contains("<D:depth>infinity</D:depth>"));
    assert!(body.contains("<D:timeout>Second-600</D:timeout>"));
    assert!(body.contains("<D:owner>test-suite</D:owner>"));
    assert!(body.contains("opaquelocktoken:"));
}

#[tokio::test]
async fn lock_without_body_is_400() {
    let dav = seeded().await;
    let resp = dav.handle(request("LOCK", "/file.txt", &[])).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lock_depth_one_is_400() {
    let dav = seeded().await;
    let resp = dav
        .handle(request_with_body(
            "LOCK",
            "/file.txt",
            &[("depth", "1")],
            LOCKINFO,
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lock_timeout_header_is_echoed_in_seconds() {
    let dav = seeded().await;
    let mut resp = dav
        .handle(request_with_body(
            "LOCK",
            "/file.txt",
            &[("timeout", "Seconds-120")],
            LOCKINFO,
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(&mut resp).await;
    assert!(body.contains("<D:timeout>Second-120</D:timeout>"));
}

#[tokio::test]
async fn garbage_timeout_is_400() {
    let dav = seeded().await;
    let resp = dav
        .handle(request_with_body(
            "LOCK",
            "/file.txt",
            &[("timeout", "Infinite")],
            LOCKINFO,
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn second_exclusive_lock_is_423() {
    let dav = seeded().await;
    let resp = dav
        .handle(request_with_body("LOCK", "/file.txt", &[], LOCKINFO))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = dav
        .handle(request_with_body("LOCK", "/file.txt", &[], LOCKINFO))
        .await;
    assert_eq!(resp.status(), StatusCode::LOCKED);
}

#[tokio::test]
async fn shared_locks_coexist() {
    let dav = seeded().await;
    for _ in 0..2 {
        let resp = dav
            .handle(request_with_body("LOCK", "/file.txt", &[], SHARED_LOCKINFO))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn deep_lock_covers_children() {
    let dav = seeded().await;
    let resp = dav
        .handle(request_with_body("LOCK", "/col", &[], LOCKINFO))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = dav
        .handle(request_with_body("LOCK", "/col/a.txt", &[], LOCKINFO))
        .await;
    assert_eq!(resp.status(), StatusCode::LOCKED);
}

#[tokio::test]
async fn unlock_releases_the_lock() {
    let dav = seeded().await;
    let mut resp = dav
        .handle(request_with_body("LOCK", "/file.txt", &[], LOCKINFO))
        .await;
    let token = token_of(&body_string(&mut resp).await);

    let resp = dav
        .handle(request(
            "UNLOCK",
            "/file.txt",
            &[("lock-token", &format!("<{token}>"))],
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // lockable again.
    let resp = dav
        .handle(request_with_body("LOCK", "/file.txt", &[], LOCKINFO))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unlock_without_token_is_400() {
    let dav = seeded().await;
    let resp = dav.handle(request("UNLOCK", "/file.txt", &[])).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unlock_with_unknown_token_is_403() {
    let dav = seeded().await;
    let resp = dav
        .handle(request(
            "UNLOCK",
            "/file.txt",
            &[("lock-token", "<opaquelocktoken:nope>")],
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn without_locksystem_lock_is_405() {
    use dav_engine::acl::FullAcl;
    use dav_engine::fs::MemFs;
    use dav_engine::DavHandler;
    use std::sync::Arc;

    let dav = DavHandler::builder(MemFs::new())
        .acl(Arc::new(FullAcl))
        .build();
    let resp = dav
        .handle(request_with_body("LOCK", "/x", &[], LOCKINFO))
        .await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn delete_clears_locks() {
    let dav = seeded().await;
    let resp = dav
        .handle(request_with_body("LOCK", "/file.txt", &[], LOCKINFO))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = dav.handle(request("DELETE", "/file.txt", &[])).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    // recreate and lock again: no stale lock in the way.
    let resp = dav
        .handle(request_with_body("PUT", "/file.txt", &[], "new"))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = dav
        .handle(request_with_body("LOCK", "/file.txt", &[], LOCKINFO))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_delete_still_clears_locks() {
    use dav_engine::acl::FullAcl;
    use dav_engine::fs::MemFs;
    use dav_engine::ls::MemLs;
    use dav_engine::DavHandler;
    use std::sync::Arc;

    let inner = MemFs::new();
    seed(&inner).await;
    let dav = DavHandler::builder(Arc::new(FailingFs {
        inner,
        fail_delete: true,
        fail_mv: false,
    }))
    .locksystem(MemLs::new())
    .acl(Arc::new(FullAcl))
    .build();

    let resp = dav
        .handle(request_with_body("LOCK", "/file.txt", &[], LOCKINFO))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // The store refuses the delete, but the locks are dropped first.
    let resp = dav.handle(request("DELETE", "/file.txt", &[])).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let resp = dav
        .handle(request_with_body("LOCK", "/file.txt", &[], LOCKINFO))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}
