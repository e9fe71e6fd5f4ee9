mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn root_lists_resources() -> Result<()> {
    let server = common::spawn().await?;
    let res = server.raw().get(server.url("/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    let resources = body["data"]["endpoints"]["resources"].as_array().cloned().unwrap_or_default();
    assert_eq!(resources.len(), 16);
    assert!(resources.iter().any(|r| r == "/api/leave-requests"));
    Ok(())
}

#[tokio::test]
async fn health_reports_store() -> Result<()> {
    let server = common::spawn().await?;
    let res = server.raw().get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["store"], "memory");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_use_error_envelope() -> Result<()> {
    let server = common::spawn().await?;
    let res = server.raw().get(server.url("/nope")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}
