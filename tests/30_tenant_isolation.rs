mod common;

use anyhow::Result;
use common::id_of;
use counsel_api::auth::Role;
use counsel_api::validation::ObjectId;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn firms_cannot_see_each_other() -> Result<()> {
    let server = common::spawn().await?;
    let firm_a = ObjectId::new();
    let firm_b = ObjectId::new();
    let alice = server.actor(Role::Lawyer, Some(&firm_a));
    let colleague = server.actor(Role::Staff, Some(&firm_a));
    let mallory = server.actor(Role::Owner, Some(&firm_b));

    let client = server.create(&alice, "/api/clients", json!({ "name": "Acme Ltd" })).await?;
    let path = format!("/api/clients/{}", id_of(&client));

    // Same firm shares documents
    let (status, body) = server.get(&colleague, &path).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Acme Ltd");

    // Another firm gets 404 everywhere
    assert_eq!(server.get(&mallory, &path).await?.0, StatusCode::NOT_FOUND);
    assert_eq!(server.patch(&mallory, &path, json!({ "name": "Stolen" })).await?.0, StatusCode::NOT_FOUND);
    assert_eq!(server.delete(&mallory, &path).await?.0, StatusCode::NOT_FOUND);

    let (_, list) = server.get(&mallory, "/api/clients").await?;
    assert_eq!(list["data"], json!([]));
    assert_eq!(list["pagination"]["total"], 0);

    let (_, body) = server.get(&alice, &path).await?;
    assert_eq!(body["data"]["name"], "Acme Ltd");
    Ok(())
}

#[tokio::test]
async fn solo_lawyers_are_isolated_from_firms() -> Result<()> {
    let server = common::spawn().await?;
    let solo = server.actor(Role::Lawyer, None);
    let other_solo = server.actor(Role::Lawyer, None);
    let firm_member = server.actor_as(solo.user_id.clone(), Role::Lawyer, Some(&ObjectId::new()));

    let case = server.create(&solo, "/api/cases", json!({ "title": "Estate of Doe" })).await?;
    assert!(case.get("firmId").is_none());
    assert_eq!(case["lawyerId"], solo.user_id.to_string());
    let path = format!("/api/cases/{}", id_of(&case));

    assert_eq!(server.get(&other_solo, &path).await?.0, StatusCode::NOT_FOUND);
    // The same user acting inside a firm does not see their solo documents
    assert_eq!(server.get(&firm_member, &path).await?.0, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn references_must_belong_to_the_caller() -> Result<()> {
    let server = common::spawn().await?;
    let owner_a = server.actor(Role::Owner, Some(&ObjectId::new()));
    let owner_b = server.actor(Role::Owner, Some(&ObjectId::new()));

    let client = server.create(&owner_a, "/api/clients", json!({ "name": "Acme" })).await?;
    let (status, body) = server
        .post(&owner_b, "/api/cases", json!({ "title": "Borrowed", "clientId": id_of(&client) }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["clientId"], "Referenced record not found");

    let (status, _) = server
        .post(&owner_a, "/api/cases", json!({ "title": "Own", "clientId": id_of(&client) }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn workflow_actions_respect_scope() -> Result<()> {
    let server = common::spawn().await?;
    let owner_a = server.actor(Role::Owner, Some(&ObjectId::new()));
    let owner_b = server.actor(Role::Owner, Some(&ObjectId::new()));

    let referral = server
        .create(&owner_a, "/api/referrals", json!({ "referrerName": "Smith & Co", "feeType": "flat", "flatFee": 500 }))
        .await?;
    let (status, _) = server
        .post(&owner_b, &format!("/api/referrals/{}/accept", id_of(&referral)), json!({}))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
