mod common;

use anyhow::Result;
use common::id_of;
use counsel_api::auth::Role;
use counsel_api::validation::ObjectId;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn malformed_bodies_are_invalid_json() -> Result<()> {
    let server = common::spawn().await?;
    let owner = server.actor(Role::Owner, Some(&ObjectId::new()));

    let res = server
        .raw()
        .post(server.url("/api/clients"))
        .bearer_auth(&owner.token)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["code"], "INVALID_JSON");

    let (status, body) = server.post(&owner, "/api/clients", json!(["Acme"])).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn system_fields_cannot_be_mass_assigned() -> Result<()> {
    let server = common::spawn().await?;
    let firm = ObjectId::new();
    let owner = server.actor(Role::Owner, Some(&firm));
    let forged = ObjectId::new().to_string();

    let client = server
        .create(
            &owner,
            "/api/clients",
            json!({
                "name": "Acme",
                "_id": forged,
                "firmId": forged,
                "lawyerId": forged,
                "createdBy": forged,
                "$where": "1 == 1",
                "role": "owner"
            }),
        )
        .await?;

    assert_ne!(client["_id"], forged);
    assert_eq!(client["firmId"], firm.to_string());
    assert_eq!(client["lawyerId"], owner.user_id.to_string());
    assert_eq!(client["createdBy"], owner.user_id.to_string());
    assert!(client.get("$where").is_none());
    assert!(client.get("role").is_none());
    Ok(())
}

#[tokio::test]
async fn field_errors_are_collected() -> Result<()> {
    let server = common::spawn().await?;
    let hr = server.actor(Role::Hr, Some(&ObjectId::new()));

    let (status, body) = server
        .post(
            &hr,
            "/api/employees",
            json!({ "firstName": "Ada", "email": "not-an-email", "hireDate": "2026-13-01", "salary": -10 }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let errors = &body["field_errors"];
    assert_eq!(errors["lastName"], "This field is required");
    assert_eq!(errors["email"], "Must be a valid email address");
    assert!(errors.get("hireDate").is_some());
    assert_eq!(errors["salary"], "Must not be negative");
    Ok(())
}

#[tokio::test]
async fn strings_are_sanitized_and_emails_normalised() -> Result<()> {
    let server = common::spawn().await?;
    let hr = server.actor(Role::Hr, Some(&ObjectId::new()));

    let employee = server
        .create(
            &hr,
            "/api/employees",
            json!({ "firstName": "  Ada\u{0007}  ", "lastName": "Lovelace", "email": "Ada@Firm.Test", "currency": "eur" }),
        )
        .await?;
    assert_eq!(employee["firstName"], "Ada");
    assert_eq!(employee["email"], "ada@firm.test");
    assert_eq!(employee["currency"], "EUR");
    Ok(())
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() -> Result<()> {
    let server = common::spawn().await?;
    let owner = server.actor(Role::Owner, None);

    let (status, body) = server.get(&owner, "/api/clients/not-an-id").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid ID format");

    let (status, _) = server.get(&owner, &format!("/api/clients/{}", ObjectId::new())).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn updates_only_touch_allow_listed_fields() -> Result<()> {
    let server = common::spawn().await?;
    let accountant = server.actor(Role::Accountant, Some(&ObjectId::new()));

    let account = server
        .create(
            &accountant,
            "/api/accounts",
            json!({ "name": "Operating", "type": "operating", "openingBalance": 1000 }),
        )
        .await?;
    let path = format!("/api/accounts/{}", id_of(&account));

    let (status, body) = server.patch(&accountant, &path, json!({ "openingBalance": 5, "currency": "EUR" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No valid fields to update");

    let (status, body) = server.patch(&accountant, &path, json!({ "name": null })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["name"], "This field is required");

    let (status, body) = server
        .patch(&accountant, &path, json!({ "institution": "First Bank", "openingBalance": 5 }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["institution"], "First Bank");
    assert_eq!(body["data"]["openingBalance"].as_f64(), Some(1000.0));
    assert_eq!(body["data"]["currency"], "USD");
    assert_eq!(body["data"]["updatedBy"], accountant.user_id.to_string());
    Ok(())
}

#[tokio::test]
async fn list_pages_sorts_and_filters() -> Result<()> {
    let server = common::spawn().await?;
    let owner = server.actor(Role::Owner, Some(&ObjectId::new()));

    for (name, kind) in [("Charlie", "company"), ("Alpha", "individual"), ("Bravo", "company")] {
        server.create(&owner, "/api/clients", json!({ "name": name, "type": kind })).await?;
    }

    let (status, body) = server.get(&owner, "/api/clients?sort=name&limit=2&page=1").await?;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"].as_array().unwrap().iter().filter_map(|c| c["name"].as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Bravo"]);
    assert_eq!(body["pagination"], json!({ "page": 1, "limit": 2, "total": 3, "pages": 2 }));

    let (_, body) = server.get(&owner, "/api/clients?sort=-name&type=company").await?;
    let names: Vec<&str> = body["data"].as_array().unwrap().iter().filter_map(|c| c["name"].as_str()).collect();
    assert_eq!(names, vec!["Charlie", "Bravo"]);

    let (status, _) = server.get(&owner, "/api/clients?sort=password").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server.get(&owner, "/api/clients?limit=5000").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["limit"], server.config.api.max_page_size);
    Ok(())
}

#[tokio::test]
async fn unique_and_delete_rules() -> Result<()> {
    let server = common::spawn().await?;
    let owner = server.actor(Role::Owner, Some(&ObjectId::new()));

    let integration = server.create(&owner, "/api/integrations", json!({ "provider": "xero" })).await?;
    assert_eq!(integration["status"], "disconnected");

    let (status, body) = server.post(&owner, "/api/integrations", json!({ "provider": "xero" })).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = server.delete(&owner, &format!("/api/integrations/{}", id_of(&integration))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "deleted": true, "_id": id_of(&integration) }));
    Ok(())
}
