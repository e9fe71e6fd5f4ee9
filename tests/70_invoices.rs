mod common;

use anyhow::Result;
use common::{id_of, num, Actor, TestServer};
use counsel_api::auth::Role;
use counsel_api::validation::ObjectId;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn draft(server: &TestServer, actor: &Actor, extra: Value) -> Result<Value> {
    let client = server.create(actor, "/api/clients", json!({ "name": "Wayne Enterprises" })).await?;
    let mut body = json!({
        "clientId": id_of(&client),
        "issueDate": "2026-09-01",
        "dueDate": "2026-09-30",
        "lineItems": [
            { "description": "Consultation", "quantity": 2, "unitPrice": 150 },
            { "description": "Court filing", "quantity": 1, "unitPrice": 100 }
        ],
        "discount": 50,
        "taxRate": 10
    });
    if let (Some(target), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        target.extend(extra.clone());
    }
    server.create(actor, "/api/invoices", body).await
}

#[tokio::test]
async fn totals_are_computed_and_numbered() -> Result<()> {
    let server = common::spawn().await?;
    let partner = server.actor(Role::Partner, Some(&ObjectId::new()));

    let invoice = draft(&server, &partner, json!({})).await?;
    assert_eq!(invoice["status"], "draft");
    assert_eq!(invoice["invoiceNumber"], "INV-00001");
    assert_eq!(invoice["currency"], "USD");
    assert_eq!(num(&invoice["subtotal"]), 400.0);
    assert_eq!(num(&invoice["taxAmount"]), 35.0);
    assert_eq!(num(&invoice["total"]), 385.0);
    assert_eq!(num(&invoice["balanceDue"]), 385.0);
    assert_eq!(num(&invoice["lineItems"][0]["amount"]), 300.0);

    let second = draft(&server, &partner, json!({})).await?;
    assert_eq!(second["invoiceNumber"], "INV-00002");

    // Editing a draft recomputes from the stored inputs
    let (status, body) = server
        .patch(&partner, &format!("/api/invoices/{}", id_of(&invoice)), json!({ "taxRate": 0 }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(num(&body["data"]["total"]), 350.0);
    Ok(())
}

#[tokio::test]
async fn numbers_are_not_reused_after_a_draft_is_deleted() -> Result<()> {
    let server = common::spawn().await?;
    let partner = server.actor(Role::Partner, Some(&ObjectId::new()));

    let first = draft(&server, &partner, json!({})).await?;
    let second = draft(&server, &partner, json!({})).await?;
    let (status, _) = server.delete(&partner, &format!("/api/invoices/{}", id_of(&first))).await?;
    assert_eq!(status, StatusCode::OK);

    let third = draft(&server, &partner, json!({})).await?;
    assert_eq!(second["invoiceNumber"], "INV-00002");
    assert_eq!(third["invoiceNumber"], "INV-00003");
    Ok(())
}

#[tokio::test]
async fn fractional_quantities_are_billed_exactly() -> Result<()> {
    let server = common::spawn().await?;
    let partner = server.actor(Role::Partner, None);

    let invoice = draft(
        &server,
        &partner,
        json!({
            "lineItems": [{ "description": "Research", "quantity": 0.333, "unitPrice": 300 }],
            "discount": 0,
            "taxRate": 0
        }),
    )
    .await?;
    assert_eq!(num(&invoice["lineItems"][0]["quantity"]), 0.333);
    assert_eq!(num(&invoice["subtotal"]), 99.9);

    // Three half-cent lines round once on the sum
    let half_cent = json!({ "description": "Copy", "quantity": 0.5, "unitPrice": 0.01 });
    let invoice = draft(
        &server,
        &partner,
        json!({ "lineItems": [half_cent.clone(), half_cent.clone(), half_cent], "discount": 0, "taxRate": 0 }),
    )
    .await?;
    assert_eq!(num(&invoice["subtotal"]), 0.02);

    let (status, body) = server
        .patch(
            &partner,
            &format!("/api/invoices/{}", id_of(&invoice)),
            json!({ "lineItems": [{ "description": "Copy", "quantity": 1, "unitPrice": 0.015 }] }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("lineItems").is_some());
    Ok(())
}

#[tokio::test]
async fn discount_cannot_exceed_subtotal() -> Result<()> {
    let server = common::spawn().await?;
    let partner = server.actor(Role::Partner, None);
    let client = server.create(&partner, "/api/clients", json!({ "name": "Stark" })).await?;

    let (status, body) = server
        .post(
            &partner,
            "/api/invoices",
            json!({
                "clientId": id_of(&client),
                "issueDate": "2026-09-01",
                "dueDate": "2026-09-30",
                "lineItems": [{ "description": "Advice", "quantity": 1, "unitPrice": 100 }],
                "discount": 101
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("discount").is_some());
    Ok(())
}

#[tokio::test]
async fn payments_move_invoice_to_paid() -> Result<()> {
    let server = common::spawn().await?;
    let firm = ObjectId::new();
    let accountant = server.actor(Role::Accountant, Some(&firm));
    let staff = server.actor(Role::Staff, Some(&firm));
    let invoice = draft(&server, &accountant, json!({})).await?;
    let path = format!("/api/invoices/{}", id_of(&invoice));

    let (status, _) = server.post(&staff, &format!("{}/send", path), json!({})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .post(&accountant, &format!("{}/payments", path), json!({ "amount": 10, "date": "2026-09-10" }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, sent) = server.post(&accountant, &format!("{}/send", path), json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["data"]["status"], "sent");

    let (status, _) = server.patch(&accountant, &path, json!({ "notes": "Too late" })).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = server
        .post(&accountant, &format!("{}/payments", path), json!({ "amount": 385.01, "date": "2026-09-10" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("amount").is_some());

    let (status, partial) = server
        .post(
            &accountant,
            &format!("{}/payments", path),
            json!({ "amount": 185, "date": "2026-09-10", "method": "bank_transfer", "reference": "TX-1" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(partial["data"]["status"], "partially_paid");
    assert_eq!(num(&partial["data"]["amountPaid"]), 185.0);
    assert_eq!(num(&partial["data"]["balanceDue"]), 200.0);

    let (status, body) = server.post(&accountant, &format!("{}/void", path), json!({})).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap_or_default().contains("void"));

    let (status, paid) = server
        .post(&accountant, &format!("{}/payments", path), json!({ "amount": 200, "date": "2026-09-20" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["data"]["status"], "paid");
    assert_eq!(num(&paid["data"]["balanceDue"]), 0.0);
    assert_eq!(paid["data"]["payments"].as_array().map(Vec::len), Some(2));
    assert!(paid["data"]["paidAt"].is_string());

    let (status, _) = server.delete(&accountant, &path).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn void_blocks_further_changes() -> Result<()> {
    let server = common::spawn().await?;
    let owner = server.actor(Role::Owner, Some(&ObjectId::new()));
    let invoice = draft(&server, &owner, json!({})).await?;
    let path = format!("/api/invoices/{}", id_of(&invoice));

    let (status, voided) = server
        .post(&owner, &format!("{}/void", path), json!({ "reason": "Raised in error" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voided["data"]["status"], "void");
    assert_eq!(voided["data"]["voidReason"], "Raised in error");
    assert_eq!(num(&voided["data"]["balanceDue"]), 0.0);

    let (status, _) = server.post(&owner, &format!("{}/send", path), json!({})).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn invoices_list_filters_by_status() -> Result<()> {
    let server = common::spawn().await?;
    let owner = server.actor(Role::Owner, Some(&ObjectId::new()));
    let first = draft(&server, &owner, json!({})).await?;
    draft(&server, &owner, json!({ "notes": "second" })).await?;
    server
        .post(&owner, &format!("/api/invoices/{}/send", id_of(&first)), json!({}))
        .await?;

    let (status, body) = server.get(&owner, "/api/invoices?status=sent").await?;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["_id"], first["_id"]);
    assert_eq!(body["pagination"]["total"], 1);
    Ok(())
}
