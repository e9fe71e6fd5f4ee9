mod common;

use anyhow::Result;
use common::{id_of, num, Actor, TestServer};
use counsel_api::auth::Role;
use counsel_api::validation::ObjectId;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn account(server: &TestServer, actor: &Actor, opening: f64) -> Result<String> {
    let account = server
        .create(actor, "/api/accounts", json!({ "name": "Client trust", "type": "trust", "openingBalance": opening }))
        .await?;
    Ok(id_of(&account))
}

async fn book(server: &TestServer, actor: &Actor, path: &str, account_id: &str, rows: &[(&str, f64)]) -> Result<Vec<Value>> {
    let mut created = Vec::new();
    for (date, amount) in rows {
        created.push(
            server
                .create(actor, path, json!({ "accountId": account_id, "date": date, "amount": amount }))
                .await?,
        );
    }
    Ok(created)
}

#[tokio::test]
async fn auto_match_balances_and_completes() -> Result<()> {
    let server = common::spawn().await?;
    let accountant = server.actor(Role::Accountant, Some(&ObjectId::new()));
    let account_id = account(&server, &accountant, 1000.0).await?;

    book(&server, &accountant, "/api/ledger-entries", &account_id, &[("2026-03-05", 500.0), ("2026-03-10", -200.0)]).await?;
    let txs = book(
        &server,
        &accountant,
        "/api/bank-transactions",
        &account_id,
        &[("2026-03-06", 500.0), ("2026-03-11", -200.0), ("2026-04-02", 50.0)],
    )
    .await?;
    assert_eq!(txs[0]["status"], "unmatched");
    assert_eq!(txs[0]["currency"], "USD");

    let rec = server
        .create(
            &accountant,
            "/api/reconciliations",
            json!({ "accountId": account_id, "periodStart": "2026-03-01", "periodEnd": "2026-03-31", "statementBalance": 1300 }),
        )
        .await?;
    assert_eq!(rec["status"], "in_progress");
    assert_eq!(num(&rec["openingBalance"]), 1000.0);
    let rec_path = format!("/api/reconciliations/{}", id_of(&rec));

    let (_, summary) = server.get(&accountant, &format!("{}/summary", rec_path)).await?;
    assert_eq!(num(&summary["data"]["difference"]), 300.0);
    assert_eq!(summary["data"]["unmatchedCount"], 2);

    let (status, body) = server.post(&accountant, &format!("{}/complete", rec_path), json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("out of balance by 300"));

    let (status, body) = server.post(&accountant, &format!("{}/auto-match", rec_path), json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["matched"], 2);

    let (_, summary) = server.get(&accountant, &format!("{}/summary", rec_path)).await?;
    let summary = &summary["data"];
    assert_eq!(num(&summary["clearedBalance"]), 1300.0);
    assert_eq!(num(&summary["difference"]), 0.0);
    assert_eq!(num(&summary["totalDeposits"]), 500.0);
    assert_eq!(num(&summary["totalWithdrawals"]), 200.0);
    assert_eq!(summary["matchedCount"], 2);
    assert_eq!(summary["unmatchedCount"], 0);

    // Matched rows are locked
    let (status, _) = server.delete(&accountant, &format!("/api/bank-transactions/{}", id_of(&txs[0]))).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = server.post(&accountant, &format!("{}/complete", rec_path), json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(num(&body["data"]["clearedBalance"]), 1300.0);
    assert_eq!(body["data"]["completedBy"], accountant.user_id.to_string());

    let (_, tx) = server.get(&accountant, &format!("/api/bank-transactions/{}", id_of(&txs[0]))).await?;
    assert_eq!(tx["data"]["status"], "reconciled");

    let (status, _) = server.patch(&accountant, &rec_path, json!({ "notes": "late edit" })).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = server.delete(&accountant, &rec_path).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // The next period opens from the completed statement
    let next = server
        .create(
            &accountant,
            "/api/reconciliations",
            json!({ "accountId": account_id, "periodStart": "2026-04-01", "periodEnd": "2026-04-30", "statementBalance": 1350 }),
        )
        .await?;
    assert_eq!(num(&next["openingBalance"]), 1300.0);
    Ok(())
}

#[tokio::test]
async fn one_open_reconciliation_per_account() -> Result<()> {
    let server = common::spawn().await?;
    let accountant = server.actor(Role::Accountant, Some(&ObjectId::new()));
    let account_id = account(&server, &accountant, 0.0).await?;
    let body = json!({ "accountId": account_id, "periodStart": "2026-01-01", "periodEnd": "2026-01-31", "statementBalance": 0 });

    let first = server.create(&accountant, "/api/reconciliations", body.clone()).await?;
    let (status, _) = server.post(&accountant, "/api/reconciliations", body.clone()).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let path = format!("/api/reconciliations/{}", id_of(&first));
    let (status, cancelled) = server.post(&accountant, &format!("{}/cancel", path), json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["data"]["status"], "cancelled");

    let (status, _) = server.delete(&accountant, &path).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server.post(&accountant, "/api/reconciliations", body).await?.0, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn period_must_not_run_backwards() -> Result<()> {
    let server = common::spawn().await?;
    let accountant = server.actor(Role::Accountant, None);
    let account_id = account(&server, &accountant, 0.0).await?;

    let (status, body) = server
        .post(
            &accountant,
            "/api/reconciliations",
            json!({ "accountId": account_id, "periodStart": "2026-02-01", "periodEnd": "2026-01-01", "statementBalance": 0 }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("periodEnd").is_some());
    Ok(())
}

#[tokio::test]
async fn manual_match_and_unmatch() -> Result<()> {
    let server = common::spawn().await?;
    let accountant = server.actor(Role::Accountant, Some(&ObjectId::new()));
    let staff = server.actor_as(ObjectId::new(), Role::Staff, accountant.firm_id.as_ref());
    let account_id = account(&server, &accountant, 0.0).await?;

    let entries = book(&server, &accountant, "/api/ledger-entries", &account_id, &[("2026-05-20", 99.0)]).await?;
    let txs = book(&server, &accountant, "/api/bank-transactions", &account_id, &[("2026-05-03", 100.0)]).await?;
    let (entry, tx) = (&entries[0], &txs[0]);
    let rec = server
        .create(
            &accountant,
            "/api/reconciliations",
            json!({ "accountId": account_id, "periodStart": "2026-05-01", "periodEnd": "2026-05-31", "statementBalance": 100 }),
        )
        .await?;
    let rec_path = format!("/api/reconciliations/{}", id_of(&rec));
    let pair = json!({ "transactionId": id_of(tx), "entryId": id_of(entry) });

    let (status, _) = server.post(&staff, &format!("{}/match", rec_path), pair.clone()).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = server.post(&accountant, &format!("{}/auto-match", rec_path), json!({})).await?;
    assert_eq!(body["data"]["matched"], 0);

    let (status, body) = server.post(&accountant, &format!("{}/match", rec_path), pair.clone()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["transactionId"], id_of(tx));

    let (status, _) = server.post(&accountant, &format!("{}/match", rec_path), pair).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = server
        .post(&accountant, &format!("{}/unmatch", rec_path), json!({ "transactionId": id_of(tx) }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, tx) = server.get(&accountant, &format!("/api/bank-transactions/{}", id_of(tx))).await?;
    assert_eq!(tx["data"]["status"], "unmatched");

    let (status, _) = server
        .post(&accountant, &format!("{}/match", rec_path), json!({ "transactionId": "bogus", "entryId": id_of(entry) }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}
