#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use counsel_api::auth::{generate_jwt, Claims, Role};
use counsel_api::config::AppConfig;
use counsel_api::store::MemoryStore;
use counsel_api::validation::ObjectId;
use counsel_api::{app, AppState};

/// One in-process server per test, backed by a fresh in-memory store
pub struct TestServer {
    pub base_url: String,
    pub config: AppConfig,
    client: reqwest::Client,
}

/// A caller with a signed token
#[derive(Debug, Clone)]
pub struct Actor {
    pub token: String,
    pub user_id: ObjectId,
    pub firm_id: Option<ObjectId>,
    pub role: Role,
}

pub async fn spawn() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test port")?;

    let config = AppConfig::development();
    let state = AppState::new(config.clone(), Arc::new(MemoryStore::new()))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        config,
        client: reqwest::Client::new(),
    })
}

impl TestServer {
    pub fn actor(&self, role: Role, firm_id: Option<&ObjectId>) -> Actor {
        self.actor_as(ObjectId::new(), role, firm_id)
    }

    pub fn actor_as(&self, user_id: ObjectId, role: Role, firm_id: Option<&ObjectId>) -> Actor {
        let claims = Claims::new(user_id.clone(), firm_id.cloned(), role, 1);
        let token = generate_jwt(&claims, &self.config.security).expect("development secret signs tokens");
        Actor {
            token,
            user_id,
            firm_id: firm_id.cloned(),
            role,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, actor: &Actor, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).bearer_auth(&actor.token).send().await?;
        read(res).await
    }

    pub async fn post(&self, actor: &Actor, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(&actor.token)
            .json(&body)
            .send()
            .await?;
        read(res).await
    }

    pub async fn patch(&self, actor: &Actor, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .patch(self.url(path))
            .bearer_auth(&actor.token)
            .json(&body)
            .send()
            .await?;
        read(res).await
    }

    pub async fn delete(&self, actor: &Actor, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.delete(self.url(path)).bearer_auth(&actor.token).send().await?;
        read(res).await
    }

    /// POST that must succeed; returns `data`
    pub async fn create(&self, actor: &Actor, path: &str, body: Value) -> Result<Value> {
        let (status, body) = self.post(actor, path, body).await?;
        anyhow::ensure!(
            status == StatusCode::CREATED || status == StatusCode::OK,
            "POST {} failed with {}: {}",
            path,
            status,
            body
        );
        Ok(body["data"].clone())
    }

    pub fn raw(&self) -> &reqwest::Client {
        &self.client
    }
}

async fn read(res: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = res.status();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, body))
}

pub fn id_of(doc: &Value) -> String {
    doc["_id"].as_str().unwrap_or_default().to_string()
}

pub fn num(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}
