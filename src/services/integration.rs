use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

use super::workflow::{ensure_status, WorkflowError, WorkflowResult};
use super::{load_in_scope, now_rfc3339, patch};
use crate::config::IntegrationsConfig;
use crate::auth::Role;
use crate::middleware::AuthUser;
use crate::store::collections::INTEGRATIONS;
use crate::store::{Document, DocumentStore};
use crate::validation::ObjectId;

pub const PROVIDERS: &[&str] = &["google_calendar", "outlook", "quickbooks", "xero", "dropbox"];

pub const DISCONNECTED: &str = "disconnected";
pub const PENDING: &str = "pending";
pub const CONNECTED: &str = "connected";

/// How long an issued OAuth state stays redeemable
const STATE_TTL_MINUTES: i64 = 15;

pub const INTEGRATION_ROLES: &[Role] = &[Role::Owner, Role::Admin];

/// Returned once from `connect`; only the hash of `state` is persisted
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub authorize_url: String,
    pub state: String,
    pub integration: Document,
}

pub fn hash_state(state: &str) -> String {
    format!("{:x}", Sha256::digest(state.as_bytes()))
}

fn new_state() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

pub struct IntegrationService<'a> {
    store: &'a dyn DocumentStore,
    config: &'a IntegrationsConfig,
}

impl<'a> IntegrationService<'a> {
    pub fn new(store: &'a dyn DocumentStore, config: &'a IntegrationsConfig) -> Self {
        Self { store, config }
    }

    /// Begin the provider's OAuth flow
    pub async fn connect(&self, user: &AuthUser, id: &ObjectId) -> WorkflowResult<AuthorizationRequest> {
        let integration = load_in_scope(self.store, INTEGRATIONS, &user.scope, id, "Integration").await?;
        ensure_status(&integration, "connect", &[DISCONNECTED, PENDING])?;

        let provider_name = integration.str_field("provider").unwrap_or_default();
        let provider = self
            .config
            .providers
            .get(provider_name)
            .filter(|p| !p.client_id.is_empty())
            .ok_or_else(|| {
                WorkflowError::Rejected(format!("Provider '{}' is not configured", provider_name))
            })?;

        let state = new_state();
        let authorize_url = Url::parse_with_params(
            &provider.authorize_url,
            &[
                ("client_id", provider.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", provider.scope.as_str()),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| {
            tracing::error!(provider = provider_name, "Invalid authorize URL: {}", e);
            WorkflowError::Rejected(format!("Provider '{}' is misconfigured", provider_name))
        })?;

        let updated = self
            .store
            .update(
                INTEGRATIONS,
                &user.scope,
                id,
                patch(json!({
                    "status": PENDING,
                    "stateHash": hash_state(&state),
                    "stateIssuedAt": now_rfc3339(),
                    "updatedBy": user.user_id.as_str(),
                })),
            )
            .await?
            .ok_or(WorkflowError::NotFound("Integration"))?;

        tracing::info!(integration = %id, provider = provider_name, "OAuth flow started");
        Ok(AuthorizationRequest {
            authorize_url: authorize_url.to_string(),
            state,
            integration: updated,
        })
    }

    /// Complete the flow once the provider redirects back with our state
    pub async fn callback(&self, user: &AuthUser, id: &ObjectId, state: &str, code: &str) -> WorkflowResult<Document> {
        let integration = load_in_scope(self.store, INTEGRATIONS, &user.scope, id, "Integration").await?;
        ensure_status(&integration, "complete authorization", &[PENDING])?;

        if code.trim().is_empty() {
            return Err(WorkflowError::Rejected("Authorization code is required".to_string()));
        }
        if integration.str_field("stateHash") != Some(hash_state(state).as_str()) {
            tracing::warn!(integration = %id, "OAuth state mismatch");
            return Err(WorkflowError::Rejected("Invalid or expired authorization state".to_string()));
        }
        let issued = integration
            .str_field("stateIssuedAt")
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|t| t.with_timezone(&Utc));
        if issued.map_or(true, |t| Utc::now() - t > Duration::minutes(STATE_TTL_MINUTES)) {
            return Err(WorkflowError::Rejected("Invalid or expired authorization state".to_string()));
        }

        let updated = self
            .store
            .update(
                INTEGRATIONS,
                &user.scope,
                id,
                patch(json!({
                    "status": CONNECTED,
                    "connectedAt": now_rfc3339(),
                    "connectedBy": user.user_id.as_str(),
                    "stateHash": null,
                    "stateIssuedAt": null,
                    "updatedBy": user.user_id.as_str(),
                })),
            )
            .await?
            .ok_or(WorkflowError::NotFound("Integration"))?;

        tracing::info!(integration = %id, "Integration connected");
        Ok(updated)
    }

    pub async fn disconnect(&self, user: &AuthUser, id: &ObjectId) -> WorkflowResult<Document> {
        let integration = load_in_scope(self.store, INTEGRATIONS, &user.scope, id, "Integration").await?;
        ensure_status(&integration, "disconnect", &[CONNECTED, PENDING])?;

        let updated = self
            .store
            .update(
                INTEGRATIONS,
                &user.scope,
                id,
                patch(json!({
                    "status": DISCONNECTED,
                    "disconnectedAt": now_rfc3339(),
                    "connectedAt": Value::Null,
                    "stateHash": null,
                    "stateIssuedAt": null,
                    "updatedBy": user.user_id.as_str(),
                })),
            )
            .await?
            .ok_or(WorkflowError::NotFound("Integration"))?;

        tracing::info!(integration = %id, "Integration disconnected");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, Role};
    use crate::config::AppConfig;
    use crate::store::MemoryStore;

    #[test]
    fn state_hash_is_hex_sha256() {
        let hash = hash_state("abc");
        assert_eq!(hash, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[tokio::test]
    async fn connect_then_callback() {
        let store = MemoryStore::new();
        let config = AppConfig::development();
        let user = AuthUser::from(Claims::new(ObjectId::new(), Some(ObjectId::new()), Role::Admin, 1));
        let body = json!({ "provider": "xero", "status": "disconnected" }).as_object().unwrap().clone();
        let doc = store
            .insert(INTEGRATIONS, Document::new(&user.scope, &user.user_id, body))
            .await
            .unwrap();

        let service = IntegrationService::new(&store, &config.integrations);
        let request = service.connect(&user, &doc.id).await.unwrap();
        assert!(request.authorize_url.starts_with("https://login.xero.com/identity/connect/authorize?"));
        assert!(request.authorize_url.contains("response_type=code"));
        assert!(request.authorize_url.contains(&format!("state={}", request.state)));
        assert_eq!(request.integration.status(), PENDING);
        assert_ne!(request.integration.str_field("stateHash"), Some(request.state.as_str()));

        let err = service.callback(&user, &doc.id, "forged", "code-1").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Rejected(_)));

        let connected = service.callback(&user, &doc.id, &request.state, "code-1").await.unwrap();
        assert_eq!(connected.status(), CONNECTED);
        assert!(connected.get("stateHash").map_or(true, Value::is_null));

        let disconnected = service.disconnect(&user, &doc.id).await.unwrap();
        assert_eq!(disconnected.status(), DISCONNECTED);
    }
}
