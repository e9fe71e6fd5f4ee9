use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub reconciliation: ReconciliationConfig,
    pub currency: CurrencyConfig,
    pub integrations: IntegrationsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string; the in-memory store is used when absent
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// How far outside the statement period a ledger entry may fall and still match
    pub date_window_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub base_currency: String,
    /// Units of each currency per one unit of the base currency
    pub rates: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    pub redirect_uri: String,
    pub providers: BTreeMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub authorize_url: String,
    pub client_id: String,
    pub scope: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Some(v) = env::var("COUNSEL_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Reconciliation overrides
        if let Ok(v) = env::var("RECONCILIATION_DATE_WINDOW_DAYS") {
            self.reconciliation.date_window_days = v.parse().unwrap_or(self.reconciliation.date_window_days);
        }

        // Currency overrides, e.g. CURRENCY_RATES="EUR=0.92,GBP=0.79"
        if let Ok(v) = env::var("CURRENCY_BASE") {
            self.currency.base_currency = v.trim().to_ascii_uppercase();
        }
        if let Ok(v) = env::var("CURRENCY_RATES") {
            for pair in v.split(',') {
                if let Some((code, rate)) = pair.split_once('=') {
                    self.currency
                        .rates
                        .insert(code.trim().to_ascii_uppercase(), rate.trim().to_string());
                }
            }
        }

        // Integration overrides
        if let Ok(v) = env::var("INTEGRATIONS_REDIRECT_URI") {
            self.integrations.redirect_uri = v;
        }
        for (name, provider) in self.integrations.providers.iter_mut() {
            let key = format!("INTEGRATION_{}_CLIENT_ID", name.to_ascii_uppercase());
            if let Ok(v) = env::var(&key) {
                provider.client_id = v;
            }
        }

        self
    }

    pub fn development() -> Self {
        let mut integrations = default_integrations("http://localhost:3000/integrations/callback");
        for (name, provider) in integrations.providers.iter_mut() {
            provider.client_id = format!("counsel-dev-{}", name);
        }

        Self {
            environment: Environment::Development,
            api: ApiConfig {
                port: 3000,
                default_page_size: 20,
                max_page_size: 100,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                acquire_timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                cors_origins: vec![],
            },
            reconciliation: ReconciliationConfig { date_window_days: 5 },
            currency: default_currency(),
            integrations,
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                port: 3000,
                default_page_size: 20,
                max_page_size: 100,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                acquire_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            reconciliation: ReconciliationConfig { date_window_days: 5 },
            currency: default_currency(),
            integrations: default_integrations("https://staging.example.com/integrations/callback"),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                port: 3000,
                default_page_size: 20,
                max_page_size: 100,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                acquire_timeout_secs: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 8,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            reconciliation: ReconciliationConfig { date_window_days: 3 },
            currency: default_currency(),
            integrations: default_integrations("https://app.example.com/integrations/callback"),
        }
    }
}

fn default_currency() -> CurrencyConfig {
    let rates = [
        ("USD", "1"),
        ("EUR", "0.92"),
        ("GBP", "0.79"),
        ("CAD", "1.36"),
        ("AUD", "1.52"),
        ("ZAR", "18.40"),
    ]
    .into_iter()
    .map(|(code, rate)| (code.to_string(), rate.to_string()))
    .collect();

    CurrencyConfig {
        base_currency: "USD".to_string(),
        rates,
    }
}

fn default_integrations(redirect_uri: &str) -> IntegrationsConfig {
    let provider = |authorize_url: &str, scope: &str| ProviderConfig {
        authorize_url: authorize_url.to_string(),
        client_id: String::new(),
        scope: scope.to_string(),
    };

    let providers = BTreeMap::from([
        (
            "google_calendar".to_string(),
            provider("https://accounts.google.com/o/oauth2/v2/auth", "https://www.googleapis.com/auth/calendar"),
        ),
        (
            "outlook".to_string(),
            provider("https://login.microsoftonline.com/common/oauth2/v2.0/authorize", "Calendars.ReadWrite offline_access"),
        ),
        (
            "quickbooks".to_string(),
            provider("https://appcenter.intuit.com/connect/oauth2", "com.intuit.quickbooks.accounting"),
        ),
        (
            "xero".to_string(),
            provider("https://login.xero.com/identity/connect/authorize", "accounting.transactions offline_access"),
        ),
        (
            "dropbox".to_string(),
            provider("https://www.dropbox.com/oauth2/authorize", "files.content.write"),
        ),
    ]);

    IntegrationsConfig {
        redirect_uri: redirect_uri.to_string(),
        providers,
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_config_has_secret_and_rates() {
        let config = AppConfig::development();
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.currency.base_currency, "USD");
        assert_eq!(config.currency.rates.get("USD").map(String::as_str), Some("1"));
        assert_eq!(config.api.max_page_size, 100);
    }

    #[test]
    fn production_config_requires_explicit_secret() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 8);
        assert!(config.database.max_connections > AppConfig::development().database.max_connections);
    }

    #[test]
    fn every_environment_knows_the_same_providers() {
        let dev = AppConfig::development();
        let prod = AppConfig::production();
        let dev_names: Vec<_> = dev.integrations.providers.keys().collect();
        let prod_names: Vec<_> = prod.integrations.providers.keys().collect();
        assert_eq!(dev_names, prod_names);
        assert!(dev.integrations.providers.contains_key("quickbooks"));
    }
}
