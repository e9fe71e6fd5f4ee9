use serde_json::json;

use crate::cli::output::{output_success, output_table};
use crate::cli::OutputFormat;
use crate::config::config;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();

    match output_format {
        // jwt_secret is skipped by the serializer
        OutputFormat::Json => output_success(output_format, "Effective configuration", Some(json!({ "config": config }))),
        OutputFormat::Text => {
            let store = if config.database.url.is_some() { "postgres" } else { "memory" };
            let rates: Vec<String> = config.currency.rates.iter().map(|(code, rate)| format!("{}={}", code, rate)).collect();
            let providers: Vec<&str> = config.integrations.providers.keys().map(String::as_str).collect();

            output_table(&[
                ("environment".to_string(), format!("{:?}", config.environment)),
                ("port".to_string(), config.api.port.to_string()),
                (
                    "page size".to_string(),
                    format!("{} (max {})", config.api.default_page_size, config.api.max_page_size),
                ),
                ("store".to_string(), store.to_string()),
                ("jwt expiry".to_string(), format!("{}h", config.security.jwt_expiry_hours)),
                ("cors".to_string(), config.security.cors_origins.join(", ")),
                (
                    "match window".to_string(),
                    format!("{} days", config.reconciliation.date_window_days),
                ),
                ("base currency".to_string(), config.currency.base_currency.clone()),
                ("rates".to_string(), rates.join(", ")),
                ("integrations".to_string(), providers.join(", ")),
            ]);
            Ok(())
        }
    }
}
