use std::sync::Arc;

use crate::config::AppConfig;
use crate::observer::ObserverPipeline;
use crate::services::currency::{ConversionError, CurrencyConverter, StaticRateConverter};
use crate::services::matching::{AmountDateMatcher, BankMatcher};
use crate::store::DocumentStore;

/// Shared handles every request handler can reach
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub converter: Arc<dyn CurrencyConverter>,
    pub matcher: Arc<dyn BankMatcher>,
    pub observers: Arc<ObserverPipeline>,
}

impl AppState {
    /// Wire the default collaborators from configuration
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Result<Self, ConversionError> {
        let converter = StaticRateConverter::from_config(&config.currency)?;
        let matcher = AmountDateMatcher::new(config.reconciliation.date_window_days);

        Ok(Self {
            config: Arc::new(config),
            store,
            converter: Arc::new(converter),
            matcher: Arc::new(matcher),
            observers: Arc::new(ObserverPipeline::with_default_observers()),
        })
    }
}
