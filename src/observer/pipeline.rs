// Observer pipeline: rings run in order, observers within a ring by priority

use std::collections::BTreeMap;
use std::time::Instant;
use tokio::time::timeout;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::implementations;
use crate::observer::traits::{Observer, ObserverRing};

pub struct ObserverPipeline {
    // Observer registry by ring
    observers: BTreeMap<ObserverRing, Vec<Box<dyn Observer>>>,
}

impl ObserverPipeline {
    /// Empty pipeline; register observers with `register_observer`
    pub fn new() -> Self {
        Self {
            observers: BTreeMap::new(),
        }
    }

    /// Pipeline carrying every built-in resource rule
    pub fn with_default_observers() -> Self {
        let mut pipeline = Self::new();
        for observer in implementations::default_observers() {
            pipeline.register_observer(observer);
        }
        pipeline
    }

    pub fn register_observer(&mut self, observer: Box<dyn Observer>) {
        let ring = observer.ring();
        let name = observer.name();
        let ring_observers = self.observers.entry(ring).or_default();
        ring_observers.push(observer);
        ring_observers.sort_by_key(|o| o.priority());

        tracing::debug!("Registered observer '{}' for ring {:?}", name, ring);
    }

    pub fn len(&self) -> usize {
        self.observers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run validation, business and enrichment rings; the first failure stops the write
    pub async fn run_before_write(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        for ring in ObserverRing::BEFORE_WRITE {
            self.execute_ring(ring, ctx).await?;
        }
        Ok(())
    }

    /// Run post-database observers once the write has landed
    pub async fn run_after_write(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        self.execute_ring(ObserverRing::PostDatabase, ctx).await
    }

    async fn execute_ring(&self, ring: ObserverRing, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        let Some(observers) = self.observers.get(&ring) else {
            return Ok(());
        };
        ctx.current_ring = Some(ring);

        for observer in observers {
            if !observer.applies_to_operation(ctx.operation) || !observer.applies_to_collection(ctx.collection) {
                continue;
            }

            let observer_start = Instant::now();
            match timeout(observer.timeout(), observer.execute(ctx)).await {
                Ok(Ok(())) => {
                    tracing::debug!(
                        "Observer: {} completed in {:?}",
                        observer.name(),
                        observer_start.elapsed()
                    );
                }
                Ok(Err(error)) => {
                    tracing::debug!(
                        "Observer: {} rejected {:?} on {}: {}",
                        observer.name(),
                        ctx.operation,
                        ctx.collection,
                        error
                    );
                    return Err(error);
                }
                Err(_elapsed) => {
                    tracing::error!(
                        "Observer: {} timed out after {:?}",
                        observer.name(),
                        observer.timeout()
                    );
                    return Err(ObserverError::Timeout(observer.name()));
                }
            }
        }

        Ok(())
    }
}

impl Default for ObserverPipeline {
    fn default() -> Self {
        Self::new()
    }
}
