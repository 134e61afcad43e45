use super::core::RecursiveResolver;
use super::engine::IterativeEngine;
use super::selection::{RandomSelector, ServerSelector};
use super::transaction::Transaction;
use super::verbosity::Verbosity;
use crate::dns::cache::ResponseCache;
use crate::dns::transport::{DnsExchange, NetworkExchange};
use rootwalk_domain::ResolverConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct ResolverBuilder {
    config: ResolverConfig,
    exchange: Option<Arc<dyn DnsExchange>>,
    selector: Option<Arc<dyn ServerSelector>>,
    cache: Option<Arc<ResponseCache>>,
}

impl ResolverBuilder {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            exchange: None,
            selector: None,
            cache: None,
        }
    }

    pub fn with_exchange(mut self, exchange: Arc<dyn DnsExchange>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    pub fn with_selector(mut self, selector: Arc<dyn ServerSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Share an existing cache instead of allocating one from the config.
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> RecursiveResolver {
        info!(
            root_hints = self.config.root_hints.len(),
            cache_max_entries = self.config.cache_max_entries,
            glue_resolver = %self.config.glue_resolver,
            single_flight = self.config.single_flight,
            custom_exchange = self.exchange.is_some(),
            "Building recursive resolver"
        );

        let verbosity = Verbosity::new(self.config.verbose);
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ResponseCache::new(self.config.cache_max_entries)));
        let exchange: Arc<dyn DnsExchange> = match self.exchange {
            Some(exchange) => exchange,
            None => Arc::new(NetworkExchange::new(Duration::from_millis(
                self.config.query_timeout,
            ))),
        };
        let selector: Arc<dyn ServerSelector> = match self.selector {
            Some(selector) => selector,
            None => Arc::new(RandomSelector),
        };

        let transaction = Arc::new(Transaction::new(
            cache,
            exchange,
            self.config.single_flight,
            verbosity.clone(),
        ));
        let engine = IterativeEngine::new(
            Arc::clone(&transaction),
            selector,
            &self.config,
            verbosity.clone(),
        );

        RecursiveResolver::from_parts(engine, transaction, verbosity)
    }
}
