use super::super::cache::{CacheKey, ResponseCache};
use super::super::transport::{DnsExchange, Protocol};
use super::verbosity::Verbosity;
use dashmap::DashMap;
use hickory_proto::op::{Message, ResponseCode};
use rootwalk_domain::DomainError;
use rustc_hash::FxBuildHasher;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

type InflightSender = Arc<watch::Sender<Option<Arc<Message>>>>;
type InflightMap = DashMap<CacheKey, InflightSender, FxBuildHasher>;

struct InflightLeaderGuard {
    inflight: Arc<InflightMap>,
    key: CacheKey,
}

impl Drop for InflightLeaderGuard {
    fn drop(&mut self) {
        if let Some((_, tx)) = self.inflight.remove(&self.key) {
            let _ = tx.send(None);
        }
    }
}

#[derive(Debug, Default)]
pub struct TransactionStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    network_exchanges: AtomicU64,
    tcp_retries: AtomicU64,
    coalesced: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub network_exchanges: u64,
    pub tcp_retries: u64,
    pub coalesced: u64,
}

impl TransactionStats {
    pub fn snapshot(&self) -> TransactionStatsSnapshot {
        TransactionStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            network_exchanges: self.network_exchanges.load(Ordering::Relaxed),
            tcp_retries: self.tcp_retries.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// One question/server exchange with the response cache in front of it.
///
/// The cache key is the question plus the *original* server set of the
/// delegation, not the server actually asked, so every sibling nameserver of
/// a zone shares one entry. Truncated UDP replies are fetched again over TCP
/// and only NOERROR replies are stored. Concurrent misses on the same key are
/// collapsed onto a single network exchange when single flight is enabled.
pub struct Transaction {
    cache: Arc<ResponseCache>,
    exchange: Arc<dyn DnsExchange>,
    inflight: Option<Arc<InflightMap>>,
    stats: TransactionStats,
    verbosity: Verbosity,
}

impl Transaction {
    pub fn new(
        cache: Arc<ResponseCache>,
        exchange: Arc<dyn DnsExchange>,
        single_flight: bool,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            cache,
            exchange,
            inflight: single_flight.then(|| Arc::new(DashMap::with_hasher(FxBuildHasher))),
            stats: TransactionStats::default(),
            verbosity,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn stats(&self) -> TransactionStatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn exchange(
        &self,
        request: &Message,
        server: SocketAddr,
        original: &[IpAddr],
    ) -> Result<Message, DomainError> {
        let query = request.queries().first().ok_or_else(|| {
            DomainError::InvalidDomainName("request carries no question".to_string())
        })?;
        let key = CacheKey::new(query, original);

        if let Some(cached) = self.cache.get(&key) {
            TransactionStats::bump(&self.stats.cache_hits);
            if self.verbosity.enabled() {
                debug!(
                    domain = %key.domain,
                    record_type = %key.record_type,
                    context = %key.context,
                    "Cache HIT"
                );
            }
            return Ok(cached);
        }

        TransactionStats::bump(&self.stats.cache_misses);
        if self.verbosity.enabled() {
            debug!(
                domain = %key.domain,
                record_type = %key.record_type,
                context = %key.context,
                server = %server,
                "Cache MISS"
            );
        }

        let Some(inflight) = &self.inflight else {
            return self.fetch(request, server, key).await;
        };

        let (is_leader, rx) = Self::register_or_join_inflight(inflight, &key);
        if !is_leader {
            return self.resolve_as_follower(request, server, key, rx).await;
        }

        self.resolve_as_leader(request, server, key, Arc::clone(inflight))
            .await
    }

    fn register_or_join_inflight(
        inflight: &InflightMap,
        key: &CacheKey,
    ) -> (bool, watch::Receiver<Option<Arc<Message>>>) {
        match inflight.entry(key.clone()) {
            dashmap::Entry::Occupied(e) => {
                let rx = e.get().subscribe();
                drop(e);
                (false, rx)
            }
            dashmap::Entry::Vacant(e) => {
                let (tx, rx) = watch::channel(None::<Arc<Message>>);
                e.insert(Arc::new(tx));
                (true, rx)
            }
        }
    }

    async fn resolve_as_leader(
        &self,
        request: &Message,
        server: SocketAddr,
        key: CacheKey,
        inflight: Arc<InflightMap>,
    ) -> Result<Message, DomainError> {
        let guard = InflightLeaderGuard {
            inflight: Arc::clone(&inflight),
            key: key.clone(),
        };

        // A previous leader may have filled the cache between our miss and
        // our registration.
        let result = match self.cache.get(&key) {
            Some(cached) => Ok(cached),
            None => self.fetch(request, server, key.clone()).await,
        };

        if let Some((_, tx)) = inflight.remove(&key) {
            let shared = result.as_ref().ok().map(|m| Arc::new(m.clone()));
            let _ = tx.send(shared);
        }

        drop(guard);
        result
    }

    async fn resolve_as_follower(
        &self,
        request: &Message,
        server: SocketAddr,
        key: CacheKey,
        mut rx: watch::Receiver<Option<Arc<Message>>>,
    ) -> Result<Message, DomainError> {
        TransactionStats::bump(&self.stats.coalesced);

        let _ = rx.changed().await;
        let shared = rx.borrow().clone();
        if let Some(message) = shared {
            return Ok(message.as_ref().clone());
        }

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        // Leader failed; try on our own rather than inheriting its error.
        self.fetch(request, server, key).await
    }

    async fn fetch(
        &self,
        request: &Message,
        server: SocketAddr,
        key: CacheKey,
    ) -> Result<Message, DomainError> {
        TransactionStats::bump(&self.stats.network_exchanges);
        let mut response = self
            .exchange
            .exchange(request, server, Protocol::Udp)
            .await?;

        if response.truncated() {
            TransactionStats::bump(&self.stats.tcp_retries);
            if self.verbosity.enabled() {
                debug!(server = %server, domain = %key.domain, "Truncated, retrying over TCP");
            }
            response = self
                .exchange
                .exchange(request, server, Protocol::Tcp)
                .await?;
        }

        if response.response_code() == ResponseCode::NoError {
            if self.verbosity.enabled() {
                debug!(domain = %key.domain, context = %key.context, "Inserting into cache");
            }
            self.cache.insert(key, response.clone());
        }

        Ok(response)
    }
}
