use super::builder::ResolverBuilder;
use super::engine::{IterativeEngine, Outcome, Resolution};
use super::transaction::{Transaction, TransactionStatsSnapshot};
use super::verbosity::Verbosity;
use crate::dns::cache::ResponseCache;
use hickory_proto::op::{Message, Query, ResponseCode};
use rootwalk_domain::ResolverConfig;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Iterative resolver entry point. Owns the response cache and the root hints
/// and resolves one question at a time from the roots down.
pub struct RecursiveResolver {
    engine: IterativeEngine,
    transaction: Arc<Transaction>,
    verbosity: Verbosity,
}

impl RecursiveResolver {
    /// Resolver wired with the real network exchange and random server
    /// selection. Performs no I/O.
    pub fn new(config: &ResolverConfig) -> Self {
        ResolverBuilder::new(config.clone()).build()
    }

    pub(super) fn from_parts(
        engine: IterativeEngine,
        transaction: Arc<Transaction>,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            engine,
            transaction,
            verbosity,
        }
    }

    /// Resolve the single question carried by `message`, append the answers
    /// to it and set its response code. Failures surface only as `ServFail`;
    /// a message without exactly one question gets `FormErr`.
    pub async fn resolve(&self, message: &mut Message) {
        if message.queries().len() != 1 {
            debug!(
                questions = message.queries().len(),
                "Rejecting message without exactly one question"
            );
            message.set_response_code(ResponseCode::FormErr);
            return;
        }

        let query = message.queries()[0].clone();
        let resolution = self.lookup(query).await;

        message.add_answers(resolution.answers);
        message.set_response_code(resolution.outcome.response_code());
    }

    /// Resolve `query` from the root hints and report the terminal outcome
    /// alongside the accumulated answers.
    pub async fn lookup(&self, query: Query) -> Resolution {
        let resolution = self.engine.run(query.clone()).await;

        if resolution.outcome == Outcome::Answered {
            info!(
                domain = %query.name(),
                record_type = %query.query_type(),
                answers = resolution.answers.len(),
                "Resolved"
            );
        }

        resolution
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.verbosity.set(verbose);
    }

    pub fn verbose(&self) -> bool {
        self.verbosity.enabled()
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        self.transaction.cache()
    }

    pub fn stats(&self) -> TransactionStatsSnapshot {
        self.transaction.stats()
    }

    pub fn glue_failures(&self) -> u64 {
        self.engine.glue_failures()
    }

    pub fn root_hints(&self) -> &[IpAddr] {
        self.engine.root_hints()
    }
}
