//! Iterative resolution engine.
//!
//! Walks the delegation tree from the root hints down, one query per step:
//!
//! - **SELECT**: order the candidate set, take the first server, keep the rest
//!   as the fallback set
//! - **QUERY**: ask that server with RD unset, through the cached transaction
//! - **ANSWERED**: an answer of the queried type arrived
//! - **CNAME_REDIRECT**: restart from the roots for the alias target
//! - **REFERRED**: adopt the referral's nameservers as a new delegation level
//! - **RETRY**: transport error, bad rcode or unusable referral; continue with
//!   the fallback set at the same level
//!
//! The step counter is capped per delegation level and resets when a new
//! level is entered. CNAME restarts carry it forward.

use super::referral::{Delegation, GlueOutcome};
use super::selection::ServerSelector;
use super::transaction::Transaction;
use super::verbosity::Verbosity;
use crate::dns::cache::key::server_context;
use crate::dns::query_builder::QueryBuilder;
use compact_str::CompactString;
use hickory_proto::op::{Message, Query, ResponseCode};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use rootwalk_domain::ResolverConfig;
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    pub max_steps_per_level: u32,
    pub max_cname_hops: u32,
    pub max_total_queries: u32,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

impl From<&ResolverConfig> for EngineLimits {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            max_steps_per_level: config.max_steps_per_level,
            max_cname_hops: config.max_cname_hops,
            max_total_queries: config.max_total_queries,
        }
    }
}

/// How a resolution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Answered,
    /// Every candidate at the current level failed.
    ExhaustedCandidates,
    /// The per-level step cap was reached.
    LoopLimit,
    CnameLimit,
    QueryBudget,
}

impl Outcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered)
    }

    pub fn response_code(&self) -> ResponseCode {
        match self {
            Self::Answered => ResponseCode::NoError,
            _ => ResponseCode::ServFail,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::ExhaustedCandidates => "exhausted_candidates",
            Self::LoopLimit => "loop_limit",
            Self::CnameLimit => "cname_limit",
            Self::QueryBudget => "query_budget",
        }
    }
}

/// Answers accumulated over the whole walk (including CNAMEs followed) and
/// the terminal outcome.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub answers: Vec<Record>,
    pub outcome: Outcome,
}

impl Resolution {
    pub fn response_code(&self) -> ResponseCode {
        self.outcome.response_code()
    }
}

enum Step {
    Answered,
    Cname(Name),
    Referral,
}

/// Loop state for one in-flight question.
struct Walk {
    question: Query,
    candidates: Vec<IpAddr>,
    original: Vec<IpAddr>,
    steps: u32,
    cname_hops: u32,
    total_queries: u32,
    visited: HashSet<CompactString>,
}

impl Walk {
    fn new(question: Query, servers: Vec<IpAddr>) -> Self {
        let mut visited = HashSet::new();
        visited.insert(server_context(&servers));
        Self {
            question,
            candidates: servers.clone(),
            original: servers,
            steps: 0,
            cname_hops: 0,
            total_queries: 0,
            visited,
        }
    }

    /// Same level, remaining siblings.
    fn retry(&mut self, fallback: Vec<IpAddr>) {
        self.candidates = fallback;
    }

    /// Enter a new delegation level. Refuses a level already visited for
    /// this question, which would only repeat earlier work.
    fn descend(&mut self, servers: Vec<IpAddr>) -> bool {
        if !self.visited.insert(server_context(&servers)) {
            return false;
        }
        self.candidates = servers.clone();
        self.original = servers;
        self.steps = 0;
        true
    }

    /// Restart from `roots` for the alias target, same type and class.
    fn chase(&mut self, target: Name, roots: &[IpAddr]) {
        let mut question = self.question.clone();
        question.set_name(target);
        self.question = question;
        self.candidates = roots.to_vec();
        self.original = roots.to_vec();
        self.cname_hops += 1;
        self.visited.clear();
        self.visited.insert(server_context(roots));
    }
}

pub struct IterativeEngine {
    transaction: Arc<Transaction>,
    selector: Arc<dyn ServerSelector>,
    root_hints: Arc<[IpAddr]>,
    glue_resolver: SocketAddr,
    server_port: u16,
    limits: EngineLimits,
    verbosity: Verbosity,
    glue_failures: AtomicU64,
}

impl IterativeEngine {
    pub fn new(
        transaction: Arc<Transaction>,
        selector: Arc<dyn ServerSelector>,
        config: &ResolverConfig,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            transaction,
            selector,
            root_hints: Arc::from(config.root_hints.as_slice()),
            glue_resolver: config.glue_resolver,
            server_port: config.server_port,
            limits: EngineLimits::from(config),
            verbosity,
            glue_failures: AtomicU64::new(0),
        }
    }

    pub fn root_hints(&self) -> &[IpAddr] {
        &self.root_hints
    }

    pub fn limits(&self) -> EngineLimits {
        self.limits
    }

    /// Glue lookups that failed or returned no address.
    pub fn glue_failures(&self) -> u64 {
        self.glue_failures.load(Ordering::Relaxed)
    }

    /// Resolve `question` starting from the root hints.
    pub async fn run(&self, question: Query) -> Resolution {
        self.run_from(question, self.root_hints.to_vec()).await
    }

    /// Resolve `question` starting from an arbitrary server set, which is
    /// both the first candidate set and the first delegation context.
    pub async fn run_from(&self, question: Query, servers: Vec<IpAddr>) -> Resolution {
        let mut walk = Walk::new(question, servers);
        let mut answers = Vec::new();

        let outcome = loop {
            if walk.candidates.is_empty() {
                break Outcome::ExhaustedCandidates;
            }
            if walk.steps >= self.limits.max_steps_per_level {
                break Outcome::LoopLimit;
            }
            if walk.total_queries >= self.limits.max_total_queries {
                break Outcome::QueryBudget;
            }
            walk.steps += 1;
            walk.total_queries += 1;

            self.selector.order(&mut walk.candidates);
            let server = walk.candidates[0];
            let fallback = walk.candidates[1..].to_vec();

            if self.verbosity.enabled() {
                debug!(
                    domain = %walk.question.name(),
                    record_type = %walk.question.query_type(),
                    server = %server,
                    fallback = fallback.len(),
                    step = walk.steps,
                    "Querying server"
                );
            }

            let request = QueryBuilder::build(&walk.question, false);
            let response = match self
                .transaction
                .exchange(&request, self.server_addr(server), &walk.original)
                .await
            {
                Ok(response) if response.response_code() == ResponseCode::NoError => response,
                Ok(response) => {
                    if self.verbosity.enabled() {
                        debug!(
                            server = %server,
                            rcode = ?response.response_code(),
                            "Non-success response, trying next server"
                        );
                    }
                    walk.retry(fallback);
                    continue;
                }
                Err(e) => {
                    if self.verbosity.enabled() {
                        debug!(server = %server, error = %e, "Exchange failed, trying next server");
                    }
                    walk.retry(fallback);
                    continue;
                }
            };

            match Self::interpret(&walk.question, &response, &mut answers) {
                Step::Answered => break Outcome::Answered,
                Step::Cname(target) => {
                    if walk.cname_hops >= self.limits.max_cname_hops {
                        break Outcome::CnameLimit;
                    }
                    if self.verbosity.enabled() {
                        debug!(from = %walk.question.name(), to = %target, "Following CNAME");
                    }
                    walk.chase(target, &self.root_hints);
                }
                Step::Referral => {
                    let next = self.follow_referral(&response).await;
                    if self.verbosity.enabled() {
                        debug!(
                            domain = %walk.question.name(),
                            servers = ?next,
                            "Referral"
                        );
                    }
                    if next.is_empty() || !walk.descend(next) {
                        walk.retry(fallback);
                    }
                }
            }
        };

        if !outcome.is_answered() {
            warn!(
                domain = %walk.question.name(),
                record_type = %walk.question.query_type(),
                outcome = outcome.as_str(),
                queries = walk.total_queries,
                "Resolution failed"
            );
        }

        Resolution { answers, outcome }
    }

    /// Append every answer to `answers` and decide the next transition. When
    /// a response carries several CNAMEs the last one wins.
    fn interpret(question: &Query, response: &Message, answers: &mut Vec<Record>) -> Step {
        let mut answered = false;
        let mut cname = None;

        for record in response.answers() {
            answers.push(record.clone());
            if record.record_type() == question.query_type() {
                answered = true;
            }
            if let Some(RData::CNAME(target)) = record.data() {
                cname = Some(target.0.clone());
            }
        }

        if answered {
            return Step::Answered;
        }
        match cname {
            Some(target) => Step::Cname(target),
            None => Step::Referral,
        }
    }

    /// Turn a referral into the next candidate set, looking up addresses for
    /// nameservers that came without glue.
    async fn follow_referral(&self, response: &Message) -> Vec<IpAddr> {
        let mut delegation = Delegation::from_response(response);

        for nameserver in delegation.missing_glue() {
            let outcome = self.bootstrap_glue(&nameserver).await;
            if !matches!(outcome, GlueOutcome::Resolved(_)) {
                self.glue_failures.fetch_add(1, Ordering::Relaxed);
            }
            if self.verbosity.enabled() {
                match &outcome {
                    GlueOutcome::Resolved(addresses) => {
                        debug!(nameserver = %nameserver, addresses = ?addresses, "Glue resolved");
                    }
                    GlueOutcome::NoAddress => {
                        debug!(nameserver = %nameserver, "Glue lookup returned no address");
                    }
                    GlueOutcome::Failed(e) => {
                        debug!(nameserver = %nameserver, error = %e, "Glue lookup failed");
                    }
                }
            }
            delegation.apply_glue(&nameserver, &outcome);
        }

        delegation.servers()
    }

    /// Ask the glue resolver, recursively, for the A records of a nameserver.
    async fn bootstrap_glue(&self, nameserver: &Name) -> GlueOutcome {
        let question = Query::query(nameserver.clone(), RecordType::A);
        let request = QueryBuilder::build(&question, true);
        let context = [self.glue_resolver.ip()];

        match self
            .transaction
            .exchange(&request, self.glue_resolver, &context)
            .await
        {
            Ok(response) => GlueOutcome::from_response(&response),
            Err(e) => GlueOutcome::Failed(e),
        }
    }

    fn server_addr(&self, ip: IpAddr) -> SocketAddr {
        SocketAddr::new(ip, self.server_port)
    }
}
