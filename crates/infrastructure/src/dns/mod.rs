pub mod cache;
pub mod query_builder;
pub mod resolver;
pub mod transport;

pub use cache::{CacheKey, ResponseCache};
pub use query_builder::QueryBuilder;
pub use resolver::{
    Delegation, EngineLimits, GlueOutcome, IterativeEngine, OrderedSelector, Outcome,
    RandomSelector, RecursiveResolver, Resolution, ResolverBuilder, ServerSelector, Transaction,
    TransactionStats, TransactionStatsSnapshot, Verbosity,
};
pub use transport::{DnsExchange, NetworkExchange, Protocol};
