pub mod builder;
pub mod core;
pub mod engine;
pub mod referral;
pub mod selection;
pub mod transaction;
pub mod verbosity;

pub use builder::ResolverBuilder;
pub use core::RecursiveResolver;
pub use engine::{EngineLimits, IterativeEngine, Outcome, Resolution};
pub use referral::{Delegation, GlueOutcome};
pub use selection::{OrderedSelector, RandomSelector, ServerSelector};
pub use transaction::{Transaction, TransactionStats, TransactionStatsSnapshot};
pub use verbosity::Verbosity;
