use std::net::IpAddr;

/// Orders a candidate set before each step; the first server after
/// ordering is queried and the rest become the fallback set.
pub trait ServerSelector: Send + Sync {
    fn order(&self, servers: &mut [IpAddr]);
}

/// Uniform random permutation drawn from fastrand's thread-local generator,
/// which is seeded once and never reseeded per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl ServerSelector for RandomSelector {
    fn order(&self, servers: &mut [IpAddr]) {
        fastrand::shuffle(servers);
    }
}

/// Leaves the candidate set untouched. Deterministic selection for fixtures.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderedSelector;

impl ServerSelector for OrderedSelector {
    fn order(&self, _servers: &mut [IpAddr]) {}
}
