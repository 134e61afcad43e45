use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// IPv4 addresses of the thirteen root servers, a.root-servers.net through
/// m.root-servers.net.
pub const ROOT_HINTS: [Ipv4Addr; 13] = [
    Ipv4Addr::new(198, 41, 0, 4),
    Ipv4Addr::new(170, 247, 170, 2),
    Ipv4Addr::new(192, 33, 4, 12),
    Ipv4Addr::new(199, 7, 91, 13),
    Ipv4Addr::new(192, 203, 230, 10),
    Ipv4Addr::new(192, 5, 5, 241),
    Ipv4Addr::new(192, 112, 36, 4),
    Ipv4Addr::new(198, 97, 190, 53),
    Ipv4Addr::new(192, 36, 148, 17),
    Ipv4Addr::new(192, 58, 128, 30),
    Ipv4Addr::new(193, 0, 14, 129),
    Ipv4Addr::new(199, 7, 83, 42),
    Ipv4Addr::new(202, 12, 27, 33),
];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Starting candidate set for every resolution and every CNAME restart.
    #[serde(default = "default_root_hints")]
    pub root_hints: Vec<IpAddr>,

    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Queries allowed against one delegation level before giving up.
    #[serde(default = "default_max_steps_per_level")]
    pub max_steps_per_level: u32,

    #[serde(default = "default_max_cname_hops")]
    pub max_cname_hops: u32,

    /// Hard ceiling on primary queries for one top-level resolution.
    #[serde(default = "default_max_total_queries")]
    pub max_total_queries: u32,

    /// Recursive resolver used to find addresses for nameservers that came
    /// without glue.
    #[serde(default = "default_glue_resolver")]
    pub glue_resolver: SocketAddr,

    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Per-exchange timeout in milliseconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,

    #[serde(default = "default_true")]
    pub single_flight: bool,

    #[serde(default = "default_false")]
    pub verbose: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            root_hints: default_root_hints(),
            cache_max_entries: default_cache_max_entries(),
            max_steps_per_level: default_max_steps_per_level(),
            max_cname_hops: default_max_cname_hops(),
            max_total_queries: default_max_total_queries(),
            glue_resolver: default_glue_resolver(),
            server_port: default_server_port(),
            query_timeout: default_query_timeout(),
            single_flight: true,
            verbose: false,
        }
    }
}

fn default_root_hints() -> Vec<IpAddr> {
    ROOT_HINTS.iter().copied().map(IpAddr::V4).collect()
}

fn default_cache_max_entries() -> usize {
    10_000
}

fn default_max_steps_per_level() -> u32 {
    30
}

fn default_max_cname_hops() -> u32 {
    8
}

fn default_max_total_queries() -> u32 {
    256
}

fn default_glue_resolver() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53)
}

fn default_server_port() -> u16 {
    53
}

fn default_query_timeout() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}
