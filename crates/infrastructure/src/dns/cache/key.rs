use compact_str::CompactString;
use hickory_proto::op::Query;
use hickory_proto::rr::{DNSClass, RecordType};
use std::fmt::Write;
use std::net::IpAddr;

/// Identifies a cached response: the question plus the delegation context it
/// was asked in. The context is the sorted original server set rendered as
/// `[a b c]`, so sibling candidates of one delegation share entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub domain: CompactString,
    pub record_type: RecordType,
    pub query_class: DNSClass,
    pub context: CompactString,
}

impl CacheKey {
    pub fn new(query: &Query, original: &[IpAddr]) -> Self {
        Self {
            domain: CompactString::from(query.name().to_lowercase().to_ascii()),
            record_type: query.query_type(),
            query_class: query.query_class(),
            context: server_context(original),
        }
    }
}

/// Stable string form of a server set, independent of input order.
pub fn server_context(servers: &[IpAddr]) -> CompactString {
    let mut sorted = servers.to_vec();
    sorted.sort_unstable();

    let mut context = CompactString::with_capacity(2 + sorted.len() * 16);
    context.push('[');
    for (i, server) in sorted.iter().enumerate() {
        if i > 0 {
            context.push(' ');
        }
        let _ = write!(context, "{}", server);
    }
    context.push(']');
    context
}
