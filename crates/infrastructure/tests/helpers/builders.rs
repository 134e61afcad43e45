#![allow(dead_code)]
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::rdata::{A, CNAME, NS};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use rootwalk_domain::ResolverConfig;
use rootwalk_infrastructure::dns::{
    DnsExchange, OrderedSelector, RecursiveResolver, ResolverBuilder,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

pub const ROOT: [u8; 4] = [198, 41, 0, 4];
pub const ROOT_B: [u8; 4] = [170, 247, 170, 2];
pub const COM_NS: [u8; 4] = [192, 5, 6, 30];
pub const COM_NS_B: [u8; 4] = [192, 33, 14, 30];
pub const EXAMPLE_NS: [u8; 4] = [199, 43, 135, 53];
pub const GLUE_RESOLVER: [u8; 4] = [8, 8, 8, 8];

pub fn ip(octets: [u8; 4]) -> IpAddr {
    IpAddr::V4(Ipv4Addr::from(octets))
}

pub fn name(s: &str) -> Name {
    Name::from_str(s).unwrap()
}

pub fn question(domain: &str, record_type: RecordType) -> Query {
    Query::query(name(domain), record_type)
}

pub fn a_record(owner: &str, octets: [u8; 4]) -> Record {
    Record::from_rdata(name(owner), 300, RData::A(A(Ipv4Addr::from(octets))))
}

pub fn ns_record(zone: &str, target: &str) -> Record {
    Record::from_rdata(name(zone), 172800, RData::NS(NS(name(target))))
}

pub fn cname_record(owner: &str, target: &str) -> Record {
    Record::from_rdata(name(owner), 300, RData::CNAME(CNAME(name(target))))
}

pub fn response(code: ResponseCode) -> Message {
    let mut message = Message::new();
    message
        .set_message_type(MessageType::Response)
        .set_response_code(code);
    message
}

/// NOERROR response carrying `records` in the answer section.
pub fn answer(records: Vec<Record>) -> Message {
    let mut message = response(ResponseCode::NoError);
    message.insert_answers(records);
    message
}

/// Referral for `zone` naming each `(nameserver, glue)` pair; `None` glue
/// leaves the nameserver without an address.
pub fn referral(zone: &str, nameservers: &[(&str, Option<[u8; 4]>)]) -> Message {
    let mut message = response(ResponseCode::NoError);
    for (target, glue) in nameservers {
        message.add_name_server(ns_record(zone, target));
        if let Some(octets) = glue {
            message.add_additional(a_record(target, *octets));
        }
    }
    message
}

pub fn truncated() -> Message {
    let mut message = response(ResponseCode::NoError);
    message.set_truncated(true);
    message
}

/// Config rooted at `roots`, with the scripted glue resolver address.
pub fn test_config(roots: &[[u8; 4]]) -> ResolverConfig {
    ResolverConfig {
        root_hints: roots.iter().copied().map(ip).collect(),
        glue_resolver: SocketAddr::new(ip(GLUE_RESOLVER), 53),
        ..ResolverConfig::default()
    }
}

/// Resolver over a scripted exchange with deterministic server order.
pub fn scripted_resolver(
    config: ResolverConfig,
    exchange: Arc<dyn DnsExchange>,
) -> RecursiveResolver {
    ResolverBuilder::new(config)
        .with_exchange(exchange)
        .with_selector(Arc::new(OrderedSelector))
        .build()
}
