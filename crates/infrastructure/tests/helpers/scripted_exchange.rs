#![allow(dead_code)]
use async_trait::async_trait;
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;
use rootwalk_domain::DomainError;
use rootwalk_infrastructure::dns::{DnsExchange, Protocol};
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::Duration;

type ScriptKey = (IpAddr, String, RecordType, Protocol);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCall {
    pub server: SocketAddr,
    pub name: String,
    pub record_type: RecordType,
    pub protocol: Protocol,
    pub recursion_desired: bool,
}

/// In-memory `DnsExchange` answering from a table keyed by
/// (server, qname, qtype, protocol). Unscripted questions are refused at the
/// transport level, like a server that is not listening.
#[derive(Default)]
pub struct ScriptedExchange {
    script: Mutex<HashMap<ScriptKey, Message>>,
    unreachable: Mutex<HashSet<IpAddr>>,
    calls: Mutex<Vec<ScriptedCall>>,
    delay: Option<Duration>,
}

impl ScriptedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Script the UDP reply; TCP falls back to it unless scripted separately.
    pub fn respond(&self, server: IpAddr, qname: &str, record_type: RecordType, reply: Message) {
        self.insert(server, qname, record_type, Protocol::Udp, reply);
    }

    pub fn respond_tcp(
        &self,
        server: IpAddr,
        qname: &str,
        record_type: RecordType,
        reply: Message,
    ) {
        self.insert(server, qname, record_type, Protocol::Tcp, reply);
    }

    /// Every exchange with `server` times out.
    pub fn unreachable(&self, server: IpAddr) {
        self.unreachable.lock().unwrap().insert(server);
    }

    pub fn calls(&self) -> Vec<ScriptedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, server: IpAddr) -> Vec<ScriptedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.server.ip() == server)
            .collect()
    }

    pub fn calls_for(&self, qname: &str) -> Vec<ScriptedCall> {
        let qname = normalize(qname);
        self.calls()
            .into_iter()
            .filter(|call| call.name == qname)
            .collect()
    }

    fn insert(
        &self,
        server: IpAddr,
        qname: &str,
        record_type: RecordType,
        protocol: Protocol,
        reply: Message,
    ) {
        self.script
            .lock()
            .unwrap()
            .insert((server, normalize(qname), record_type, protocol), reply);
    }

    fn lookup(&self, key: &ScriptKey) -> Option<Message> {
        let script = self.script.lock().unwrap();
        if let Some(reply) = script.get(key) {
            return Some(reply.clone());
        }
        if key.3 == Protocol::Tcp {
            let udp_key = (key.0, key.1.clone(), key.2, Protocol::Udp);
            return script.get(&udp_key).cloned();
        }
        None
    }
}

fn normalize(qname: &str) -> String {
    let lower = qname.to_ascii_lowercase();
    if lower.ends_with('.') {
        lower
    } else {
        format!("{}.", lower)
    }
}

#[async_trait]
impl DnsExchange for ScriptedExchange {
    async fn exchange(
        &self,
        request: &Message,
        server: SocketAddr,
        protocol: Protocol,
    ) -> Result<Message, DomainError> {
        let query = request
            .queries()
            .first()
            .cloned()
            .ok_or_else(|| DomainError::InvalidDnsResponse("no question".to_string()))?;
        let qname = normalize(&query.name().to_ascii());

        self.calls.lock().unwrap().push(ScriptedCall {
            server,
            name: qname.clone(),
            record_type: query.query_type(),
            protocol,
            recursion_desired: request.recursion_desired(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.unreachable.lock().unwrap().contains(&server.ip()) {
            return Err(DomainError::TransportTimeout {
                server: server.to_string(),
            });
        }

        let key = (server.ip(), qname, query.query_type(), protocol);
        let mut reply = self
            .lookup(&key)
            .ok_or_else(|| DomainError::TransportConnectionRefused {
                server: server.to_string(),
            })?;

        reply.set_id(request.id());
        if reply.queries().is_empty() {
            reply.add_query(query);
        }
        Ok(reply)
    }
}
