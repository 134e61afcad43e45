use super::{create_transport, Protocol};
use crate::dns::query_builder::QueryBuilder;
use async_trait::async_trait;
use hickory_proto::op::Message;
use rootwalk_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

/// One request/response exchange with a single server.
#[async_trait]
pub trait DnsExchange: Send + Sync {
    async fn exchange(
        &self,
        request: &Message,
        server: SocketAddr,
        protocol: Protocol,
    ) -> Result<Message, DomainError>;
}

/// Exchange over the real network using the UDP and TCP transports.
pub struct NetworkExchange {
    timeout: Duration,
}

impl NetworkExchange {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl DnsExchange for NetworkExchange {
    async fn exchange(
        &self,
        request: &Message,
        server: SocketAddr,
        protocol: Protocol,
    ) -> Result<Message, DomainError> {
        let bytes = QueryBuilder::serialize(request)?;
        let transport = create_transport(protocol, server);
        let response = transport.send(&bytes, self.timeout).await?;

        let message = Message::from_vec(&response.bytes).map_err(|e| {
            DomainError::InvalidDnsResponse(format!(
                "Failed to parse DNS response from {}: {}",
                server, e
            ))
        })?;

        if message.id() != request.id() {
            return Err(DomainError::InvalidDnsResponse(format!(
                "Response ID mismatch from {}: expected {}, got {}",
                server,
                request.id(),
                message.id()
            )));
        }

        debug!(
            server = %server,
            protocol = %response.protocol_used,
            rcode = ?message.response_code(),
            truncated = message.truncated(),
            answers = message.answers().len(),
            "Exchange complete"
        );

        Ok(message)
    }
}
