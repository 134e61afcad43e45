pub mod exchange;
pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use rootwalk_domain::DomainError;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

pub use exchange::{DnsExchange, NetworkExchange};

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,

    pub protocol_used: Protocol,
}

/// Wire transport an exchange runs over. UDP is the default; TCP is the
/// reliable fallback for truncated replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Udp,
    Tcp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "UDP",
            Self::Tcp => "TCP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;

    fn protocol(&self) -> Protocol;
}

pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
}

impl Transport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Udp(_) => Protocol::Udp,
            Self::Tcp(_) => Protocol::Tcp,
        }
    }
}

pub fn create_transport(protocol: Protocol, server: SocketAddr) -> Transport {
    match protocol {
        Protocol::Udp => Transport::Udp(udp::UdpTransport::new(server)),
        Protocol::Tcp => Transport::Tcp(tcp::TcpTransport::new(server)),
    }
}

pub(crate) fn timeout_error(server: SocketAddr) -> DomainError {
    DomainError::TransportTimeout {
        server: server.to_string(),
    }
}

pub(crate) fn io_error(server: SocketAddr, context: &str, error: io::Error) -> DomainError {
    match error.kind() {
        io::ErrorKind::ConnectionRefused => DomainError::TransportConnectionRefused {
            server: server.to_string(),
        },
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
            DomainError::TransportConnectionReset {
                server: server.to_string(),
            }
        }
        io::ErrorKind::TimedOut => timeout_error(server),
        _ => DomainError::IoError(format!("{} {}: {}", context, server, error)),
    }
}
