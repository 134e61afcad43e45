//! DNS Query Builder
//!
//! Constructs single-question query messages using `hickory-proto`. The
//! iterative walk sends them with RD unset; glue bootstrap sets it.

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use rootwalk_domain::DomainError;
use std::str::FromStr;

/// Builds DNS query messages
pub struct QueryBuilder;

impl QueryBuilder {
    /// Parse a domain into a fully qualified question of class IN.
    pub fn question(domain: &str, record_type: RecordType) -> Result<Query, DomainError> {
        let fqdn = if domain.ends_with('.') {
            domain.to_string()
        } else {
            format!("{}.", domain)
        };

        let name = Name::from_str(&fqdn).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", domain, e))
        })?;

        Ok(Query::query(name, record_type))
    }

    /// Build a query message carrying exactly `query`, with a random ID.
    pub fn build(query: &Query, recursion_desired: bool) -> Message {
        let mut message = Message::new();
        message
            .set_id(fastrand::u16(..))
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(recursion_desired)
            .add_query(query.clone());
        message
    }

    /// Serialize a Message to wire format bytes
    pub fn serialize(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            DomainError::EncodeError(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}
