#![allow(dead_code)]

pub mod builders;
pub mod dns_server_mock;
pub mod scripted_exchange;

pub use builders::*;
pub use dns_server_mock::MockDnsServer;
pub use scripted_exchange::{ScriptedExchange, ScriptedCall};
