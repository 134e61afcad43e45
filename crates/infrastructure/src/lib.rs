//! rootwalk infrastructure: the iterative resolution engine, its response
//! cache and the UDP/TCP exchange it runs on.
pub mod dns;
