//! Infrastructure adapters behind the ports.

pub mod http;
pub mod memory;
pub mod stripe;
