//! Shared utilities for dpservice.

pub mod addr;

pub use addr::{ip_from_octets, ip_octets, parse_prefix};
