//! Address parsing and raw octet conversion.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::IpNet;

/// Error type for address parsing.
#[derive(Debug, thiserror::Error)]
pub enum AddrError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid prefix length: {0}")]
    InvalidPrefix(String),

    #[error("invalid address length: {0} bytes")]
    InvalidLength(usize),
}

pub type Result<T> = std::result::Result<T, AddrError>;

/// Parse an IP prefix in CIDR notation.
///
/// A bare address becomes a host prefix (`/32` or `/128`).
pub fn parse_prefix(s: &str) -> Result<IpNet> {
    if let Some((addr_str, len_str)) = s.split_once('/') {
        let addr: IpAddr = addr_str
            .parse()
            .map_err(|_| AddrError::InvalidAddress(addr_str.to_string()))?;
        let len: u8 = len_str
            .parse()
            .map_err(|_| AddrError::InvalidPrefix(len_str.to_string()))?;
        IpNet::new(addr, len).map_err(|_| {
            AddrError::InvalidPrefix(format!(
                "{} exceeds maximum {} for address family",
                len,
                max_prefix_len(&addr)
            ))
        })
    } else {
        let addr: IpAddr = s
            .parse()
            .map_err(|_| AddrError::InvalidAddress(s.to_string()))?;
        Ok(IpNet::from(addr))
    }
}

fn max_prefix_len(addr: &IpAddr) -> u8 {
    if addr.is_ipv4() { 32 } else { 128 }
}

/// Build an address from raw network-order octets.
///
/// Empty input means "not set". Anything other than 4 or 16 bytes is an error.
pub fn ip_from_octets(bytes: &[u8]) -> Result<Option<IpAddr>> {
    match bytes.len() {
        0 => Ok(None),
        4 => {
            let octets: [u8; 4] = bytes
                .try_into()
                .map_err(|_| AddrError::InvalidLength(bytes.len()))?;
            Ok(Some(IpAddr::V4(Ipv4Addr::from(octets))))
        }
        16 => {
            let octets: [u8; 16] = bytes
                .try_into()
                .map_err(|_| AddrError::InvalidLength(bytes.len()))?;
            Ok(Some(IpAddr::V6(Ipv6Addr::from(octets))))
        }
        n => Err(AddrError::InvalidLength(n)),
    }
}

/// Raw network-order octets of an address, empty when unset.
pub fn ip_octets(addr: Option<IpAddr>) -> Vec<u8> {
    match addr {
        Some(IpAddr::V4(v4)) => v4.octets().to_vec(),
        Some(IpAddr::V6(v6)) => v6.octets().to_vec(),
        None => Vec::new(),
    }
}
