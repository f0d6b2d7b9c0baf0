//! Network address parsing and private-range classification.
//!
//! Target descriptors arrive as `host`, `host:port`, `[v6]:port` or a bare
//! IPv6 literal. The port is accepted so descriptors parse, but nothing in the
//! locate decision ever looks at it.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing an address descriptor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty address")]
    Empty,

    #[error("invalid port in address {0:?}")]
    InvalidPort(String),

    #[error("{0:?} is not an IP address")]
    NotAnAddress(String),
}

/// A parsed IP address with an optional, semantically unused port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkAddress {
    ip: IpAddr,
    port: Option<u16>,
}

/// A descriptor split into its host part, before any name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Addr(NetworkAddress),
    Name { host: &'a str, port: Option<u16> },
}

impl NetworkAddress {
    pub fn new(ip: IpAddr, port: Option<u16>) -> Self {
        Self { ip, port }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Whether the address lies in a reserved, non-globally-routable range.
    pub fn is_private(&self) -> bool {
        is_private_ip(self.ip)
    }
}

impl From<SocketAddr> for NetworkAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), Some(addr.port()))
    }
}

impl From<IpAddr> for NetworkAddress {
    fn from(ip: IpAddr) -> Self {
        Self::new(ip, None)
    }
}

impl FromStr for NetworkAddress {
    type Err = AddressError;

    /// Parse an IP literal with an optional port. Host names are rejected;
    /// use [`parse_endpoint`] when a name may need resolving.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_endpoint(s)? {
            Endpoint::Addr(addr) => Ok(addr),
            Endpoint::Name { host, .. } => Err(AddressError::NotAnAddress(host.to_string())),
        }
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ip, self.port) {
            (IpAddr::V6(ip), Some(port)) => write!(f, "[{ip}]:{port}"),
            (ip, Some(port)) => write!(f, "{ip}:{port}"),
            (ip, None) => write!(f, "{ip}"),
        }
    }
}

/// Split a descriptor into host and optional port and classify the host.
///
/// Anything that is neither an IP literal nor a syntactically plausible host
/// name (error text from a finder, for instance) is rejected.
pub fn parse_endpoint(s: &str) -> Result<Endpoint<'_>, AddressError> {
    let (host, port) = split_host_port(s)?;
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(Endpoint::Addr(NetworkAddress::new(ip, port)));
    }
    if is_host_name(host) {
        return Ok(Endpoint::Name { host, port });
    }
    Err(AddressError::NotAnAddress(host.to_string()))
}

fn split_host_port(s: &str) -> Result<(&str, Option<u16>), AddressError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AddressError::Empty);
    }

    if let Some(rest) = s.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| AddressError::NotAnAddress(s.to_string()))?;
        let port = match tail {
            "" => None,
            _ => Some(parse_port(s, tail.strip_prefix(':'))?),
        };
        return Ok((host, port));
    }

    // Bare IPv6 literals contain colons of their own.
    if s.parse::<Ipv6Addr>().is_ok() {
        return Ok((s, None));
    }

    match s.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => Ok((host, Some(parse_port(s, Some(port))?))),
        Some(_) => Err(AddressError::NotAnAddress(s.to_string())),
        None => Ok((s, None)),
    }
}

fn parse_port(whole: &str, port: Option<&str>) -> Result<u16, AddressError> {
    port.and_then(|p| p.parse::<u16>().ok())
        .ok_or_else(|| AddressError::InvalidPort(whole.to_string()))
}

fn is_host_name(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && host
            .split('.')
            .all(|label| !label.is_empty() && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-'))
}

/// Private-range test used for both targets and clients.
///
/// IPv4: 10/8, 172.16/12, 192.168/16 and loopback. IPv6: loopback,
/// link-local, site-local and unique-local; v4-mapped addresses follow the
/// IPv4 rules.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_v4(v4),
            None => is_private_v6(v6),
        },
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_private() || ip.is_loopback()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    let head = ip.segments()[0];
    ip.is_loopback()
        || head & 0xffc0 == 0xfe80 // link-local
        || head & 0xffc0 == 0xfec0 // site-local
        || head & 0xfe00 == 0xfc00 // unique-local
}

#[cfg(test)]
mod tests {
    use super::*;

    fn private(s: &str) -> bool {
        s.parse::<NetworkAddress>().unwrap().is_private()
    }

    #[test]
    fn test_rfc1918_ranges_are_private() {
        assert!(private("10.0.0.5"));
        assert!(private("172.16.0.1"));
        assert!(private("172.31.255.254"));
        assert!(private("192.168.1.10"));
        assert!(private("127.0.0.1"));
    }

    #[test]
    fn test_public_v4_is_not_private() {
        assert!(!private("203.0.113.4"));
        assert!(!private("8.8.8.8"));
        assert!(!private("172.32.0.1"));
        assert!(!private("172.15.255.255"));
        assert!(!private("192.169.0.1"));
    }

    #[test]
    fn test_v6_classification() {
        assert!(private("::1"));
        assert!(private("fe80::1"));
        assert!(private("fd12:3456::1"));
        assert!(private("fec0::1"));
        assert!(private("::ffff:192.168.0.7"));
        assert!(!private("2001:db8::1"));
        assert!(!private("::ffff:203.0.113.4"));
    }

    #[test]
    fn test_port_is_optional_and_ignored_for_classification() {
        let with_port: NetworkAddress = "10.0.0.5:1094".parse().unwrap();
        let without: NetworkAddress = "10.0.0.5".parse().unwrap();
        assert_eq!(with_port.ip(), without.ip());
        assert_eq!(with_port.port(), Some(1094));
        assert_eq!(without.port(), None);
        assert_eq!(with_port.is_private(), without.is_private());
    }

    #[test]
    fn test_bracketed_v6_with_port() {
        let addr: NetworkAddress = "[fd00::5]:1094".parse().unwrap();
        assert_eq!(addr.port(), Some(1094));
        assert!(addr.is_private());
        assert_eq!(addr.to_string(), "[fd00::5]:1094");
    }

    #[test]
    fn test_malformed_descriptors_are_rejected() {
        assert_eq!("".parse::<NetworkAddress>(), Err(AddressError::Empty));
        assert_eq!(
            "10.0.0.5:http".parse::<NetworkAddress>(),
            Err(AddressError::InvalidPort("10.0.0.5:http".to_string()))
        );
        assert!(matches!(
            "no servers available".parse::<NetworkAddress>(),
            Err(AddressError::NotAnAddress(_))
        ));
        assert!(matches!(
            "[fd00::5".parse::<NetworkAddress>(),
            Err(AddressError::NotAnAddress(_))
        ));
    }

    #[test]
    fn test_host_names_split_without_resolving() {
        assert_eq!(
            parse_endpoint("data01.cluster.local:1094").unwrap(),
            Endpoint::Name {
                host: "data01.cluster.local",
                port: Some(1094)
            }
        );
        assert!(matches!(
            "data01.cluster.local".parse::<NetworkAddress>(),
            Err(AddressError::NotAnAddress(_))
        ));
    }

    #[test]
    fn test_socket_addr_conversion_keeps_port() {
        let sock: SocketAddr = "192.168.1.10:53211".parse().unwrap();
        let addr = NetworkAddress::from(sock);
        assert_eq!(addr.port(), Some(53211));
        assert!(addr.is_private());
    }
}
