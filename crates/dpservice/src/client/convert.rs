//! Conversions between records and generated protobuf messages.

use std::net::IpAddr;

use ipnet::{IpNet, Ipv6Net};

use crate::api::{
    FirewallAction, FirewallRule, FirewallRuleMeta, FirewallRuleSpec, IcmpFilter, Interface,
    InterfaceMeta, InterfaceSpec, LbPort, NeighborNat, NeighborNatMeta, NeighborNatSpec, NextHop,
    PortFilter, Protocol, ProtocolFilter, Pxe, Route, RouteMeta, RouteSpec, TrafficDirection,
    VirtualFunction,
};
use crate::proto;
use crate::util::addr::{ip_from_octets, ip_octets};
use crate::{Error, Result};

/// Weight given to routes created from this client.
pub(crate) const ROUTE_WEIGHT: u32 = 100;

/// Port or ICMP filter value meaning "any".
const ANY: i32 = -1;

// ============================================================================
// Addresses and identifiers
// ============================================================================

pub(crate) fn ip_to_proto(addr: IpAddr) -> proto::IpAddress {
    let ipver = match addr {
        IpAddr::V4(_) => proto::IpVersion::Ipv4,
        IpAddr::V6(_) => proto::IpVersion::Ipv6,
    };
    proto::IpAddress {
        ipver: ipver as i32,
        address: ip_octets(Some(addr)),
    }
}

pub(crate) fn opt_ip_from_proto(addr: Option<&proto::IpAddress>) -> Result<Option<IpAddr>> {
    match addr {
        Some(addr) => Ok(ip_from_octets(&addr.address)?),
        None => Ok(None),
    }
}

pub(crate) fn ip_from_proto(addr: Option<&proto::IpAddress>, field: &str) -> Result<IpAddr> {
    opt_ip_from_proto(addr)?.ok_or_else(|| Error::InvalidMessage(format!("missing {field}")))
}

pub(crate) fn prefix_to_proto(net: &IpNet) -> proto::Prefix {
    proto::Prefix {
        ip: Some(ip_to_proto(net.addr())),
        length: u32::from(net.prefix_len()),
        underlay_route: Vec::new(),
    }
}

pub(crate) fn prefix_from_proto(prefix: &proto::Prefix) -> Result<IpNet> {
    let addr = ip_from_proto(prefix.ip.as_ref(), "prefix address")?;
    u8::try_from(prefix.length)
        .ok()
        .and_then(|len| IpNet::new(addr, len).ok())
        .ok_or_else(|| Error::InvalidMessage(format!("invalid prefix length {}", prefix.length)))
}

pub(crate) fn id_from_bytes(id: Vec<u8>) -> Result<String> {
    String::from_utf8(id).map_err(|e| Error::InvalidMessage(format!("identifier is not UTF-8: {e}")))
}

/// `net`, or the zero-length prefix of the same family as `other`.
fn any_prefix(net: Option<&IpNet>, other: Option<&IpNet>) -> proto::Prefix {
    match (net, other) {
        (Some(net), _) => prefix_to_proto(net),
        (None, Some(IpNet::V6(_))) => prefix_to_proto(&IpNet::V6(Ipv6Net::default())),
        (None, _) => prefix_to_proto(&IpNet::default()),
    }
}

/// A zero-length prefix matches everything and reads back as no prefix.
fn match_prefix_from_proto(prefix: Option<&proto::Prefix>) -> Result<Option<IpNet>> {
    let Some(prefix) = prefix else {
        return Ok(None);
    };
    let net = prefix_from_proto(prefix)?;
    Ok((net.prefix_len() != 0).then_some(net))
}

// ============================================================================
// Interfaces
// ============================================================================

impl From<proto::VirtualFunction> for VirtualFunction {
    fn from(vf: proto::VirtualFunction) -> Self {
        Self {
            name: vf.name,
            domain: vf.domain,
            bus: vf.bus,
            slot: vf.slot,
            function: vf.function,
        }
    }
}

impl TryFrom<proto::PxeConfig> for Pxe {
    type Error = Error;

    fn try_from(pxe: proto::PxeConfig) -> Result<Self> {
        Ok(Self {
            server: opt_ip_from_proto(pxe.next_server.as_ref())?,
            boot_file: pxe.boot_filename,
        })
    }
}

impl From<&Pxe> for proto::PxeConfig {
    fn from(pxe: &Pxe) -> Self {
        Self {
            next_server: pxe.server.map(ip_to_proto),
            boot_filename: pxe.boot_file.clone(),
        }
    }
}

impl TryFrom<proto::Interface> for Interface {
    type Error = Error;

    fn try_from(iface: proto::Interface) -> Result<Self> {
        let primary_ipv4 = match opt_ip_from_proto(iface.primary_ipv4.as_ref())? {
            Some(IpAddr::V4(v4)) => Some(v4),
            Some(IpAddr::V6(v6)) => {
                return Err(Error::InvalidMessage(format!(
                    "primary IPv4 address is {v6}"
                )));
            }
            None => None,
        };
        let primary_ipv6 = match opt_ip_from_proto(iface.primary_ipv6.as_ref())? {
            Some(IpAddr::V6(v6)) => Some(v6),
            Some(IpAddr::V4(v4)) => {
                return Err(Error::InvalidMessage(format!(
                    "primary IPv6 address is {v4}"
                )));
            }
            None => None,
        };

        Ok(Interface::new(
            InterfaceMeta {
                id: id_from_bytes(iface.id)?,
            },
            InterfaceSpec {
                vni: iface.vni,
                device: iface.pci_name,
                primary_ipv4,
                primary_ipv6,
                underlay_route: ip_from_octets(&iface.underlay_route)?,
                virtual_function: iface.vf.map(Into::into),
                pxe: iface.pxe.map(Pxe::try_from).transpose()?,
            },
        ))
    }
}

impl From<&Interface> for proto::CreateInterfaceRequest {
    fn from(iface: &Interface) -> Self {
        Self {
            interface_id: iface.metadata.id.clone().into_bytes(),
            vni: iface.spec.vni,
            ipv4_config: iface.spec.primary_ipv4.map(|v4| ip_to_proto(v4.into())),
            ipv6_config: iface.spec.primary_ipv6.map(|v6| ip_to_proto(v6.into())),
            device_name: iface.spec.device.clone(),
            pxe_config: iface.spec.pxe.as_ref().map(Into::into),
        }
    }
}

// ============================================================================
// Load balancer ports
// ============================================================================

impl From<Protocol> for proto::Protocol {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Tcp => proto::Protocol::Tcp,
            Protocol::Udp => proto::Protocol::Udp,
            Protocol::Icmp => proto::Protocol::Icmp,
            Protocol::Icmpv6 => proto::Protocol::Icmpv6,
            Protocol::Sctp => proto::Protocol::Sctp,
        }
    }
}

impl TryFrom<proto::Protocol> for Protocol {
    type Error = Error;

    fn try_from(protocol: proto::Protocol) -> Result<Self> {
        match protocol {
            proto::Protocol::Tcp => Ok(Protocol::Tcp),
            proto::Protocol::Udp => Ok(Protocol::Udp),
            proto::Protocol::Icmp => Ok(Protocol::Icmp),
            proto::Protocol::Icmpv6 => Ok(Protocol::Icmpv6),
            proto::Protocol::Sctp => Ok(Protocol::Sctp),
            proto::Protocol::Undefined => {
                Err(Error::InvalidMessage("undefined port protocol".into()))
            }
        }
    }
}

impl From<&LbPort> for proto::LbPort {
    fn from(port: &LbPort) -> Self {
        Self {
            protocol: proto::Protocol::from(port.protocol) as i32,
            port: u32::from(port.port),
        }
    }
}

impl TryFrom<&proto::LbPort> for LbPort {
    type Error = Error;

    fn try_from(port: &proto::LbPort) -> Result<Self> {
        let protocol = proto::Protocol::try_from(port.protocol)
            .map_err(|_| Error::InvalidMessage(format!("unknown protocol {}", port.protocol)))?;
        Ok(Self {
            protocol: protocol.try_into()?,
            port: u16::try_from(port.port)
                .map_err(|_| Error::InvalidMessage(format!("port {} out of range", port.port)))?,
        })
    }
}

// ============================================================================
// Firewall rules
// ============================================================================

fn port_to_proto(port: Option<u16>) -> i32 {
    port.map_or(ANY, i32::from)
}

fn port_from_proto(port: i32) -> Option<u16> {
    u16::try_from(port).ok()
}

fn icmp_to_proto(value: Option<u8>) -> i32 {
    value.map_or(ANY, i32::from)
}

fn icmp_from_proto(value: i32) -> Option<u8> {
    u8::try_from(value).ok()
}

impl From<&ProtocolFilter> for proto::ProtocolFilter {
    fn from(filter: &ProtocolFilter) -> Self {
        use proto::protocol_filter::Filter;

        let filter = match filter {
            ProtocolFilter::Tcp(ports) => Filter::Tcp(proto::TcpFilter {
                src_port_lower: port_to_proto(ports.src_port_lower),
                src_port_upper: port_to_proto(ports.src_port_upper),
                dst_port_lower: port_to_proto(ports.dst_port_lower),
                dst_port_upper: port_to_proto(ports.dst_port_upper),
            }),
            ProtocolFilter::Udp(ports) => Filter::Udp(proto::UdpFilter {
                src_port_lower: port_to_proto(ports.src_port_lower),
                src_port_upper: port_to_proto(ports.src_port_upper),
                dst_port_lower: port_to_proto(ports.dst_port_lower),
                dst_port_upper: port_to_proto(ports.dst_port_upper),
            }),
            ProtocolFilter::Icmp(icmp) => Filter::Icmp(proto::IcmpFilter {
                icmp_type: icmp_to_proto(icmp.icmp_type),
                icmp_code: icmp_to_proto(icmp.icmp_code),
            }),
        };
        Self {
            filter: Some(filter),
        }
    }
}

fn protocol_filter_from_proto(filter: proto::ProtocolFilter) -> Option<ProtocolFilter> {
    use proto::protocol_filter::Filter;

    Some(match filter.filter? {
        Filter::Tcp(tcp) => ProtocolFilter::Tcp(PortFilter {
            src_port_lower: port_from_proto(tcp.src_port_lower),
            src_port_upper: port_from_proto(tcp.src_port_upper),
            dst_port_lower: port_from_proto(tcp.dst_port_lower),
            dst_port_upper: port_from_proto(tcp.dst_port_upper),
        }),
        Filter::Udp(udp) => ProtocolFilter::Udp(PortFilter {
            src_port_lower: port_from_proto(udp.src_port_lower),
            src_port_upper: port_from_proto(udp.src_port_upper),
            dst_port_lower: port_from_proto(udp.dst_port_lower),
            dst_port_upper: port_from_proto(udp.dst_port_upper),
        }),
        Filter::Icmp(icmp) => ProtocolFilter::Icmp(IcmpFilter {
            icmp_type: icmp_from_proto(icmp.icmp_type),
            icmp_code: icmp_from_proto(icmp.icmp_code),
        }),
    })
}

impl From<&FirewallRule> for proto::FirewallRule {
    fn from(rule: &FirewallRule) -> Self {
        let direction = match rule.spec.traffic_direction {
            TrafficDirection::Ingress => proto::TrafficDirection::Ingress,
            TrafficDirection::Egress => proto::TrafficDirection::Egress,
        };
        let action = match rule.spec.action {
            FirewallAction::Accept => proto::FirewallAction::Accept,
            FirewallAction::Drop => proto::FirewallAction::Drop,
        };
        let source = rule.spec.source_prefix.as_ref();
        let destination = rule.spec.destination_prefix.as_ref();
        Self {
            id: rule.metadata.rule_id.clone().into_bytes(),
            direction: direction as i32,
            action: action as i32,
            priority: rule.spec.priority,
            source_prefix: Some(any_prefix(source, destination)),
            destination_prefix: Some(any_prefix(destination, source)),
            protocol_filter: rule.spec.protocol_filter.as_ref().map(Into::into),
        }
    }
}

/// Build a firewall rule record from a rule attached to `interface_id`.
pub(crate) fn firewall_rule_from_proto(
    interface_id: &str,
    rule: proto::FirewallRule,
) -> Result<FirewallRule> {
    let traffic_direction = match rule.direction() {
        proto::TrafficDirection::Ingress => TrafficDirection::Ingress,
        proto::TrafficDirection::Egress => TrafficDirection::Egress,
    };
    let action = match rule.action() {
        proto::FirewallAction::Accept => FirewallAction::Accept,
        proto::FirewallAction::Drop => FirewallAction::Drop,
    };

    Ok(FirewallRule::new(
        FirewallRuleMeta {
            interface_id: interface_id.to_string(),
            rule_id: id_from_bytes(rule.id)?,
        },
        FirewallRuleSpec {
            traffic_direction,
            action,
            priority: rule.priority,
            source_prefix: match_prefix_from_proto(rule.source_prefix.as_ref())?,
            destination_prefix: match_prefix_from_proto(rule.destination_prefix.as_ref())?,
            protocol_filter: rule.protocol_filter.and_then(protocol_filter_from_proto),
        },
    ))
}

// ============================================================================
// Routes
// ============================================================================

impl From<&Route> for proto::Route {
    fn from(route: &Route) -> Self {
        Self {
            prefix: Some(prefix_to_proto(&route.spec.prefix)),
            nexthop_vni: route.spec.next_hop.vni,
            nexthop_address: Some(ip_to_proto(route.spec.next_hop.ip)),
            weight: ROUTE_WEIGHT,
        }
    }
}

/// Build a route record from a route installed in `vni`.
pub(crate) fn route_from_proto(vni: u32, route: &proto::Route) -> Result<Route> {
    let prefix = route
        .prefix
        .as_ref()
        .ok_or_else(|| Error::InvalidMessage("route without prefix".into()))?;
    Ok(Route::new(
        RouteMeta { vni },
        RouteSpec {
            prefix: prefix_from_proto(prefix)?,
            next_hop: NextHop {
                vni: route.nexthop_vni,
                ip: ip_from_proto(route.nexthop_address.as_ref(), "next hop address")?,
            },
        },
    ))
}

// ============================================================================
// NAT
// ============================================================================

/// Build a neighbor NAT record from an entry listed for `nat_ip`.
pub(crate) fn neighbor_nat_from_proto(nat_ip: IpAddr, nat: &proto::Nat) -> Result<NeighborNat> {
    Ok(NeighborNat::new(
        NeighborNatMeta {
            nat_ip: opt_ip_from_proto(nat.nat_ip.as_ref())?.unwrap_or(nat_ip),
        },
        NeighborNatSpec {
            vni: nat.vni,
            min_port: nat.min_port,
            max_port: nat.max_port,
            underlay_route: ip_from_octets(&nat.underlay_route)?,
        },
    ))
}
