//! Concrete record types.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use super::{Record, Status, record};

fn unspecified() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

// ============================================================================
// Interface
// ============================================================================

record! {
    /// A virtual machine interface attached to the dataplane.
    Interface { metadata: InterfaceMeta, spec: InterfaceSpec }
}

/// Interface identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterfaceMeta {
    /// Interface ID, unique within the dataplane.
    pub id: String,
}

/// Interface configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterfaceSpec {
    /// Virtual network the interface belongs to.
    pub vni: u32,
    /// PCI device name of the backing virtual function.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_ipv4: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_ipv6: Option<Ipv6Addr>,
    /// Assigned by the service on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlay_route: Option<IpAddr>,
    /// Assigned by the service on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_function: Option<VirtualFunction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pxe: Option<Pxe>,
}

/// PCI virtual function backing an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualFunction {
    pub name: String,
    pub domain: u32,
    pub bus: u32,
    pub slot: u32,
    pub function: u32,
}

/// Network boot settings of an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pxe {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<IpAddr>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub boot_file: String,
}

impl Record for Interface {
    const KIND: &'static str = "Interface";

    fn key(&self) -> String {
        self.metadata.id.clone()
    }
}

// ============================================================================
// Prefix
// ============================================================================

record! {
    /// An alias prefix routed to an interface.
    Prefix { metadata: PrefixMeta, spec: PrefixSpec }
}

/// Identity shared by prefixes and load balancer prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrefixMeta {
    pub interface_id: String,
}

/// Configuration shared by prefixes and load balancer prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrefixSpec {
    pub prefix: IpNet,
    /// Assigned by the service on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlay_route: Option<IpAddr>,
}

impl Record for Prefix {
    const KIND: &'static str = "Prefix";

    fn key(&self) -> String {
        format!("{}/{}", self.metadata.interface_id, self.spec.prefix)
    }
}

// ============================================================================
// Route
// ============================================================================

record! {
    /// A route inside a virtual network.
    Route { metadata: RouteMeta, spec: RouteSpec }
}

/// Route identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteMeta {
    /// Virtual network the route is installed in.
    pub vni: u32,
}

/// Route destination and next hop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteSpec {
    pub prefix: IpNet,
    pub next_hop: NextHop,
}

/// Next hop of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NextHop {
    pub vni: u32,
    pub ip: IpAddr,
}

impl Default for NextHop {
    fn default() -> Self {
        Self {
            vni: 0,
            ip: unspecified(),
        }
    }
}

impl Record for Route {
    const KIND: &'static str = "Route";

    fn key(&self) -> String {
        format!(
            "{}-{}:{}-{}",
            self.metadata.vni, self.spec.prefix, self.spec.next_hop.vni, self.spec.next_hop.ip
        )
    }
}

// ============================================================================
// Virtual IP
// ============================================================================

record! {
    /// A public address mapped onto an interface.
    VirtualIp { metadata: VirtualIpMeta, spec: VirtualIpSpec }
}

/// Virtual IP identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualIpMeta {
    pub interface_id: String,
}

/// Virtual IP address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualIpSpec {
    pub ip: IpAddr,
    /// Assigned by the service on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlay_route: Option<IpAddr>,
}

impl Default for VirtualIpSpec {
    fn default() -> Self {
        Self {
            ip: unspecified(),
            underlay_route: None,
        }
    }
}

impl Record for VirtualIp {
    const KIND: &'static str = "VirtualIP";

    fn key(&self) -> String {
        self.metadata.interface_id.clone()
    }
}

// ============================================================================
// NAT
// ============================================================================

record! {
    /// Source NAT of an interface to a shared address and port range.
    Nat { metadata: NatMeta, spec: NatSpec }
}

/// NAT identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NatMeta {
    pub interface_id: String,
}

/// NAT address and port range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NatSpec {
    pub nat_ip: IpAddr,
    pub min_port: u32,
    pub max_port: u32,
    /// Assigned by the service on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlay_route: Option<IpAddr>,
}

impl Default for NatSpec {
    fn default() -> Self {
        Self {
            nat_ip: unspecified(),
            min_port: 0,
            max_port: 0,
            underlay_route: None,
        }
    }
}

impl Record for Nat {
    const KIND: &'static str = "Nat";

    fn key(&self) -> String {
        self.metadata.interface_id.clone()
    }
}

// ============================================================================
// Neighbor NAT
// ============================================================================

record! {
    /// A port range of a NAT address owned by another dataplane.
    NeighborNat { metadata: NeighborNatMeta, spec: NeighborNatSpec }
}

/// Neighbor NAT identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NeighborNatMeta {
    pub nat_ip: IpAddr,
}

impl Default for NeighborNatMeta {
    fn default() -> Self {
        Self {
            nat_ip: unspecified(),
        }
    }
}

/// Neighbor NAT port range and location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NeighborNatSpec {
    pub vni: u32,
    pub min_port: u32,
    pub max_port: u32,
    /// Underlay address of the dataplane owning the range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlay_route: Option<IpAddr>,
}

impl Record for NeighborNat {
    const KIND: &'static str = "NeighborNat";

    fn key(&self) -> String {
        format!(
            "{}/{}/{}-{}",
            self.metadata.nat_ip, self.spec.vni, self.spec.min_port, self.spec.max_port
        )
    }
}

// ============================================================================
// Load balancer
// ============================================================================

record! {
    /// A load balancer exposing a virtual IP on a set of ports.
    LoadBalancer { metadata: LoadBalancerMeta, spec: LoadBalancerSpec }
}

/// Load balancer identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancerMeta {
    pub id: String,
}

/// Load balancer address and ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    pub vni: u32,
    pub lb_vip_ip: IpAddr,
    pub lbports: Vec<LbPort>,
    /// Assigned by the service on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlay_route: Option<IpAddr>,
}

impl Default for LoadBalancerSpec {
    fn default() -> Self {
        Self {
            vni: 0,
            lb_vip_ip: unspecified(),
            lbports: Vec::new(),
            underlay_route: None,
        }
    }
}

/// A load balanced protocol and port.
///
/// Documents spell it as a map, `{protocol: TCP, port: 80}`. The command
/// line form parsed by `FromStr` is `tcp/80`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LbPort {
    pub protocol: Protocol,
    pub port: u16,
}

impl fmt::Display for LbPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.protocol, self.port)
    }
}

impl FromStr for LbPort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (protocol, port) = s
            .split_once('/')
            .ok_or_else(|| format!("invalid port {s:?}, expected <protocol>/<port>"))?;
        Ok(Self {
            protocol: protocol.parse()?,
            port: port
                .parse()
                .map_err(|_| format!("invalid port number {port:?}"))?,
        })
    }
}

/// IP protocol of load balancer ports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Icmp,
    Icmpv6,
    Sctp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Icmp => "ICMP",
            Protocol::Icmpv6 => "ICMPV6",
            Protocol::Sctp => "SCTP",
        })
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "icmp" => Ok(Protocol::Icmp),
            "icmpv6" => Ok(Protocol::Icmpv6),
            "sctp" => Ok(Protocol::Sctp),
            _ => Err(format!("unknown protocol {s:?}")),
        }
    }
}

impl Record for LoadBalancer {
    const KIND: &'static str = "LoadBalancer";

    fn key(&self) -> String {
        self.metadata.id.clone()
    }
}

// ============================================================================
// Load balancer target
// ============================================================================

record! {
    /// A backend address of a load balancer.
    LoadBalancerTarget { metadata: LoadBalancerTargetMeta, spec: LoadBalancerTargetSpec }
}

/// Load balancer target identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancerTargetMeta {
    pub load_balancer_id: String,
}

/// Load balancer target address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancerTargetSpec {
    pub target_ip: IpAddr,
}

impl Default for LoadBalancerTargetSpec {
    fn default() -> Self {
        Self {
            target_ip: unspecified(),
        }
    }
}

impl Record for LoadBalancerTarget {
    const KIND: &'static str = "LoadBalancerTarget";

    fn key(&self) -> String {
        format!("{}/{}", self.metadata.load_balancer_id, self.spec.target_ip)
    }
}

// ============================================================================
// Load balancer prefix
// ============================================================================

record! {
    /// A prefix routed to an interface that acts as a load balancer target.
    LoadBalancerPrefix { metadata: PrefixMeta, spec: PrefixSpec }
}

impl Record for LoadBalancerPrefix {
    const KIND: &'static str = "LoadBalancerPrefix";

    fn key(&self) -> String {
        format!("{}/{}", self.metadata.interface_id, self.spec.prefix)
    }
}

// ============================================================================
// Firewall rule
// ============================================================================

record! {
    /// A firewall rule attached to an interface.
    FirewallRule { metadata: FirewallRuleMeta, spec: FirewallRuleSpec }
}

/// Firewall rule identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirewallRuleMeta {
    pub interface_id: String,
    pub rule_id: String,
}

/// Firewall rule match and verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirewallRuleSpec {
    pub traffic_direction: TrafficDirection,
    pub action: FirewallAction,
    pub priority: u32,
    /// Matches any source when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_prefix: Option<IpNet>,
    /// Matches any destination when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_prefix: Option<IpNet>,
    /// Matches any protocol when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_filter: Option<ProtocolFilter>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrafficDirection {
    #[default]
    Ingress,
    Egress,
}

impl fmt::Display for TrafficDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrafficDirection::Ingress => "Ingress",
            TrafficDirection::Egress => "Egress",
        })
    }
}

impl FromStr for TrafficDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ingress" => Ok(TrafficDirection::Ingress),
            "egress" => Ok(TrafficDirection::Egress),
            _ => Err(format!("unknown traffic direction {s:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirewallAction {
    #[default]
    Accept,
    Drop,
}

impl fmt::Display for FirewallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FirewallAction::Accept => "Accept",
            FirewallAction::Drop => "Drop",
        })
    }
}

impl FromStr for FirewallAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "accept" => Ok(FirewallAction::Accept),
            "drop" | "deny" => Ok(FirewallAction::Drop),
            _ => Err(format!("unknown firewall action {s:?}")),
        }
    }
}

/// Protocol match of a firewall rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum ProtocolFilter {
    Tcp(PortFilter),
    Udp(PortFilter),
    Icmp(IcmpFilter),
}

impl fmt::Display for ProtocolFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolFilter::Tcp(ports) => write!(f, "tcp {ports}"),
            ProtocolFilter::Udp(ports) => write!(f, "udp {ports}"),
            ProtocolFilter::Icmp(icmp) => write!(f, "icmp {icmp}"),
        }
    }
}

/// TCP/UDP port ranges; an unset bound matches any port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_port_lower: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_port_upper: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_port_lower: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_port_upper: Option<u16>,
}

fn fmt_range(f: &mut fmt::Formatter<'_>, lower: Option<u16>, upper: Option<u16>) -> fmt::Result {
    match (lower, upper) {
        (None, None) => f.write_str("*"),
        (lower, upper) => write!(
            f,
            "{}-{}",
            lower.map_or_else(|| "*".to_string(), |p| p.to_string()),
            upper.map_or_else(|| "*".to_string(), |p| p.to_string())
        ),
    }
}

impl fmt::Display for PortFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("src ")?;
        fmt_range(f, self.src_port_lower, self.src_port_upper)?;
        f.write_str(" dst ")?;
        fmt_range(f, self.dst_port_lower, self.dst_port_upper)
    }
}

/// ICMP type and code; an unset field matches any value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IcmpFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_code: Option<u8>,
}

impl fmt::Display for IcmpFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.icmp_type {
            Some(t) => write!(f, "type {t}")?,
            None => f.write_str("type *")?,
        }
        match self.icmp_code {
            Some(c) => write!(f, " code {c}"),
            None => f.write_str(" code *"),
        }
    }
}

impl Record for FirewallRule {
    const KIND: &'static str = "FirewallRule";

    fn key(&self) -> String {
        format!("{}/{}", self.metadata.interface_id, self.metadata.rule_id)
    }
}

// ============================================================================
// Service information (not records)
// ============================================================================

/// Protocol and version information reported by `get version`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub client_protocol: String,
    pub client_name: String,
    pub client_version: String,
    pub service_protocol: String,
    pub service_version: String,
}

/// Initialization state of the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Init {
    /// Identifies the current service instance; changes when it restarts.
    pub uuid: String,
}
