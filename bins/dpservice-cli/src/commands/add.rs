//! add command implementation.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use clap::{Args, Subcommand, ValueEnum};
use dpservice::Object;
use dpservice::api::*;
use dpservice::client::Operation;
use ipnet::IpNet;

use super::{Context, parse_prefix};

#[derive(Args)]
#[command(args_conflicts_with_subcommands = true, arg_required_else_help = true)]
pub struct AddCmd {
    /// Files, directories or `-` (stdin) holding objects to create.
    #[arg(short = 'f', long = "filename", value_name = "PATH", num_args = 1..)]
    files: Vec<String>,

    #[command(subcommand)]
    resource: Option<AddResource>,
}

#[derive(Subcommand)]
enum AddResource {
    /// Create an interface.
    Interface {
        /// Interface ID.
        #[arg(long)]
        id: String,

        /// Virtual network identifier.
        #[arg(long)]
        vni: u32,

        /// PCI device of the virtual function.
        #[arg(long)]
        device: String,

        /// Primary IPv4 address.
        #[arg(long)]
        ipv4: Option<Ipv4Addr>,

        /// Primary IPv6 address.
        #[arg(long)]
        ipv6: Option<Ipv6Addr>,

        /// PXE server address.
        #[arg(long)]
        pxe_server: Option<IpAddr>,

        /// PXE boot file path.
        #[arg(long, requires = "pxe_server")]
        pxe_boot_file: Option<String>,
    },

    /// Create an alias prefix on an interface.
    Prefix {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,

        /// Prefix in CIDR notation.
        #[arg(long, value_parser = parse_prefix)]
        prefix: IpNet,
    },

    /// Create a route in a virtual network.
    Route {
        /// Virtual network identifier.
        #[arg(long)]
        vni: u32,

        /// Destination prefix.
        #[arg(long, value_parser = parse_prefix)]
        prefix: IpNet,

        /// Virtual network of the next hop.
        #[arg(long)]
        next_hop_vni: u32,

        /// Underlay address of the next hop.
        #[arg(long)]
        next_hop_ip: IpAddr,
    },

    /// Attach a virtual IP to an interface.
    #[command(name = "virtualip", visible_alias = "vip")]
    VirtualIp {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,

        /// Virtual IP address.
        #[arg(long)]
        ip: IpAddr,
    },

    /// Enable NAT for an interface.
    Nat {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,

        /// NAT address.
        #[arg(long)]
        nat_ip: IpAddr,

        /// First port of the range.
        #[arg(long)]
        min_port: u32,

        /// Last port of the range.
        #[arg(long)]
        max_port: u32,
    },

    /// Register a NAT port range owned by another host.
    #[command(name = "neighbornat")]
    NeighborNat {
        /// Shared NAT address.
        #[arg(long)]
        nat_ip: IpAddr,

        /// Virtual network identifier.
        #[arg(long)]
        vni: u32,

        /// First port of the range.
        #[arg(long)]
        min_port: u32,

        /// Last port of the range.
        #[arg(long)]
        max_port: u32,

        /// Underlay address of the owning host.
        #[arg(long)]
        underlay_route: IpAddr,
    },

    /// Create a load balancer.
    #[command(name = "loadbalancer", visible_alias = "lb")]
    LoadBalancer {
        /// Load balancer ID.
        #[arg(long)]
        id: String,

        /// Virtual network identifier.
        #[arg(long)]
        vni: u32,

        /// Virtual IP the load balancer listens on.
        #[arg(long)]
        vip: IpAddr,

        /// Listening ports as PROTOCOL/PORT, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        lbports: Vec<LbPort>,
    },

    /// Add a target to a load balancer.
    #[command(name = "lbtarget")]
    LoadBalancerTarget {
        /// Load balancer ID.
        #[arg(long)]
        lb_id: String,

        /// Underlay address of the target.
        #[arg(long)]
        target_ip: IpAddr,
    },

    /// Create a load balancer prefix on an interface.
    #[command(name = "lbprefix")]
    LoadBalancerPrefix {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,

        /// Prefix in CIDR notation.
        #[arg(long, value_parser = parse_prefix)]
        prefix: IpNet,
    },

    /// Create a firewall rule on an interface.
    #[command(name = "firewallrule", visible_alias = "fwrule")]
    FirewallRule(FirewallRuleArgs),
}

#[derive(Args)]
struct FirewallRuleArgs {
    /// Interface ID.
    #[arg(long)]
    interface_id: String,

    /// Rule ID.
    #[arg(long)]
    rule_id: String,

    /// Traffic direction (ingress, egress).
    #[arg(long, default_value_t = TrafficDirection::Ingress)]
    direction: TrafficDirection,

    /// Action on match (accept, drop).
    #[arg(long, default_value_t = FirewallAction::Accept)]
    action: FirewallAction,

    /// Rule priority; lower values match first.
    #[arg(long, default_value_t = 1000)]
    priority: u32,

    /// Source prefix; any source if unset.
    #[arg(long, value_parser = parse_prefix)]
    src: Option<IpNet>,

    /// Destination prefix; any destination if unset.
    #[arg(long, value_parser = parse_prefix)]
    dst: Option<IpNet>,

    /// Protocol to match; any protocol if unset.
    #[arg(long, value_enum)]
    protocol: Option<FilterProtocol>,

    #[arg(long)]
    src_port_min: Option<u16>,

    #[arg(long)]
    src_port_max: Option<u16>,

    #[arg(long)]
    dst_port_min: Option<u16>,

    #[arg(long)]
    dst_port_max: Option<u16>,

    #[arg(long)]
    icmp_type: Option<u8>,

    #[arg(long)]
    icmp_code: Option<u8>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterProtocol {
    Tcp,
    Udp,
    Icmp,
}

impl FirewallRuleArgs {
    fn protocol_filter(&self) -> Option<ProtocolFilter> {
        let ports = PortFilter {
            src_port_lower: self.src_port_min,
            src_port_upper: self.src_port_max,
            dst_port_lower: self.dst_port_min,
            dst_port_upper: self.dst_port_max,
        };
        match self.protocol? {
            FilterProtocol::Tcp => Some(ProtocolFilter::Tcp(ports)),
            FilterProtocol::Udp => Some(ProtocolFilter::Udp(ports)),
            FilterProtocol::Icmp => Some(ProtocolFilter::Icmp(IcmpFilter {
                icmp_type: self.icmp_type,
                icmp_code: self.icmp_code,
            })),
        }
    }

    fn into_object(self) -> Object {
        let protocol_filter = self.protocol_filter();
        FirewallRule::new(
            FirewallRuleMeta {
                interface_id: self.interface_id,
                rule_id: self.rule_id,
            },
            FirewallRuleSpec {
                traffic_direction: self.direction,
                action: self.action,
                priority: self.priority,
                source_prefix: self.src,
                destination_prefix: self.dst,
                protocol_filter,
            },
        )
        .into()
    }
}

impl AddResource {
    fn into_object(self) -> Object {
        match self {
            AddResource::Interface {
                id,
                vni,
                device,
                ipv4,
                ipv6,
                pxe_server,
                pxe_boot_file,
            } => Interface::new(
                InterfaceMeta { id },
                InterfaceSpec {
                    vni,
                    device,
                    primary_ipv4: ipv4,
                    primary_ipv6: ipv6,
                    pxe: pxe_server.map(|server| Pxe {
                        server: Some(server),
                        boot_file: pxe_boot_file.unwrap_or_default(),
                    }),
                    ..Default::default()
                },
            )
            .into(),
            AddResource::Prefix {
                interface_id,
                prefix,
            } => Prefix::new(
                PrefixMeta { interface_id },
                PrefixSpec {
                    prefix,
                    underlay_route: None,
                },
            )
            .into(),
            AddResource::Route {
                vni,
                prefix,
                next_hop_vni,
                next_hop_ip,
            } => Route::new(
                RouteMeta { vni },
                RouteSpec {
                    prefix,
                    next_hop: NextHop {
                        vni: next_hop_vni,
                        ip: next_hop_ip,
                    },
                },
            )
            .into(),
            AddResource::VirtualIp { interface_id, ip } => VirtualIp::new(
                VirtualIpMeta { interface_id },
                VirtualIpSpec {
                    ip,
                    underlay_route: None,
                },
            )
            .into(),
            AddResource::Nat {
                interface_id,
                nat_ip,
                min_port,
                max_port,
            } => Nat::new(
                NatMeta { interface_id },
                NatSpec {
                    nat_ip,
                    min_port,
                    max_port,
                    underlay_route: None,
                },
            )
            .into(),
            AddResource::NeighborNat {
                nat_ip,
                vni,
                min_port,
                max_port,
                underlay_route,
            } => NeighborNat::new(
                NeighborNatMeta { nat_ip },
                NeighborNatSpec {
                    vni,
                    min_port,
                    max_port,
                    underlay_route: Some(underlay_route),
                },
            )
            .into(),
            AddResource::LoadBalancer {
                id,
                vni,
                vip,
                lbports,
            } => LoadBalancer::new(
                LoadBalancerMeta { id },
                LoadBalancerSpec {
                    vni,
                    lb_vip_ip: vip,
                    lbports,
                    underlay_route: None,
                },
            )
            .into(),
            AddResource::LoadBalancerTarget { lb_id, target_ip } => LoadBalancerTarget::new(
                LoadBalancerTargetMeta {
                    load_balancer_id: lb_id,
                },
                LoadBalancerTargetSpec { target_ip },
            )
            .into(),
            AddResource::LoadBalancerPrefix {
                interface_id,
                prefix,
            } => LoadBalancerPrefix::new(
                PrefixMeta { interface_id },
                PrefixSpec {
                    prefix,
                    underlay_route: None,
                },
            )
            .into(),
            AddResource::FirewallRule(args) => args.into_object(),
        }
    }
}

impl AddCmd {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        match self.resource {
            Some(resource) => {
                ctx.apply_one(Operation::Create, resource.into_object())
                    .await
            }
            None => ctx.apply_files(Operation::Create, &self.files).await,
        }
    }
}
