//! delete command implementation.

use std::net::IpAddr;

use clap::{Args, Subcommand};
use dpservice::Object;
use dpservice::api::*;
use dpservice::client::Operation;
use ipnet::IpNet;

use super::{Context, parse_prefix};

#[derive(Args)]
#[command(args_conflicts_with_subcommands = true, arg_required_else_help = true)]
pub struct DeleteCmd {
    /// Files, directories or `-` (stdin) holding objects to delete.
    #[arg(short = 'f', long = "filename", value_name = "PATH", num_args = 1..)]
    files: Vec<String>,

    #[command(subcommand)]
    resource: Option<DeleteResource>,
}

#[derive(Subcommand)]
enum DeleteResource {
    /// Delete an interface.
    Interface {
        /// Interface ID.
        #[arg(long)]
        id: String,
    },

    /// Delete an alias prefix.
    Prefix {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,

        /// Prefix in CIDR notation.
        #[arg(long, value_parser = parse_prefix)]
        prefix: IpNet,
    },

    /// Delete a route.
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

    /// Detach the virtual IP of an interface.
    #[command(name = "virtualip", visible_alias = "vip")]
    VirtualIp {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,
    },

    /// Disable NAT for an interface.
    Nat {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,
    },

    /// Remove a neighbor NAT port range.
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
    },

    /// Delete a load balancer.
    #[command(name = "loadbalancer", visible_alias = "lb")]
    LoadBalancer {
        /// Load balancer ID.
        #[arg(long)]
        id: String,
    },

    /// Remove a target from a load balancer.
    #[command(name = "lbtarget")]
    LoadBalancerTarget {
        /// Load balancer ID.
        #[arg(long)]
        lb_id: String,

        /// Underlay address of the target.
        #[arg(long)]
        target_ip: IpAddr,
    },

    /// Delete a load balancer prefix.
    #[command(name = "lbprefix")]
    LoadBalancerPrefix {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,

        /// Prefix in CIDR notation.
        #[arg(long, value_parser = parse_prefix)]
        prefix: IpNet,
    },

    /// Delete a firewall rule.
    #[command(name = "firewallrule", visible_alias = "fwrule")]
    FirewallRule {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,

        /// Rule ID.
        #[arg(long)]
        rule_id: String,
    },
}

impl DeleteResource {
    /// Record carrying just the identity the delete call needs.
    fn into_object(self) -> Object {
        match self {
            DeleteResource::Interface { id } => {
                Interface::new(InterfaceMeta { id }, InterfaceSpec::default()).into()
            }
            DeleteResource::Prefix {
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
            DeleteResource::Route {
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
            DeleteResource::VirtualIp { interface_id } => {
                VirtualIp::new(VirtualIpMeta { interface_id }, VirtualIpSpec::default()).into()
            }
            DeleteResource::Nat { interface_id } => {
                Nat::new(NatMeta { interface_id }, NatSpec::default()).into()
            }
            DeleteResource::NeighborNat {
                nat_ip,
                vni,
                min_port,
                max_port,
            } => NeighborNat::new(
                NeighborNatMeta { nat_ip },
                NeighborNatSpec {
                    vni,
                    min_port,
                    max_port,
                    underlay_route: None,
                },
            )
            .into(),
            DeleteResource::LoadBalancer { id } => {
                LoadBalancer::new(LoadBalancerMeta { id }, LoadBalancerSpec::default()).into()
            }
            DeleteResource::LoadBalancerTarget { lb_id, target_ip } => LoadBalancerTarget::new(
                LoadBalancerTargetMeta {
                    load_balancer_id: lb_id,
                },
                LoadBalancerTargetSpec { target_ip },
            )
            .into(),
            DeleteResource::LoadBalancerPrefix {
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
            DeleteResource::FirewallRule {
                interface_id,
                rule_id,
            } => FirewallRule::new(
                FirewallRuleMeta {
                    interface_id,
                    rule_id,
                },
                FirewallRuleSpec::default(),
            )
            .into(),
        }
    }
}

impl DeleteCmd {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        match self.resource {
            Some(resource) => {
                ctx.apply_one(Operation::Delete, resource.into_object())
                    .await
            }
            None => ctx.apply_files(Operation::Delete, &self.files).await,
        }
    }
}
