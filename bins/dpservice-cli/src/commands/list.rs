//! list command implementation.

use std::net::IpAddr;

use clap::{Args, Subcommand};
use dpservice::Object;
use dpservice::client::DataplaneApi;

use super::Context;

#[derive(Args)]
pub struct ListCmd {
    #[command(subcommand)]
    resource: ListResource,
}

#[derive(Subcommand)]
enum ListResource {
    /// List all interfaces.
    Interfaces,

    /// List alias prefixes of an interface.
    Prefixes {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,
    },

    /// List load balancer prefixes of an interface.
    #[command(name = "lbprefixes")]
    LoadBalancerPrefixes {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,
    },

    /// List routes of a virtual network.
    Routes {
        /// Virtual network identifier.
        #[arg(long)]
        vni: u32,
    },

    /// List neighbor NAT ranges sharing a NAT address.
    #[command(name = "neighbornats")]
    NeighborNats {
        /// Shared NAT address.
        #[arg(long)]
        nat_ip: IpAddr,
    },

    /// List targets of a load balancer.
    #[command(name = "lbtargets")]
    LoadBalancerTargets {
        /// Load balancer ID.
        #[arg(long)]
        lb_id: String,
    },

    /// List firewall rules of an interface.
    #[command(name = "firewallrules", visible_alias = "fwrules")]
    FirewallRules {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,
    },
}

fn objects<T: Into<Object>>(records: Vec<T>) -> Vec<Object> {
    records.into_iter().map(Into::into).collect()
}

impl ListCmd {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        let mut client = ctx.connect().await?;

        let objects = match self.resource {
            ListResource::Interfaces => objects(client.list_interfaces().await?),
            ListResource::Prefixes { interface_id } => {
                objects(client.list_prefixes(&interface_id).await?)
            }
            ListResource::LoadBalancerPrefixes { interface_id } => {
                objects(client.list_load_balancer_prefixes(&interface_id).await?)
            }
            ListResource::Routes { vni } => objects(client.list_routes(vni).await?),
            ListResource::NeighborNats { nat_ip } => {
                objects(client.list_neighbor_nats(nat_ip).await?)
            }
            ListResource::LoadBalancerTargets { lb_id } => {
                objects(client.list_load_balancer_targets(&lb_id).await?)
            }
            ListResource::FirewallRules { interface_id } => {
                objects(client.list_firewall_rules(&interface_id).await?)
            }
        };

        ctx.print_many(&objects)
    }
}
