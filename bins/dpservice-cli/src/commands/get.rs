//! get command implementation.

use clap::{Args, Subcommand};
use dpservice::Object;
use dpservice::client::DataplaneApi;

use super::Context;

#[derive(Args)]
pub struct GetCmd {
    #[command(subcommand)]
    resource: GetResource,
}

#[derive(Subcommand)]
enum GetResource {
    /// Show an interface.
    Interface {
        /// Interface ID.
        #[arg(long)]
        id: String,
    },

    /// Show the virtual IP of an interface.
    #[command(name = "virtualip", visible_alias = "vip")]
    VirtualIp {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,
    },

    /// Show the NAT of an interface.
    Nat {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,
    },

    /// Show a load balancer.
    #[command(name = "loadbalancer", visible_alias = "lb")]
    LoadBalancer {
        /// Load balancer ID.
        #[arg(long)]
        id: String,
    },

    /// Show a firewall rule.
    #[command(name = "firewallrule", visible_alias = "fwrule")]
    FirewallRule {
        /// Interface ID.
        #[arg(long)]
        interface_id: String,

        /// Rule ID.
        #[arg(long)]
        rule_id: String,
    },

    /// Show client and service versions.
    Version,

    /// Show whether the service is initialized.
    Init,
}

impl GetCmd {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        let mut client = ctx.connect().await?;

        let object: Object = match self.resource {
            GetResource::Interface { id } => client.get_interface(&id).await?.into(),
            GetResource::VirtualIp { interface_id } => {
                client.get_virtual_ip(&interface_id).await?.into()
            }
            GetResource::Nat { interface_id } => client.get_nat(&interface_id).await?.into(),
            GetResource::LoadBalancer { id } => client.get_load_balancer(&id).await?.into(),
            GetResource::FirewallRule {
                interface_id,
                rule_id,
            } => client
                .get_firewall_rule(&interface_id, &rule_id)
                .await?
                .into(),
            GetResource::Version => return ctx.print_one(&client.get_version().await?),
            GetResource::Init => return ctx.print_one(&client.check_initialized().await?),
        };

        ctx.print_one(&object)
    }
}
