//! init command implementation.

use clap::Args;
use dpservice::client::DataplaneApi;
use tracing::info;

use super::Context;

#[derive(Args)]
pub struct InitCmd {}

impl InitCmd {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        let mut client = ctx.connect().await?;
        let init = client.initialize().await?;
        info!(uuid = %init.uuid, "dataplane initialized");
        ctx.print_one(&init)
    }
}
