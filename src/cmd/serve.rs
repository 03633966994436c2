use anyhow::Result;
use async_trait::async_trait;
use bige_guard::server::factory::ServerFactory;
use clap::Args;
use log::{debug, info};

use super::{ConfigArgs, RunCommand};

/// Start the guarded HTTP server.
#[derive(Args)]
pub struct ServeArgs {
    /// Override the bind address from the config.
    #[arg(short, long)]
    pub bind: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait(?Send)]
impl RunCommand for ServeArgs {
    async fn run(&self) -> Result<()> {
        let mut cfg = self.config.load_and_init_logs()?;
        if let Some(bind) = self.bind.as_ref() {
            cfg.bind = bind.clone();
        }

        debug!("Use config: {:?}", cfg);

        let factory = ServerFactory::new(cfg);
        let srv = factory.build_server()?;
        srv.run().await?;

        info!("Server exited");
        Ok(())
    }
}
