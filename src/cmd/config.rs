use anyhow::Result;
use async_trait::async_trait;
use bige_guard::display::display_json;
use clap::Args;

use super::{ConfigArgs, RunCommand};

/// Display the completed configuration in JSON format. The token secret is
/// redacted.
#[derive(Args)]
pub struct ShowConfigArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait(?Send)]
impl RunCommand for ShowConfigArgs {
    async fn run(&self) -> Result<()> {
        let cfg = self.config.load()?;
        display_json(cfg)
    }
}
