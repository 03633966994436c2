use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bige_guard::authn::RequestTokens;
use bige_guard::authz::factory::GuardFactory;
use bige_guard::authz::RequestParams;
use bige_guard::decision::IdentityContext;
use bige_guard::display::display_json;
use bige_guard::server::config::RouteMethod;
use bige_guard::server::DenialResponse;
use chrono::Utc;
use clap::Args;
use serde::Serialize;

use super::{parse_pair, ConfigArgs, RunCommand};

/// Evaluate the guards of a configured route offline and print the decision.
///
/// Exits with an error when the request is denied.
#[derive(Args)]
pub struct CheckArgs {
    /// Route path pattern as configured, e.g. "/apps/{id}".
    pub path: String,

    #[arg(short, long, default_value = "get")]
    pub method: RouteMethod,

    /// Request header, as "name=value". Can be repeated.
    #[arg(short = 'H', long = "header", value_parser = parse_pair)]
    pub headers: Vec<(String, String)>,

    /// Query string param, as "name=value". Also used for placeholders.
    #[arg(short, long, value_parser = parse_pair)]
    pub query: Vec<(String, String)>,

    /// Cookie, as "name=value".
    #[arg(long = "cookie", value_parser = parse_pair)]
    pub cookies: Vec<(String, String)>,

    /// Path param, as "name=value". Wins over a query param of the same name.
    #[arg(short, long = "param", value_parser = parse_pair)]
    pub params: Vec<(String, String)>,

    /// Evaluate as of this unix timestamp instead of now.
    #[arg(long)]
    pub now: Option<u64>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
enum CheckOutput {
    Permit {
        identity: IdentityContext,
    },
    Deny {
        #[serde(flatten)]
        response: DenialResponse,
    },
}

#[async_trait(?Send)]
impl RunCommand for CheckArgs {
    async fn run(&self) -> Result<()> {
        let cfg = self.config.load_and_init_logs()?;

        let Some(route) = cfg.find_route(self.method, &self.path) else {
            bail!("no route {} {} in config", self.method, self.path);
        };

        let factory = GuardFactory::from_config(&cfg.token).context("init token verifier")?;
        let chain = factory.build_chain(&route.guards)?;

        let mut source = RequestTokens::new();
        for (name, value) in self.headers.iter() {
            source = source.header(name, value.as_str());
        }
        for (name, value) in self.query.iter() {
            source = source.query(name.as_str(), value.as_str());
        }
        for (name, value) in self.cookies.iter() {
            source = source.cookie(name.as_str(), value.as_str());
        }

        let mut params: RequestParams = self.query.iter().cloned().collect();
        params.extend(self.params.iter().cloned());

        let now = self.now.unwrap_or_else(|| Utc::now().timestamp() as u64);
        match chain.check_at(&source, &params, now) {
            Ok(identity) => display_json(CheckOutput::Permit { identity }),
            Err(denial) => {
                display_json(CheckOutput::Deny {
                    response: DenialResponse::from(&denial),
                })?;
                bail!("request denied");
            }
        }
    }
}
