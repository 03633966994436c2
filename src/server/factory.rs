use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::authz::factory::GuardFactory;

use super::config::ServerConfig;
use super::restful::{RestfulContext, RestfulServer, Route};

pub struct ServerFactory {
    cfg: ServerConfig,
}

impl ServerFactory {
    pub fn new(cfg: ServerConfig) -> Self {
        Self { cfg }
    }

    pub fn build_server(&self) -> Result<RestfulServer> {
        let ctx = self.build_context()?;

        let mut srv = RestfulServer::new(self.cfg.bind.clone(), ctx);
        if self.cfg.keep_alive_secs > 0 {
            srv.set_keep_alive_secs(self.cfg.keep_alive_secs);
        }
        if self.cfg.workers > 0 {
            srv.set_workers(self.cfg.workers);
        }

        Ok(srv)
    }

    /// Builds every route's guard chain. All chains share one verifier, so the
    /// secret is checked exactly once here.
    pub fn build_context(&self) -> Result<Arc<RestfulContext>> {
        let guard_factory = GuardFactory::from_config(&self.cfg.token).context("init token verifier")?;

        let mut routes = Vec::with_capacity(self.cfg.routes.len());
        for route in self.cfg.routes.iter() {
            let chain = guard_factory
                .build_chain(&route.guards)
                .with_context(|| format!("build guards for {} {}", route.method, route.path))?;
            if chain.is_public() {
                info!("Route {} {} is public", route.method, route.path);
            } else {
                debug!(
                    "Route {} {} guarded by {} credential(s)",
                    route.method,
                    route.path,
                    chain.guards().len()
                );
            }
            routes.push(Route {
                method: route.method,
                path: route.path.clone(),
                handler: route.handler,
                chain,
            });
        }

        Ok(Arc::new(RestfulContext { routes }))
    }
}
