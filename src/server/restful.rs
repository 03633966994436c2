use std::sync::Arc;
use std::time::Duration;

use actix_web::web::{self, Data, ServiceConfig};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use log::{error, info};

use crate::authn::jwt::JwtVerifier;
use crate::authz::chain::GuardChain;

use super::config::RouteMethod;
use super::handlers::{GuardedRequest, HandlerKind};
use super::request::request_params;
use super::response::Response;

pub struct RestfulServer {
    ctx: Arc<RestfulContext>,

    keep_alive_secs: Option<u64>,
    workers: Option<u64>,

    bind: String,
}

/// Routes shared by all workers. Built once at startup, read-only afterwards.
pub struct RestfulContext {
    pub routes: Vec<Route>,
}

pub struct Route {
    pub method: RouteMethod,
    pub path: String,
    pub handler: HandlerKind,
    pub chain: GuardChain<JwtVerifier>,
}

impl RestfulServer {
    pub fn new(bind: String, ctx: Arc<RestfulContext>) -> Self {
        Self {
            ctx,
            keep_alive_secs: None,
            workers: None,
            bind,
        }
    }

    pub fn set_keep_alive_secs(&mut self, keep_alive_secs: u64) {
        self.keep_alive_secs = Some(keep_alive_secs);
    }

    pub fn set_workers(&mut self, workers: u64) {
        self.workers = Some(workers);
    }

    pub async fn run(self) -> Result<()> {
        let ctx = self.ctx.clone();
        let mut srv =
            HttpServer::new(move || App::new().configure(|cfg| Self::register(cfg, ctx.clone())));

        info!("Binding to http://{}", self.bind);
        srv = srv.bind(&self.bind).context("bind server")?;

        if let Some(keep_alive) = self.keep_alive_secs {
            srv = srv.keep_alive(Duration::from_secs(keep_alive));
        }
        if let Some(workers) = self.workers {
            srv = srv.workers(workers as usize);
        }

        info!("Starting restful server with {} routes", self.ctx.routes.len());
        srv.run().await.context("run server")?;

        info!("Server stopped by user");
        Ok(())
    }

    /// Registers every configured route plus the 404 fallback. Routes sharing
    /// a path pattern are grouped into one resource, other methods get a 405.
    pub fn register(cfg: &mut ServiceConfig, ctx: Arc<RestfulContext>) {
        let mut paths: Vec<&str> = Vec::new();
        for route in ctx.routes.iter() {
            if !paths.contains(&route.path.as_str()) {
                paths.push(&route.path);
            }
        }

        for path in paths {
            let mut resource = web::resource(path);
            for (idx, route) in ctx.routes.iter().enumerate() {
                if route.path != path {
                    continue;
                }
                let handler = move |req: HttpRequest, ctx: Data<Arc<RestfulContext>>| {
                    Self::handle_route(idx, req, ctx)
                };
                resource = resource.route(web::method(route.method.to_method()).to(handler));
            }
            cfg.service(resource.default_service(web::to(Self::method_not_allowed)));
        }

        cfg.app_data(Data::new(ctx))
            .default_service(web::route().to(Self::default_handler));
    }

    async fn handle_route(
        idx: usize,
        req: HttpRequest,
        ctx: Data<Arc<RestfulContext>>,
    ) -> HttpResponse {
        let Some(route) = ctx.routes.get(idx) else {
            error!("Route #{idx} is not registered");
            return Response::error("route not registered").into();
        };

        let params = request_params(&req);
        let identity = match route.chain.check(&req, &params) {
            Ok(identity) => identity,
            Err(denial) => return Response::denied(&denial).into(),
        };

        route
            .handler
            .handle(GuardedRequest {
                req: &req,
                route,
                params,
                identity,
                ctx: &ctx,
            })
            .into()
    }

    async fn method_not_allowed() -> HttpResponse {
        Response::method_not_allowed().into()
    }

    async fn default_handler(req: HttpRequest) -> HttpResponse {
        let path = req.uri().path().to_string();
        let method = req.method().as_str().to_string();
        Response::not_found(format!("No route to {method} {path}")).into()
    }
}
