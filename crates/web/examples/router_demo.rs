//! Builds a small routing table, logs its structure and resolves a few
//! sample paths.
//!
//! ```sh
//! cargo run -p lattice-web --example router_demo
//! ```

use async_trait::async_trait;
use lattice_http::HttpRequest;
use lattice_web::handler::{HandlerResult, RequestHandler};
use lattice_web::router::Router;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

struct Named(&'static str);

#[async_trait]
impl RequestHandler for Named {
    async fn handle(&self, _req: &mut dyn HttpRequest) -> HandlerResult {
        Ok(())
    }
}

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut router = Router::new();
    for rule in [
        "/",
        "/products",
        "/products/listing*",
        "/products/listing*/details",
        "/clients/johan",
        "/assets/*",
    ] {
        router.add(rule, Arc::new(Named(rule)), Some(Arc::new(rule.to_string())));
    }
    router.append_middleware("/products/*", Arc::new(Named("@/products/*")), None);

    router.log_tree();

    for path in [
        "/",
        "/products/listing42",
        "/products/listing42/details",
        "/assets/css/site.css",
        "/unknown",
    ] {
        let result = router.find(path);
        info!(
            path,
            matched = result.is_match(),
            wildcards = ?result.wildcards(),
            remaining = ?result.remaining_segments(),
            middlewares = result.middlewares().len(),
            "resolved"
        );
    }

    info!("tree dump:");
    for item in router.dump_tree() {
        info!("  {}", item.path);
    }
}
