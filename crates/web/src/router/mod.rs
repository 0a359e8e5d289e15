//! Hierarchical URL router.
//!
//! A [`Router`] binds handlers to `/`-separated paths. A path segment is a
//! literal, a literal with a trailing `*` (prefix wildcard, capturing the
//! remainder of the segment), or a standalone `*` as the final segment
//! (catch-all for every deeper path). Middlewares attach either to an exact
//! path or, with a trailing `/*`, to every descendant of a path; the ordered
//! chain for each node is precomputed at registration time so resolution
//! never allocates chain state.
//!
//! Resolution never fails: a missed match yields a [`RouteMatch`] without a
//! target, which the host turns into its not-found reply.

mod node;

use crate::handler::{RequestHandler, RouteTag};
use node::{MiddlewareEntry, PathNode, RouteTarget};
use std::sync::Arc;

use node::{empty_chain, MiddlewareChain};

/// Maps a method's paths to handlers plus ordered middleware chains.
///
/// One resolver exists per (host, method). Registration is authoritative:
/// the last `add` for a path wins, duplicate middleware registrations stack
/// in insertion order.
pub struct Router {
    root: PathNode,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { root: PathNode::new(String::new()) }
    }

    /// Binds `handler` to `path`. An empty path (or `/`) addresses the root.
    pub fn add(&mut self, path: &str, handler: Arc<dyn RequestHandler>, tag: Option<RouteTag>) {
        let path = path.strip_prefix('/').unwrap_or(path);
        let segments = split_registration_path(path);
        let mut inherited = Vec::new();
        self.root.add_path(&segments, "", &mut inherited, RouteTarget { handler, tag });
    }

    /// Registers a middleware executed before the handlers below `path`.
    ///
    /// A path ending in `/*` applies the middleware to every descendant
    /// match of the target node; otherwise it applies to the exact match
    /// only.
    pub fn append_middleware(&mut self, path: &str, handler: Arc<dyn RequestHandler>, tag: Option<RouteTag>) {
        let path = path.strip_prefix('/').unwrap_or(path);
        let (path, exact_match) = match path.strip_suffix("/*") {
            Some(stripped) => (stripped, false),
            None => (path, true),
        };

        let segments = split_registration_path(path);
        let mut inherited = Vec::new();
        self.root.append_middleware(
            &segments,
            "",
            &mut inherited,
            MiddlewareEntry { handler, tag },
            exact_match,
        );
    }

    /// Resolves `path` to a handler and its middleware chain.
    pub fn find(&self, path: &str) -> RouteMatch {
        let segments = split_request_path(path);
        let mut result = RouteMatch {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            remaining: Vec::new(),
            target: None,
            middlewares: empty_chain(),
            raw_wildcards: Vec::new(),
        };
        self.root.find(&segments, &mut result);
        result
    }

    /// Serializes the tree as `(path, handler, tag)` items.
    ///
    /// Exact handlers use the node's canonical path, catch-alls append `/*`,
    /// middlewares are prefixed with `@`. Replaying the list into a fresh
    /// router rebuilds an equivalent resolver.
    pub fn dump_tree(&self) -> Vec<TreeItem> {
        let mut tree = Vec::new();
        self.root.dump_tree(&mut tree);
        tree
    }

    /// Logs the tree structure at debug level.
    pub fn log_tree(&self) {
        self.root.log_tree("");
    }
}

/// The outcome of a resolve operation.
pub struct RouteMatch {
    segments: Vec<String>,
    remaining: Vec<String>,
    target: Option<Arc<dyn RequestHandler>>,
    middlewares: MiddlewareChain,
    raw_wildcards: Vec<String>,
}

impl RouteMatch {
    pub fn is_match(&self) -> bool {
        self.target.is_some()
    }

    /// The matched handler, if any.
    pub fn target(&self) -> Option<&Arc<dyn RequestHandler>> {
        self.target.as_ref()
    }

    /// The ordered middleware chain for the matched node.
    pub fn middlewares(&self) -> &[Arc<dyn RequestHandler>] {
        &self.middlewares
    }

    /// All segments of the resolved path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Trailing segments a catch-all left unmatched.
    pub fn remaining_segments(&self) -> &[String] {
        &self.remaining
    }

    /// Captured wildcard values in segment order, first captured first.
    ///
    /// Captures are recorded leaf to root while the resolution unwinds; this
    /// accessor reverses them.
    pub fn wildcards(&self) -> Vec<String> {
        self.raw_wildcards.iter().rev().cloned().collect()
    }
}

/// A replayable line of [`Router::dump_tree`].
pub struct TreeItem {
    pub path: String,
    pub handler: Arc<dyn RequestHandler>,
    pub tag: Option<RouteTag>,
}

fn split_registration_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').collect()
    }
}

fn split_request_path(path: &str) -> Vec<&str> {
    if path.is_empty() || path == "/" {
        return Vec::new();
    }
    let mut parts = path.split('/');
    parts.next();
    parts.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerResult;
    use async_trait::async_trait;
    use lattice_http::HttpRequest;
    use std::collections::HashMap;

    struct NoopHandler;

    #[async_trait]
    impl RequestHandler for NoopHandler {
        async fn handle(&self, _req: &mut dyn HttpRequest) -> HandlerResult {
            Ok(())
        }
    }

    struct Fixture {
        router: Router,
        handlers: HashMap<String, Arc<dyn RequestHandler>>,
        middlewares: HashMap<String, Arc<dyn RequestHandler>>,
    }

    fn rule_set() -> Vec<&'static str> {
        vec![
            "/",
            "/products",
            "/products/bedroom",
            "/clients",
            "/clients/",
            "/clients/johan",
            "/vip",
            "/vip/johan",
            "/products/any/*",
            "/products/listing1*",
            "/products/listing1*/suiteA",
            "/products/listing1*/suiteB",
            "/products/listing1b*",
            "/products/listing1b*/suite1B",
            "/products/listing2*",
            "/products/listing2",
            "/products/listing2/",
            "/wildcards/w1*/suite/w2*",
            "/wildcards/w1*/suite/w2*/*",
        ]
    }

    fn middleware_set() -> Vec<&'static str> {
        vec![
            // exact middlewares
            "/clients",
            "/clients/",
            "/clients/johan",
            "/products/listing1*/suiteA",
            "/wildcards/w1*/suite/w2*",
            "/wildcards/w1*/suite/w2*/*",
            "/wildcards/*",
            // applies to descendants, not to /products/any itself
            "/products/any/*",
        ]
    }

    fn build_fixture() -> Fixture {
        let mut fixture =
            Fixture { router: Router::new(), handlers: HashMap::new(), middlewares: HashMap::new() };
        for rule in rule_set() {
            add_rule(&mut fixture, rule);
        }
        fixture
    }

    fn add_rule(fixture: &mut Fixture, rule: &str) {
        let handler: Arc<dyn RequestHandler> = Arc::new(NoopHandler);
        fixture.handlers.insert(rule.to_string(), handler.clone());
        fixture.router.add(rule, handler, Some(Arc::new(format!("tag:{rule}"))));
    }

    fn add_middlewares(fixture: &mut Fixture) {
        for rule in middleware_set() {
            let handler: Arc<dyn RequestHandler> = Arc::new(NoopHandler);
            fixture.middlewares.insert(rule.to_string(), handler.clone());
            fixture.router.append_middleware(rule, handler, Some(Arc::new(format!("tag:{rule}"))));
        }
    }

    fn expect_found(fixture: &Fixture, rule: &str, path: &str) -> RouteMatch {
        let result = fixture.router.find(path);
        let target = result.target().unwrap_or_else(|| panic!("no match for [{path}], wanted rule [{rule}]"));
        let expected = &fixture.handlers[rule];
        assert!(
            Arc::ptr_eq(target, expected),
            "path [{path}] matched the wrong rule, expected [{rule}]"
        );
        result
    }

    fn expect_not_found(fixture: &Fixture, rule: &str, path: &str) {
        let result = fixture.router.find(path);
        assert!(result.target().is_none(), "path [{path}] should not match (was testing rule [{rule}])");
    }

    fn expect_wildcards(fixture: &Fixture, rule: &str, path: &str, wildcards: &[&str], remaining: &[&str]) {
        let result = expect_found(fixture, rule, path);
        assert_eq!(result.wildcards(), wildcards, "wildcards for [{path}]");
        assert_eq!(result.remaining_segments(), remaining, "remaining segments for [{path}]");
    }

    fn expect_middlewares(fixture: &Fixture, path: &str, rules: &[&str]) {
        let result = fixture.router.find(path);
        let chain = result.middlewares();
        assert_eq!(chain.len(), rules.len(), "middleware count for [{path}]");
        for (i, rule) in rules.iter().enumerate() {
            assert!(
                Arc::ptr_eq(&chain[i], &fixture.middlewares[*rule]),
                "middleware {i} for [{path}] should come from [{rule}]"
            );
        }
    }

    fn assert_resolving(fixture: &Fixture) {
        expect_found(fixture, "/", "/");
        expect_found(fixture, "/products", "/products");
        expect_found(fixture, "/products/bedroom", "/products/bedroom");

        expect_found(fixture, "/clients", "/clients");
        expect_found(fixture, "/clients/", "/clients/");
        expect_found(fixture, "/clients/johan", "/clients/johan");

        expect_found(fixture, "/vip", "/vip");
        expect_found(fixture, "/vip/johan", "/vip/johan");

        expect_found(fixture, "/products/any/*", "/products/any/aa");
        expect_found(fixture, "/products/any/*", "/products/any/aa/bb");

        expect_found(fixture, "/products/listing1*", "/products/listing1fff");
        expect_found(fixture, "/products/listing1*/suiteA", "/products/listing1fff/suiteA");
        expect_found(fixture, "/products/listing1*/suiteB", "/products/listing1fff/suiteB");

        expect_found(fixture, "/products/listing1b*", "/products/listing1bfff");
        expect_found(fixture, "/products/listing1b*/suite1B", "/products/listing1bfff/suite1B");

        expect_found(fixture, "/products/listing2", "/products/listing2");
        expect_found(fixture, "/products/listing2/", "/products/listing2/");
        expect_found(fixture, "/products/listing2*", "/products/listing2fff");

        expect_found(fixture, "/wildcards/w1*/suite/w2*", "/wildcards/w1WD1/suite/w2WD2");
        expect_found(fixture, "/wildcards/w1*/suite/w2*/*", "/wildcards/w1WD1/suite/w2WD2/suite");

        // an empty suffix is a valid capture when no literal child claims
        // the segment
        expect_wildcards(fixture, "/products/listing1b*/suite1B", "/products/listing1b/suite1B", &[""], &[]);

        expect_not_found(fixture, "/products/listing2/", "/products/listing2/ko");

        // longest prefix wins, and a failed branch must not fall back to a
        // shorter prefix
        expect_not_found(fixture, "/products/listing1b*", "/products/listing1bfff/ko");
        expect_not_found(fixture, "/products/listing1b*/suite1B", "/products/listing1bfff/suite1B/ko");

        expect_not_found(fixture, "/clients/", "/clients/ko");

        // a catch-all expects at least one segment after its node
        expect_not_found(fixture, "/products/any/*", "/products/any");
        expect_not_found(fixture, "/products/any/*", "/products/any/");

        expect_wildcards(fixture, "/products/listing1*", "/products/listing1MY_WILDCARD", &["MY_WILDCARD"], &[]);
        expect_wildcards(
            fixture,
            "/products/listing1*/suiteA",
            "/products/listing1MY_WILDCARD/suiteA",
            &["MY_WILDCARD"],
            &[],
        );
        expect_wildcards(
            fixture,
            "/products/listing1b*/suite1B",
            "/products/listing1bMY_WILDCARD/suite1B",
            &["MY_WILDCARD"],
            &[],
        );

        expect_wildcards(
            fixture,
            "/wildcards/w1*/suite/w2*/*",
            "/wildcards/w1WD1/suite/w2WD2/suite1/suite2",
            &["WD1", "WD2"],
            &["suite1", "suite2"],
        );
    }

    fn assert_middlewares(fixture: &Fixture) {
        // exact middlewares
        expect_middlewares(fixture, "/clients", &["/clients"]);
        expect_middlewares(fixture, "/clients/", &["/clients/"]);
        expect_middlewares(fixture, "/clients/johan", &["/clients/johan"]);
        expect_middlewares(fixture, "/products/listing1fff/suiteA", &["/products/listing1*/suiteA"]);
        expect_middlewares(
            fixture,
            "/wildcards/w1WD1/suite/w2WD2",
            &["/wildcards/*", "/wildcards/w1*/suite/w2*"],
        );

        expect_middlewares(fixture, "/clients/unknown", &[]);

        // child middlewares exclude the node itself
        expect_middlewares(fixture, "/products", &[]);
        expect_middlewares(fixture, "/products/", &[]);
        expect_middlewares(fixture, "/products/any", &[]);
        expect_middlewares(fixture, "/products/any/", &[]);

        expect_middlewares(fixture, "/products/any/p1", &["/products/any/*"]);
        expect_middlewares(fixture, "/products/any/p1/p2", &["/products/any/*"]);
    }

    #[test]
    fn test_resolving() {
        let mut fixture = build_fixture();
        add_middlewares(&mut fixture);
        assert_resolving(&fixture);
    }

    #[test]
    fn test_middleware_chains() {
        let mut fixture = build_fixture();
        add_middlewares(&mut fixture);
        assert_middlewares(&fixture);
    }

    #[test]
    fn test_last_add_wins() {
        let mut fixture = build_fixture();
        add_rule(&mut fixture, "/products");
        expect_found(&fixture, "/products", "/products");
    }

    #[test]
    fn test_precedence_literal_over_prefix() {
        let fixture = build_fixture();
        // "/products/listing2" is registered both as a literal and as the
        // prefix rule "/products/listing2*"
        expect_found(&fixture, "/products/listing2", "/products/listing2");
        expect_found(&fixture, "/products/listing2*", "/products/listing2X");
    }

    #[test]
    fn test_catch_all_rescues_failed_branches() {
        let mut fixture = Fixture { router: Router::new(), handlers: HashMap::new(), middlewares: HashMap::new() };
        add_rule(&mut fixture, "/api/*");
        add_rule(&mut fixture, "/api/users/list");

        expect_found(&fixture, "/api/users/list", "/api/users/list");
        // "/api/users/detail" walks into the literal "users" branch, fails,
        // and backtracks into the catch-all
        expect_found(&fixture, "/api/*", "/api/users/detail");
    }

    #[test]
    fn test_wildcard_order_is_root_to_leaf() {
        let mut fixture = Fixture { router: Router::new(), handlers: HashMap::new(), middlewares: HashMap::new() };
        add_rule(&mut fixture, "/a*/b/c*");
        expect_wildcards(&fixture, "/a*/b/c*", "/aX/b/cY", &["X", "Y"], &[]);
    }

    fn rebuild_from_dump(fixture: &Fixture) -> Fixture {
        let mut rebuilt =
            Fixture { router: Router::new(), handlers: fixture.handlers.clone(), middlewares: fixture.middlewares.clone() };
        for item in fixture.router.dump_tree() {
            match item.path.strip_prefix('@') {
                Some(path) => rebuilt.router.append_middleware(path, item.handler.clone(), item.tag.clone()),
                None => rebuilt.router.add(&item.path, item.handler.clone(), item.tag.clone()),
            }
        }
        rebuilt
    }

    #[test]
    fn test_tree_dump_round_trip() {
        let fixture = build_fixture();
        let tree = fixture.router.dump_tree();

        // every handler line carries its registration tag
        for item in &tree {
            if !item.path.starts_with('@') {
                let tag = item.tag.as_ref().expect("handler items keep their tag");
                let tag = tag.downcast_ref::<String>().expect("tags in this test are strings");
                assert_eq!(tag, &format!("tag:{}", item.path));
            }
        }

        let mut dumped: Vec<String> =
            tree.iter().filter(|i| !i.path.starts_with('@')).map(|i| i.path.clone()).collect();
        dumped.sort();
        let mut expected: Vec<String> = rule_set().iter().map(|r| r.to_string()).collect();
        expected.sort();
        assert_eq!(dumped, expected);

        let rebuilt = rebuild_from_dump(&fixture);
        assert_resolving(&rebuilt);
    }

    #[test]
    fn test_tree_dump_round_trip_with_middlewares() {
        let mut fixture = build_fixture();
        add_middlewares(&mut fixture);

        let rebuilt = rebuild_from_dump(&fixture);
        assert_resolving(&rebuilt);
        assert_middlewares(&rebuilt);
    }
}
