use crate::handler::{RequestHandler, RouteTag};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{RouteMatch, TreeItem};

/// An ordered middleware chain, shared between the tree and match results.
pub(crate) type MiddlewareChain = Arc<[Arc<dyn RequestHandler>]>;

pub(crate) fn empty_chain() -> MiddlewareChain {
    Arc::from(Vec::new())
}

/// A handler bound to a node, with its registration tag.
pub(crate) struct RouteTarget {
    pub(crate) handler: Arc<dyn RequestHandler>,
    pub(crate) tag: Option<RouteTag>,
}

/// A middleware bound to a node, with its registration tag.
pub(crate) struct MiddlewareEntry {
    pub(crate) handler: Arc<dyn RequestHandler>,
    pub(crate) tag: Option<RouteTag>,
}

/// One position in the path hierarchy.
///
/// `exact_chain` and `catch_all_chain` are derived data: the first is the
/// concatenation of the ancestors' `child_middlewares` (root first) with this
/// node's `exact_middlewares`, the second swaps in this node's
/// `child_middlewares`. Every mutation that can invalidate them rebuilds them
/// before returning, so `find` never recomputes anything.
pub(crate) struct PathNode {
    /// Canonical path from the root to this node, for diagnostics and dumps.
    path_prefix: String,

    exact: Option<RouteTarget>,
    catch_all: Option<RouteTarget>,

    segment_children: HashMap<String, Box<PathNode>>,
    prefix_children: HashMap<String, Box<PathNode>>,
    /// Prefix keys sorted longest first, ties broken lexically descending.
    ordered_prefixes: Vec<String>,

    exact_middlewares: Vec<MiddlewareEntry>,
    child_middlewares: Vec<MiddlewareEntry>,

    exact_chain: MiddlewareChain,
    catch_all_chain: MiddlewareChain,
}

impl PathNode {
    pub(crate) fn new(path_prefix: String) -> Self {
        Self {
            path_prefix,
            exact: None,
            catch_all: None,
            segment_children: HashMap::new(),
            prefix_children: HashMap::new(),
            ordered_prefixes: Vec::new(),
            exact_middlewares: Vec::new(),
            child_middlewares: Vec::new(),
            exact_chain: empty_chain(),
            catch_all_chain: empty_chain(),
        }
    }

    /// Walks or creates the nodes for `segments` and binds `target` at the
    /// end. `inherited` carries the ancestors' `child_middlewares` so the
    /// terminal node can rebuild its chain caches without back references.
    pub(crate) fn add_path(
        &mut self,
        segments: &[&str],
        path_prefix: &str,
        inherited: &mut Vec<Arc<dyn RequestHandler>>,
        target: RouteTarget,
    ) {
        let Some((&s0, rest)) = segments.split_first() else {
            self.exact = Some(target);
            self.rebuild_chains(inherited);
            return;
        };

        if s0 == "*" && rest.is_empty() {
            self.catch_all = Some(target);
            self.rebuild_chains(inherited);
            return;
        }

        let child_prefix = format!("{}/{}", path_prefix, s0);
        let depth = inherited.len();
        inherited.extend(self.child_middlewares.iter().map(|e| e.handler.clone()));

        let child = self.child_for_segment(s0, &child_prefix);
        child.add_path(rest, &child_prefix, inherited, target);
        inherited.truncate(depth);
    }

    /// Registers a middleware at the node addressed by `segments`.
    ///
    /// With `exact_match`, the middleware only applies when that node matches
    /// exactly; otherwise it applies to every descendant match, and the chain
    /// caches of the whole subtree are rebuilt.
    pub(crate) fn append_middleware(
        &mut self,
        segments: &[&str],
        path_prefix: &str,
        inherited: &mut Vec<Arc<dyn RequestHandler>>,
        entry: MiddlewareEntry,
        exact_match: bool,
    ) {
        let Some((&s0, rest)) = segments.split_first() else {
            if exact_match {
                self.exact_middlewares.push(entry);
                self.rebuild_chains(inherited);
            } else {
                self.child_middlewares.push(entry);
                self.rebuild_subtree(inherited);
            }
            return;
        };

        if s0 == "*" && rest.is_empty() {
            // the "/*" suffix is stripped before descending, so a bare "*"
            // cannot reach this point through the public surface
            return;
        }

        let child_prefix = format!("{}/{}", path_prefix, s0);
        let depth = inherited.len();
        inherited.extend(self.child_middlewares.iter().map(|e| e.handler.clone()));

        let child = self.child_for_segment(s0, &child_prefix);
        child.append_middleware(rest, &child_prefix, inherited, entry, exact_match);
        inherited.truncate(depth);
    }

    /// Finds or creates the child for one registration segment, descending
    /// through `prefix_children` when the segment carries a trailing `*`.
    fn child_for_segment(&mut self, segment: &str, child_prefix: &str) -> &mut PathNode {
        if let Some(prefix) = segment.strip_suffix('*') {
            if prefix.is_empty() {
                // an empty prefix key would shadow every segment
                warn!(segment, "bare '*' is only valid as the final segment, matching it literally");
            } else {
                if !self.prefix_children.contains_key(prefix) {
                    self.prefix_children.insert(prefix.to_string(), Box::new(PathNode::new(child_prefix.to_string())));
                    self.reorder_prefixes();
                }
                return self.prefix_children.get_mut(prefix).expect("inserted above");
            }
        }

        self.segment_children
            .entry(segment.to_string())
            .or_insert_with(|| Box::new(PathNode::new(child_prefix.to_string())))
    }

    fn reorder_prefixes(&mut self) {
        let mut keys: Vec<String> = self.prefix_children.keys().cloned().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| b.cmp(a)));
        self.ordered_prefixes = keys;
    }

    /// Rebuilds this node's chain caches from the ancestors' inherited chain.
    fn rebuild_chains(&mut self, inherited: &[Arc<dyn RequestHandler>]) {
        self.exact_chain = concat_chain(inherited, &self.exact_middlewares);
        self.catch_all_chain = concat_chain(inherited, &self.child_middlewares);
    }

    /// Rebuilds the chain caches of this node and every descendant, top-down.
    fn rebuild_subtree(&mut self, inherited: &mut Vec<Arc<dyn RequestHandler>>) {
        self.rebuild_chains(inherited);

        let depth = inherited.len();
        inherited.extend(self.child_middlewares.iter().map(|e| e.handler.clone()));
        for child in self.prefix_children.values_mut() {
            child.rebuild_subtree(inherited);
        }
        for child in self.segment_children.values_mut() {
            child.rebuild_subtree(inherited);
        }
        inherited.truncate(depth);
    }

    /// Resolves `segments` against this subtree.
    ///
    /// Rule order: exhausted segments take the exact handler; then a literal
    /// child; then the longest matching prefix child (a single candidate,
    /// captured on the unwind so wildcards come out leaf first); then the
    /// catch-all. A failed branch backtracks to the next rule.
    pub(crate) fn find(&self, segments: &[&str], result: &mut RouteMatch) -> bool {
        let Some((&s0, rest)) = segments.split_first() else {
            let Some(target) = &self.exact else {
                return false;
            };
            result.target = Some(target.handler.clone());
            result.middlewares = self.exact_chain.clone();
            return true;
        };

        if let Some(child) = self.segment_children.get(s0) {
            if child.find(rest, result) {
                return true;
            }
        }

        for prefix in &self.ordered_prefixes {
            if let Some(suffix) = s0.strip_prefix(prefix.as_str()) {
                if let Some(child) = self.prefix_children.get(prefix) {
                    if child.find(rest, result) {
                        result.raw_wildcards.push(suffix.to_string());
                        return true;
                    }
                }
                // only the longest matching prefix is ever tried
                break;
            }
        }

        if let Some(target) = &self.catch_all {
            if !s0.is_empty() && s0 != "/" {
                result.target = Some(target.handler.clone());
                result.middlewares = self.catch_all_chain.clone();
                result.remaining = segments.iter().map(|s| s.to_string()).collect();
                return true;
            }
        }

        false
    }

    /// Serializes this subtree as replayable `(path, handler, tag)` items.
    pub(crate) fn dump_tree(&self, tree: &mut Vec<TreeItem>) {
        let display_prefix = if self.path_prefix.is_empty() { "/" } else { self.path_prefix.as_str() };

        if let Some(target) = &self.exact {
            tree.push(TreeItem {
                path: display_prefix.to_string(),
                handler: target.handler.clone(),
                tag: target.tag.clone(),
            });
        }

        if let Some(target) = &self.catch_all {
            tree.push(TreeItem {
                path: format!("{}/*", self.path_prefix),
                handler: target.handler.clone(),
                tag: target.tag.clone(),
            });
        }

        for entry in &self.exact_middlewares {
            tree.push(TreeItem {
                path: format!("@{}", display_prefix),
                handler: entry.handler.clone(),
                tag: entry.tag.clone(),
            });
        }

        for entry in &self.child_middlewares {
            tree.push(TreeItem {
                path: format!("@{}/*", self.path_prefix),
                handler: entry.handler.clone(),
                tag: entry.tag.clone(),
            });
        }

        for key in sorted_keys(&self.prefix_children) {
            self.prefix_children[&key].dump_tree(tree);
        }
        for key in sorted_keys(&self.segment_children) {
            self.segment_children[&key].dump_tree(tree);
        }
    }

    /// Logs this subtree through `tracing`, one line per node.
    pub(crate) fn log_tree(&self, indent: &str) {
        let mut info = String::new();
        if self.exact.is_some() {
            info.push_str("[exact]");
        }
        if self.catch_all.is_some() {
            info.push_str("[catch-all]");
        }
        if !self.exact_middlewares.is_empty() {
            info.push_str(&format!("[exact middlewares ({})]", self.exact_middlewares.len()));
        }
        if !self.child_middlewares.is_empty() {
            info.push_str(&format!("[child middlewares ({})]", self.child_middlewares.len()));
        }
        if info.is_empty() {
            info.push_str("[empty]");
        }

        let url = if self.path_prefix.is_empty() { "/" } else { self.path_prefix.as_str() };
        debug!("{}|- {} {}", indent, url, info);

        let deeper = format!("{}   ", indent);
        for key in sorted_keys(&self.prefix_children) {
            self.prefix_children[&key].log_tree(&deeper);
        }
        for key in sorted_keys(&self.segment_children) {
            self.segment_children[&key].log_tree(&deeper);
        }
    }
}

fn concat_chain(inherited: &[Arc<dyn RequestHandler>], own: &[MiddlewareEntry]) -> MiddlewareChain {
    let mut chain: Vec<Arc<dyn RequestHandler>> = Vec::with_capacity(inherited.len() + own.len());
    chain.extend(inherited.iter().cloned());
    chain.extend(own.iter().map(|e| e.handler.clone()));
    Arc::from(chain)
}

fn sorted_keys(map: &HashMap<String, Box<PathNode>>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}
