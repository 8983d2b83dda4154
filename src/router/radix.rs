//! Radix tree implementation for HTTP route matching
//!
//! This module provides a radix tree (also called compact prefix tree) whose
//! edges are either literal character runs or single typed capture slots.
//!
//! ## Implementation Details
//!
//! - **Static nodes** hold a literal run. Sibling static nodes never share a
//!   leading character; a common prefix is always factored out into a parent.
//! - **Parameter nodes** hold a parameter name and its convertor. A node has at
//!   most one parameter child, so a capture slot has exactly one shape.
//! - Routes live on terminal nodes, at most one per node.
//!
//! Lookup is a depth-first walk over an explicit stack of `(cursor, node)`
//! frames. Parameter children are pushed before static children, so static
//! children are popped first and `/project/top` wins over `/project/{id}`.
//! Every frame consumes at least one byte of the path, so the walk is bounded
//! by the path length.
//!
//! ## Example
//!
//! For `/hello/a`, `/hello/b` and `/hello/{name}` the tree is:
//!
//! ```text
//! /
//!   hello/
//!     {name:str}  -> /hello/{name}
//!     b  -> /hello/b
//!     a  -> /hello/a
//! ```

use smallvec::{smallvec, SmallVec};
use std::mem;
use std::sync::Arc;

use super::core::{Route, MAX_INLINE_PARAMS};
use crate::error::RouteError;
use crate::path::{CompiledPath, Convertor, PathSegment};

/// Pending frames kept on the stack before spilling to the heap
const MAX_INLINE_FRAMES: usize = 16;

#[derive(Debug)]
enum NodeKind {
    Static(String),
    Param {
        name: Arc<str>,
        /// Registry tag; two slots are the same shape when name and tag agree
        tag: Arc<str>,
        convertor: Arc<dyn Convertor>,
    },
}

/// Node in the radix tree
#[derive(Debug)]
struct RadixNode<H> {
    kind: NodeKind,
    /// Route terminating exactly at this node
    route: Option<Route<H>>,
    /// Most recently created child first
    children: Vec<RadixNode<H>>,
}

impl<H> RadixNode<H> {
    fn new_static(text: &str) -> Self {
        Self {
            kind: NodeKind::Static(text.to_owned()),
            route: None,
            children: Vec::new(),
        }
    }

    fn new_param(name: &Arc<str>, tag: &Arc<str>, convertor: &Arc<dyn Convertor>) -> Self {
        Self {
            kind: NodeKind::Param {
                name: Arc::clone(name),
                tag: Arc::clone(tag),
                convertor: Arc::clone(convertor),
            },
            route: None,
            children: Vec::new(),
        }
    }

    fn literal(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Static(text) => Some(text),
            NodeKind::Param { .. } => None,
        }
    }

    fn is_param(&self) -> bool {
        matches!(self.kind, NodeKind::Param { .. })
    }

    /// Static child sharing a non-empty prefix with `rest`, with the shared length
    fn static_child(&self, rest: &str) -> Option<(usize, usize)> {
        self.children.iter().enumerate().find_map(|(i, child)| {
            let shared = common_prefix_len(child.literal()?, rest);
            (shared > 0).then_some((i, shared))
        })
    }

    fn param_child(&self) -> Option<usize> {
        self.children.iter().position(RadixNode::is_param)
    }

    /// Keep the first `at` bytes of the literal here and push the rest,
    /// together with the route and children, down into a new single child.
    fn split_at(&mut self, at: usize) {
        let NodeKind::Static(text) = &mut self.kind else {
            return;
        };
        let suffix = text.split_off(at);
        let tail = RadixNode {
            kind: NodeKind::Static(suffix),
            route: self.route.take(),
            children: mem::take(&mut self.children),
        };
        self.children = vec![tail];
    }

    fn label(&self) -> String {
        match &self.kind {
            NodeKind::Static(text) => text.clone(),
            NodeKind::Param { name, tag, .. } => format!("{{{name}:{tag}}}"),
        }
    }
}

/// Byte length of the longest common prefix, on a char boundary
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(c, _)| c.len_utf8())
        .sum()
}

/// A compiled pattern seen as the sequence of edges to walk below the root
enum Slot<'a> {
    Static(&'a str),
    Param(&'a Arc<str>, &'a Arc<str>, &'a Arc<dyn Convertor>),
}

fn slots(compiled: &CompiledPath) -> impl Iterator<Item = Slot<'_>> {
    compiled
        .segments
        .iter()
        .enumerate()
        .filter_map(|(i, segment)| match segment {
            // The root node already holds the leading '/'
            PathSegment::Static(text) if i == 0 => {
                Some(Slot::Static(text.strip_prefix('/').unwrap_or(text.as_str())))
            }
            PathSegment::Static(text) => Some(Slot::Static(text.as_str())),
            PathSegment::Param { index, tag } => compiled
                .convertors
                .get(*index)
                .map(|(name, convertor)| Slot::Param(name, tag, convertor)),
        })
}

fn param_shape(name: &str, tag: &str) -> String {
    format!("{name}:{tag}")
}

/// A capture recorded while walking the tree
pub(crate) struct Capture<'t> {
    pub name: &'t Arc<str>,
    pub convertor: &'t Arc<dyn Convertor>,
    pub start: usize,
    pub end: usize,
}

pub(crate) type Captures<'t> = SmallVec<[Capture<'t>; MAX_INLINE_PARAMS]>;

struct Frame<'t, H> {
    cursor: usize,
    node: &'t RadixNode<H>,
    /// Number of captures belonging to the ancestors of `node`
    depth: usize,
}

/// Radix tree owning every registered route
#[derive(Debug)]
pub(crate) struct RadixTree<H> {
    root: RadixNode<H>,
    len: usize,
}

impl<H> RadixTree<H> {
    pub fn new() -> Self {
        Self {
            root: RadixNode::new_static("/"),
            len: 0,
        }
    }

    /// Number of routes in the tree
    pub fn len(&self) -> usize {
        self.len
    }

    /// Verify that `compiled` can be inserted without touching the tree.
    ///
    /// Fails with `ConflictingParameter` when a capture slot on the way is
    /// already taken by a different shape, and with `DuplicateRoute` when the
    /// terminal node already carries a route.
    pub fn check(&self, compiled: &CompiledPath) -> Result<(), RouteError> {
        let mut node = &self.root;
        let mut position = String::from("/");

        for slot in slots(compiled) {
            match slot {
                Slot::Static(mut rest) => {
                    while !rest.is_empty() {
                        let Some((i, shared)) = node.static_child(rest) else {
                            return Ok(());
                        };
                        let child = &node.children[i];
                        if child.literal().map_or(0, str::len) != shared {
                            // The edge will be split; everything below is new
                            return Ok(());
                        }
                        position.push_str(&rest[..shared]);
                        rest = &rest[shared..];
                        node = child;
                    }
                }
                Slot::Param(name, tag, _) => {
                    let Some(i) = node.param_child() else {
                        return Ok(());
                    };
                    let child = &node.children[i];
                    if let NodeKind::Param {
                        name: existing_name,
                        tag: existing_tag,
                        ..
                    } = &child.kind
                    {
                        if existing_name != name || existing_tag != tag {
                            return Err(RouteError::ConflictingParameter {
                                position,
                                existing: param_shape(existing_name, existing_tag),
                                incoming: param_shape(name, tag),
                            });
                        }
                    }
                    position.push('{');
                    position.push_str(name);
                    position.push('}');
                    node = child;
                }
            }
        }

        if node.route.is_some() {
            return Err(RouteError::DuplicateRoute {
                pattern: compiled.normalized.clone(),
            });
        }
        Ok(())
    }

    /// Insert `route`, splitting edges as needed
    pub fn insert(&mut self, route: Route<H>) -> Result<(), RouteError> {
        self.check(&route.compiled)?;

        let mut node = &mut self.root;
        for slot in slots(&route.compiled) {
            match slot {
                Slot::Static(mut rest) => {
                    while !rest.is_empty() {
                        match node.static_child(rest) {
                            Some((i, shared)) => {
                                let child_len = node.children[i].literal().map_or(0, str::len);
                                if shared < child_len {
                                    node.children[i].split_at(shared);
                                }
                                rest = &rest[shared..];
                                node = &mut node.children[i];
                            }
                            None => {
                                node.children.insert(0, RadixNode::new_static(rest));
                                rest = "";
                                node = &mut node.children[0];
                            }
                        }
                    }
                }
                Slot::Param(name, tag, convertor) => {
                    let i = match node.param_child() {
                        Some(i) => i,
                        None => {
                            node.children
                                .insert(0, RadixNode::new_param(name, tag, convertor));
                            0
                        }
                    };
                    node = &mut node.children[i];
                }
            }
        }

        node.route = Some(route);
        self.len += 1;
        Ok(())
    }

    /// The route registered for exactly this compiled pattern, if any
    pub fn find_mut(&mut self, compiled: &CompiledPath) -> Option<&mut Route<H>> {
        let mut node = &mut self.root;
        for slot in slots(compiled) {
            match slot {
                Slot::Static(mut rest) => {
                    while !rest.is_empty() {
                        let i = node
                            .children
                            .iter()
                            .position(|c| c.literal().is_some_and(|l| rest.starts_with(l)))?;
                        let len = node.children[i].literal().map_or(0, str::len);
                        rest = &rest[len..];
                        node = &mut node.children[i];
                    }
                }
                Slot::Param(..) => {
                    let i = node.param_child()?;
                    node = &mut node.children[i];
                }
            }
        }
        node.route.as_mut()
    }

    /// Find the route matching `path` and the raw captures along the way
    pub fn search<'t>(&'t self, path: &str) -> Option<(&'t Route<H>, Captures<'t>)> {
        let mut stack: SmallVec<[Frame<'t, H>; MAX_INLINE_FRAMES]> = smallvec![Frame {
            cursor: 0,
            node: &self.root,
            depth: 0,
        }];
        let mut captures = Captures::new();

        while let Some(Frame {
            cursor,
            node,
            depth,
        }) = stack.pop()
        {
            // Drop captures left behind by an abandoned sibling branch
            captures.truncate(depth);
            let rest = &path[cursor..];

            let consumed = match &node.kind {
                NodeKind::Static(text) => {
                    if !rest.starts_with(text.as_str()) {
                        continue;
                    }
                    text.len()
                }
                NodeKind::Param {
                    name, convertor, ..
                } => match convertor.match_prefix(rest) {
                    Ok(matched) if !matched.is_empty() && rest.is_char_boundary(matched.len()) => {
                        captures.push(Capture {
                            name,
                            convertor,
                            start: cursor,
                            end: cursor + matched.len(),
                        });
                        matched.len()
                    }
                    _ => continue,
                },
            };

            let cursor = cursor + consumed;
            if cursor == path.len() {
                if let Some(route) = &node.route {
                    return Some((route, captures));
                }
                continue;
            }

            let depth = captures.len();
            for child in node.children.iter().filter(|c| c.is_param()) {
                stack.push(Frame {
                    cursor,
                    node: child,
                    depth,
                });
            }
            for child in node.children.iter().rev().filter(|c| !c.is_param()) {
                stack.push(Frame {
                    cursor,
                    node: child,
                    depth,
                });
            }
        }
        None
    }

    /// Every route, in depth-first order
    pub fn routes(&self) -> Vec<&Route<H>> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if let Some(route) = &node.route {
                out.push(route);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Indented rendering of the tree, one node per line
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(0usize, &self.root)];
        while let Some((level, node)) = stack.pop() {
            out.push_str(&"  ".repeat(level));
            out.push_str(&node.label());
            if let Some(route) = &node.route {
                out.push_str("  -> ");
                out.push_str(route.normalized());
            }
            out.push('\n');
            stack.extend(node.children.iter().rev().map(|c| (level + 1, c)));
        }
        out
    }
}

impl<H> Default for RadixTree<H> {
    fn default() -> Self {
        Self::new()
    }
}
