//! Arena-indexed parse trees.
//!
//! Every node lives in a flat `Vec` owned by its tree and is addressed by a
//! stable [`NodeId`]. Trees are built bottom-up with [`TreeBuilder`]; the last
//! node pushed becomes the root unless another root is given.

use std::fmt;

/// Index of a node inside its owning [`ParseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A variable hypothesis leaf (`ph`, `A`, ...).
    Var,
    /// A work variable leaf (`&W1`, ...), created by the host proof assistant.
    WorkVar,
    /// A syntax axiom application.
    Syntax,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
    /// Syntax axiom label for syntax nodes, variable symbol for leaves.
    pub label: String,
    /// Type code produced by this node (`wff`, `class`, ...).
    pub typ: String,
    pub kind: NodeKind,
    children: Vec<NodeId>,
}

impl ParseNode {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_var(&self) -> bool {
        matches!(self.kind, NodeKind::Var | NodeKind::WorkVar)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    nodes: Vec<ParseNode>,
    root: NodeId,
}

/// A node addressed together with the tree that owns it.
#[derive(Debug, Clone, Copy)]
pub struct SubtreeRef<'a> {
    pub tree: &'a ParseTree,
    pub node: NodeId,
}

impl<'a> SubtreeRef<'a> {
    pub fn root_of(tree: &'a ParseTree) -> Self {
        Self {
            tree,
            node: tree.root(),
        }
    }

    pub fn get(&self) -> &'a ParseNode {
        self.tree.node(self.node)
    }

    /// Structural equality of two subtrees, possibly in different trees.
    pub fn deep_eq(&self, other: &SubtreeRef<'_>) -> bool {
        let mut stack = vec![(self.node, other.node)];
        while let Some((left, right)) = stack.pop() {
            let a = self.tree.node(left);
            let b = other.tree.node(right);
            if a.label != b.label
                || a.typ != b.typ
                || a.kind != b.kind
                || a.children.len() != b.children.len()
            {
                return false;
            }
            stack.extend(a.children.iter().copied().zip(b.children.iter().copied()));
        }
        true
    }
}

impl ParseTree {
    /// Convenience constructor for a tree that is a single variable leaf.
    pub fn var(typ: &str, symbol: &str) -> Self {
        let mut builder = TreeBuilder::new();
        let root = builder.var(typ, symbol);
        builder.finish(root)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &ParseNode {
        &self.nodes[id.index()]
    }

    pub fn root_node(&self) -> &ParseNode {
        self.node(self.root)
    }

    pub fn root_type(&self) -> &str {
        &self.root_node().typ
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Height of the tree. Work variables count as depth 0, every other leaf as 1.
    pub fn max_depth(&self) -> usize {
        self.depth_of(self.root)
    }

    fn depth_of(&self, id: NodeId) -> usize {
        // children always precede their parent in the arena, so one forward pass suffices
        let mut depth = vec![0usize; id.index() + 1];
        for (index, node) in self.nodes.iter().enumerate().take(id.index() + 1) {
            depth[index] = match node.kind {
                NodeKind::WorkVar => 0,
                _ => {
                    1 + node
                        .children
                        .iter()
                        .map(|child| depth[child.index()])
                        .max()
                        .unwrap_or(0)
                }
            };
        }
        depth[id.index()]
    }

    /// Root label followed by the labels of the root's children, space separated.
    ///
    /// Empty when the root or any direct child is a variable, which means the
    /// tree can overlay anything at the top two levels.
    pub fn level_one_two(&self) -> String {
        let root = self.root_node();
        if root.is_var() {
            return String::new();
        }
        let mut key = root.label.clone();
        for child in &root.children {
            let child = self.node(*child);
            if child.is_var() {
                return String::new();
            }
            key.push(' ');
            key.push_str(&child.label);
        }
        key
    }

    /// Distinct variable symbols in first-occurrence order.
    pub fn variables(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = Vec::new();
        for id in self.preorder(self.root) {
            let node = self.node(id);
            if node.is_var() && !vars.contains(&node.label.as_str()) {
                vars.push(&node.label);
            }
        }
        vars
    }

    /// Depth-first, pre-order walk of the subtree rooted at `start`.
    pub fn preorder(&self, start: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![start],
            skip_vars: false,
        }
    }

    /// Every sub-expression of the tree, root first.
    ///
    /// With `skip_vars` set, bare variable leaves are not yielded.
    pub fn subexpressions(&self, skip_vars: bool) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![self.root],
            skip_vars,
        }
    }

    /// Copies the subtree rooted at `id` into a standalone tree.
    pub fn subtree(&self, id: NodeId) -> ParseTree {
        let mut builder = TreeBuilder::new();
        let root = builder.copy_from(SubtreeRef { tree: self, node: id }, &|_| None);
        builder.finish(root)
    }

    /// Rebuilds the tree replacing each variable for which `lookup` returns a
    /// tree by a copy of that tree.
    pub fn substitute<'s>(&self, lookup: &dyn Fn(&str) -> Option<&'s ParseTree>) -> ParseTree {
        let mut builder = TreeBuilder::new();
        let root = builder.copy_from(SubtreeRef::root_of(self), lookup);
        builder.finish(root)
    }
}

impl fmt::Display for ParseTree {
    /// Renders the tree in prefix (RPN-reversed) notation, mainly for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(tree: &ParseTree, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let node = tree.node(id);
            if node.children.is_empty() {
                return f.write_str(&node.label);
            }
            write!(f, "({}", node.label)?;
            for child in &node.children {
                f.write_str(" ")?;
                write_node(tree, *child, f)?;
            }
            f.write_str(")")
        }
        write_node(self, self.root, f)
    }
}

pub struct Preorder<'a> {
    tree: &'a ParseTree,
    stack: Vec<NodeId>,
    skip_vars: bool,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let node = self.tree.node(id);
            self.stack.extend(node.children.iter().rev().copied());
            if self.skip_vars && node.is_var() {
                continue;
            }
            return Some(id);
        }
        None
    }
}

/// Bottom-up builder for [`ParseTree`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<ParseNode>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: ParseNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn var(&mut self, typ: &str, symbol: &str) -> NodeId {
        self.push(ParseNode {
            label: symbol.to_string(),
            typ: typ.to_string(),
            kind: NodeKind::Var,
            children: Vec::new(),
        })
    }

    pub fn work_var(&mut self, typ: &str, symbol: &str) -> NodeId {
        self.push(ParseNode {
            label: symbol.to_string(),
            typ: typ.to_string(),
            kind: NodeKind::WorkVar,
            children: Vec::new(),
        })
    }

    /// Pushes a syntax node. Children must already have been pushed.
    pub fn syntax(&mut self, label: &str, typ: &str, children: Vec<NodeId>) -> NodeId {
        self.push(ParseNode {
            label: label.to_string(),
            typ: typ.to_string(),
            kind: NodeKind::Syntax,
            children,
        })
    }

    fn copy_from<'s>(
        &mut self,
        source: SubtreeRef<'_>,
        lookup: &dyn Fn(&str) -> Option<&'s ParseTree>,
    ) -> NodeId {
        let node = source.get();
        if node.is_var() {
            if let Some(replacement) = lookup(&node.label) {
                return self.copy_from(SubtreeRef::root_of(replacement), &|_| None);
            }
        }
        let children = node
            .children
            .iter()
            .map(|child| {
                self.copy_from(
                    SubtreeRef {
                        tree: source.tree,
                        node: *child,
                    },
                    lookup,
                )
            })
            .collect();
        self.push(ParseNode {
            label: node.label.clone(),
            typ: node.typ.clone(),
            kind: node.kind,
            children,
        })
    }

    pub fn finish(self, root: NodeId) -> ParseTree {
        ParseTree {
            nodes: self.nodes,
            root,
        }
    }
}
