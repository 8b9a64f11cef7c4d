//! Search-oriented tree unification.
//!
//! A *general* tree unifies with an *instance* tree when every variable of the
//! general side can be replaced by a subtree of the instance side, consistently
//! across repeated occurrences, so that both become identical. Only the general
//! side binds; variables on the instance side behave like constants.

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use crate::tree::{ParseTree, SubtreeRef};

/// Variable bindings produced by a successful unification, keyed by the
/// variable symbol of the general side.
pub type Bindings<'a> = FnvHashMap<&'a str, SubtreeRef<'a>>;

/// Relational operator applied by the tree matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelOp {
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "==")]
    EqEq,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<>")]
    LtGt,
}

impl RelOp {
    pub const ALL: [RelOp; 7] = [
        RelOp::Le,
        RelOp::Lt,
        RelOp::Eq,
        RelOp::EqEq,
        RelOp::Ge,
        RelOp::Gt,
        RelOp::LtGt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Le => "<=",
            Self::Lt => "<",
            Self::Eq => "=",
            Self::EqEq => "==",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::LtGt => "<>",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == text)
    }
}

/// Unifies `general` against `instance`, extending `bindings`.
///
/// On failure `bindings` may hold partial entries; callers that retry should
/// start from a fresh map.
pub fn unify_subtree<'a>(
    general: SubtreeRef<'a>,
    instance: SubtreeRef<'a>,
    bindings: &mut Bindings<'a>,
) -> bool {
    let mut stack = vec![(general.node, instance.node)];
    while let Some((g, i)) = stack.pop() {
        let g_node = general.tree.node(g);
        let target = SubtreeRef {
            tree: instance.tree,
            node: i,
        };
        let i_node = target.get();
        if g_node.is_var() {
            if g_node.typ != i_node.typ {
                return false;
            }
            match bindings.get(g_node.label.as_str()) {
                Some(bound) => {
                    if !bound.deep_eq(&target) {
                        return false;
                    }
                }
                None => {
                    bindings.insert(g_node.label.as_str(), target);
                }
            }
            continue;
        }
        if i_node.is_var()
            || g_node.label != i_node.label
            || g_node.children().len() != i_node.children().len()
        {
            return false;
        }
        stack.extend(
            g_node
                .children()
                .iter()
                .copied()
                .zip(i_node.children().iter().copied()),
        );
    }
    true
}

/// Unifies two subtrees from scratch, returning the bindings on success.
pub fn unify<'a>(general: SubtreeRef<'a>, instance: SubtreeRef<'a>) -> Option<Bindings<'a>> {
    let mut bindings = Bindings::default();
    unify_subtree(general, instance, &mut bindings).then_some(bindings)
}

/// Cheap rejection test for whole-statement unification.
///
/// The general tree's top two levels must equal the instance's unless a
/// variable occurs there, and the general tree cannot be deeper.
pub fn level_and_depth_compatible(general: &ParseTree, instance: &ParseTree) -> bool {
    let key = general.level_one_two();
    if !key.is_empty() && key != instance.level_one_two() {
        return false;
    }
    let instance_depth = instance.max_depth();
    instance_depth == 0 || general.max_depth() <= instance_depth
}

/// Whole-statement unification with the level/depth prefilter applied.
pub fn unify_statement<'a>(general: &'a ParseTree, instance: &'a ParseTree) -> Option<Bindings<'a>> {
    if general.root_type() != instance.root_type() || !level_and_depth_compatible(general, instance)
    {
        return None;
    }
    unify(SubtreeRef::root_of(general), SubtreeRef::root_of(instance))
}

/// True when the bindings are a one-to-one renaming of `var_count` variables.
fn is_renaming(bindings: &Bindings<'_>, var_count: usize) -> bool {
    if bindings.len() != var_count {
        return false;
    }
    let mut targets: Vec<&str> = Vec::with_capacity(bindings.len());
    for bound in bindings.values() {
        let node = bound.get();
        if !node.is_var() {
            return false;
        }
        if !targets.contains(&node.label.as_str()) {
            targets.push(&node.label);
        }
    }
    targets.len() == var_count
}

/// Matches a search term against a whole assertion formula tree.
///
/// `<=` holds when the term is an instance of the assertion; `>=` when the
/// assertion is an instance of the term.
pub fn matches_statement(op: RelOp, assertion: &ParseTree, term: &ParseTree) -> bool {
    let var_count = term.variables().len();
    let narrower = || unify_statement(assertion, term);
    let wider = || unify_statement(term, assertion);
    match op {
        RelOp::Le => narrower().is_some(),
        RelOp::Lt => narrower().is_some_and(|b| !is_renaming(&b, var_count)),
        RelOp::Eq => narrower().is_some_and(|b| is_renaming(&b, var_count)),
        RelOp::EqEq => narrower().is_some_and(|b| {
            is_renaming(&b, var_count)
                && SubtreeRef::root_of(assertion).deep_eq(&SubtreeRef::root_of(term))
        }),
        RelOp::Ge => wider().is_some(),
        RelOp::Gt => wider().is_some_and(|b| !is_renaming(&b, var_count)),
        RelOp::LtGt => {
            matches_statement(RelOp::Lt, assertion, term)
                || matches_statement(RelOp::Gt, assertion, term)
        }
    }
}

/// Matches a search term against every sub-expression of an assertion tree.
///
/// Bare variable sub-expressions are only considered when the term itself is a
/// bare variable. Operators other than `<=` and `>=` decide on the first
/// sub-expression that unifies.
pub fn matches_expression(op: RelOp, assertion: &ParseTree, term: &ParseTree) -> bool {
    let var_count = term.variables().len();
    let skip_vars = !term.root_node().is_var();
    let term_root = SubtreeRef::root_of(term);
    let mut subexpressions = assertion.subexpressions(skip_vars).map(|node| SubtreeRef {
        tree: assertion,
        node,
    });
    match op {
        RelOp::Le => subexpressions.any(|sub| unify(sub, term_root).is_some()),
        RelOp::Ge => subexpressions.any(|sub| unify(term_root, sub).is_some()),
        RelOp::Lt | RelOp::Eq | RelOp::EqEq => {
            for sub in subexpressions {
                if let Some(bindings) = unify(sub, term_root) {
                    let renaming = is_renaming(&bindings, var_count);
                    return match op {
                        RelOp::Lt => !renaming,
                        RelOp::Eq => renaming,
                        _ => renaming && sub.deep_eq(&term_root),
                    };
                }
            }
            false
        }
        RelOp::Gt => {
            for sub in subexpressions {
                if let Some(bindings) = unify(term_root, sub) {
                    return !is_renaming(&bindings, var_count);
                }
            }
            false
        }
        RelOp::LtGt => {
            matches_expression(RelOp::Lt, assertion, term)
                || matches_expression(RelOp::Gt, assertion, term)
        }
    }
}
