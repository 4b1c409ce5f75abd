//! # Groups
//! Nodes of the pipeline tree aggregating ops and subgroups.

use crate::{GroupId, Param};
use core::fmt;
use serde::{Deserialize, Serialize};

/// A node in the pipeline tree.
///
/// Groups own their children in declaration order. Child groups are arena
/// indices into [`Pipeline::groups`][crate::Pipeline::groups]; child ops are
/// names into [`Pipeline::ops`][crate::Pipeline::ops].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique name of the group across the whole pipeline.
    pub name: String,
    /// The group's kind together with any per-kind payload.
    pub kind: GroupKind,
    /// Ordered child groups.
    pub groups: Vec<GroupId>,
    /// Ordered child op names.
    pub ops: Vec<String>,
    /// Declared input parameters.
    ///
    /// Populated for recursive groups, where the declared inputs are matched
    /// positionally against the recursion target's declared inputs.
    pub inputs: Vec<Param>,
    /// Names of sibling groups this group must run after.
    pub dependencies: Vec<String>,
}

impl Group {
    /// A new, empty group of the given kind.
    pub fn new(name: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            name: name.into(),
            kind,
            groups: Vec::new(),
            ops: Vec::new(),
            inputs: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Whether this group is a recursive reference into an earlier group.
    pub fn is_recursive(&self) -> bool {
        matches!(self.kind, GroupKind::Recursive { .. })
    }

    /// The recursion target, if this group is a recursive reference.
    pub fn recursion_target(&self) -> Option<GroupId> {
        match self.kind {
            GroupKind::Recursive { target } => Some(target),
            _ => None,
        }
    }
}

/// The kind of a group, with per-kind payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    /// The root of the pipeline tree.
    Root,
    /// A conditional subtree, executed only when the predicate holds.
    Condition(Condition),
    /// A subtree covered by an exit handler.
    ExitHandler {
        /// Name of the op invoked when the workflow exits.
        exit_op: String,
    },
    /// A plain iterated subtree.
    Loop,
    /// A recursive re-entry into an earlier group.
    ///
    /// Recursive groups are never rendered as templates; the target group's
    /// template embodies them. The back-edge is an arena index and is never
    /// traversed.
    Recursive {
        /// Arena index of the originating group.
        target: GroupId,
    },
}

/// The predicate guarding a condition group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Left-hand operand.
    pub operand1: Operand,
    /// Comparison operator.
    pub operator: ConditionOperator,
    /// Right-hand operand.
    pub operand2: Operand,
}

/// One side of a condition predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// A parameter reference, resolved against the condition group's inputs.
    Param(Param),
    /// A literal value, rendered as its string form.
    Literal(String),
}

/// Comparison operator of a condition predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        };
        write!(f, "{s}")
    }
}
