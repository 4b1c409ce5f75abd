//! Ancestry analysis over a pipeline's group tree.

use crate::error::CompileError;
use crate::types::{GroupId, Pipeline};
use std::collections::BTreeMap;

/// Ancestor chains for every op and non-recursive group of a pipeline.
///
/// Chains run from the root down to and including the entity itself, so the
/// first element of any chain is the root group's name. Recursive groups are
/// recorded as pseudo-leaves under their own name: downstream analyses treat
/// them like ops, and their children are never walked.
#[derive(Debug, Clone, Default)]
pub struct Ancestry {
    /// Non-recursive groups by name. Recursive groups are absent because
    /// their recursion target's template embodies them.
    pub groups: BTreeMap<String, GroupId>,
    /// Op name to its ancestor chain. Also holds the pseudo-leaf entries of
    /// recursive groups.
    pub op_ancestors: BTreeMap<String, Vec<String>>,
    /// Non-recursive group name to its ancestor chain.
    pub group_ancestors: BTreeMap<String, Vec<String>>,
}

impl Ancestry {
    /// Walk the tree depth-first from the root and record every chain.
    pub fn build(pipeline: &Pipeline) -> Self {
        let mut ancestry = Self::default();
        let mut stack = Vec::new();
        ancestry.walk(pipeline, pipeline.root, &mut stack);
        ancestry
    }

    fn walk(&mut self, pipeline: &Pipeline, id: GroupId, stack: &mut Vec<String>) {
        let group = pipeline.group(id);
        if group.is_recursive() {
            // Pseudo-leaf: record the chain and terminate the descent.
            let mut chain = stack.clone();
            chain.push(group.name.clone());
            self.op_ancestors.insert(group.name.clone(), chain);
            return;
        }
        stack.push(group.name.clone());
        self.groups.insert(group.name.clone(), id);
        self.group_ancestors
            .insert(group.name.clone(), stack.clone());
        for op in &group.ops {
            let mut chain = stack.clone();
            chain.push(op.clone());
            self.op_ancestors.insert(op.clone(), chain);
        }
        for &child in &group.groups {
            self.walk(pipeline, child, stack);
        }
        stack.pop();
    }

    /// The ancestor chain of the named op or group.
    pub fn ancestors(&self, name: &str) -> Result<&[String], CompileError> {
        self.op_ancestors
            .get(name)
            .or_else(|| self.group_ancestors.get(name))
            .map(Vec::as_slice)
            .ok_or_else(|| CompileError::UnknownEntity(name.to_string()))
    }

    /// Strip the longest common prefix off the two entities' ancestor chains
    /// and return the divergent tails, `a`'s first.
    ///
    /// The last element of each tail is the entity itself; the first element
    /// is the highest ancestor that is sibling-scope to the other entity.
    pub fn uncommon_ancestors(
        &self,
        a: &str,
        b: &str,
    ) -> Result<(Vec<String>, Vec<String>), CompileError> {
        let a_chain = self.ancestors(a)?;
        let b_chain = self.ancestors(b)?;
        let common = a_chain
            .iter()
            .zip(b_chain.iter())
            .take_while(|(x, y)| x == y)
            .count();
        Ok((a_chain[common..].to_vec(), b_chain[common..].to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Group, GroupKind, Op};

    fn nested_pipeline() -> Pipeline {
        // root -> outer -> inner -> leaf, plus sibling op at root.
        let mut pipeline = Pipeline::new("demo");
        let outer = pipeline.add_group(pipeline.root, Group::new("outer", GroupKind::Loop));
        let inner = pipeline.add_group(outer, Group::new("inner", GroupKind::Loop));
        pipeline.add_op(inner, Op::container("leaf", "img"));
        pipeline.add_op(pipeline.root, Op::container("top", "img"));
        pipeline
    }

    #[test]
    fn chains_run_root_to_entity() {
        let ancestry = Ancestry::build(&nested_pipeline());
        assert_eq!(
            ancestry.op_ancestors["leaf"],
            ["demo", "outer", "inner", "leaf"]
        );
        assert_eq!(ancestry.group_ancestors["inner"], ["demo", "outer", "inner"]);
        assert_eq!(ancestry.group_ancestors["demo"], ["demo"]);
    }

    #[test]
    fn uncommon_tails_strip_shared_prefix() {
        let ancestry = Ancestry::build(&nested_pipeline());
        let (up, down) = ancestry.uncommon_ancestors("top", "leaf").unwrap();
        assert_eq!(up, ["top"]);
        assert_eq!(down, ["outer", "inner", "leaf"]);
    }

    #[test]
    fn recursive_groups_are_pseudo_leaves() {
        let mut pipeline = Pipeline::new("demo");
        let entry = pipeline.add_group(pipeline.root, Group::new("entry", GroupKind::Loop));
        pipeline.add_group(entry, Group::new("again", GroupKind::Recursive { target: entry }));
        let ancestry = Ancestry::build(&pipeline);
        assert_eq!(ancestry.op_ancestors["again"], ["demo", "entry", "again"]);
        assert!(!ancestry.groups.contains_key("again"));
        assert!(!ancestry.group_ancestors.contains_key("again"));
    }

    #[test]
    fn unknown_entity_errors() {
        let ancestry = Ancestry::build(&nested_pipeline());
        assert_eq!(
            ancestry.uncommon_ancestors("leaf", "ghost"),
            Err(CompileError::UnknownEntity("ghost".to_string()))
        );
    }
}
