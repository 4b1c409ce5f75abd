//! Rendering of parameter references against a group's known inputs.

use crate::lift::LiftedParam;
use crate::types::{Operand, Param};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// Collapse a set of lifted inputs into one sibling marker per full name.
///
/// Lifting coalesces by `(full_name, marker)`, so a name can in principle
/// carry both a sibling marker and the parent-supplied `None` marker. Such
/// entries are canonicalized rather than rejected: a sibling marker wins
/// over `None`, and the lexicographically smallest sibling wins when several
/// exist.
pub fn canonical_inputs(inputs: &BTreeSet<LiftedParam>) -> BTreeMap<String, Option<String>> {
    let mut canonical = BTreeMap::new();
    for (name, marker) in inputs {
        match canonical.entry(name.clone()) {
            Entry::Vacant(vacant) => {
                vacant.insert(marker.clone());
            }
            Entry::Occupied(mut occupied) => {
                // Entries iterate in order, so the first sibling marker seen
                // for a name is the smallest.
                if occupied.get().is_none() && marker.is_some() {
                    occupied.insert(marker.clone());
                }
            }
        }
    }
    canonical
}

/// Format an operand for the manifest's templating language.
///
/// Parameter operands resolve against the consuming group's inputs; literal
/// operands render as their string form.
pub fn resolve_operand(operand: &Operand, inputs: &BTreeMap<String, Option<String>>) -> String {
    match operand {
        Operand::Param(param) => resolve_param(param, inputs),
        Operand::Literal(value) => value.clone(),
    }
}

/// Format a parameter reference for the manifest's templating language.
///
/// A parameter carried by a sibling task renders as that task's output; one
/// supplied by the enclosing scope, or absent from the inputs entirely,
/// renders as the current group's own input.
pub fn resolve_param(param: &Param, inputs: &BTreeMap<String, Option<String>>) -> String {
    let full_name = param.full_name();
    match inputs.get(&full_name) {
        Some(Some(task)) => task_output_ref(task, &full_name),
        _ => input_ref(&full_name),
    }
}

/// The `{{inputs.parameters.NAME}}` reference form.
pub fn input_ref(name: &str) -> String {
    format!("{{{{inputs.parameters.{name}}}}}")
}

/// The `{{tasks.TASK.outputs.parameters.NAME}}` reference form.
pub fn task_output_ref(task: &str, name: &str) -> String {
    format!("{{{{tasks.{task}.outputs.parameters.{name}}}}}")
}
