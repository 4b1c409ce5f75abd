//! Op transformers applied during normalization.

use crate::types::manifest::{EnvVar, EnvVarSource, FieldRef};
use crate::types::{Op, OpVariant};

/// Name of the injected downward-API pod name variable.
pub const POD_NAME_ENV: &str = "POD_NAME";

/// Expose the pod's own name to container ops through the downward API.
///
/// Always the first transformer applied; container ops that already define
/// the variable are left alone.
pub fn add_pod_name_env(op: &mut Op) {
    let OpVariant::Container(container) = &mut op.variant else {
        return;
    };
    if container.env.iter().any(|env| env.name == POD_NAME_ENV) {
        return;
    }
    container.env.push(EnvVar {
        name: POD_NAME_ENV.to_string(),
        value: None,
        value_from: Some(EnvVarSource {
            field_ref: Some(FieldRef {
                field_path: "metadata.name".to_string(),
            }),
        }),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_name_is_injected_once() {
        let mut op = Op::container("step", "img");
        add_pod_name_env(&mut op);
        add_pod_name_env(&mut op);
        let OpVariant::Container(container) = &op.variant else {
            unreachable!()
        };
        let pod_envs: Vec<_> = container
            .env
            .iter()
            .filter(|env| env.name == POD_NAME_ENV)
            .collect();
        assert_eq!(pod_envs.len(), 1);
        assert_eq!(
            pod_envs[0]
                .value_from
                .as_ref()
                .unwrap()
                .field_ref
                .as_ref()
                .unwrap()
                .field_path,
            "metadata.name"
        );
    }

    #[test]
    fn resource_ops_are_untouched() {
        let mut op = Op::resource("deploy", "create", "kind: Job");
        let before = op.clone();
        add_pod_name_env(&mut op);
        assert_eq!(op, before);
    }
}
