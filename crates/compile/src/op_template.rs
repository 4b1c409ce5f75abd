//! Rendering of leaf ops into templates.

use crate::error::CompileError;
use crate::types::manifest::{
    Container, Inputs, OutputParameter, Outputs, Parameter, ResourceTemplate, Template, ValueFrom,
};
use crate::types::{Op, OpVariant};
use std::collections::BTreeSet;

/// The pluggable op-to-template contract.
///
/// Invoked once per op; the returned templates are concatenated into the
/// workflow's template list. Implemented for any
/// `Fn(&Op) -> Result<Vec<Template>, CompileError>`.
pub trait RenderOp {
    /// Render one op into one or more manifest templates.
    fn render(&self, op: &Op) -> Result<Vec<Template>, CompileError>;
}

impl<F> RenderOp for F
where
    F: Fn(&Op) -> Result<Vec<Template>, CompileError>,
{
    fn render(&self, op: &Op) -> Result<Vec<Template>, CompileError> {
        (self)(op)
    }
}

/// The built-in renderer for container and resource ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRender;

impl RenderOp for DefaultRender {
    fn render(&self, op: &Op) -> Result<Vec<Template>, CompileError> {
        Ok(vec![op_template(op)])
    }
}

/// Render a single op into its leaf template.
///
/// Inputs are the full names of the op's non-immediate parameters. Container
/// ops emit their file outputs as path-sourced output parameters; resource
/// ops emit their attribute outputs as JSON-path-sourced ones. Output
/// parameter names are prefixed with the op name, matching the full names
/// the enclosing DAG references.
pub fn op_template(op: &Op) -> Template {
    let mut template = Template::new(op.name.clone());

    let input_names: BTreeSet<String> = op
        .inputs
        .iter()
        .filter(|param| !param.is_immediate())
        .map(|param| param.full_name())
        .collect();
    if !input_names.is_empty() {
        template.inputs = Some(Inputs {
            parameters: input_names
                .into_iter()
                .map(|name| Parameter { name, value: None })
                .collect(),
        });
    }

    let outputs = match &op.variant {
        OpVariant::Container(spec) => {
            template.container = Some(Container {
                image: spec.image.clone(),
                command: spec.command.clone(),
                args: spec.args.clone(),
                env: spec.env.clone(),
            });
            spec.file_outputs
                .iter()
                .map(|(key, path)| OutputParameter {
                    name: format!("{}-{}", op.name, key),
                    value_from: ValueFrom {
                        path: Some(path.clone()),
                        ..ValueFrom::default()
                    },
                })
                .collect::<Vec<_>>()
        }
        OpVariant::Resource(spec) => {
            template.resource = Some(ResourceTemplate {
                action: spec.action.clone(),
                manifest: spec.manifest.clone(),
            });
            spec.attribute_outputs
                .iter()
                .map(|(key, json_path)| OutputParameter {
                    name: format!("{}-{}", op.name, key),
                    value_from: ValueFrom {
                        json_path: Some(json_path.clone()),
                        ..ValueFrom::default()
                    },
                })
                .collect::<Vec<_>>()
        }
    };
    if !outputs.is_empty() {
        template.outputs = Some(Outputs {
            parameters: outputs,
        });
    }
    template
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Param;

    #[test]
    fn container_op_renders_image_and_file_outputs() {
        let mut op = Op::container("train", "trainer:v1");
        op.inputs.push(Param::pipeline_input("epochs"));
        op.inputs.push(Param::immediate("seed", "42"));
        if let OpVariant::Container(spec) = &mut op.variant {
            spec.command = vec!["python".to_string(), "train.py".to_string()];
            spec.file_outputs
                .insert("model".to_string(), "/out/model.txt".to_string());
        }

        let template = op_template(&op);
        assert_eq!(template.name, "train");
        let inputs = template.inputs.unwrap().parameters;
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, "epochs");
        let outputs = template.outputs.unwrap().parameters;
        assert_eq!(outputs[0].name, "train-model");
        assert_eq!(outputs[0].value_from.path.as_deref(), Some("/out/model.txt"));
        assert_eq!(template.container.unwrap().image, "trainer:v1");
    }

    #[test]
    fn resource_op_renders_attribute_outputs() {
        let mut op = Op::resource("deploy", "create", "kind: Job");
        if let OpVariant::Resource(spec) = &mut op.variant {
            spec.attribute_outputs
                .insert("name".to_string(), "{.metadata.name}".to_string());
        }

        let template = op_template(&op);
        let outputs = template.outputs.unwrap().parameters;
        assert_eq!(outputs[0].name, "deploy-name");
        assert_eq!(
            outputs[0].value_from.json_path.as_deref(),
            Some("{.metadata.name}")
        );
        assert_eq!(template.resource.unwrap().action, "create");
    }

    #[test]
    fn closures_implement_the_contract() {
        let handler = |op: &Op| -> Result<Vec<Template>, CompileError> {
            Ok(vec![Template::new(format!("{}-custom", op.name))])
        };
        let rendered = handler.render(&Op::container("step", "img")).unwrap();
        assert_eq!(rendered[0].name, "step-custom");
    }
}
