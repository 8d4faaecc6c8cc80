//! Input validation against the application version and flavor

use meshpack_core::{
    CoreError, CustomizationLayer, LayerOption, Parameter, ValuesInputs, VersionedApplicationSpec,
};
use std::collections::BTreeMap;

use crate::dependency::DependencyValidator;
use crate::error::{RenderError, Result};

/// Check layer selections, option dependencies and parameters
///
/// Checks run in a fixed order and the first failure is returned:
/// 1. at least as many layer inputs as the flavor has required layers
/// 2. every required layer resolves to an option; each resolved option's
///    dependencies pass `validator`
/// 3. every required parameter has a non-empty value
/// 4. every supplied parameter is declared by the application version, the flavor or a
///    selected option
pub fn validate_inputs(
    inputs: &ValuesInputs,
    spec: &VersionedApplicationSpec,
    validator: &dyn DependencyValidator,
) -> Result<()> {
    let flavor = &inputs.flavor;

    let required = flavor.required_layer_count();
    if inputs.layers.len() < required {
        return Err(RenderError::IncorrectNumberOfInputLayers {
            supplied: inputs.layers.len(),
            required,
        });
    }

    let mut selected_options: Vec<&LayerOption> = Vec::new();
    for layer in &flavor.customization_layers {
        match select_option(inputs, layer) {
            Ok(option) => {
                tracing::debug!(layer = %layer.id, option = %option.id, "selected layer option");
                validator
                    .validate(&option.resource_dependencies)
                    .map_err(RenderError::DependencyValidation)?;
                selected_options.push(option);
            }
            Err(cause) if !layer.optional => {
                return Err(RenderError::MissingInputForRequiredLayer {
                    layer: layer.id.clone(),
                    cause,
                });
            }
            Err(_) => {
                tracing::debug!(layer = %layer.id, "skipping optional layer without selection");
            }
        }
    }

    let parameters = parameter_namespace(spec, &flavor.parameters, &selected_options);

    for (name, param) in &parameters {
        let missing = inputs.params.get(*name).is_none_or(|value| value.is_empty());
        if param.required && missing {
            return Err(RenderError::MissingInputForRequiredParameter {
                name: name.to_string(),
            });
        }
    }

    for name in inputs.params.keys() {
        if !parameters.contains_key(name.as_str()) {
            return Err(RenderError::UnrecognizedParameter { name: name.clone() });
        }
    }

    Ok(())
}

/// Resolve the option selected for `layer`; the first matching input wins
fn select_option<'a>(
    inputs: &ValuesInputs,
    layer: &'a CustomizationLayer,
) -> std::result::Result<&'a LayerOption, CoreError> {
    let input = inputs
        .layers
        .iter()
        .find(|input| input.layer_id == layer.id)
        .ok_or_else(|| CoreError::NoLayerSelection {
            layer: layer.id.clone(),
        })?;

    layer.option(&input.option_id)
}

/// Merge parameter declarations: spec, then flavor, then each selected option
///
/// A later declaration with the same name replaces the earlier one entirely.
fn parameter_namespace<'a>(
    spec: &'a VersionedApplicationSpec,
    flavor_parameters: &'a [Parameter],
    selected_options: &[&'a LayerOption],
) -> BTreeMap<&'a str, &'a Parameter> {
    let option_parameters = selected_options.iter().flat_map(|o| o.parameters.iter());

    spec.parameters
        .iter()
        .chain(flavor_parameters)
        .chain(option_parameters)
        .map(|param| (param.name.as_str(), param))
        .collect()
}
