//! Value coalescing
//!
//! Builds the single values document handed to a chart renderer by deep
//! merging, lowest precedence first:
//!
//! 1. spec-defined values
//! 2. selected layer option overlays, in caller order
//! 3. parameters (dotted paths expanded into nesting)
//! 4. user-defined values

use meshpack_core::{Values, ValuesInputs};

use crate::error::{RenderError, Result, ValuesOrigin};

/// Merge every values source of `inputs` and serialize the result to YAML
pub fn compute_value_overrides(inputs: &ValuesInputs) -> Result<String> {
    let mut values = parse_values(&inputs.spec_defined_values, ValuesOrigin::Spec)?;

    for input in &inputs.layers {
        let option = inputs
            .flavor
            .get_layer_option(&input.layer_id, &input.option_id)?;
        if option.helm_values.trim().is_empty() {
            continue;
        }

        let origin = ValuesOrigin::Layer {
            layer: input.layer_id.clone(),
            option: input.option_id.clone(),
        };
        values.merge(&parse_values(&option.helm_values, origin)?);
    }

    let params = Values::from_params(&inputs.params).map_err(|e| {
        tracing::error!(params = ?inputs.params, error = %e, "failed to parse params");
        RenderError::values_parse(ValuesOrigin::Params, format!("{:?}", inputs.params), e)
    })?;
    values.merge(&params);

    values.merge(&parse_values(&inputs.user_defined_values, ValuesOrigin::User)?);

    Ok(values.to_yaml()?)
}

fn parse_values(text: &str, origin: ValuesOrigin) -> Result<Values> {
    Values::from_yaml(text).map_err(|e| {
        tracing::error!(%origin, values = %text, error = %e, "failed to parse values");
        RenderError::values_parse(origin, text, e)
    })
}
